//!
//! # Shared-Pointer Types
//!
//! Cells in a photonic library are shared between many parents:
//! a single waveguide bend or MMI cell is commonly instanced by dozens of larger components.
//! [Ptr] and [PtrList] provide the shared, lockable, address-compared handles used for them.
//!

// Std-lib
use std::hash::{Hash, Hasher};
use std::ops::{Deref, DerefMut};
use std::sync::{Arc, RwLock};

// Crates.io
use by_address::ByAddress;

///
/// # Ptr
///
/// Thread-safe, reference-counted pointer to a lockable `T`.
/// Access goes through the [RwLock] methods, via [Deref]:
///
/// ```text
/// let cell = ptr.read()?;
/// let name = &cell.name;
/// ```
///
/// Borrowing the guarded data as a function argument generally requires
/// a ref-and-deref, i.e. `some_function(&*ptr.read()?)`,
/// and guards used across statements need their own `let` binding.
///
/// Equality and hashing are *by address*, so that two structurally identical cells
/// remain distinct keys, and clones of one pointer compare equal.
///
#[derive(Debug, Default)]
pub struct Ptr<T: ?Sized>(ByAddress<Arc<RwLock<T>>>);

impl<T> Ptr<T> {
    /// Create a new [Ptr], taking ownership of `t`.
    pub fn new(t: T) -> Self {
        Self(ByAddress(Arc::new(RwLock::new(t))))
    }
    /// Number of strong references to the pointee.
    pub fn refcount(&self) -> usize {
        Arc::strong_count(&self.0 .0)
    }
}
impl<T> From<T> for Ptr<T> {
    fn from(t: T) -> Self {
        Self::new(t)
    }
}
impl<T> Deref for Ptr<T> {
    type Target = ByAddress<Arc<RwLock<T>>>;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
impl<T> DerefMut for Ptr<T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}
// Manual impls, as the [Deref] implementation does not play well with derived ones.
impl<T> Clone for Ptr<T> {
    fn clone(&self) -> Self {
        Self(ByAddress::clone(&self.0))
    }
}
impl<T> PartialEq for Ptr<T> {
    fn eq(&self, other: &Self) -> bool {
        self.0.eq(&other.0)
    }
}
impl<T> Eq for Ptr<T> {}
impl<T> Hash for Ptr<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state)
    }
}

///
/// # Pointer List
///
/// Newtype over a [Vec] of [Ptr]s, which hands back a pointer to each newly added item.
/// Everything else forwards to the inner [Vec].
///
#[derive(Debug, Clone)]
pub struct PtrList<T: ?Sized>(Vec<Ptr<T>>);

impl<T> PtrList<T> {
    /// Create a new and empty [PtrList]. Also available via [Default].
    pub fn new() -> Self {
        Self(Vec::new())
    }
    /// Add a `T`-convertible item, returning a pointer to it.
    pub fn add(&mut self, t: impl Into<T>) -> Ptr<T> {
        let ptr = Ptr::new(t.into());
        self.0.push(ptr.clone());
        ptr
    }
    /// Add an existing [Ptr], unless it is already in the list.
    /// Returns `true` if it was added.
    pub fn add_ptr(&mut self, ptr: &Ptr<T>) -> bool {
        if self.0.contains(ptr) {
            return false;
        }
        self.0.push(ptr.clone());
        true
    }
}
impl<T> Default for PtrList<T> {
    fn default() -> Self {
        Self::new()
    }
}
impl<T> Deref for PtrList<T> {
    type Target = Vec<Ptr<T>>;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
impl<T> DerefMut for PtrList<T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}
impl<T> From<Vec<Ptr<T>>> for PtrList<T> {
    fn from(v: Vec<Ptr<T>>) -> Self {
        Self(v)
    }
}
impl<T> From<Vec<T>> for PtrList<T> {
    fn from(v: Vec<T>) -> Self {
        Self(v.into_iter().map(Ptr::new).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compares_by_address() {
        let a = Ptr::new("ring".to_string());
        let b = Ptr::new("ring".to_string());
        assert_ne!(a, b);
        let c = a.clone();
        assert_eq!(a, c);
        assert_eq!(a.refcount(), 2);
    }
    #[test]
    fn list_add_and_dedup() {
        let mut list = PtrList::<u32>::new();
        let p = list.add(3u32);
        assert_eq!(list.len(), 1);
        assert_eq!(*p.read().unwrap(), 3);

        assert!(!list.add_ptr(&p));
        assert_eq!(list.len(), 1);
        assert!(list.add_ptr(&Ptr::new(5)));
        assert_eq!(*list[1].read().unwrap(), 5);
    }
}
