//!
//! # Dependency Ordering
//!
//! Component cells instance sub-cells (an MZI instances its MMIs and arms, a spiral its waveguide),
//! and exporters such as GDSII writers need every cell written after everything it instances.
//!

// Std-lib
use std::collections::HashSet;
use std::marker::PhantomData;

///
/// # Dependency-Ordering Trait
///
/// Implementers supply `process`, which passes each direct dependency of `item`
/// to [DepOrderer::push]. `push` recurses depth-first and reports cycles through `fail`.
///
/// ```text
/// struct CellOrder;
/// impl DepOrder for CellOrder {
///     type Item = Ptr<Cell>;
///     type Error = PicError;
///     fn process(item: &Ptr<Cell>, orderer: &mut DepOrderer<Self>) -> Result<(), PicError> {
///         for inst in item.read()?.layout.insts.iter() {
///             orderer.push(&inst.cell)?;
///         }
///         Ok(())
///     }
///     fn fail() -> Result<(), PicError> { ... }
/// }
/// let ordered = CellOrder::order(&cells)?;
/// ```
///
pub trait DepOrder: Sized {
    /// Item type. Typically pointers or keys to graph nodes.
    type Item: Clone + Eq + std::hash::Hash;
    /// Error type
    type Error;

    /// Dependency-order all entries in slice `items`
    fn order(items: &[Self::Item]) -> Result<Vec<Self::Item>, Self::Error> {
        DepOrderer::<Self>::order(items)
    }
    /// Process a single `item`, pushing each of its dependencies
    fn process(item: &Self::Item, orderer: &mut DepOrderer<Self>) -> Result<(), Self::Error>;
    /// Failure handler, invoked upon a dependency cycle
    fn fail() -> Result<(), Self::Error>;
}

/// # Dependency Order Helper
/// Public solely for use in the signature of [DepOrder::process].
pub struct DepOrderer<P: DepOrder> {
    /// Ordered, completed items
    stack: Vec<P::Item>,
    /// Completed items
    seen: HashSet<P::Item>,
    /// Items with an open stack frame
    pending: HashSet<P::Item>,
    p: PhantomData<P>,
}
impl<P: DepOrder> DepOrderer<P> {
    /// Dependency-order all entries in slice `items`
    pub fn order(items: &[P::Item]) -> Result<Vec<P::Item>, P::Error> {
        let mut this = Self {
            stack: Vec::with_capacity(items.len()),
            seen: HashSet::with_capacity(items.len()),
            pending: HashSet::new(),
            p: PhantomData,
        };
        for item in items.iter() {
            this.push(item)?;
        }
        Ok(this.stack)
    }
    /// Push `item`'s dependencies, and then itself, onto the stack
    pub fn push(&mut self, item: &P::Item) -> Result<(), P::Error> {
        if self.seen.contains(item) {
            return Ok(());
        }
        if !self.pending.insert(item.clone()) {
            return P::fail(); // Cycle
        }
        P::process(item, self)?;
        self.pending.remove(item);
        self.seen.insert(item.clone());
        self.stack.push(item.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    thread_local! {
        static GRAPH: std::cell::RefCell<HashMap<&'static str, Vec<&'static str>>> = Default::default();
    }
    struct NameOrder;
    impl DepOrder for NameOrder {
        type Item = &'static str;
        type Error = String;
        fn process(item: &&'static str, orderer: &mut DepOrderer<Self>) -> Result<(), String> {
            let deps = GRAPH.with(|g| g.borrow().get(item).cloned().unwrap_or_default());
            for dep in deps.iter() {
                orderer.push(dep)?;
            }
            Ok(())
        }
        fn fail() -> Result<(), String> {
            Err("cycle".into())
        }
    }

    #[test]
    fn orders_dependencies_first() {
        GRAPH.with(|g| {
            let mut g = g.borrow_mut();
            g.clear();
            g.insert("mzi", vec!["mmi", "arm"]);
            g.insert("arm", vec!["bend"]);
        });
        let order = NameOrder::order(&["mzi", "bend"]).unwrap();
        assert_eq!(order, vec!["mmi", "bend", "arm", "mzi"]);
    }
    #[test]
    fn detects_cycles() {
        GRAPH.with(|g| {
            let mut g = g.borrow_mut();
            g.clear();
            g.insert("a", vec!["b"]);
            g.insert("b", vec!["a"]);
        });
        assert_eq!(NameOrder::order(&["a"]), Err("cycle".to_string()));
    }
}
