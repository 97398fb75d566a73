//!
//! # Error-Helper Utilities
//!
//! ```rust
//! use pic21utils::error::{ErrorHelper, Unwrapper};
//!
//! /// Reports which layer it was working on when failing.
//! struct LayerWalker {
//!     layer: i16,
//! }
//! impl ErrorHelper for LayerWalker {
//!     type Error = String;
//!     fn err(&self, msg: impl Into<String>) -> Self::Error {
//!         format!("Layer {}: {}", self.layer, msg.into())
//!     }
//! }
//! impl LayerWalker {
//!     fn walk(&self) -> Result<i32, String> {
//!         let npts = Some(4).unwrapper(self, "no points")?;
//!         self.assert(npts > 2, "degenerate polygon")?;
//!         Ok(npts)
//!     }
//! }
//! assert_eq!(LayerWalker { layer: 1 }.walk(), Ok(4));
//! ```
//!

///
/// # ErrorHelper
///
/// Shared failure-handling for tree-walkers such as exporters and converters.
/// Implementers inject their own state (commonly a context stack) in `err`;
/// the remaining methods build on it.
///
pub trait ErrorHelper {
    type Error;

    /// Create a [Self::Error] from message `msg`
    fn err(&self, msg: impl Into<String>) -> Self::Error;
    /// Return failure
    fn fail<T>(&self, msg: impl Into<String>) -> Result<T, Self::Error> {
        Err(self.err(msg))
    }
    /// Unwrap `opt` if [Some], else fail with `msg`
    fn unwrap<T>(&self, opt: Option<T>, msg: impl Into<String>) -> Result<T, Self::Error> {
        match opt {
            Some(val) => Ok(val),
            None => self.fail(msg),
        }
    }
    /// Fail with `msg` unless `b` holds
    fn assert(&self, b: bool, msg: impl Into<String>) -> Result<(), Self::Error> {
        match b {
            true => Ok(()),
            false => self.fail(msg),
        }
    }
}

///
/// # Unwrapper
///
/// Post-fix [ErrorHelper] handling for [Option]s and [Result]s:
/// `value.unwrapper(helper, "message")?` rather than a panicking `unwrap`.
///
pub trait Unwrapper {
    type Ok;
    fn unwrapper<H>(self, helper: &H, msg: impl Into<String>) -> Result<Self::Ok, H::Error>
    where
        H: ErrorHelper;
}
impl<T> Unwrapper for Option<T> {
    type Ok = T;
    fn unwrapper<H>(self, helper: &H, msg: impl Into<String>) -> Result<Self::Ok, H::Error>
    where
        H: ErrorHelper,
    {
        helper.unwrap(self, msg)
    }
}
impl<T, E: std::fmt::Display> Unwrapper for Result<T, E> {
    type Ok = T;
    /// Failures carry both `msg` and the display of the original error.
    fn unwrapper<H>(self, helper: &H, msg: impl Into<String>) -> Result<T, H::Error>
    where
        H: ErrorHelper,
    {
        match self {
            Ok(t) => Ok(t),
            Err(e) => helper.fail(format!("{}: {}", msg.into(), e)),
        }
    }
}
