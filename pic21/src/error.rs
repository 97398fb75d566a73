//!
//! # Pic21 Result and Error Types
//!

// Crates.io
use thiserror::Error;

// Local Imports
pub use crate::utils::{self, ErrorContext};

/// # [PicError] Result Type
pub type PicResult<T> = Result<T, PicError>;

///
/// # Pic21 Error Enumeration
///
#[derive(Debug, Error)]
pub enum PicError {
    /// Error exporting to a foreign format, e.g. GDSII
    #[error("Export Error: {message} (in {})", display_stack(.stack))]
    Export {
        message: String,
        stack: Vec<ErrorContext>,
    },
    /// Invalid component or template parameters
    #[error("Invalid Parameter: {0}")]
    Validation(String),
    /// Requested geometry cannot be realized, e.g. waypoints too close for the bend radius
    #[error("Geometry Error: {0}")]
    Geometry(String),
    /// File IO
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// Markup (de)serialization
    #[error(transparent)]
    Ser(#[from] utils::ser::Error),
    /// Boxed external errors
    #[error(transparent)]
    Boxed(Box<dyn std::error::Error + Send + Sync>),
    /// Uncategorized error with message
    #[error("{0}")]
    Str(String),
    /// # [Ptr](crate::utils::Ptr) Locking
    /// A panic occurred while holding a cell lock.
    #[error("Poisoned shared-pointer lock")]
    PtrLock,
}
impl PicError {
    /// Create a [PicError::Str] from anything String-convertible
    pub fn msg(s: impl Into<String>) -> Self {
        Self::Str(s.into())
    }
    /// Create an error-variant [Result] of our [PicError::Str] variant
    pub fn fail<T>(s: impl Into<String>) -> PicResult<T> {
        Err(Self::msg(s))
    }
    /// Create an error-variant [Result] of our [PicError::Validation] variant
    pub fn invalid<T>(s: impl Into<String>) -> PicResult<T> {
        Err(Self::Validation(s.into()))
    }
    /// Create an error-variant [Result] of our [PicError::Geometry] variant
    pub fn geometry<T>(s: impl Into<String>) -> PicResult<T> {
        Err(Self::Geometry(s.into()))
    }
}
fn display_stack(stack: &[ErrorContext]) -> String {
    let ctx: Vec<String> = stack.iter().map(|c| c.to_string()).collect();
    ctx.join(" / ")
}
impl From<String> for PicError {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}
impl From<&str> for PicError {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}
impl From<serde_json::Error> for PicError {
    fn from(e: serde_json::Error) -> Self {
        Self::Boxed(Box::new(e))
    }
}
impl From<gds21::GdsError> for PicError {
    fn from(e: gds21::GdsError) -> Self {
        Self::Str(format!("GDSII Error: {}", e))
    }
}
impl<T> From<std::sync::PoisonError<T>> for PicError {
    fn from(_e: std::sync::PoisonError<T>) -> Self {
        Self::PtrLock
    }
}
