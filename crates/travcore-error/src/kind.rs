//! Error kinds for travcore operations

use strum_macros::{Display, IntoStaticStr};

/// The kind of error that occurred.
///
/// This enum categorizes errors to help users write clear error handling logic.
/// Users can match on ErrorKind to decide how to handle specific error cases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoStaticStr, Display)]
#[non_exhaustive]
pub enum ErrorKind {
    // =========================================================================
    // General errors
    // =========================================================================
    /// An unexpected error occurred - catch-all for unhandled cases
    Unexpected,

    /// Invalid argument passed to a function
    InvalidArgument,

    /// Assertion failed
    AssertionFailed,

    /// Invariant violation
    InvariantViolation,

    /// Feature or operation not yet implemented
    NotImplemented,

    // =========================================================================
    // Traversal errors
    // =========================================================================
    /// A cycle was discovered in the IR while a node was still `Visiting`.
    LoopDetected,

    /// A hook attempted to replace a node through an immutable (non-const) slot.
    ConstReplacement,

    /// A flavor hook violated its contract (e.g. Transform's `preorder` returned
    /// a node the driver could not reconcile with the current slot).
    HookContract,

    // =========================================================================
    // Control-flow extension errors
    // =========================================================================
    /// A control-flow merge arrived for a node that was never registered as a
    /// join point, or the incoming-edge count underflowed.
    JoinMisuse,

    /// A scoped named-global guard found the key already held.
    GlobalInUse,
}

impl ErrorKind {
    /// Returns the error kind as a static string
    pub fn as_str(&self) -> &'static str {
        (*self).into()
    }

    /// Check if this error kind is retryable by default.
    ///
    /// Every kind surfaced by the traversal core is a programming error and is
    /// never retryable; this always returns `false`. The method is kept so that
    /// `Error::new` can share the same retry-classification logic every other
    /// kind in a larger catalog would use.
    pub fn is_retryable(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kind_display() {
        assert_eq!(ErrorKind::LoopDetected.to_string(), "LoopDetected");
        assert_eq!(ErrorKind::JoinMisuse.to_string(), "JoinMisuse");
    }

    #[test]
    fn test_is_retryable() {
        assert!(!ErrorKind::LoopDetected.is_retryable());
        assert!(!ErrorKind::HookContract.is_retryable());
    }
}
