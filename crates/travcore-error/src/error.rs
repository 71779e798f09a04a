//! The main Error type for travcore.

use crate::{ErrorKind, ErrorStatus};
use std::fmt;

/// Unified error type for all travcore operations.
pub struct Error {
    kind: ErrorKind,
    message: String,
    status: ErrorStatus,
    operation: &'static str,
    context: Vec<(&'static str, String)>,
    source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
}

impl Error {
    /// Create a new error with the given kind and message.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        let status = if kind.is_retryable() {
            ErrorStatus::Temporary
        } else {
            ErrorStatus::Permanent
        };

        Self {
            kind,
            message: message.into(),
            status,
            operation: "",
            context: Vec::new(),
            source: None,
        }
    }

    /// Get the error kind.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Get the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Get the error status
    pub fn status(&self) -> ErrorStatus {
        self.status
    }

    /// Get the operation that caused this error
    pub fn operation(&self) -> &'static str {
        self.operation
    }

    /// Get the context key-value pairs
    pub fn context(&self) -> &[(&'static str, String)] {
        &self.context
    }

    /// Get the source error (if any).
    pub fn source_ref(&self) -> Option<&(dyn std::error::Error + Send + Sync + 'static)> {
        self.source.as_ref().map(|e| e.as_ref())
    }

    /// Set the error status.
    pub fn with_status(mut self, status: ErrorStatus) -> Self {
        self.status = status;
        self
    }

    /// Mark as temporary (retryable)
    pub fn temporary(mut self) -> Self {
        self.status = ErrorStatus::Temporary;
        self
    }

    /// Mark as permanent (not retryable)
    pub fn permanent(mut self) -> Self {
        self.status = ErrorStatus::Permanent;
        self
    }

    /// Set the operation that caused this error.
    ///
    /// If an operation was already set, the previous one is moved to context
    /// as "called" to preserve the call chain.
    pub fn with_operation(mut self, operation: &'static str) -> Self {
        if !self.operation.is_empty() {
            self.context.push(("called", self.operation.to_string()));
        }
        self.operation = operation;
        self
    }

    /// Add context to the error
    pub fn with_context(mut self, key: &'static str, value: impl Into<String>) -> Self {
        self.context.push((key, value.into()));
        self
    }

    /// Set the source error.
    ///
    /// # Panics (debug only)
    /// Panics in debug mode if source was already set.
    pub fn set_source<E>(mut self, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        debug_assert!(self.source.is_none(), "source error already set");
        self.source = Some(Box::new(source));
        self
    }

    /// Mark as persistent after failed retries.
    pub fn persist(mut self) -> Self {
        self.status = self.status.persist();
        self
    }

    /// Check if this error is retryable
    pub fn is_retryable(&self) -> bool {
        self.status.is_retryable()
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}) at {}", self.kind, self.status, self.operation)?;

        if !self.context.is_empty() {
            write!(f, ", context {{ ")?;
            for (i, (key, value)) in self.context.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}: {}", key, value)?;
            }
            write!(f, " }}")?;
        }

        if !self.message.is_empty() {
            write!(f, " => {}", self.message)?;
        }

        Ok(())
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} ({}) at {}", self.kind, self.status, self.operation)?;

        if !self.message.is_empty() {
            writeln!(f)?;
            writeln!(f, "    Message: {}", self.message)?;
        }

        if !self.context.is_empty() {
            writeln!(f)?;
            writeln!(f, "    Context:")?;
            for (key, value) in &self.context {
                writeln!(f, "        {}: {}", key, value)?;
            }
        }

        if let Some(source) = &self.source {
            writeln!(f)?;
            writeln!(f, "    Source: {:?}", source)?;
        }

        Ok(())
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

impl From<String> for Error {
    fn from(msg: String) -> Self {
        Error::new(ErrorKind::Unexpected, msg)
    }
}

impl From<&str> for Error {
    fn from(msg: &str) -> Self {
        Error::new(ErrorKind::Unexpected, msg)
    }
}

impl Error {
    /// Create an Unexpected error.
    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unexpected, message)
    }

    /// Create an InvalidArgument error
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidArgument, message)
    }

    /// Create an AssertionFailed error
    pub fn assertion_failed(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::AssertionFailed, message)
    }

    /// Create a NotImplemented error
    pub fn not_implemented(feature: impl Into<String>) -> Self {
        let feature = feature.into();
        Self::new(
            ErrorKind::NotImplemented,
            format!("'{}' is not implemented", feature),
        )
        .with_context("feature", feature)
    }

    /// Create a LoopDetected error: a node was re-entered while still `Visiting`.
    pub fn loop_detected(node: impl fmt::Display) -> Self {
        Self::new(
            ErrorKind::LoopDetected,
            format!("node {node} is already being visited (cycle in IR)"),
        )
        .with_context("node", node.to_string())
    }

    /// Create a ConstReplacement error: a hook tried to replace a node through
    /// an immutable slot.
    pub fn const_replacement(slot: impl fmt::Display) -> Self {
        Self::new(
            ErrorKind::ConstReplacement,
            format!("slot {slot} is immutable and cannot be replaced"),
        )
        .with_context("slot", slot.to_string())
    }

    /// Create a HookContract error: a flavor hook violated its contract.
    pub fn hook_contract(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::HookContract, message)
    }

    /// Create a JoinMisuse error: a control-flow merge arrived for a node that
    /// was never registered as a join point, or the edge count underflowed.
    pub fn join_misuse(node: impl fmt::Display) -> Self {
        Self::new(
            ErrorKind::JoinMisuse,
            format!("node {node} is not a registered join point"),
        )
        .with_context("node", node.to_string())
    }

    /// Create a GlobalInUse error: a scoped named-global guard found the key
    /// already held.
    pub fn global_in_use(key: impl Into<String>) -> Self {
        let key = key.into();
        Self::new(
            ErrorKind::GlobalInUse,
            format!("named global '{}' is already held", key),
        )
        .with_context("key", key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = Error::new(ErrorKind::LoopDetected, "cycle found");
        assert_eq!(err.kind(), ErrorKind::LoopDetected);
        assert_eq!(err.message(), "cycle found");
        assert_eq!(err.status(), ErrorStatus::Permanent);
    }

    #[test]
    fn test_error_with_context() {
        let err = Error::new(ErrorKind::JoinMisuse, "not found")
            .with_operation("control_flow::join_flows")
            .with_context("node", "n42")
            .with_context("pass", "reaching_defs");

        assert_eq!(err.operation(), "control_flow::join_flows");
        assert_eq!(err.context().len(), 2);
        assert_eq!(err.context()[0], ("node", "n42".to_string()));
    }

    #[test]
    fn test_operation_chaining() {
        let err = Error::new(ErrorKind::HookContract, "failed")
            .with_operation("transform::preorder")
            .with_operation("driver::apply_visitor");

        assert_eq!(err.operation(), "driver::apply_visitor");
        assert_eq!(err.context().len(), 1);
        assert_eq!(
            err.context()[0],
            ("called", "transform::preorder".to_string())
        );
    }

    #[test]
    fn test_all_kinds_are_permanent() {
        for err in [
            Error::loop_detected("n0"),
            Error::const_replacement("lhs"),
            Error::hook_contract("null node"),
            Error::join_misuse("n1"),
            Error::global_in_use("loop_exit"),
        ] {
            assert_eq!(err.status(), ErrorStatus::Permanent);
            assert!(!err.is_retryable());
        }
    }

    #[test]
    fn test_display() {
        let err = Error::loop_detected("n7")
            .with_operation("driver::apply_visitor")
            .with_context("depth", "3");

        let display = format!("{}", err);
        assert!(display.contains("LoopDetected"));
        assert!(display.contains("permanent"));
        assert!(display.contains("driver::apply_visitor"));
        assert!(display.contains("node: n7"));
    }

    #[test]
    fn test_convenience_constructors() {
        let err = Error::loop_detected("n3");
        assert_eq!(err.kind(), ErrorKind::LoopDetected);
        assert!(err.message().contains("n3"));

        let err = Error::global_in_use("loop_exit");
        assert_eq!(err.kind(), ErrorKind::GlobalInUse);
        assert!(err.message().contains("loop_exit"));
    }

    #[test]
    fn test_set_source() {
        #[derive(Debug)]
        struct Inner;
        impl fmt::Display for Inner {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "inner")
            }
        }
        impl std::error::Error for Inner {}

        let err = Error::new(ErrorKind::Unexpected, "wrapped").set_source(Inner);
        assert!(err.source_ref().is_some());
    }
}
