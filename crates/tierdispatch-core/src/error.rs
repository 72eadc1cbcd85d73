//! Error types for kernel registration and dispatch.
//!
//! Every variant here is a setup-time invariant violation. Once a dispatcher
//! has resolved an operation successfully, dispatching it never fails again.

use thiserror::Error;

/// Errors that can occur while registering or resolving kernels.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    /// A second fallback was registered for the same operation.
    ///
    /// Every operation owns exactly one extension-independent implementation.
    /// The rejected registration leaves the registry unchanged.
    #[error("Operation '{operation}' already has a fallback implementation")]
    DuplicateFallback {
        /// Operation that already has a fallback
        operation: String,
    },

    /// Registration was attempted after the registry was frozen.
    ///
    /// The registry freezes on the first resolution; the priority chains it
    /// hands to the dispatcher never change afterwards.
    #[error("Registry is frozen, cannot register a kernel for '{operation}'")]
    RegistryFrozen {
        /// Operation the late registration targeted
        operation: String,
    },

    /// Dispatch was requested for an operation with no registered entries.
    #[error("Unknown operation '{operation}'")]
    UnknownOperation {
        /// Name of the missing operation
        operation: String,
    },

    /// An operation has tier entries but no fallback.
    ///
    /// Detected when the registry freezes, so the unresolvable chain is
    /// rejected before any caller can reach it.
    #[error("Operation '{operation}' has no fallback implementation")]
    MissingFallback {
        /// Operation without a fallback
        operation: String,
    },

    /// An extension name could not be parsed.
    #[error("Unknown CPU extension '{name}'")]
    UnknownExtension {
        /// The unrecognized name
        name: String,
    },
}

impl DispatchError {
    /// Create a DuplicateFallback error.
    pub fn duplicate_fallback<S: Into<String>>(operation: S) -> Self {
        Self::DuplicateFallback {
            operation: operation.into(),
        }
    }

    /// Create a RegistryFrozen error.
    pub fn registry_frozen<S: Into<String>>(operation: S) -> Self {
        Self::RegistryFrozen {
            operation: operation.into(),
        }
    }

    /// Create an UnknownOperation error.
    pub fn unknown_operation<S: Into<String>>(operation: S) -> Self {
        Self::UnknownOperation {
            operation: operation.into(),
        }
    }

    /// Create a MissingFallback error.
    pub fn missing_fallback<S: Into<String>>(operation: S) -> Self {
        Self::MissingFallback {
            operation: operation.into(),
        }
    }

    /// Create an UnknownExtension error.
    pub fn unknown_extension<S: Into<String>>(name: S) -> Self {
        Self::UnknownExtension { name: name.into() }
    }

    /// Name of the operation involved, if any.
    pub fn operation(&self) -> Option<&str> {
        match self {
            Self::DuplicateFallback { operation }
            | Self::RegistryFrozen { operation }
            | Self::UnknownOperation { operation }
            | Self::MissingFallback { operation } => Some(operation),
            Self::UnknownExtension { .. } => None,
        }
    }
}

/// Result type alias for registry and dispatcher operations.
pub type Result<T> = std::result::Result<T, DispatchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = DispatchError::duplicate_fallback("increment");
        assert!(matches!(err, DispatchError::DuplicateFallback { .. }));
        assert_eq!(
            err.to_string(),
            "Operation 'increment' already has a fallback implementation"
        );

        let err = DispatchError::unknown_operation("decrement");
        assert!(matches!(err, DispatchError::UnknownOperation { .. }));
        assert_eq!(err.to_string(), "Unknown operation 'decrement'");
    }

    #[test]
    fn test_error_display() {
        let errors = vec![
            DispatchError::duplicate_fallback("a"),
            DispatchError::registry_frozen("b"),
            DispatchError::unknown_operation("c"),
            DispatchError::missing_fallback("d"),
            DispatchError::unknown_extension("avx9000"),
        ];

        for err in errors {
            assert!(!err.to_string().is_empty());
        }
    }

    #[test]
    fn test_error_operation() {
        assert_eq!(
            DispatchError::registry_frozen("increment").operation(),
            Some("increment")
        );
        assert_eq!(
            DispatchError::missing_fallback("dispatch3").operation(),
            Some("dispatch3")
        );
        assert_eq!(DispatchError::unknown_extension("mmx").operation(), None);
    }
}
