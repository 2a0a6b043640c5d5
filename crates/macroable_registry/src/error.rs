//! Error types for macro registration and invocation.

use thiserror::Error;

/// Errors that can occur while registering, resolving or invoking macros.
#[derive(Debug, Error)]
pub enum MacroError {
    /// Malformed registration input or a rejected call argument.
    ///
    /// Raised for empty host, macro or namespace names, drafts committed
    /// without an implementation, overwrite-protected duplicates and
    /// parameter validation failures.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// No macro could be resolved for the host and name.
    #[error("method {host}::{name} does not exist")]
    MethodNotFound {
        /// The host the call was made against.
        host: String,
        /// The macro name that was called.
        name: String,
    },

    /// No macro could be resolved for the namespace, host and name.
    #[error("namespaced method {namespace}::{host}::{name} does not exist")]
    NamespacedMethodNotFound {
        /// The namespace the call was made under.
        namespace: String,
        /// The host the call was made against.
        host: String,
        /// The macro name that was called.
        name: String,
    },

    /// Failure raised by a macro body.
    #[error("{0}")]
    Failure(String),

    /// JSON serialization error, e.g. while computing a cache key.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl MacroError {
    /// Creates an [`InvalidArgument`](Self::InvalidArgument).
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// Creates a [`Failure`](Self::Failure).
    pub fn failure(msg: impl Into<String>) -> Self {
        Self::Failure(msg.into())
    }

    /// Creates a [`MethodNotFound`](Self::MethodNotFound).
    pub fn method_not_found(host: impl Into<String>, name: impl Into<String>) -> Self {
        Self::MethodNotFound {
            host: host.into(),
            name: name.into(),
        }
    }

    /// Creates a [`NamespacedMethodNotFound`](Self::NamespacedMethodNotFound).
    pub fn namespaced_method_not_found(
        namespace: impl Into<String>,
        host: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self::NamespacedMethodNotFound {
            namespace: namespace.into(),
            host: host.into(),
            name: name.into(),
        }
    }

    /// Returns `true` for either "does not exist" variant.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::MethodNotFound { .. } | Self::NamespacedMethodNotFound { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_messages_name_the_target() {
        let err = MacroError::method_not_found("Greeter", "shout");
        assert_eq!(err.to_string(), "method Greeter::shout does not exist");
        assert!(err.is_not_found());

        let err = MacroError::namespaced_method_not_found("admin", "Api", "adminOnly");
        assert_eq!(
            err.to_string(),
            "namespaced method admin::Api::adminOnly does not exist"
        );
        assert!(err.is_not_found());
    }

    #[test]
    fn failure_is_not_a_lookup_error() {
        let err = MacroError::failure("boom");
        assert_eq!(err.to_string(), "boom");
        assert!(!err.is_not_found());
    }
}
