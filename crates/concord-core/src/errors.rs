//! Unified error type for Concord
//!
//! Two families of failure exist: structural errors raised while building a
//! protocol model, and usage errors raised when a composition or verification
//! call receives inputs it cannot work with. Property violations and bounded
//! coverage are results, not errors, and never appear here.

/// Unified error type for all Concord operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConcordError {
    /// The initial state is not among the declared states
    #[error("protocol '{protocol}': initial state '{state}' is not a declared state (declared: {declared:?})")]
    UndeclaredInitialState {
        /// Protocol being constructed
        protocol: String,
        /// The offending initial state name
        state: String,
        /// Declared state names, in declaration order
        declared: Vec<String>,
    },

    /// A transition endpoint is not among the declared states
    #[error("protocol '{protocol}': transition on '{action}' references undeclared {endpoint} state '{state}'")]
    UndeclaredTransitionState {
        /// Protocol being constructed
        protocol: String,
        /// Action label of the offending transition
        action: String,
        /// Which endpoint was undeclared ("from" or "to")
        endpoint: &'static str,
        /// The undeclared state name
        state: String,
    },

    /// The same state name was declared twice
    #[error("protocol '{protocol}': state '{state}' is declared more than once")]
    DuplicateState {
        /// Protocol being constructed
        protocol: String,
        /// Duplicated state name
        state: String,
    },

    /// A query named a state the protocol does not have
    #[error("protocol '{protocol}': unknown state '{state}'")]
    UnknownState {
        /// Protocol queried
        protocol: String,
        /// Unknown state name
        state: String,
    },

    /// A composition was requested over zero protocols
    #[error("{operation}: at least one protocol is required")]
    EmptyComposition {
        /// Operation that rejected the input
        operation: String,
    },

    /// Two composed protocols share a name
    #[error("protocol name '{protocol}' appears more than once in the composition")]
    DuplicateProtocol {
        /// Duplicated protocol name
        protocol: String,
    },

    /// A priority list names protocols that are not being composed
    #[error("priority list contains unknown protocol names {unknown:?} (known: {known:?})")]
    UnknownPriorityProtocol {
        /// Names that matched no protocol
        unknown: Vec<String>,
        /// Names of the composed protocols
        known: Vec<String>,
    },

    /// The full Cartesian product is larger than the caller allowed
    #[error("joint state space has {size} states, above the ceiling of {ceiling}")]
    StateSpaceTooLarge {
        /// Product of the per-protocol state counts (saturating)
        size: usize,
        /// Ceiling supplied by the caller
        ceiling: usize,
    },

    /// Invalid configuration value
    #[error("Invalid configuration: {message}")]
    InvalidConfig {
        /// Error message describing the invalid value
        message: String,
    },

    /// A protocol or composition definition could not be parsed
    #[error("Definition error: {message}")]
    Definition {
        /// Error message from the parser
        message: String,
    },

    /// A report could not be serialized
    #[error("Serialization error: {message}")]
    Serialization {
        /// Error message from the serializer
        message: String,
    },
}

impl ConcordError {
    /// Create an empty-composition error for `operation`
    pub fn empty_composition(operation: impl Into<String>) -> Self {
        Self::EmptyComposition {
            operation: operation.into(),
        }
    }

    /// Create an invalid configuration error
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Create a definition error
    pub fn definition(message: impl Into<String>) -> Self {
        Self::Definition {
            message: message.into(),
        }
    }

    /// Returns `true` for errors raised while building a protocol model.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            Self::UndeclaredInitialState { .. }
                | Self::UndeclaredTransitionState { .. }
                | Self::DuplicateState { .. }
        )
    }

    /// Returns `true` for errors caused by the inputs of a composition or
    /// verification call.
    pub fn is_usage(&self) -> bool {
        matches!(
            self,
            Self::UnknownState { .. }
                | Self::EmptyComposition { .. }
                | Self::DuplicateProtocol { .. }
                | Self::UnknownPriorityProtocol { .. }
                | Self::StateSpaceTooLarge { .. }
                | Self::InvalidConfig { .. }
        )
    }
}

impl From<toml::de::Error> for ConcordError {
    fn from(err: toml::de::Error) -> Self {
        Self::definition(err.to_string())
    }
}

impl From<std::io::Error> for ConcordError {
    fn from(err: std::io::Error) -> Self {
        Self::definition(format!("failed to read definition: {err}"))
    }
}

impl From<serde_json::Error> for ConcordError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            message: err.to_string(),
        }
    }
}

/// Standard Result type for Concord operations
pub type Result<T> = std::result::Result<T, ConcordError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ConcordError::empty_composition("ProtocolComposer::new");
        assert_eq!(
            err.to_string(),
            "ProtocolComposer::new: at least one protocol is required"
        );
    }

    #[test]
    fn test_error_classification() {
        let structural = ConcordError::DuplicateState {
            protocol: "ATP".into(),
            state: "low".into(),
        };
        assert!(structural.is_structural());
        assert!(!structural.is_usage());

        let usage = ConcordError::StateSpaceTooLarge {
            size: 27,
            ceiling: 8,
        };
        assert!(usage.is_usage());
        assert!(!usage.is_structural());

        let parse = ConcordError::definition("bad toml");
        assert!(!parse.is_usage());
        assert!(!parse.is_structural());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing.toml");
        let err = ConcordError::from(io_err);
        assert!(matches!(err, ConcordError::Definition { .. }));
    }
}
