//! Error types shared by the Traeger platforms

use thiserror::Error;

use crate::EntityIdError;

/// Result type for integration operations
pub type TraegerResult<T> = Result<T, TraegerError>;

/// Errors surfaced to callers of entity operations
#[derive(Debug, Clone, Error, PartialEq)]
pub enum TraegerError {
    /// The operation is not valid in the grill's current mode
    #[error("{0} not supported in current state")]
    UnsupportedInCurrentState(String),

    #[error("unknown grill: {0}")]
    UnknownGrill(String),

    #[error("unknown entity: {0}")]
    UnknownEntity(String),

    #[error("invalid service data: {0}")]
    InvalidServiceData(String),

    /// The grill client rejected or failed a request
    #[error("grill client error: {0}")]
    Client(String),

    #[error(transparent)]
    EntityId(#[from] EntityIdError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_message() {
        let err = TraegerError::UnsupportedInCurrentState("Set Timer".to_string());
        assert_eq!(err.to_string(), "Set Timer not supported in current state");
    }
}
