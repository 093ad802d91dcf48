/// Domain-specific error types for gamefinder
///
/// Only failures that make a ranking request impossible surface here.
/// Degraded signals (tag extraction failures, dirty metadata) are recovered
/// inside the engine and never become an error value.

#[derive(Debug, thiserror::Error)]
pub enum GameFinderError {
    #[error("Validation error: {message}")]
    Validation {
        message: String,
        field: Option<String>
    },

    #[error("Configuration error: {0}")]
    Config(String),

    /// A required collaborator (vector index or embedding model) failed.
    #[error("Collaborator failure: {0}")]
    Collaborator(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<crate::embedding::EmbeddingError> for GameFinderError {
    fn from(e: crate::embedding::EmbeddingError) -> Self {
        GameFinderError::Collaborator(format!("embedding: {}", e))
    }
}

impl From<crate::index::IndexError> for GameFinderError {
    fn from(e: crate::index::IndexError) -> Self {
        GameFinderError::Collaborator(format!("vector index: {}", e))
    }
}

impl GameFinderError {
    /// Helper to create validation errors with field names
    ///
    /// Example:
    /// ```
    /// use gamefinder::errors::GameFinderError;
    /// let err = GameFinderError::validation("top_k", "top_k must be at most 100");
    /// ```
    pub fn validation(field: &str, message: &str) -> Self {
        GameFinderError::Validation {
            message: message.to_string(),
            field: Some(field.to_string()),
        }
    }

    /// True when the failure came from the index or embedding collaborator.
    pub fn is_collaborator_failure(&self) -> bool {
        matches!(self, GameFinderError::Collaborator(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::EmbeddingError;
    use crate::index::IndexError;

    #[test]
    fn test_embedding_error_maps_to_collaborator() {
        let err: GameFinderError = EmbeddingError::Timeout(10_000).into();
        assert!(err.is_collaborator_failure());
        assert!(err.to_string().contains("embedding"));
    }

    #[test]
    fn test_index_error_maps_to_collaborator() {
        let err: GameFinderError = IndexError::Api { status: 503, message: "unavailable".into() }.into();
        assert!(err.is_collaborator_failure());
        assert!(err.to_string().contains("503"));
    }

    #[test]
    fn test_validation_helper_sets_field() {
        match GameFinderError::validation("query", "empty") {
            GameFinderError::Validation { field, .. } => assert_eq!(field.as_deref(), Some("query")),
            other => panic!("unexpected variant: {:?}", other),
        }
    }
}
