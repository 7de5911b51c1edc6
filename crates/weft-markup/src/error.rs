//! Error types for the markup model.

/// Error raised by the markup model, the definition registries and processors.
///
/// Every variant is fatal for the current operation: there is no partial
/// recovery, and a failed construction never leaves a half-initialized object.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum MarkupError {
    /// Malformed input: bad offsets, empty names, inconsistent field combinations.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    /// Invalid dialect or processor configuration.
    #[error("Configuration error: {0}")]
    Configuration(String),
    /// Broken internal invariant (e.g. two processors with the same precedence).
    #[error("Illegal state: {0}")]
    IllegalState(String),
    /// A processor aborted template processing.
    #[error("Processor error: {0}")]
    Processor(String),
}

impl MarkupError {
    /// Create an [`MarkupError::InvalidArgument`] error.
    #[must_use]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    /// Create a [`MarkupError::Configuration`] error.
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Create a [`MarkupError::IllegalState`] error.
    #[must_use]
    pub fn illegal_state(message: impl Into<String>) -> Self {
        Self::IllegalState(message.into())
    }

    /// Create a [`MarkupError::Processor`] error.
    #[must_use]
    pub fn processor(message: impl Into<String>) -> Self {
        Self::Processor(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_category() {
        assert_eq!(
            MarkupError::invalid_argument("name cannot be empty").to_string(),
            "Invalid argument: name cannot be empty"
        );
        assert_eq!(
            MarkupError::illegal_state("tie").to_string(),
            "Illegal state: tie"
        );
    }
}
