//! Error types for template processing.

use std::io;

use weft_config::ConfigError;
use weft_markup::{Location, MarkupError};

/// Error raised while configuring the engine or processing a template.
///
/// Every error aborts the render it occurs in; nothing is retried.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ProcessingError {
    /// Invalid argument, configuration or broken invariant in the markup model.
    #[error(transparent)]
    Markup(#[from] MarkupError),

    /// `weft.toml` could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The tokenizer rejected the template.
    #[error("Cannot parse template \"{template}\" (line {line}, col {col}): {message}")]
    Parse {
        template: String,
        line: usize,
        col: usize,
        message: String,
    },

    /// A processor failed.
    #[error("Error processing template \"{template}\" (line {line}, col {col}): {message}")]
    Processor {
        template: String,
        line: usize,
        col: usize,
        message: String,
    },

    /// Writing the output failed.
    #[error("Cannot write output of template \"{template}\" (line {line}, col {col})")]
    Output {
        template: String,
        line: usize,
        col: usize,
        #[source]
        source: io::Error,
    },
}

impl ProcessingError {
    pub(crate) fn processor(template: &str, location: Option<Location>, source: &MarkupError) -> Self {
        let Location { line, col } = location.unwrap_or_default();
        Self::Processor {
            template: template.to_owned(),
            line,
            col,
            message: source.to_string(),
        }
    }

    pub(crate) fn output(template: &str, location: Option<Location>, source: io::Error) -> Self {
        let Location { line, col } = location.unwrap_or_default();
        Self::Output {
            template: template.to_owned(),
            line,
            col,
            source,
        }
    }

    pub(crate) fn parse(template: &str, location: Location, message: impl Into<String>) -> Self {
        Self::Parse {
            template: template.to_owned(),
            line: location.line,
            col: location.col,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_processor_error_message() {
        let err = ProcessingError::processor(
            "home",
            Some(Location::new(3, 5)),
            &MarkupError::processor("boom"),
        );
        let message = err.to_string();
        assert!(message.contains("\"home\""));
        assert!(message.contains("line 3, col 5"));
        assert!(message.contains("boom"));
    }

    #[test]
    fn test_output_error_keeps_source() {
        let err = ProcessingError::output("t", None, io::Error::other("disk full"));
        let source = std::error::Error::source(&err).unwrap();
        assert_eq!(source.to_string(), "disk full");
        assert!(err.to_string().contains("line 0, col 0"));
    }
}
