use std::fmt;
use std::sync::Arc;

use super::{Location, delimited_from_buffer};
use crate::error::MarkupError;
use crate::span::DelimitedSpan;

const PREFIX: &str = "<!--";
const SUFFIX: &str = "-->";

/// A markup comment (`<!--content-->`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    span: DelimitedSpan,
    location: Option<Location>,
}

impl Comment {
    /// Build a comment around `content`.
    #[must_use]
    pub fn new(content: &str) -> Self {
        Self {
            span: DelimitedSpan::synthesize(PREFIX, content, SUFFIX),
            location: None,
        }
    }

    /// Reference a comment inside a source buffer.
    ///
    /// The outer span must be exactly the content wrapped in `<!--` and `-->`.
    pub fn from_buffer(
        buffer: &Arc<str>,
        outer_offset: usize,
        outer_len: usize,
        content_offset: usize,
        content_len: usize,
        location: Option<Location>,
    ) -> Result<Self, MarkupError> {
        let span = delimited_from_buffer(
            buffer,
            (outer_offset, outer_len),
            (content_offset, content_len),
            PREFIX,
            SUFFIX,
        )?;
        Ok(Self { span, location })
    }

    /// The comment including its delimiters.
    #[must_use]
    pub fn comment(&self) -> &str {
        self.span.outer()
    }

    /// The comment without its delimiters.
    #[must_use]
    pub fn content(&self) -> &str {
        self.span.content()
    }

    pub fn set_content(&mut self, content: &str) {
        self.span = DelimitedSpan::synthesize(PREFIX, content, SUFFIX);
    }

    #[must_use]
    pub fn location(&self) -> Option<Location> {
        self.location
    }

    pub fn reset_as_clone_of(&mut self, original: &Self) {
        self.clone_from(original);
    }
}

impl Default for Comment {
    fn default() -> Self {
        Self::new("")
    }
}

impl fmt::Display for Comment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.comment())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_new_serializes_with_delimiters() {
        let comment = Comment::new("hi");
        assert_eq!(comment.to_string(), "<!--hi-->");
        assert_eq!(comment.content(), "hi");
    }

    #[test]
    fn test_from_buffer() {
        let buffer: Arc<str> = Arc::from("a<!-- note -->b");
        let comment = Comment::from_buffer(&buffer, 1, 13, 5, 6, None).unwrap();
        assert_eq!(comment.content(), " note ");
        assert_eq!(comment.comment(), "<!-- note -->");
    }

    #[test]
    fn test_from_buffer_requires_delimiters() {
        let buffer: Arc<str> = Arc::from("a<!-- note -->b");
        assert!(matches!(
            Comment::from_buffer(&buffer, 0, 14, 5, 6, None),
            Err(MarkupError::InvalidArgument(_))
        ));
        assert!(Comment::from_buffer(&buffer, 1, 13, 6, 5, None).is_err());
    }

    #[test]
    fn test_set_content_rebuilds_outer_form() {
        let buffer: Arc<str> = Arc::from("<!--old-->");
        let mut comment = Comment::from_buffer(&buffer, 0, 10, 4, 3, None).unwrap();
        comment.set_content("new");
        assert_eq!(comment.comment(), "<!--new-->");
    }

    #[test]
    fn test_reset_as_clone_of() {
        let original = Comment::new("shared");
        let mut pooled = Comment::default();
        pooled.reset_as_clone_of(&original);
        assert_eq!(pooled, original);
        assert_eq!(pooled.content(), "shared");
    }
}
