use std::fmt;
use std::sync::Arc;

use super::Location;
use crate::error::MarkupError;
use crate::span::SourceSpan;

/// A run of character data.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Text {
    text: SourceSpan,
    location: Option<Location>,
}

impl Text {
    #[must_use]
    pub fn new(text: &str) -> Self {
        Self {
            text: SourceSpan::owned(text),
            location: None,
        }
    }

    /// Reference `len` bytes of a source buffer starting at `offset`.
    pub fn from_buffer(
        buffer: &Arc<str>,
        offset: usize,
        len: usize,
        location: Option<Location>,
    ) -> Result<Self, MarkupError> {
        Ok(Self {
            text: SourceSpan::new(buffer, offset, len)?,
            location,
        })
    }

    #[must_use]
    pub fn text(&self) -> &str {
        self.text.as_str()
    }

    pub fn set_text(&mut self, text: &str) {
        self.text = SourceSpan::owned(text);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.text.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Whether the text is empty or whitespace only.
    #[must_use]
    pub fn is_whitespace(&self) -> bool {
        self.text().chars().all(char::is_whitespace)
    }

    #[must_use]
    pub fn location(&self) -> Option<Location> {
        self.location
    }

    pub fn reset_as_clone_of(&mut self, original: &Self) {
        self.clone_from(original);
    }
}

impl fmt::Display for Text {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_buffer_is_zero_copy_view() {
        let buffer: Arc<str> = Arc::from("<p>Hello</p>");
        let text = Text::from_buffer(&buffer, 3, 5, Some(Location::new(1, 4))).unwrap();
        assert_eq!(text.text(), "Hello");
        assert_eq!(text.location(), Some(Location::new(1, 4)));
        assert!(Text::from_buffer(&buffer, 10, 5, None).is_err());
    }

    #[test]
    fn test_is_whitespace() {
        assert!(Text::new(" \n\t").is_whitespace());
        assert!(Text::new("").is_whitespace());
        assert!(!Text::new(" a ").is_whitespace());
    }

    #[test]
    fn test_set_text_replaces_content() {
        let mut text = Text::new("before");
        text.set_text("after");
        assert_eq!(text.to_string(), "after");
        assert_eq!(text.len(), 5);
    }

    #[test]
    fn test_reset_as_clone_of() {
        let buffer: Arc<str> = Arc::from("abc");
        let original = Text::from_buffer(&buffer, 1, 2, Some(Location::new(3, 7))).unwrap();
        let mut pooled = Text::new("stale");
        pooled.reset_as_clone_of(&original);
        assert_eq!(pooled, original);
        assert_eq!(pooled.text(), "bc");
        assert_eq!(pooled.location(), original.location());
    }
}
