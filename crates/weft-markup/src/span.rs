//! Views into shared source buffers.
//!
//! The tokenizer reports every construct as `(offset, len)` spans into one
//! shared document buffer. Events keep an [`Arc<str>`] to that buffer so the
//! parse path never copies text; events built programmatically get a buffer
//! of their own holding exactly their serialized form.

use std::fmt;
use std::ops::Range;
use std::sync::Arc;

use crate::error::MarkupError;

/// Validate `offset`/`len` against `buffer` and return the covered range.
pub(crate) fn checked_range(buffer: &str, offset: usize, len: usize) -> Result<Range<usize>, MarkupError> {
    let end = offset
        .checked_add(len)
        .filter(|end| *end <= buffer.len())
        .ok_or_else(|| {
            MarkupError::invalid_argument(format!(
                "Span {offset}+{len} exceeds buffer length {}",
                buffer.len()
            ))
        })?;
    if !buffer.is_char_boundary(offset) || !buffer.is_char_boundary(end) {
        return Err(MarkupError::invalid_argument(format!(
            "Span {offset}+{len} does not fall on character boundaries"
        )));
    }
    Ok(offset..end)
}

/// Borrow the text covered by `offset`/`len`.
pub fn slice(buffer: &str, offset: usize, len: usize) -> Result<&str, MarkupError> {
    checked_range(buffer, offset, len).map(|range| &buffer[range])
}

/// A contiguous region of a shared buffer.
#[derive(Clone)]
pub struct SourceSpan {
    buffer: Arc<str>,
    range: Range<usize>,
}

impl SourceSpan {
    /// Reference `len` bytes of `buffer` starting at `offset`.
    pub fn new(buffer: &Arc<str>, offset: usize, len: usize) -> Result<Self, MarkupError> {
        let range = checked_range(buffer, offset, len)?;
        Ok(Self {
            buffer: Arc::clone(buffer),
            range,
        })
    }

    /// Own a buffer holding exactly `text`.
    #[must_use]
    pub fn owned(text: &str) -> Self {
        Self {
            buffer: Arc::from(text),
            range: 0..text.len(),
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.buffer[self.range.clone()]
    }

    #[must_use]
    pub fn offset(&self) -> usize {
        self.range.start
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.range.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.range.is_empty()
    }
}

impl Default for SourceSpan {
    fn default() -> Self {
        Self::owned("")
    }
}

impl PartialEq for SourceSpan {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl Eq for SourceSpan {}

impl fmt::Debug for SourceSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.as_str(), f)
    }
}

/// A construct delimited by literal markers, such as `<!--` and `-->`.
///
/// The outer span always contains the content span.
#[derive(Clone)]
pub struct DelimitedSpan {
    buffer: Arc<str>,
    outer: Range<usize>,
    content: Range<usize>,
}

impl DelimitedSpan {
    /// Reference a construct inside a shared buffer.
    pub fn new(
        buffer: &Arc<str>,
        outer_offset: usize,
        outer_len: usize,
        content_offset: usize,
        content_len: usize,
    ) -> Result<Self, MarkupError> {
        let outer = checked_range(buffer, outer_offset, outer_len)?;
        let content = checked_range(buffer, content_offset, content_len)?;
        if content.start < outer.start || content.end > outer.end {
            return Err(MarkupError::invalid_argument(format!(
                "Content span {content:?} is not contained in outer span {outer:?}"
            )));
        }
        Ok(Self {
            buffer: Arc::clone(buffer),
            outer,
            content,
        })
    }

    /// Build a buffer of the form `{prefix}{content}{suffix}`.
    #[must_use]
    pub fn synthesize(prefix: &str, content: &str, suffix: &str) -> Self {
        let buffer: Arc<str> = Arc::from(format!("{prefix}{content}{suffix}"));
        let content_start = prefix.len();
        Self {
            outer: 0..buffer.len(),
            content: content_start..content_start + content.len(),
            buffer,
        }
    }

    /// The whole construct, delimiters included.
    #[must_use]
    pub fn outer(&self) -> &str {
        &self.buffer[self.outer.clone()]
    }

    /// The construct without its delimiters.
    #[must_use]
    pub fn content(&self) -> &str {
        &self.buffer[self.content.clone()]
    }
}

impl PartialEq for DelimitedSpan {
    fn eq(&self, other: &Self) -> bool {
        self.outer() == other.outer() && self.content() == other.content()
    }
}

impl Eq for DelimitedSpan {}

impl fmt::Debug for DelimitedSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.outer(), f)
    }
}
