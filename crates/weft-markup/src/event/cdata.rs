use std::fmt;
use std::sync::Arc;

use super::{Location, delimited_from_buffer};
use crate::error::MarkupError;
use crate::span::DelimitedSpan;

const PREFIX: &str = "<![CDATA[";
const SUFFIX: &str = "]]>";

/// A CDATA section (`<![CDATA[content]]>`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CdataSection {
    span: DelimitedSpan,
    location: Option<Location>,
}

impl CdataSection {
    /// Build a CDATA section around `content`.
    #[must_use]
    pub fn new(content: &str) -> Self {
        Self {
            span: DelimitedSpan::synthesize(PREFIX, content, SUFFIX),
            location: None,
        }
    }

    /// Reference a CDATA section inside a source buffer.
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

    /// The section including its delimiters.
    #[must_use]
    pub fn cdata_section(&self) -> &str {
        self.span.outer()
    }

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

impl Default for CdataSection {
    fn default() -> Self {
        Self::new("")
    }
}

impl fmt::Display for CdataSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.cdata_section())
    }
}
