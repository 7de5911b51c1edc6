//! Template events.
//!
//! One type per markup construct. Events are mutable and meant to be reused:
//! producers reset a pooled instance in place (`reset_as_clone_of`, setters)
//! instead of allocating one per construct. Anything that must outlive the
//! callback it was handed to has to be cloned.
//!
//! Events built from a source buffer borrow it through an [`Arc<str>`]; events
//! built programmatically own a buffer with their serialized form.

mod attributes;
mod cdata;
mod comment;
mod doctype;
mod processing_instruction;
mod tag;
mod text;
mod xml_declaration;

use std::fmt;
use std::io;
use std::sync::Arc;

pub use attributes::{AttributeValueQuotes, ElementAttribute, ElementAttributes};
pub use cdata::CdataSection;
pub use comment::Comment;
pub use doctype::{DocType, DocTypeParts};
pub use processing_instruction::ProcessingInstruction;
pub use tag::{
    AutoCloseElementTag, AutoOpenElementTag, CloseElementTag, ElementTag, OpenElementTag,
    ProcessableTag, StandaloneElementTag, UnmatchedCloseElementTag,
};
pub use text::Text;
pub use xml_declaration::{XmlDeclaration, XmlDeclarationParts};

use crate::error::MarkupError;
use crate::span::DelimitedSpan;

/// Position of a construct in its template, 1-based.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Location {
    pub line: usize,
    pub col: usize,
}

impl Location {
    #[must_use]
    pub fn new(line: usize, col: usize) -> Self {
        Self { line, col }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, col {}", self.line, self.col)
    }
}

/// Check that a delimited construct is exactly `prefix + content + suffix`.
pub(crate) fn delimited_from_buffer(
    buffer: &Arc<str>,
    (outer_offset, outer_len): (usize, usize),
    (content_offset, content_len): (usize, usize),
    prefix: &str,
    suffix: &str,
) -> Result<DelimitedSpan, MarkupError> {
    let span = DelimitedSpan::new(buffer, outer_offset, outer_len, content_offset, content_len)?;
    let outer = span.outer();
    if outer_len < prefix.len() + suffix.len()
        || !outer.starts_with(prefix)
        || !outer.ends_with(suffix)
        || content_offset != outer_offset + prefix.len()
        || content_offset + content_len + suffix.len() != outer_offset + outer_len
    {
        return Err(MarkupError::invalid_argument(format!(
            "Span {outer_offset}+{outer_len} is not delimited by \"{prefix}\" and \"{suffix}\""
        )));
    }
    Ok(span)
}

/// Any template event.
#[derive(Debug, Clone, PartialEq)]
pub enum TemplateEvent {
    Text(Text),
    Comment(Comment),
    CdataSection(CdataSection),
    DocType(DocType),
    XmlDeclaration(XmlDeclaration),
    ProcessingInstruction(ProcessingInstruction),
    OpenElement(OpenElementTag),
    StandaloneElement(StandaloneElementTag),
    CloseElement(CloseElementTag),
    AutoOpenElement(AutoOpenElementTag),
    AutoCloseElement(AutoCloseElementTag),
    UnmatchedCloseElement(UnmatchedCloseElementTag),
}

impl TemplateEvent {
    #[must_use]
    pub fn location(&self) -> Option<Location> {
        match self {
            Self::Text(e) => e.location(),
            Self::Comment(e) => e.location(),
            Self::CdataSection(e) => e.location(),
            Self::DocType(e) => e.location(),
            Self::XmlDeclaration(e) => e.location(),
            Self::ProcessingInstruction(e) => e.location(),
            Self::OpenElement(e) => e.location(),
            Self::StandaloneElement(e) => e.location(),
            Self::CloseElement(e) => e.location(),
            Self::AutoOpenElement(e) => e.location(),
            Self::AutoCloseElement(e) => e.location(),
            Self::UnmatchedCloseElement(e) => e.location(),
        }
    }

    /// Whether this event opens an element whose close event follows later.
    #[must_use]
    pub fn is_element_open(&self) -> bool {
        matches!(self, Self::OpenElement(_) | Self::AutoOpenElement(_))
    }

    /// Whether this event closes an element opened earlier.
    #[must_use]
    pub fn is_element_close(&self) -> bool {
        matches!(self, Self::CloseElement(_) | Self::AutoCloseElement(_))
    }

    /// Whether this event is an element of its own (open, standalone or close).
    #[must_use]
    pub fn is_element(&self) -> bool {
        matches!(
            self,
            Self::OpenElement(_)
                | Self::StandaloneElement(_)
                | Self::CloseElement(_)
                | Self::AutoOpenElement(_)
                | Self::AutoCloseElement(_)
                | Self::UnmatchedCloseElement(_)
        )
    }

    /// Serialize the event. Auto-balanced tags write nothing.
    pub fn write_to(&self, writer: &mut dyn io::Write) -> io::Result<()> {
        write!(writer, "{self}")
    }
}

impl fmt::Display for TemplateEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(e) => e.fmt(f),
            Self::Comment(e) => e.fmt(f),
            Self::CdataSection(e) => e.fmt(f),
            Self::DocType(e) => e.fmt(f),
            Self::XmlDeclaration(e) => e.fmt(f),
            Self::ProcessingInstruction(e) => e.fmt(f),
            Self::OpenElement(e) => e.fmt(f),
            Self::StandaloneElement(e) => e.fmt(f),
            Self::CloseElement(e) => e.fmt(f),
            Self::AutoOpenElement(e) => e.fmt(f),
            Self::AutoCloseElement(e) => e.fmt(f),
            Self::UnmatchedCloseElement(e) => e.fmt(f),
        }
    }
}

macro_rules! impl_from_event {
    ($($variant:ident($ty:ty)),* $(,)?) => {
        $(
            impl From<$ty> for TemplateEvent {
                fn from(event: $ty) -> Self {
                    Self::$variant(event)
                }
            }
        )*
    };
}

impl_from_event!(
    Text(Text),
    Comment(Comment),
    CdataSection(CdataSection),
    DocType(DocType),
    XmlDeclaration(XmlDeclaration),
    ProcessingInstruction(ProcessingInstruction),
    OpenElement(OpenElementTag),
    StandaloneElement(StandaloneElementTag),
    CloseElement(CloseElementTag),
    AutoOpenElement(AutoOpenElementTag),
    AutoCloseElement(AutoCloseElementTag),
    UnmatchedCloseElement(UnmatchedCloseElementTag),
);
