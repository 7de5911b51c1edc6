//! Template modes.

use std::fmt;

/// Markup dialect a template is parsed and serialized in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TemplateMode {
    /// HTML: case-insensitive names, void elements, boolean and unquoted attributes.
    Html,
    /// XML: case-sensitive names, every element explicitly closed.
    Xml,
}

impl TemplateMode {
    /// All supported modes.
    pub const ALL: [Self; 2] = [Self::Html, Self::Xml];

    /// Whether this is [`TemplateMode::Html`].
    #[must_use]
    pub fn is_html(self) -> bool {
        self == Self::Html
    }

    /// Whether name comparisons are case-sensitive in this mode.
    #[must_use]
    pub fn is_case_sensitive(self) -> bool {
        self == Self::Xml
    }
}

impl fmt::Display for TemplateMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Html => f.write_str("HTML"),
            Self::Xml => f.write_str("XML"),
        }
    }
}
