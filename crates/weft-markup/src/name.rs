//! Element and attribute names.
//!
//! Raw markup names are split into an optional dialect prefix and a local
//! name, and every canonical string form the name can appear under is
//! precomputed ("complete names").
//!
//! # Parsing rules
//!
//! | Mode | Kind | Split on | Complete forms |
//! |------|------|----------|----------------|
//! | XML | both | first `:` | `p:n` |
//! | HTML | attribute | first `:`, or `data-p-n` | `p:n`, `data-p-n` |
//! | HTML | element | first `:` or `-` | `p:n`, `p-n` |
//!
//! A separator in first position never yields a prefix. HTML names are
//! folded to lowercase, and the reserved `xml`/`xmlns` prefixes are kept as
//! part of the local name.

use std::fmt;

use crate::error::MarkupError;
use crate::template_mode::TemplateMode;

/// Prefixes reserved by XML itself; never treated as dialect prefixes.
fn is_reserved_prefix(prefix: &str) -> bool {
    prefix == "xml" || prefix == "xmlns"
}

fn require_name(raw: &str) -> Result<(), MarkupError> {
    if raw.trim().is_empty() {
        return Err(MarkupError::invalid_argument("Name cannot be empty"));
    }
    Ok(())
}

/// Split on the first `sep`-matching character, unless it comes first or ends the name.
fn split_at_separator(name: &str, is_sep: impl Fn(char) -> bool) -> Option<(&str, &str)> {
    let (index, sep) = name.char_indices().find(|&(_, c)| is_sep(c))?;
    if index == 0 || index + sep.len_utf8() == name.len() {
        return None;
    }
    Some((&name[..index], &name[index + sep.len_utf8()..]))
}

/// Name of an element, as found in markup or declared by a processor.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ElementName {
    prefix: Option<String>,
    name: String,
    complete_names: Vec<String>,
}

impl ElementName {
    /// Parse a raw element name according to the template mode rules.
    pub fn parse(template_mode: TemplateMode, raw: &str) -> Result<Self, MarkupError> {
        require_name(raw)?;
        match template_mode {
            TemplateMode::Xml => Ok(match split_at_separator(raw, |c| c == ':') {
                Some((prefix, name)) => Self::xml_prefixed(prefix, name),
                None => Self::unprefixed(raw.to_owned()),
            }),
            TemplateMode::Html => {
                let lower = raw.to_lowercase();
                Ok(match split_at_separator(&lower, |c| c == ':' || c == '-') {
                    Some((prefix, name)) if !is_reserved_prefix(prefix) => {
                        Self::html_prefixed(prefix, name)
                    }
                    _ => Self::unprefixed(lower),
                })
            }
        }
    }

    /// Build a name from an explicit prefix and local name.
    ///
    /// A missing or blank prefix falls back to [`ElementName::parse`] on `name`.
    pub fn with_prefix(
        template_mode: TemplateMode,
        prefix: Option<&str>,
        name: &str,
    ) -> Result<Self, MarkupError> {
        let Some(prefix) = prefix.filter(|p| !p.trim().is_empty()) else {
            return Self::parse(template_mode, name);
        };
        require_name(name)?;
        Ok(match template_mode {
            TemplateMode::Xml => Self::xml_prefixed(prefix, name),
            TemplateMode::Html => {
                Self::html_prefixed(&prefix.to_lowercase(), &name.to_lowercase())
            }
        })
    }

    fn unprefixed(name: String) -> Self {
        Self {
            prefix: None,
            complete_names: vec![name.clone()],
            name,
        }
    }

    fn xml_prefixed(prefix: &str, name: &str) -> Self {
        Self {
            prefix: Some(prefix.to_owned()),
            name: name.to_owned(),
            complete_names: vec![format!("{prefix}:{name}")],
        }
    }

    fn html_prefixed(prefix: &str, name: &str) -> Self {
        Self {
            prefix: Some(prefix.to_owned()),
            name: name.to_owned(),
            complete_names: vec![format!("{prefix}:{name}"), format!("{prefix}-{name}")],
        }
    }

    /// Dialect prefix, if any.
    #[must_use]
    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    /// Local name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Every canonical form this name can be written as.
    #[must_use]
    pub fn complete_names(&self) -> &[String] {
        &self.complete_names
    }

    /// The primary canonical form.
    #[must_use]
    pub fn complete_name(&self) -> &str {
        &self.complete_names[0]
    }
}

impl fmt::Display for ElementName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}}}", self.complete_names.join(","))
    }
}

/// Name of an attribute, as found in markup or declared by a processor.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AttributeName {
    prefix: Option<String>,
    name: String,
    complete_names: Vec<String>,
}

impl AttributeName {
    /// Parse a raw attribute name according to the template mode rules.
    pub fn parse(template_mode: TemplateMode, raw: &str) -> Result<Self, MarkupError> {
        require_name(raw)?;
        match template_mode {
            TemplateMode::Xml => Ok(match split_at_separator(raw, |c| c == ':') {
                Some((prefix, name)) => Self::xml_prefixed(prefix, name),
                None => Self::unprefixed(raw.to_owned()),
            }),
            TemplateMode::Html => {
                let lower = raw.to_lowercase();
                Ok(match Self::split_html(&lower) {
                    Some((prefix, name)) => Self::html_prefixed(prefix, name),
                    None => Self::unprefixed(lower),
                })
            }
        }
    }

    /// `th:text` and `data-th-text` both split into `(th, text)`. Any other
    /// hyphen before the first `:` means the name is unprefixed.
    fn split_html(lower: &str) -> Option<(&str, &str)> {
        if let Some(rest) = lower.strip_prefix("data-") {
            return split_at_separator(rest, |c| c == '-');
        }
        let colon = lower.find(':')?;
        if lower[..colon].contains('-') {
            return None;
        }
        split_at_separator(lower, |c| c == ':').filter(|(prefix, _)| !is_reserved_prefix(prefix))
    }

    /// Build a name from an explicit prefix and local name.
    ///
    /// A missing or blank prefix falls back to [`AttributeName::parse`] on `name`.
    pub fn with_prefix(
        template_mode: TemplateMode,
        prefix: Option<&str>,
        name: &str,
    ) -> Result<Self, MarkupError> {
        let Some(prefix) = prefix.filter(|p| !p.trim().is_empty()) else {
            return Self::parse(template_mode, name);
        };
        require_name(name)?;
        Ok(match template_mode {
            TemplateMode::Xml => Self::xml_prefixed(prefix, name),
            TemplateMode::Html => {
                Self::html_prefixed(&prefix.to_lowercase(), &name.to_lowercase())
            }
        })
    }

    fn unprefixed(name: String) -> Self {
        Self {
            prefix: None,
            complete_names: vec![name.clone()],
            name,
        }
    }

    fn xml_prefixed(prefix: &str, name: &str) -> Self {
        Self {
            prefix: Some(prefix.to_owned()),
            name: name.to_owned(),
            complete_names: vec![format!("{prefix}:{name}")],
        }
    }

    fn html_prefixed(prefix: &str, name: &str) -> Self {
        Self {
            prefix: Some(prefix.to_owned()),
            name: name.to_owned(),
            complete_names: vec![
                format!("{prefix}:{name}"),
                format!("data-{prefix}-{name}"),
            ],
        }
    }

    /// Dialect prefix, if any.
    #[must_use]
    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    /// Local name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Every canonical form this name can be written as.
    #[must_use]
    pub fn complete_names(&self) -> &[String] {
        &self.complete_names
    }

    /// The primary canonical form.
    #[must_use]
    pub fn complete_name(&self) -> &str {
        &self.complete_names[0]
    }
}

impl fmt::Display for AttributeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}}}", self.complete_names.join(","))
    }
}

fn prefix_matches(template_mode: TemplateMode, expected: &str, actual: Option<&str>) -> bool {
    match actual {
        Some(actual) if template_mode.is_case_sensitive() => actual == expected,
        Some(actual) => actual.eq_ignore_ascii_case(expected),
        None => false,
    }
}

/// Element names a processor is scoped to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchingElementName {
    /// Exactly one element name.
    Name {
        template_mode: TemplateMode,
        name: ElementName,
    },
    /// Every element carrying the given prefix.
    AllWithPrefix {
        template_mode: TemplateMode,
        prefix: String,
    },
    /// Every element.
    All { template_mode: TemplateMode },
}

impl MatchingElementName {
    /// Match a single element name.
    #[must_use]
    pub fn for_element_name(template_mode: TemplateMode, name: ElementName) -> Self {
        Self::Name {
            template_mode,
            name,
        }
    }

    /// Match every element with `prefix`.
    #[must_use]
    pub fn for_all_elements_with_prefix(template_mode: TemplateMode, prefix: &str) -> Self {
        Self::AllWithPrefix {
            template_mode,
            prefix: prefix.to_owned(),
        }
    }

    /// Match every element.
    #[must_use]
    pub fn for_all_elements(template_mode: TemplateMode) -> Self {
        Self::All { template_mode }
    }

    #[must_use]
    pub fn template_mode(&self) -> TemplateMode {
        match self {
            Self::Name { template_mode, .. }
            | Self::AllWithPrefix { template_mode, .. }
            | Self::All { template_mode } => *template_mode,
        }
    }

    #[must_use]
    pub fn matches(&self, element_name: &ElementName) -> bool {
        match self {
            Self::Name { name, .. } => name == element_name,
            Self::AllWithPrefix {
                template_mode,
                prefix,
            } => prefix_matches(*template_mode, prefix, element_name.prefix()),
            Self::All { .. } => true,
        }
    }
}

impl fmt::Display for MatchingElementName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name { name, .. } => write!(f, "{name}"),
            Self::AllWithPrefix { prefix, .. } => write!(f, "{prefix}:*"),
            Self::All { .. } => f.write_str("*"),
        }
    }
}

/// Attribute names a processor is triggered by.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchingAttributeName {
    /// Exactly one attribute name.
    Name {
        template_mode: TemplateMode,
        name: AttributeName,
    },
    /// Every attribute carrying the given prefix.
    AllWithPrefix {
        template_mode: TemplateMode,
        prefix: String,
    },
    /// Every attribute.
    All { template_mode: TemplateMode },
}

impl MatchingAttributeName {
    /// Match a single attribute name.
    #[must_use]
    pub fn for_attribute_name(template_mode: TemplateMode, name: AttributeName) -> Self {
        Self::Name {
            template_mode,
            name,
        }
    }

    /// Match every attribute with `prefix`.
    #[must_use]
    pub fn for_all_attributes_with_prefix(template_mode: TemplateMode, prefix: &str) -> Self {
        Self::AllWithPrefix {
            template_mode,
            prefix: prefix.to_owned(),
        }
    }

    /// Match every attribute.
    #[must_use]
    pub fn for_all_attributes(template_mode: TemplateMode) -> Self {
        Self::All { template_mode }
    }

    #[must_use]
    pub fn template_mode(&self) -> TemplateMode {
        match self {
            Self::Name { template_mode, .. }
            | Self::AllWithPrefix { template_mode, .. }
            | Self::All { template_mode } => *template_mode,
        }
    }

    #[must_use]
    pub fn matches(&self, attribute_name: &AttributeName) -> bool {
        match self {
            Self::Name { name, .. } => name == attribute_name,
            Self::AllWithPrefix {
                template_mode,
                prefix,
            } => prefix_matches(*template_mode, prefix, attribute_name.prefix()),
            Self::All { .. } => true,
        }
    }
}

impl fmt::Display for MatchingAttributeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name { name, .. } => write!(f, "{name}"),
            Self::AllWithPrefix { prefix, .. } => write!(f, "{prefix}:*"),
            Self::All { .. } => f.write_str("*"),
        }
    }
}
