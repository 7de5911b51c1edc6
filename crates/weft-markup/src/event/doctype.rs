use std::cell::OnceCell;
use std::fmt;

use super::Location;
use crate::error::MarkupError;

const DEFAULT_KEYWORD: &str = "DOCTYPE";
const DEFAULT_ELEMENT_NAME: &str = "html";
const TYPE_PUBLIC: &str = "PUBLIC";
const TYPE_SYSTEM: &str = "SYSTEM";

/// Fields of a DOCTYPE clause as written in a source buffer.
#[derive(Debug, Clone, Copy)]
pub struct DocTypeParts<'a> {
    /// The whole clause, `<!` and `>` included.
    pub doc_type: &'a str,
    pub keyword: &'a str,
    pub element_name: &'a str,
    pub doc_type_type: Option<&'a str>,
    pub public_id: Option<&'a str>,
    pub system_id: Option<&'a str>,
    pub internal_subset: Option<&'a str>,
}

/// A DOCTYPE clause.
///
/// Built clauses are validated on every mutation and rendered lazily as
/// `<!{keyword} {element}[ {type}[ "{public}"] "{system}"][ [{subset}]]>`.
/// Parsed clauses keep their original text until modified.
#[derive(Debug, Clone)]
pub struct DocType {
    keyword: String,
    element_name: String,
    doc_type_type: Option<String>,
    public_id: Option<String>,
    system_id: Option<String>,
    internal_subset: Option<String>,
    doc_type: OnceCell<String>,
    location: Option<Location>,
}

fn validate(
    keyword: &str,
    element_name: &str,
    doc_type_type: Option<&str>,
    public_id: Option<&str>,
    system_id: Option<&str>,
) -> Result<(), MarkupError> {
    if !keyword.eq_ignore_ascii_case(DEFAULT_KEYWORD) {
        return Err(MarkupError::invalid_argument(format!(
            "DOCTYPE keyword must be \"{DEFAULT_KEYWORD}\", got \"{keyword}\""
        )));
    }
    if element_name.trim().is_empty() {
        return Err(MarkupError::invalid_argument("DOCTYPE element name cannot be empty"));
    }
    let is_public = doc_type_type.is_some_and(|t| t.eq_ignore_ascii_case(TYPE_PUBLIC));
    if let Some(doc_type_type) = doc_type_type
        && !is_public
        && !doc_type_type.eq_ignore_ascii_case(TYPE_SYSTEM)
    {
        return Err(MarkupError::invalid_argument(format!(
            "DOCTYPE type must be \"{TYPE_PUBLIC}\" or \"{TYPE_SYSTEM}\", got \"{doc_type_type}\""
        )));
    }
    if public_id.is_some() && !is_public {
        return Err(MarkupError::invalid_argument(
            "A DOCTYPE public ID requires type PUBLIC",
        ));
    }
    if is_public && public_id.is_none() {
        return Err(MarkupError::invalid_argument(
            "A PUBLIC DOCTYPE requires a public ID",
        ));
    }
    if system_id.is_some() && doc_type_type.is_none() {
        return Err(MarkupError::invalid_argument(
            "A DOCTYPE system ID requires a type",
        ));
    }
    if doc_type_type.is_some() && system_id.is_none() {
        return Err(MarkupError::invalid_argument(
            "A typed DOCTYPE requires a system ID",
        ));
    }
    Ok(())
}

/// Type implied by a pair of identifiers.
fn compute_type(public_id: Option<&str>, system_id: Option<&str>) -> Result<Option<&'static str>, MarkupError> {
    match (public_id, system_id) {
        (Some(_), None) => Err(MarkupError::invalid_argument(
            "A DOCTYPE public ID requires a system ID",
        )),
        (None, None) => Ok(None),
        (Some(_), Some(_)) => Ok(Some(TYPE_PUBLIC)),
        (None, Some(_)) => Ok(Some(TYPE_SYSTEM)),
    }
}

impl DocType {
    /// Build a DOCTYPE from all its fields.
    pub fn new(
        keyword: &str,
        element_name: &str,
        doc_type_type: Option<&str>,
        public_id: Option<&str>,
        system_id: Option<&str>,
        internal_subset: Option<&str>,
    ) -> Result<Self, MarkupError> {
        validate(keyword, element_name, doc_type_type, public_id, system_id)?;
        Ok(Self {
            keyword: keyword.to_owned(),
            element_name: element_name.to_owned(),
            doc_type_type: doc_type_type.map(str::to_owned),
            public_id: public_id.map(str::to_owned),
            system_id: system_id.map(str::to_owned),
            internal_subset: internal_subset.map(str::to_owned),
            doc_type: OnceCell::new(),
            location: None,
        })
    }

    /// Build an `html` DOCTYPE, deriving the type from the identifiers.
    pub fn with_ids(public_id: Option<&str>, system_id: Option<&str>) -> Result<Self, MarkupError> {
        let doc_type_type = compute_type(public_id, system_id)?;
        Self::new(
            DEFAULT_KEYWORD,
            DEFAULT_ELEMENT_NAME,
            doc_type_type,
            public_id,
            system_id,
            None,
        )
    }

    /// `<!DOCTYPE html>`.
    #[must_use]
    pub fn html5() -> Self {
        Self {
            keyword: DEFAULT_KEYWORD.to_owned(),
            element_name: DEFAULT_ELEMENT_NAME.to_owned(),
            doc_type_type: None,
            public_id: None,
            system_id: None,
            internal_subset: None,
            doc_type: OnceCell::new(),
            location: None,
        }
    }

    /// Keep a parsed clause as written.
    ///
    /// Source documents are not held to the cross-field rules: legacy
    /// DOCTYPEs such as a PUBLIC clause without a system ID are preserved.
    #[must_use]
    pub fn from_parts(parts: &DocTypeParts<'_>, location: Option<Location>) -> Self {
        Self {
            keyword: parts.keyword.to_owned(),
            element_name: parts.element_name.to_owned(),
            doc_type_type: parts.doc_type_type.map(str::to_owned),
            public_id: parts.public_id.map(str::to_owned),
            system_id: parts.system_id.map(str::to_owned),
            internal_subset: parts.internal_subset.map(str::to_owned),
            doc_type: OnceCell::from(parts.doc_type.to_owned()),
            location,
        }
    }

    #[must_use]
    pub fn keyword(&self) -> &str {
        &self.keyword
    }

    #[must_use]
    pub fn element_name(&self) -> &str {
        &self.element_name
    }

    /// `PUBLIC`, `SYSTEM` or none, as written.
    #[must_use]
    pub fn doc_type_type(&self) -> Option<&str> {
        self.doc_type_type.as_deref()
    }

    #[must_use]
    pub fn public_id(&self) -> Option<&str> {
        self.public_id.as_deref()
    }

    #[must_use]
    pub fn system_id(&self) -> Option<&str> {
        self.system_id.as_deref()
    }

    #[must_use]
    pub fn internal_subset(&self) -> Option<&str> {
        self.internal_subset.as_deref()
    }

    #[must_use]
    pub fn location(&self) -> Option<Location> {
        self.location
    }

    /// The full clause.
    #[must_use]
    pub fn doc_type(&self) -> &str {
        self.doc_type.get_or_init(|| self.render())
    }

    fn render(&self) -> String {
        let mut out = format!("<!{} {}", self.keyword, self.element_name);
        if let Some(doc_type_type) = &self.doc_type_type {
            out.push(' ');
            out.push_str(doc_type_type);
            if let Some(public_id) = &self.public_id {
                out.push_str(" \"");
                out.push_str(public_id);
                out.push('"');
            }
            if let Some(system_id) = &self.system_id {
                out.push_str(" \"");
                out.push_str(system_id);
                out.push('"');
            }
        }
        if let Some(internal_subset) = &self.internal_subset {
            out.push_str(" [");
            out.push_str(internal_subset);
            out.push(']');
        }
        out.push('>');
        out
    }

    pub fn set_keyword(&mut self, keyword: &str) -> Result<(), MarkupError> {
        validate(
            keyword,
            &self.element_name,
            self.doc_type_type.as_deref(),
            self.public_id.as_deref(),
            self.system_id.as_deref(),
        )?;
        keyword.clone_into(&mut self.keyword);
        self.doc_type.take();
        Ok(())
    }

    pub fn set_element_name(&mut self, element_name: &str) -> Result<(), MarkupError> {
        validate(
            &self.keyword,
            element_name,
            self.doc_type_type.as_deref(),
            self.public_id.as_deref(),
            self.system_id.as_deref(),
        )?;
        element_name.clone_into(&mut self.element_name);
        self.doc_type.take();
        Ok(())
    }

    /// Replace both identifiers, deriving the type from them.
    pub fn set_ids(&mut self, public_id: Option<&str>, system_id: Option<&str>) -> Result<(), MarkupError> {
        let doc_type_type = compute_type(public_id, system_id)?;
        validate(&self.keyword, &self.element_name, doc_type_type, public_id, system_id)?;
        self.doc_type_type = doc_type_type.map(str::to_owned);
        self.public_id = public_id.map(str::to_owned);
        self.system_id = system_id.map(str::to_owned);
        self.doc_type.take();
        Ok(())
    }

    pub fn set_internal_subset(&mut self, internal_subset: Option<&str>) {
        self.internal_subset = internal_subset.map(str::to_owned);
        self.doc_type.take();
    }

    /// Drop both identifiers, turning e.g. an XHTML DOCTYPE into `<!DOCTYPE html>`.
    pub fn set_to_html5(&mut self) {
        self.doc_type_type = None;
        self.public_id = None;
        self.system_id = None;
        self.doc_type.take();
    }

    pub fn reset_as_clone_of(&mut self, original: &Self) {
        self.clone_from(original);
    }
}

impl Default for DocType {
    fn default() -> Self {
        Self::html5()
    }
}

impl PartialEq for DocType {
    fn eq(&self, other: &Self) -> bool {
        self.doc_type() == other.doc_type() && self.location == other.location
    }
}

impl fmt::Display for DocType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.doc_type())
    }
}
