//! Attributes of processable element tags.
//!
//! Attributes are kept in source order together with the literal whitespace
//! found before each of them (and, optionally, after the last one), so a tag
//! serializes exactly as written until it is modified.
//!
//! ```text
//! <div␣class="a"␣␣th:text="b"⏎>
//!     ^ws[0]     ^^ws[1]       ^ws[2] (trailing)
//! ```

use std::fmt;
use std::sync::Arc;

use super::Location;
use crate::definition::AttributeDefinition;
use crate::definitions::AttributeDefinitions;
use crate::error::MarkupError;
use crate::name::AttributeName;
use crate::template_mode::TemplateMode;

const DEFAULT_OPERATOR: &str = "=";
const DEFAULT_WHITESPACE: &str = " ";

/// How an attribute value is quoted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AttributeValueQuotes {
    #[default]
    Double,
    Single,
    /// Unquoted (HTML only).
    None,
}

impl AttributeValueQuotes {
    fn as_str(self) -> &'static str {
        match self {
            Self::Double => "\"",
            Self::Single => "'",
            Self::None => "",
        }
    }
}

/// A single attribute.
#[derive(Debug, Clone)]
pub struct ElementAttribute {
    definition: Arc<AttributeDefinition>,
    name: String,
    operator: Option<String>,
    value: Option<String>,
    quotes: AttributeValueQuotes,
    location: Option<Location>,
}

impl ElementAttribute {
    #[must_use]
    pub fn definition(&self) -> &Arc<AttributeDefinition> {
        &self.definition
    }

    /// Name as written.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Operator as written, surrounding whitespace included (`=`, ` = `).
    #[must_use]
    pub fn operator(&self) -> Option<&str> {
        self.operator.as_deref()
    }

    #[must_use]
    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    #[must_use]
    pub fn quotes(&self) -> AttributeValueQuotes {
        self.quotes
    }

    #[must_use]
    pub fn location(&self) -> Option<Location> {
        self.location
    }
}

impl PartialEq for ElementAttribute {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.definition, &other.definition)
            && self.name == other.name
            && self.operator == other.operator
            && self.value == other.value
            && self.quotes == other.quotes
            && self.location == other.location
    }
}

impl fmt::Display for ElementAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        if let Some(operator) = &self.operator {
            let quote = self.quotes.as_str();
            write!(
                f,
                "{operator}{quote}{}{quote}",
                self.value.as_deref().unwrap_or_default()
            )?;
        }
        Ok(())
    }
}

/// The attributes of one tag.
///
/// Every mutation bumps [`version`](Self::version), which processable tags
/// use to know when their associated processors must be recomputed.
///
/// # Thread Safety
///
/// Not shared between renders; clone to keep past a processor invocation.
pub struct ElementAttributes {
    template_mode: TemplateMode,
    attribute_definitions: Arc<AttributeDefinitions>,
    attributes: Vec<ElementAttribute>,
    // Either one entry per attribute, or one more holding trailing whitespace
    inner_whitespaces: Vec<String>,
    version: u64,
}

impl ElementAttributes {
    #[must_use]
    pub fn new(template_mode: TemplateMode, attribute_definitions: Arc<AttributeDefinitions>) -> Self {
        Self {
            template_mode,
            attribute_definitions,
            attributes: Vec::new(),
            inner_whitespaces: Vec::new(),
            version: 0,
        }
    }

    #[must_use]
    pub fn template_mode(&self) -> TemplateMode {
        self.template_mode
    }

    /// Mutation counter.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.version
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ElementAttribute> {
        self.attributes.iter()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&ElementAttribute> {
        self.attributes.get(index)
    }

    /// Whitespace written after the last attribute, if any.
    #[must_use]
    pub fn trailing_whitespace(&self) -> Option<&str> {
        self.inner_whitespaces
            .get(self.attributes.len())
            .map(String::as_str)
    }

    fn position_of_definition(&self, definition: &Arc<AttributeDefinition>) -> Option<usize> {
        self.attributes
            .iter()
            .position(|a| Arc::ptr_eq(&a.definition, definition))
    }

    /// Exact spelling first, then any spelling of the same name.
    fn position_of(&self, complete_name: &str) -> Option<usize> {
        if let Some(index) = self.attributes.iter().position(|a| a.name == complete_name) {
            return Some(index);
        }
        let definition = self
            .attribute_definitions
            .for_name(self.template_mode, complete_name)
            .ok()?;
        self.position_of_definition(&definition)
    }

    fn position_of_prefixed(&self, prefix: Option<&str>, name: &str) -> Option<usize> {
        let definition = self
            .attribute_definitions
            .for_prefixed_name(self.template_mode, prefix, name)
            .ok()?;
        self.position_of_definition(&definition)
    }

    /// Find an attribute by any of its spellings (`th:text` finds `data-th-text`).
    #[must_use]
    pub fn attribute(&self, complete_name: &str) -> Option<&ElementAttribute> {
        self.position_of(complete_name).map(|i| &self.attributes[i])
    }

    #[must_use]
    pub fn attribute_by_prefix(&self, prefix: Option<&str>, name: &str) -> Option<&ElementAttribute> {
        self.position_of_prefixed(prefix, name)
            .map(|i| &self.attributes[i])
    }

    #[must_use]
    pub fn attribute_by_name(&self, name: &AttributeName) -> Option<&ElementAttribute> {
        self.attributes.iter().find(|a| a.definition.name() == name)
    }

    #[must_use]
    pub fn has_attribute(&self, complete_name: &str) -> bool {
        self.position_of(complete_name).is_some()
    }

    #[must_use]
    pub fn has_attribute_by_name(&self, name: &AttributeName) -> bool {
        self.attribute_by_name(name).is_some()
    }

    /// Value of an attribute; `None` both when absent and when valueless.
    #[must_use]
    pub fn value(&self, complete_name: &str) -> Option<&str> {
        self.attribute(complete_name).and_then(ElementAttribute::value)
    }

    /// Set an attribute value, double-quoted.
    ///
    /// A `None` value (a valueless attribute such as `disabled`) is only
    /// allowed in HTML.
    pub fn set_attribute(&mut self, complete_name: &str, value: Option<&str>) -> Result<(), MarkupError> {
        self.set_attribute_with_quotes(complete_name, value, AttributeValueQuotes::Double)
    }

    /// Set an attribute value with explicit quoting.
    ///
    /// Existing attributes keep their position and surrounding whitespace;
    /// new ones are appended after a single space.
    pub fn set_attribute_with_quotes(
        &mut self,
        complete_name: &str,
        value: Option<&str>,
        quotes: AttributeValueQuotes,
    ) -> Result<(), MarkupError> {
        if !self.template_mode.is_html() {
            if value.is_none() {
                return Err(MarkupError::invalid_argument(format!(
                    "Attribute \"{complete_name}\" must have a value in {} mode",
                    self.template_mode
                )));
            }
            if quotes == AttributeValueQuotes::None {
                return Err(MarkupError::invalid_argument(format!(
                    "Attribute \"{complete_name}\" cannot be unquoted in {} mode",
                    self.template_mode
                )));
            }
        }
        if quotes == AttributeValueQuotes::None && value.is_some_and(str::is_empty) {
            return Err(MarkupError::invalid_argument(format!(
                "Attribute \"{complete_name}\" cannot have an empty unquoted value"
            )));
        }

        let definition = self
            .attribute_definitions
            .for_name(self.template_mode, complete_name)?;

        if let Some(index) = self.position_of_definition(&definition) {
            let attribute = &mut self.attributes[index];
            complete_name.clone_into(&mut attribute.name);
            attribute.operator = match (value, attribute.operator.take()) {
                (None, _) => None,
                (Some(_), Some(operator)) => Some(operator),
                (Some(_), None) => Some(DEFAULT_OPERATOR.to_owned()),
            };
            attribute.value = value.map(str::to_owned);
            attribute.quotes = quotes;
        } else {
            self.inner_whitespaces
                .insert(self.attributes.len(), DEFAULT_WHITESPACE.to_owned());
            self.attributes.push(ElementAttribute {
                definition,
                name: complete_name.to_owned(),
                operator: value.map(|_| DEFAULT_OPERATOR.to_owned()),
                value: value.map(str::to_owned),
                quotes,
                location: None,
            });
        }
        self.version += 1;
        Ok(())
    }

    /// Rename an attribute in place, keeping its value and whitespace.
    pub fn replace_attribute(
        &mut self,
        old_name: &str,
        new_name: &str,
        value: Option<&str>,
    ) -> Result<(), MarkupError> {
        match self.position_of(old_name) {
            Some(index) => {
                let definition = self
                    .attribute_definitions
                    .for_name(self.template_mode, new_name)?;
                if let Some(existing) = self.position_of_definition(&definition)
                    && existing != index
                {
                    self.remove_at(existing);
                    return self.replace_attribute(old_name, new_name, value);
                }
                let attribute = &mut self.attributes[index];
                attribute.definition = definition;
                new_name.clone_into(&mut attribute.name);
                self.version += 1;
                self.set_attribute(new_name, value)
            }
            None => self.set_attribute(new_name, value),
        }
    }

    fn remove_at(&mut self, index: usize) {
        let last = self.attributes.len() - 1;
        // Trailing whitespace (if any) takes the removed attribute's slot
        // when removing the last one; otherwise the next attribute inherits it.
        if index == last {
            self.inner_whitespaces.remove(index);
        } else {
            self.inner_whitespaces.remove(index + 1);
        }
        self.attributes.remove(index);
        self.version += 1;
    }

    /// Remove an attribute by any of its spellings. Returns whether it existed.
    pub fn remove_attribute(&mut self, complete_name: &str) -> bool {
        match self.position_of(complete_name) {
            Some(index) => {
                self.remove_at(index);
                true
            }
            None => false,
        }
    }

    pub fn remove_attribute_by_prefix(&mut self, prefix: Option<&str>, name: &str) -> bool {
        match self.position_of_prefixed(prefix, name) {
            Some(index) => {
                self.remove_at(index);
                true
            }
            None => false,
        }
    }

    pub fn remove_attribute_by_name(&mut self, name: &AttributeName) -> bool {
        match self.attributes.iter().position(|a| a.definition.name() == name) {
            Some(index) => {
                self.remove_at(index);
                true
            }
            None => false,
        }
    }

    /// Remove every attribute and all whitespace between them.
    pub fn clear_all(&mut self) {
        if self.attributes.is_empty() && self.inner_whitespaces.is_empty() {
            return;
        }
        self.attributes.clear();
        self.inner_whitespaces.clear();
        self.version += 1;
    }

    /// Append whitespace found in the source.
    pub fn add_inner_whitespace(&mut self, whitespace: &str) {
        if self.inner_whitespaces.len() > self.attributes.len() {
            if let Some(pending) = self.inner_whitespaces.last_mut() {
                pending.push_str(whitespace);
            }
        } else {
            self.inner_whitespaces.push(whitespace.to_owned());
        }
        self.version += 1;
    }

    /// Append an attribute found in the source, exactly as written.
    pub fn add_parsed_attribute(
        &mut self,
        definition: Arc<AttributeDefinition>,
        name: &str,
        operator: Option<&str>,
        value: Option<&str>,
        quotes: AttributeValueQuotes,
        location: Option<Location>,
    ) {
        if self.inner_whitespaces.len() == self.attributes.len() {
            self.inner_whitespaces.push(String::new());
        }
        self.attributes.push(ElementAttribute {
            definition,
            name: name.to_owned(),
            operator: operator.map(str::to_owned),
            value: value.map(str::to_owned),
            quotes,
            location,
        });
        self.version += 1;
    }

    pub fn reset_as_clone_of(&mut self, original: &Self) {
        self.clone_from(original);
    }
}

impl Clone for ElementAttributes {
    fn clone(&self) -> Self {
        Self {
            template_mode: self.template_mode,
            attribute_definitions: Arc::clone(&self.attribute_definitions),
            attributes: self.attributes.clone(),
            inner_whitespaces: self.inner_whitespaces.clone(),
            version: self.version,
        }
    }

    fn clone_from(&mut self, source: &Self) {
        self.template_mode = source.template_mode;
        self.attribute_definitions = Arc::clone(&source.attribute_definitions);
        self.attributes.clone_from(&source.attributes);
        self.inner_whitespaces.clone_from(&source.inner_whitespaces);
        self.version = source.version;
    }
}

impl PartialEq for ElementAttributes {
    fn eq(&self, other: &Self) -> bool {
        self.template_mode == other.template_mode
            && self.attributes == other.attributes
            && self.inner_whitespaces == other.inner_whitespaces
    }
}

impl fmt::Debug for ElementAttributes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ElementAttributes")
            .field("template_mode", &self.template_mode)
            .field("attributes", &self.attributes)
            .field("inner_whitespaces", &self.inner_whitespaces)
            .field("version", &self.version)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for ElementAttributes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, attribute) in self.attributes.iter().enumerate() {
            let whitespace = self
                .inner_whitespaces
                .get(index)
                .map_or(DEFAULT_WHITESPACE, String::as_str);
            write!(f, "{whitespace}{attribute}")?;
        }
        if let Some(trailing) = self.trailing_whitespace() {
            f.write_str(trailing)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn html_attributes() -> ElementAttributes {
        let definitions = Arc::new(AttributeDefinitions::new(&[]).unwrap());
        ElementAttributes::new(TemplateMode::Html, definitions)
    }

    /// `<x␣id="a"␣␣class='b'⏎>` as the tokenizer reports it.
    fn parsed(trailing: bool) -> ElementAttributes {
        let mut attributes = html_attributes();
        let id = attributes.attribute_definitions.for_html_name("id").unwrap();
        let class = attributes.attribute_definitions.for_html_name("class").unwrap();
        attributes.add_inner_whitespace(" ");
        attributes.add_parsed_attribute(id, "id", Some("="), Some("a"), AttributeValueQuotes::Double, None);
        attributes.add_inner_whitespace("  ");
        attributes.add_parsed_attribute(class, "class", Some("="), Some("b"), AttributeValueQuotes::Single, None);
        if trailing {
            attributes.add_inner_whitespace("\n");
        }
        attributes
    }

    #[test]
    fn test_parsed_attributes_round_trip() {
        assert_eq!(parsed(true).to_string(), " id=\"a\"  class='b'\n");
        assert_eq!(parsed(false).to_string(), " id=\"a\"  class='b'");
    }

    #[test]
    fn test_adjacent_attributes_get_empty_whitespace() {
        let mut attributes = html_attributes();
        let a = attributes.attribute_definitions.for_html_name("a").unwrap();
        let b = attributes.attribute_definitions.for_html_name("b").unwrap();
        attributes.add_inner_whitespace(" ");
        attributes.add_parsed_attribute(a, "a", Some("="), Some("1"), AttributeValueQuotes::Double, None);
        attributes.add_parsed_attribute(b, "b", None, None, AttributeValueQuotes::Double, None);
        assert_eq!(attributes.to_string(), " a=\"1\"b");
    }

    #[test]
    fn test_operator_and_value_serialization() {
        let mut attributes = html_attributes();
        attributes.set_attribute("name", Some("v")).unwrap();
        attributes.set_attribute("disabled", None).unwrap();
        assert_eq!(attributes.to_string(), " name=\"v\" disabled");
    }

    #[test]
    fn test_set_attribute_appends_before_trailing_whitespace() {
        let mut attributes = parsed(true);
        attributes.set_attribute("title", Some("t")).unwrap();
        assert_eq!(attributes.to_string(), " id=\"a\"  class='b' title=\"t\"\n");
    }

    #[test]
    fn test_set_existing_attribute_keeps_position() {
        let mut attributes = parsed(true);
        let version = attributes.version();
        attributes.set_attribute("ID", Some("z")).unwrap();
        assert_eq!(attributes.to_string(), " ID=\"z\"  class='b'\n");
        assert!(attributes.version() > version);
    }

    #[test]
    fn test_lookup_by_any_spelling() {
        let mut attributes = html_attributes();
        attributes.set_attribute("data-th-text", Some("${x}")).unwrap();
        assert_eq!(attributes.value("th:text"), Some("${x}"));
        assert!(attributes.has_attribute("TH:TEXT"));
        assert!(attributes.attribute_by_prefix(Some("th"), "text").is_some());
        let name = AttributeName::parse(TemplateMode::Html, "th:text").unwrap();
        assert!(attributes.has_attribute_by_name(&name));
        assert!(!attributes.has_attribute("th:utext"));
    }

    #[test]
    fn test_remove_middle_attribute() {
        let mut attributes = parsed(true);
        let title = attributes.attribute_definitions.for_html_name("title").unwrap();
        attributes.add_parsed_attribute(title, "title", Some("="), Some("t"), AttributeValueQuotes::Double, None);
        // ws: [" ", "  ", "\n"] + title has "\n" as its preceding whitespace
        assert!(attributes.remove_attribute("class"));
        assert_eq!(attributes.to_string(), " id=\"a\"  title=\"t\"");
    }

    #[test]
    fn test_remove_last_attribute_keeps_trailing_whitespace() {
        let mut attributes = parsed(true);
        assert!(attributes.remove_attribute("class"));
        assert_eq!(attributes.to_string(), " id=\"a\"\n");
    }

    #[test]
    fn test_remove_last_attribute_without_trailing_whitespace() {
        let mut attributes = parsed(false);
        assert!(attributes.remove_attribute("class"));
        assert_eq!(attributes.to_string(), " id=\"a\"");
        assert!(attributes.remove_attribute("id"));
        assert_eq!(attributes.to_string(), "");
        assert!(!attributes.remove_attribute("id"));
    }

    #[test]
    fn test_xml_rejects_valueless_and_unquoted() {
        let definitions = Arc::new(AttributeDefinitions::new(&[]).unwrap());
        let mut attributes = ElementAttributes::new(TemplateMode::Xml, definitions);
        assert!(matches!(
            attributes.set_attribute("flag", None),
            Err(MarkupError::InvalidArgument(_))
        ));
        assert!(
            attributes
                .set_attribute_with_quotes("a", Some("b"), AttributeValueQuotes::None)
                .is_err()
        );
        assert!(attributes.is_empty());
    }

    #[test]
    fn test_unquoted_value_must_not_be_empty() {
        let mut attributes = html_attributes();
        assert!(
            attributes
                .set_attribute_with_quotes("a", Some(""), AttributeValueQuotes::None)
                .is_err()
        );
        attributes
            .set_attribute_with_quotes("a", Some("b"), AttributeValueQuotes::None)
            .unwrap();
        assert_eq!(attributes.to_string(), " a=b");
    }

    #[test]
    fn test_replace_attribute() {
        let mut attributes = parsed(false);
        attributes.replace_attribute("id", "th:id", Some("${id}")).unwrap();
        assert_eq!(attributes.to_string(), " th:id=\"${id}\"  class='b'");
    }

    #[test]
    fn test_clear_all() {
        let mut attributes = parsed(true);
        attributes.clear_all();
        assert!(attributes.is_empty());
        assert_eq!(attributes.to_string(), "");
    }

    #[test]
    fn test_reset_as_clone_of() {
        let original = parsed(true);
        let mut pooled = html_attributes();
        pooled.set_attribute("stale", Some("x")).unwrap();
        pooled.reset_as_clone_of(&original);
        assert_eq!(pooled, original);
        assert_eq!(pooled.version(), original.version());
        assert_eq!(pooled.to_string(), original.to_string());
    }
}
