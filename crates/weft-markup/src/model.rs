//! Owned event sequences.
//!
//! Processors hand bodies and replacements to the engine as a
//! [`TemplateModel`], built with the [`ModelFactory`] of the render they run
//! in so that every tag resolves against the same definitions.

use std::fmt;
use std::sync::Arc;

use crate::definitions::{AttributeDefinitions, ElementDefinitions};
use crate::error::MarkupError;
use crate::event::{
    CdataSection, CloseElementTag, Comment, ElementAttributes, ElementTag, OpenElementTag,
    ProcessableTag, StandaloneElementTag, TemplateEvent, Text,
};
use crate::template_mode::TemplateMode;

/// An ordered, owned list of events.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TemplateModel {
    events: Vec<TemplateEvent>,
}

impl TemplateModel {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, event: TemplateEvent) {
        self.events.push(event);
    }

    /// Insert `event` at `index`, shifting later events.
    pub fn insert(&mut self, index: usize, event: TemplateEvent) -> Result<(), MarkupError> {
        if index > self.events.len() {
            return Err(MarkupError::invalid_argument(format!(
                "Index {index} is out of bounds for a model of {} events",
                self.events.len()
            )));
        }
        self.events.insert(index, event);
        Ok(())
    }

    /// Append every event of `other`.
    pub fn add_model(&mut self, other: &Self) {
        self.events.extend(other.events.iter().cloned());
    }

    pub fn remove(&mut self, index: usize) -> Option<TemplateEvent> {
        (index < self.events.len()).then(|| self.events.remove(index))
    }

    pub fn reset(&mut self) {
        self.events.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&TemplateEvent> {
        self.events.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TemplateEvent> {
        self.events.iter()
    }

    #[must_use]
    pub fn events(&self) -> &[TemplateEvent] {
        &self.events
    }

    #[must_use]
    pub fn into_events(self) -> Vec<TemplateEvent> {
        self.events
    }
}

impl From<Vec<TemplateEvent>> for TemplateModel {
    fn from(events: Vec<TemplateEvent>) -> Self {
        Self { events }
    }
}

impl FromIterator<TemplateEvent> for TemplateModel {
    fn from_iter<I: IntoIterator<Item = TemplateEvent>>(iter: I) -> Self {
        Self {
            events: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a TemplateModel {
    type Item = &'a TemplateEvent;
    type IntoIter = std::slice::Iter<'a, TemplateEvent>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.iter()
    }
}

impl fmt::Display for TemplateModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.events.iter().try_for_each(|event| event.fmt(f))
    }
}

/// Builds events bound to one engine configuration.
#[derive(Clone)]
pub struct ModelFactory {
    template_mode: TemplateMode,
    element_definitions: Arc<ElementDefinitions>,
    attribute_definitions: Arc<AttributeDefinitions>,
}

impl ModelFactory {
    #[must_use]
    pub fn new(
        template_mode: TemplateMode,
        element_definitions: Arc<ElementDefinitions>,
        attribute_definitions: Arc<AttributeDefinitions>,
    ) -> Self {
        Self {
            template_mode,
            element_definitions,
            attribute_definitions,
        }
    }

    #[must_use]
    pub fn template_mode(&self) -> TemplateMode {
        self.template_mode
    }

    #[must_use]
    pub fn element_definitions(&self) -> &Arc<ElementDefinitions> {
        &self.element_definitions
    }

    #[must_use]
    pub fn attribute_definitions(&self) -> &Arc<AttributeDefinitions> {
        &self.attribute_definitions
    }

    #[must_use]
    pub fn create_model(&self) -> TemplateModel {
        TemplateModel::new()
    }

    #[must_use]
    pub fn text(&self, text: &str) -> Text {
        Text::new(text)
    }

    #[must_use]
    pub fn comment(&self, content: &str) -> Comment {
        Comment::new(content)
    }

    #[must_use]
    pub fn cdata_section(&self, content: &str) -> CdataSection {
        CdataSection::new(content)
    }

    /// Empty attribute set for a new tag.
    #[must_use]
    pub fn attributes(&self) -> ElementAttributes {
        ElementAttributes::new(self.template_mode, Arc::clone(&self.attribute_definitions))
    }

    fn processable_tag(
        &self,
        element_name: &str,
        attributes: &[(&str, &str)],
    ) -> Result<ProcessableTag, MarkupError> {
        let definition = self
            .element_definitions
            .for_name(self.template_mode, element_name)?;
        let mut element_attributes = self.attributes();
        for (name, value) in attributes {
            element_attributes.set_attribute(name, Some(value))?;
        }
        Ok(ProcessableTag::new(definition, element_name, element_attributes, None))
    }

    /// `<name a="v"...>`
    pub fn open_element(
        &self,
        element_name: &str,
        attributes: &[(&str, &str)],
    ) -> Result<OpenElementTag, MarkupError> {
        self.processable_tag(element_name, attributes)
            .map(OpenElementTag::new)
    }

    /// `<name a="v".../>`, or `<name ...>` when not minimized (HTML void elements only).
    pub fn standalone_element(
        &self,
        element_name: &str,
        attributes: &[(&str, &str)],
        minimized: bool,
    ) -> Result<StandaloneElementTag, MarkupError> {
        let mut tag = StandaloneElementTag::new(self.processable_tag(element_name, attributes)?, true);
        tag.set_minimized(minimized)?;
        Ok(tag)
    }

    /// `</name>`
    pub fn close_element(&self, element_name: &str) -> Result<CloseElementTag, MarkupError> {
        let definition = self
            .element_definitions
            .for_name(self.template_mode, element_name)?;
        Ok(CloseElementTag::new(ElementTag::new(definition, element_name, None)))
    }

    /// An element holding a single text: `<name ...>text</name>`.
    pub fn element_with_text(
        &self,
        element_name: &str,
        attributes: &[(&str, &str)],
        text: &str,
    ) -> Result<TemplateModel, MarkupError> {
        Ok(TemplateModel::from(vec![
            self.open_element(element_name, attributes)?.into(),
            self.text(text).into(),
            self.close_element(element_name)?.into(),
        ]))
    }
}

impl fmt::Debug for ModelFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelFactory")
            .field("template_mode", &self.template_mode)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn factory(mode: TemplateMode) -> ModelFactory {
        ModelFactory::new(
            mode,
            Arc::new(ElementDefinitions::new(&[]).unwrap()),
            Arc::new(AttributeDefinitions::new(&[]).unwrap()),
        )
    }

    #[test]
    fn test_element_with_text() {
        let factory = factory(TemplateMode::Html);
        let model = factory
            .element_with_text("li", &[("class", "item")], "one")
            .unwrap();
        assert_eq!(model.len(), 3);
        assert_eq!(model.to_string(), "<li class=\"item\">one</li>");
    }

    #[test]
    fn test_standalone_element() {
        let factory = factory(TemplateMode::Xml);
        let tag = factory.standalone_element("item", &[("id", "1")], true).unwrap();
        assert_eq!(tag.to_string(), "<item id=\"1\"/>");
        assert!(factory.standalone_element("item", &[], false).is_err());
    }

    #[test]
    fn test_insert_and_remove() {
        let factory = factory(TemplateMode::Html);
        let mut model = factory.create_model();
        model.add(factory.text("b").into());
        model.insert(0, factory.comment("a").into()).unwrap();
        assert!(model.insert(5, factory.text("x").into()).is_err());
        assert_eq!(model.to_string(), "<!--a-->b");
        assert!(model.remove(1).is_some());
        assert!(model.remove(1).is_none());
        assert_eq!(model.to_string(), "<!--a-->");
    }

    #[test]
    fn test_add_model_and_reset() {
        let factory = factory(TemplateMode::Html);
        let mut first = TemplateModel::from(vec![factory.text("1").into()]);
        let second: TemplateModel = [factory.cdata_section("2").into()].into_iter().collect();
        first.add_model(&second);
        assert_eq!(first.to_string(), "1<![CDATA[2]]>");
        first.reset();
        assert!(first.is_empty());
    }

    #[test]
    fn test_invalid_element_name() {
        let factory = factory(TemplateMode::Html);
        assert!(factory.open_element(" ", &[]).is_err());
    }
}
