//! Definition registries for every template mode.
//!
//! [`ElementDefinitions`] and [`AttributeDefinitions`] turn raw names (or
//! spans of a source buffer) into interned definitions. They are built once
//! per engine configuration from its element processors and are shared by
//! every render.
//!
//! # Example
//!
//! ```
//! use weft_markup::AttributeDefinitions;
//!
//! let definitions = AttributeDefinitions::new(&[]).unwrap();
//! let by_colon = definitions.for_html_name("th:text").unwrap();
//! let by_data = definitions.for_html_name("data-th-text").unwrap();
//! assert!(std::sync::Arc::ptr_eq(&by_colon, &by_data));
//! assert!(definitions.for_html_name("disabled").unwrap().is_boolean());
//! ```

use std::sync::Arc;

use crate::definition::{AttributeDefinition, ElementDefinition, ElementType};
use crate::error::MarkupError;
use crate::name::{AttributeName, ElementName};
use crate::processor::{ElementProcessorRef, sort_by_precedence};
use crate::repository::{DefinitionRepository, NameKey};
use crate::span;
use crate::standard::{HTML_ATTRIBUTES, HTML_BOOLEAN_ATTRIBUTES, HTML_ELEMENTS};
use crate::template_mode::TemplateMode;

/// Split `processors` per template mode, sorted by precedence, checking that
/// their matching names belong to the processor's own mode.
fn processors_by_mode(
    processors: &[ElementProcessorRef],
) -> Result<(Vec<ElementProcessorRef>, Vec<ElementProcessorRef>), MarkupError> {
    let mut html = Vec::new();
    let mut xml = Vec::new();
    for processor_ref in processors {
        let processor = processor_ref.processor();
        let mode = processor.template_mode();
        if let Some(matching) = processor.matching_element_name()
            && matching.template_mode() != mode
        {
            return Err(MarkupError::configuration(format!(
                "Processor of dialect '{}' has template mode {mode} but matches element name {matching} of mode {}",
                processor_ref.dialect().name(),
                matching.template_mode()
            )));
        }
        if let Some(matching) = processor.matching_attribute_name()
            && matching.template_mode() != mode
        {
            return Err(MarkupError::configuration(format!(
                "Processor of dialect '{}' has template mode {mode} but matches attribute name {matching} of mode {}",
                processor_ref.dialect().name(),
                matching.template_mode()
            )));
        }
        match mode {
            TemplateMode::Html => html.push(processor_ref.clone()),
            TemplateMode::Xml => xml.push(processor_ref.clone()),
        }
    }
    sort_by_precedence(&mut html);
    sort_by_precedence(&mut xml);
    Ok((html, xml))
}

/// Registry of element definitions.
pub struct ElementDefinitions {
    html: DefinitionRepository<ElementDefinition>,
    xml: DefinitionRepository<ElementDefinition>,
    html_processors: Vec<ElementProcessorRef>,
    xml_processors: Vec<ElementProcessorRef>,
}

impl ElementDefinitions {
    /// Build the registries, seeding HTML with the standard elements.
    pub fn new(processors: &[ElementProcessorRef]) -> Result<Self, MarkupError> {
        let (html_processors, xml_processors) = processors_by_mode(processors)?;

        let standard = HTML_ELEMENTS
            .iter()
            .map(|&(raw, element_type)| {
                let name = ElementName::parse(TemplateMode::Html, raw)?;
                ElementDefinition::new(name, element_type, true, &html_processors).map(Arc::new)
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            html: DefinitionRepository::new(false, standard),
            xml: DefinitionRepository::new(true, Vec::new()),
            html_processors,
            xml_processors,
        })
    }

    fn repository(&self, mode: TemplateMode) -> (&DefinitionRepository<ElementDefinition>, &[ElementProcessorRef]) {
        match mode {
            TemplateMode::Html => (&self.html, &self.html_processors),
            TemplateMode::Xml => (&self.xml, &self.xml_processors),
        }
    }

    /// Definition for a raw element name.
    pub fn for_name(&self, mode: TemplateMode, raw: &str) -> Result<Arc<ElementDefinition>, MarkupError> {
        if raw.trim().is_empty() {
            return Err(MarkupError::invalid_argument("Element name cannot be empty"));
        }
        let (repository, processors) = self.repository(mode);
        repository.get_or_insert(NameKey::Raw(raw), || {
            let name = ElementName::parse(mode, raw)?;
            ElementDefinition::new(name, ElementType::Normal, false, processors)
        })
    }

    pub fn for_html_name(&self, raw: &str) -> Result<Arc<ElementDefinition>, MarkupError> {
        self.for_name(TemplateMode::Html, raw)
    }

    pub fn for_xml_name(&self, raw: &str) -> Result<Arc<ElementDefinition>, MarkupError> {
        self.for_name(TemplateMode::Xml, raw)
    }

    /// Definition for the name covering `len` bytes of `buffer` from `offset`.
    pub fn for_buffer(
        &self,
        mode: TemplateMode,
        buffer: &str,
        offset: usize,
        len: usize,
    ) -> Result<Arc<ElementDefinition>, MarkupError> {
        self.for_name(mode, span::slice(buffer, offset, len)?)
    }

    /// Definition for an explicit `(prefix, name)` pair.
    ///
    /// A missing or blank prefix behaves like [`for_name`](Self::for_name).
    pub fn for_prefixed_name(
        &self,
        mode: TemplateMode,
        prefix: Option<&str>,
        name: &str,
    ) -> Result<Arc<ElementDefinition>, MarkupError> {
        let Some(prefix) = prefix.filter(|p| !p.trim().is_empty()) else {
            return self.for_name(mode, name);
        };
        if name.trim().is_empty() {
            return Err(MarkupError::invalid_argument("Element name cannot be empty"));
        }
        let (repository, processors) = self.repository(mode);
        repository.get_or_insert(NameKey::Prefixed { prefix, name }, || {
            let name = ElementName::with_prefix(mode, Some(prefix), name)?;
            ElementDefinition::new(name, ElementType::Normal, false, processors)
        })
    }
}

/// Registry of attribute definitions.
pub struct AttributeDefinitions {
    html: DefinitionRepository<AttributeDefinition>,
    xml: DefinitionRepository<AttributeDefinition>,
    html_processors: Vec<ElementProcessorRef>,
    xml_processors: Vec<ElementProcessorRef>,
}

impl AttributeDefinitions {
    /// Build the registries, seeding HTML with the standard attributes.
    pub fn new(processors: &[ElementProcessorRef]) -> Result<Self, MarkupError> {
        let (html_processors, xml_processors) = processors_by_mode(processors)?;

        let standard = HTML_ATTRIBUTES
            .iter()
            .map(|&raw| {
                let name = AttributeName::parse(TemplateMode::Html, raw)?;
                let boolean = HTML_BOOLEAN_ATTRIBUTES.contains(&raw);
                AttributeDefinition::new(name, boolean, &html_processors).map(Arc::new)
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            html: DefinitionRepository::new(false, standard),
            xml: DefinitionRepository::new(true, Vec::new()),
            html_processors,
            xml_processors,
        })
    }

    fn repository(&self, mode: TemplateMode) -> (&DefinitionRepository<AttributeDefinition>, &[ElementProcessorRef]) {
        match mode {
            TemplateMode::Html => (&self.html, &self.html_processors),
            TemplateMode::Xml => (&self.xml, &self.xml_processors),
        }
    }

    fn build(
        mode: TemplateMode,
        name: AttributeName,
        processors: &[ElementProcessorRef],
    ) -> Result<AttributeDefinition, MarkupError> {
        let boolean = mode.is_html()
            && name.prefix().is_none()
            && HTML_BOOLEAN_ATTRIBUTES.contains(&name.name());
        AttributeDefinition::new(name, boolean, processors)
    }

    /// Definition for a raw attribute name.
    pub fn for_name(&self, mode: TemplateMode, raw: &str) -> Result<Arc<AttributeDefinition>, MarkupError> {
        if raw.trim().is_empty() {
            return Err(MarkupError::invalid_argument("Attribute name cannot be empty"));
        }
        let (repository, processors) = self.repository(mode);
        repository.get_or_insert(NameKey::Raw(raw), || {
            Self::build(mode, AttributeName::parse(mode, raw)?, processors)
        })
    }

    pub fn for_html_name(&self, raw: &str) -> Result<Arc<AttributeDefinition>, MarkupError> {
        self.for_name(TemplateMode::Html, raw)
    }

    pub fn for_xml_name(&self, raw: &str) -> Result<Arc<AttributeDefinition>, MarkupError> {
        self.for_name(TemplateMode::Xml, raw)
    }

    /// Definition for the name covering `len` bytes of `buffer` from `offset`.
    pub fn for_buffer(
        &self,
        mode: TemplateMode,
        buffer: &str,
        offset: usize,
        len: usize,
    ) -> Result<Arc<AttributeDefinition>, MarkupError> {
        self.for_name(mode, span::slice(buffer, offset, len)?)
    }

    /// Definition for an explicit `(prefix, name)` pair.
    ///
    /// A missing or blank prefix behaves like [`for_name`](Self::for_name).
    pub fn for_prefixed_name(
        &self,
        mode: TemplateMode,
        prefix: Option<&str>,
        name: &str,
    ) -> Result<Arc<AttributeDefinition>, MarkupError> {
        let Some(prefix) = prefix.filter(|p| !p.trim().is_empty()) else {
            return self.for_name(mode, name);
        };
        if name.trim().is_empty() {
            return Err(MarkupError::invalid_argument("Attribute name cannot be empty"));
        }
        let (repository, processors) = self.repository(mode);
        repository.get_or_insert(NameKey::Prefixed { prefix, name }, || {
            Self::build(mode, AttributeName::with_prefix(mode, Some(prefix), name)?, processors)
        })
    }
}
