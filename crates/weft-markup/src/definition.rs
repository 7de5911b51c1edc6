//! Element and attribute definitions.
//!
//! A definition is the interned, immutable description of a name: the name
//! itself, mode-specific metadata and the processors statically known to
//! apply to it. Definitions are shared through [`Arc`](std::sync::Arc) and
//! compared by reference.

use crate::error::MarkupError;
use crate::name::{AttributeName, ElementName, MatchingAttributeName};
use crate::processor::{ElementProcessorRef, check_total_order};

/// Content model of an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementType {
    /// No content and no close tag (`<br>`).
    Void,
    /// Content is not parsed as markup (`<script>`).
    RawText,
    /// Content is not parsed as markup but may contain references (`<textarea>`).
    EscapableRawText,
    /// Regular element.
    Normal,
}

impl ElementType {
    #[must_use]
    pub fn is_void(self) -> bool {
        self == Self::Void
    }
}

/// Names under which a definition is indexed in a repository.
pub(crate) trait Indexed {
    fn index_names(&self) -> &[String];
}

/// Interned definition of an element name.
#[derive(Debug)]
pub struct ElementDefinition {
    name: ElementName,
    element_type: ElementType,
    standard: bool,
    associated_processors: Vec<ElementProcessorRef>,
}

impl ElementDefinition {
    /// Build a definition, associating every element-level processor in
    /// `processors` (sorted by precedence) that applies to `name`.
    ///
    /// Element-level processors have no matching attribute name or match
    /// every attribute. A processor without a matching element name applies
    /// to every element.
    pub(crate) fn new(
        name: ElementName,
        element_type: ElementType,
        standard: bool,
        processors: &[ElementProcessorRef],
    ) -> Result<Self, MarkupError> {
        let associated_processors: Vec<_> = processors
            .iter()
            .filter(|p| {
                let processor = p.processor();
                matches!(
                    processor.matching_attribute_name(),
                    None | Some(MatchingAttributeName::All { .. })
                ) && processor
                    .matching_element_name()
                    .is_none_or(|matching| matching.matches(&name))
            })
            .cloned()
            .collect();
        check_total_order(&associated_processors)?;
        Ok(Self {
            name,
            element_type,
            standard,
            associated_processors,
        })
    }

    #[must_use]
    pub fn name(&self) -> &ElementName {
        &self.name
    }

    #[must_use]
    pub fn element_type(&self) -> ElementType {
        self.element_type
    }

    /// Whether this is one of the built-in HTML elements.
    #[must_use]
    pub fn is_standard(&self) -> bool {
        self.standard
    }

    /// Element-level processors, sorted by precedence.
    #[must_use]
    pub fn associated_processors(&self) -> &[ElementProcessorRef] {
        &self.associated_processors
    }

    #[must_use]
    pub fn has_associated_processors(&self) -> bool {
        !self.associated_processors.is_empty()
    }
}

impl Indexed for ElementDefinition {
    fn index_names(&self) -> &[String] {
        self.name.complete_names()
    }
}

/// Interned definition of an attribute name.
#[derive(Debug)]
pub struct AttributeDefinition {
    name: AttributeName,
    boolean: bool,
    associated_processors: Vec<ElementProcessorRef>,
}

impl AttributeDefinition {
    /// Build a definition, associating every processor in `processors`
    /// (sorted by precedence) whose matching attribute name matches `name`.
    ///
    /// Processors matching every attribute are never associated.
    pub(crate) fn new(
        name: AttributeName,
        boolean: bool,
        processors: &[ElementProcessorRef],
    ) -> Result<Self, MarkupError> {
        let associated_processors: Vec<_> = processors
            .iter()
            .filter(|p| match p.processor().matching_attribute_name() {
                None | Some(MatchingAttributeName::All { .. }) => false,
                Some(matching) => matching.matches(&name),
            })
            .cloned()
            .collect();
        check_total_order(&associated_processors)?;
        Ok(Self {
            name,
            boolean,
            associated_processors,
        })
    }

    #[must_use]
    pub fn name(&self) -> &AttributeName {
        &self.name
    }

    /// Whether the attribute is an HTML boolean attribute (`disabled`, `checked`...).
    #[must_use]
    pub fn is_boolean(&self) -> bool {
        self.boolean
    }

    /// Processors triggered by this attribute, sorted by precedence.
    #[must_use]
    pub fn associated_processors(&self) -> &[ElementProcessorRef] {
        &self.associated_processors
    }

    #[must_use]
    pub fn has_associated_processors(&self) -> bool {
        !self.associated_processors.is_empty()
    }
}

impl Indexed for AttributeDefinition {
    fn index_names(&self) -> &[String] {
        self.name.complete_names()
    }
}
