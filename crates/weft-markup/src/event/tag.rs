//! Element tags.
//!
//! Open, standalone and auto-open tags carry attributes and are handed to
//! element processors as a [`ProcessableTag`]. Close, auto-close and
//! unmatched-close tags only carry a name.
//!
//! Auto-open and auto-close tags are inserted to balance the document and
//! were never written in the source: they serialize to nothing.

use std::fmt;
use std::sync::Arc;

use super::{ElementAttributes, Location};
use crate::definition::ElementDefinition;
use crate::error::MarkupError;
use crate::name::ElementName;
use crate::processor::{ElementProcessorRef, check_total_order, sort_by_precedence};
use crate::template_mode::TemplateMode;

/// An element tag with attributes, as seen by element processors.
///
/// The processors that apply to the tag are computed on demand and cached
/// until its attributes change.
#[derive(Debug, Clone)]
pub struct ProcessableTag {
    template_mode: TemplateMode,
    element_definition: Arc<ElementDefinition>,
    element_name: String,
    attributes: ElementAttributes,
    location: Option<Location>,
    associated_processors: Vec<ElementProcessorRef>,
    associated_version: Option<u64>,
}

impl ProcessableTag {
    #[must_use]
    pub fn new(
        element_definition: Arc<ElementDefinition>,
        element_name: &str,
        attributes: ElementAttributes,
        location: Option<Location>,
    ) -> Self {
        Self {
            template_mode: attributes.template_mode(),
            element_definition,
            element_name: element_name.to_owned(),
            attributes,
            location,
            associated_processors: Vec::new(),
            associated_version: None,
        }
    }

    #[must_use]
    pub fn template_mode(&self) -> TemplateMode {
        self.template_mode
    }

    #[must_use]
    pub fn element_definition(&self) -> &Arc<ElementDefinition> {
        &self.element_definition
    }

    /// Canonical name of the element.
    #[must_use]
    pub fn name(&self) -> &ElementName {
        self.element_definition.name()
    }

    /// Name as written.
    #[must_use]
    pub fn element_name(&self) -> &str {
        &self.element_name
    }

    #[must_use]
    pub fn location(&self) -> Option<Location> {
        self.location
    }

    #[must_use]
    pub fn attributes(&self) -> &ElementAttributes {
        &self.attributes
    }

    pub fn attributes_mut(&mut self) -> &mut ElementAttributes {
        &mut self.attributes
    }

    #[must_use]
    pub fn has_attribute(&self, complete_name: &str) -> bool {
        self.attributes.has_attribute(complete_name)
    }

    #[must_use]
    pub fn attribute_value(&self, complete_name: &str) -> Option<&str> {
        self.attributes.value(complete_name)
    }

    pub fn set_attribute(&mut self, complete_name: &str, value: Option<&str>) -> Result<(), MarkupError> {
        self.attributes.set_attribute(complete_name, value)
    }

    pub fn remove_attribute(&mut self, complete_name: &str) -> bool {
        self.attributes.remove_attribute(complete_name)
    }

    /// Processors applying to this tag, sorted by precedence.
    ///
    /// Element-level processors of the definition come first, then the
    /// processors of every attribute present, skipping those scoped to
    /// another element. Recomputed only when the attributes changed since
    /// the last call.
    ///
    /// # Errors
    ///
    /// Returns [`MarkupError::IllegalState`] when two different processors
    /// share a precedence.
    pub fn associated_processors(&mut self) -> Result<&[ElementProcessorRef], MarkupError> {
        let version = self.attributes.version();
        if self.associated_version != Some(version) {
            self.recompute_processors()?;
            self.associated_version = Some(version);
        }
        Ok(&self.associated_processors)
    }

    /// Whether any processor applies to this tag.
    pub fn has_associated_processors(&mut self) -> Result<bool, MarkupError> {
        Ok(!self.associated_processors()?.is_empty())
    }

    fn recompute_processors(&mut self) -> Result<(), MarkupError> {
        let name = self.element_definition.name();
        let processors = &mut self.associated_processors;
        processors.clear();
        processors.extend(self.element_definition.associated_processors().iter().cloned());
        for attribute in self.attributes.iter() {
            processors.extend(
                attribute
                    .definition()
                    .associated_processors()
                    .iter()
                    .filter(|p| {
                        p.processor()
                            .matching_element_name()
                            .is_none_or(|matching| matching.matches(name))
                    })
                    .cloned(),
            );
        }
        if processors.len() > 1 {
            sort_by_precedence(processors);
            // A prefix-wide processor reaches the tag through every attribute it matches
            processors.dedup_by(|a, b| a.is_same(b));
            check_total_order(processors)?;
        }
        Ok(())
    }

    pub fn reset_as_clone_of(&mut self, original: &Self) {
        self.clone_from(original);
    }

    fn write_open(&self, f: &mut fmt::Formatter<'_>, close: &str) -> fmt::Result {
        write!(f, "<{}{}{close}", self.element_name, self.attributes)
    }
}

impl PartialEq for ProcessableTag {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.element_definition, &other.element_definition)
            && self.element_name == other.element_name
            && self.attributes == other.attributes
            && self.location == other.location
    }
}

macro_rules! processable_tag_wrapper {
    ($ty:ident) => {
        impl $ty {
            #[must_use]
            pub fn tag(&self) -> &ProcessableTag {
                &self.tag
            }

            pub fn tag_mut(&mut self) -> &mut ProcessableTag {
                &mut self.tag
            }

            #[must_use]
            pub fn into_tag(self) -> ProcessableTag {
                self.tag
            }

            #[must_use]
            pub fn template_mode(&self) -> TemplateMode {
                self.tag.template_mode()
            }

            #[must_use]
            pub fn element_definition(&self) -> &Arc<ElementDefinition> {
                self.tag.element_definition()
            }

            #[must_use]
            pub fn element_name(&self) -> &str {
                self.tag.element_name()
            }

            #[must_use]
            pub fn attributes(&self) -> &ElementAttributes {
                self.tag.attributes()
            }

            #[must_use]
            pub fn location(&self) -> Option<Location> {
                self.tag.location()
            }
        }
    };
}

/// `<div class="a">`
#[derive(Debug, Clone, PartialEq)]
pub struct OpenElementTag {
    tag: ProcessableTag,
}

processable_tag_wrapper!(OpenElementTag);

impl OpenElementTag {
    #[must_use]
    pub fn new(tag: ProcessableTag) -> Self {
        Self { tag }
    }

    pub fn reset_as_clone_of(&mut self, original: &Self) {
        self.tag.reset_as_clone_of(&original.tag);
    }
}

impl fmt::Display for OpenElementTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.tag.write_open(f, ">")
    }
}

/// `<br/>`, or an HTML void element written as `<br>`.
#[derive(Debug, Clone, PartialEq)]
pub struct StandaloneElementTag {
    tag: ProcessableTag,
    minimized: bool,
}

processable_tag_wrapper!(StandaloneElementTag);

impl StandaloneElementTag {
    #[must_use]
    pub fn new(tag: ProcessableTag, minimized: bool) -> Self {
        Self { tag, minimized }
    }

    /// Whether the tag was written with a closing slash.
    #[must_use]
    pub fn is_minimized(&self) -> bool {
        self.minimized
    }

    /// Switch between `<x/>` and `<x>`.
    ///
    /// Non-minimized standalone tags only exist for HTML void elements.
    pub fn set_minimized(&mut self, minimized: bool) -> Result<(), MarkupError> {
        if !minimized && !self.tag.element_definition().element_type().is_void() {
            return Err(MarkupError::invalid_argument(format!(
                "Element \"{}\" is not void and cannot be written without a closing slash",
                self.tag.element_name()
            )));
        }
        self.minimized = minimized;
        Ok(())
    }

    pub fn reset_as_clone_of(&mut self, original: &Self) {
        self.tag.reset_as_clone_of(&original.tag);
        self.minimized = original.minimized;
    }
}

impl fmt::Display for StandaloneElementTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.tag.write_open(f, if self.minimized { "/>" } else { ">" })
    }
}

/// Open tag inserted for an element whose close tag appears without one.
#[derive(Debug, Clone, PartialEq)]
pub struct AutoOpenElementTag {
    tag: ProcessableTag,
}

processable_tag_wrapper!(AutoOpenElementTag);

impl AutoOpenElementTag {
    #[must_use]
    pub fn new(tag: ProcessableTag) -> Self {
        Self { tag }
    }

    pub fn reset_as_clone_of(&mut self, original: &Self) {
        self.tag.reset_as_clone_of(&original.tag);
    }
}

impl fmt::Display for AutoOpenElementTag {
    fn fmt(&self, _f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Ok(())
    }
}

/// Name and position of a tag without attributes.
#[derive(Debug, Clone)]
pub struct ElementTag {
    element_definition: Arc<ElementDefinition>,
    element_name: String,
    location: Option<Location>,
}

impl ElementTag {
    #[must_use]
    pub fn new(
        element_definition: Arc<ElementDefinition>,
        element_name: &str,
        location: Option<Location>,
    ) -> Self {
        Self {
            element_definition,
            element_name: element_name.to_owned(),
            location,
        }
    }

    #[must_use]
    pub fn element_definition(&self) -> &Arc<ElementDefinition> {
        &self.element_definition
    }

    #[must_use]
    pub fn name(&self) -> &ElementName {
        self.element_definition.name()
    }

    #[must_use]
    pub fn element_name(&self) -> &str {
        &self.element_name
    }

    #[must_use]
    pub fn location(&self) -> Option<Location> {
        self.location
    }

    pub fn reset_as_clone_of(&mut self, original: &Self) {
        self.clone_from(original);
    }
}

impl PartialEq for ElementTag {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.element_definition, &other.element_definition)
            && self.element_name == other.element_name
            && self.location == other.location
    }
}

macro_rules! close_tag {
    ($(#[$meta:meta])* $ty:ident, $render:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq)]
        pub struct $ty {
            tag: ElementTag,
        }

        impl $ty {
            #[must_use]
            pub fn new(tag: ElementTag) -> Self {
                Self { tag }
            }

            #[must_use]
            pub fn tag(&self) -> &ElementTag {
                &self.tag
            }

            #[must_use]
            pub fn element_definition(&self) -> &Arc<ElementDefinition> {
                self.tag.element_definition()
            }

            #[must_use]
            pub fn element_name(&self) -> &str {
                self.tag.element_name()
            }

            #[must_use]
            pub fn location(&self) -> Option<Location> {
                self.tag.location()
            }

            pub fn reset_as_clone_of(&mut self, original: &Self) {
                self.tag.reset_as_clone_of(&original.tag);
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                let render: fn(&ElementTag, &mut fmt::Formatter<'_>) -> fmt::Result = $render;
                render(&self.tag, f)
            }
        }
    };
}

close_tag!(
    /// `</div>`
    CloseElementTag,
    |tag, f| write!(f, "</{}>", tag.element_name)
);

close_tag!(
    /// Close tag inserted for an element left open in the source.
    AutoCloseElementTag,
    |_, _| Ok(())
);

close_tag!(
    /// A close tag with no matching open tag, kept as written.
    UnmatchedCloseElementTag,
    |tag, f| write!(f, "</{}>", tag.element_name)
);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definitions::{AttributeDefinitions, ElementDefinitions};
    use crate::name::{MatchingAttributeName, MatchingElementName};
    use crate::processor::test_support::{NoopProcessor, element_ref};
    use crate::processor::{ElementTagProcessor, ProcessorDialect, ProcessorRef};
    use pretty_assertions::assert_eq;

    struct Fixture {
        elements: ElementDefinitions,
        attributes: Arc<AttributeDefinitions>,
    }

    impl Fixture {
        fn new(processors: &[ElementProcessorRef]) -> Self {
            Self {
                elements: ElementDefinitions::new(processors).unwrap(),
                attributes: Arc::new(AttributeDefinitions::new(processors).unwrap()),
            }
        }

        fn tag(&self, name: &str, attributes: &[(&str, &str)]) -> ProcessableTag {
            let mut element_attributes =
                ElementAttributes::new(TemplateMode::Html, Arc::clone(&self.attributes));
            for (attribute, value) in attributes {
                element_attributes.set_attribute(attribute, Some(value)).unwrap();
            }
            ProcessableTag::new(
                self.elements.for_html_name(name).unwrap(),
                name,
                element_attributes,
                None,
            )
        }

        fn close(&self, name: &str) -> ElementTag {
            ElementTag::new(self.elements.for_html_name(name).unwrap(), name, None)
        }
    }

    fn precedences(tag: &mut ProcessableTag) -> Vec<i32> {
        tag.associated_processors()
            .unwrap()
            .iter()
            .map(|p| p.processor().precedence())
            .collect()
    }

    #[test]
    fn test_open_and_standalone_serialization() {
        let fixture = Fixture::new(&[]);
        let open = OpenElementTag::new(fixture.tag("div", &[("class", "a")]));
        assert_eq!(open.to_string(), "<div class=\"a\">");
        let minimized = StandaloneElementTag::new(fixture.tag("img", &[("src", "x")]), true);
        assert_eq!(minimized.to_string(), "<img src=\"x\"/>");
        let void = StandaloneElementTag::new(fixture.tag("br", &[]), false);
        assert_eq!(void.to_string(), "<br>");
    }

    #[test]
    fn test_close_tag_serialization() {
        let fixture = Fixture::new(&[]);
        assert_eq!(CloseElementTag::new(fixture.close("DIV")).to_string(), "</DIV>");
        assert_eq!(
            UnmatchedCloseElementTag::new(fixture.close("p")).to_string(),
            "</p>"
        );
    }

    #[test]
    fn test_auto_tags_render_nothing() {
        let fixture = Fixture::new(&[]);
        let auto_open = AutoOpenElementTag::new(fixture.tag("tbody", &[("id", "x")]));
        let auto_close = AutoCloseElementTag::new(fixture.close("tbody"));
        assert_eq!(auto_open.to_string(), "");
        assert_eq!(auto_close.to_string(), "");
    }

    #[test]
    fn test_set_minimized_only_for_void_elements() {
        let fixture = Fixture::new(&[]);
        let mut div = StandaloneElementTag::new(fixture.tag("div", &[]), true);
        assert!(div.set_minimized(false).is_err());
        let mut br = StandaloneElementTag::new(fixture.tag("br", &[]), true);
        br.set_minimized(false).unwrap();
        assert_eq!(br.to_string(), "<br>");
    }

    #[test]
    fn test_processors_sorted_and_scoped() {
        let processors = vec![
            element_ref(NoopProcessor::for_attribute(TemplateMode::Html, "th:text", 300)),
            element_ref(NoopProcessor::for_attribute(TemplateMode::Html, "th:if", 100)),
            element_ref(NoopProcessor::for_element(TemplateMode::Html, "th:block", 50)),
            element_ref(
                NoopProcessor::for_attribute(TemplateMode::Html, "th:field", 200).scoped_to("input"),
            ),
        ];
        let fixture = Fixture::new(&processors);

        let mut div = fixture.tag("div", &[("th:text", "a"), ("th:if", "b"), ("th:field", "c")]);
        assert_eq!(precedences(&mut div), [100, 300]);

        let mut input = fixture.tag("input", &[("th:field", "c"), ("th:text", "a")]);
        assert_eq!(precedences(&mut input), [200, 300]);

        let mut block = fixture.tag("th:block", &[("th:if", "x")]);
        assert_eq!(precedences(&mut block), [50, 100]);
    }

    #[test]
    fn test_processors_recomputed_after_attribute_change() {
        let processors = vec![
            element_ref(NoopProcessor::for_attribute(TemplateMode::Html, "th:text", 300)),
            element_ref(NoopProcessor::for_attribute(TemplateMode::Html, "th:if", 100)),
        ];
        let fixture = Fixture::new(&processors);
        let mut tag = fixture.tag("p", &[("th:text", "a")]);
        assert_eq!(precedences(&mut tag), [300]);

        tag.set_attribute("th:if", Some("b")).unwrap();
        assert_eq!(precedences(&mut tag), [100, 300]);

        tag.remove_attribute("th:text");
        assert_eq!(precedences(&mut tag), [100]);
        assert!(tag.has_associated_processors().unwrap());
    }

    #[test]
    fn test_prefix_processor_applies_once() {
        let processor = NoopProcessor {
            template_mode: TemplateMode::Html,
            precedence: 10,
            element: None,
            attribute: Some(MatchingAttributeName::for_all_attributes_with_prefix(
                TemplateMode::Html,
                "th",
            )),
        };
        let fixture = Fixture::new(&[element_ref(processor)]);
        let mut tag = fixture.tag("p", &[("th:a", "1"), ("th:b", "2")]);
        assert_eq!(precedences(&mut tag), [10]);
    }

    #[test]
    fn test_precedence_tie_is_illegal_state() {
        let dialect = Arc::new(ProcessorDialect::new("d", None, 1));
        let make = |raw: &str| {
            ProcessorRef::new(
                Arc::new(NoopProcessor::for_attribute(TemplateMode::Html, raw, 5))
                    as Arc<dyn ElementTagProcessor>,
                Arc::clone(&dialect),
            )
        };
        let fixture = Fixture::new(&[make("th:a"), make("th:b")]);
        let mut tag = fixture.tag("p", &[("th:a", "1"), ("th:b", "2")]);
        assert!(matches!(
            tag.associated_processors(),
            Err(MarkupError::IllegalState(_))
        ));
    }

    #[test]
    fn test_element_matcher_uses_canonical_name() {
        let processor = NoopProcessor {
            template_mode: TemplateMode::Html,
            precedence: 1,
            element: Some(MatchingElementName::for_all_elements_with_prefix(
                TemplateMode::Html,
                "th",
            )),
            attribute: None,
        };
        let fixture = Fixture::new(&[element_ref(processor)]);
        let mut tag = fixture.tag("th-block", &[]);
        assert_eq!(tag.name().prefix(), Some("th"));
        assert_eq!(precedences(&mut tag), [1]);
        let mut plain = fixture.tag("div", &[]);
        assert!(!plain.has_associated_processors().unwrap());
    }

    #[test]
    fn test_reset_as_clone_of() {
        let fixture = Fixture::new(&[]);
        let original = OpenElementTag::new(fixture.tag("a", &[("href", "/")]));
        let mut pooled = OpenElementTag::new(fixture.tag("b", &[]));
        pooled.reset_as_clone_of(&original);
        assert_eq!(pooled, original);
        assert_eq!(pooled.to_string(), "<a href=\"/\">");

        let original_close = CloseElementTag::new(fixture.close("a"));
        let mut pooled_close = CloseElementTag::new(fixture.close("b"));
        pooled_close.reset_as_clone_of(&original_close);
        assert_eq!(pooled_close.element_name(), "a");
    }
}
