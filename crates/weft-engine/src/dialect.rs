//! Dialects and their validation.
//!
//! A dialect is a named bundle of processors sharing a prefix and a
//! precedence. [`DialectSetConfiguration::build`] validates a set of dialects
//! once, before any template is processed, and sorts their processors into
//! the per-mode lists the engine uses.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use weft_markup::{
    CommentProcessorRef, ElementProcessorRef, ElementTagProcessor, MarkupError, ProcessorDialect,
    ProcessorRef, ProcessorRegistration, TemplateMode, TextProcessorRef, check_total_order,
    sort_by_precedence,
};

/// Default precedence of a dialect.
pub const DEFAULT_DIALECT_PRECEDENCE: i32 = 1000;

/// A named set of processors.
pub trait Dialect: Send + Sync {
    fn name(&self) -> &str;

    /// Prefix used when the configuration does not override it.
    fn prefix(&self) -> Option<&str> {
        None
    }

    /// Order of this dialect's processors relative to other dialects; lower runs first.
    fn precedence(&self) -> i32 {
        DEFAULT_DIALECT_PRECEDENCE
    }

    /// Create the processors of this dialect for the effective `prefix`.
    fn processors(&self, prefix: Option<&str>) -> Vec<ProcessorRegistration>;
}

/// A dialect with the prefix it is registered under.
#[derive(Clone)]
pub struct DialectConfiguration {
    dialect: Arc<dyn Dialect>,
    prefix: Option<String>,
}

impl DialectConfiguration {
    /// Register `dialect` under its own prefix.
    pub fn new(dialect: Arc<dyn Dialect>) -> Self {
        let prefix = dialect.prefix().map(str::to_owned);
        Self { dialect, prefix }
    }

    /// Register `dialect` under `prefix` instead of its own.
    pub fn with_prefix(dialect: Arc<dyn Dialect>, prefix: Option<&str>) -> Self {
        Self {
            dialect,
            prefix: prefix.map(str::to_owned),
        }
    }

    #[must_use]
    pub fn dialect(&self) -> &Arc<dyn Dialect> {
        &self.dialect
    }

    #[must_use]
    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }
}

impl fmt::Debug for DialectConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DialectConfiguration")
            .field("name", &self.dialect.name())
            .field("prefix", &self.prefix)
            .finish()
    }
}

/// Processors of one kind, split by template mode.
#[derive(Debug, Clone)]
struct PerMode<T> {
    html: Vec<T>,
    xml: Vec<T>,
}

impl<T> Default for PerMode<T> {
    fn default() -> Self {
        Self {
            html: Vec::new(),
            xml: Vec::new(),
        }
    }
}

impl<T> PerMode<T> {
    fn get(&self, mode: TemplateMode) -> &[T] {
        match mode {
            TemplateMode::Html => &self.html,
            TemplateMode::Xml => &self.xml,
        }
    }

    fn get_mut(&mut self, mode: TemplateMode) -> &mut Vec<T> {
        match mode {
            TemplateMode::Html => &mut self.html,
            TemplateMode::Xml => &mut self.xml,
        }
    }
}

/// A validated set of dialects and the processors they contribute.
#[derive(Debug, Clone)]
pub struct DialectSetConfiguration {
    dialects: Vec<Arc<ProcessorDialect>>,
    element_processors: Vec<ElementProcessorRef>,
    text_processors: PerMode<TextProcessorRef>,
    comment_processors: PerMode<CommentProcessorRef>,
}

fn check_element_processor(dialect: &str, processor: &dyn ElementTagProcessor) -> Result<(), MarkupError> {
    let mode = processor.template_mode();
    let element = processor.matching_element_name();
    let attribute = processor.matching_attribute_name();
    let mismatched = element.is_some_and(|m| m.template_mode() != mode)
        || attribute.is_some_and(|m| m.template_mode() != mode);
    if mismatched {
        return Err(MarkupError::configuration(format!(
            "Element processor of dialect '{dialect}' is a {mode} processor with a matching name for another template mode"
        )));
    }
    Ok(())
}

impl DialectSetConfiguration {
    /// Validate `dialects` and collect their processors.
    ///
    /// # Errors
    ///
    /// Returns [`MarkupError::Configuration`] for empty or duplicate dialect
    /// names, processor instances registered twice, and element processors
    /// whose matching names belong to another template mode. Returns
    /// [`MarkupError::IllegalState`] when two processors of one mode share a
    /// precedence.
    pub fn build(dialects: &[DialectConfiguration]) -> Result<Self, MarkupError> {
        let mut names = HashSet::new();
        let mut addresses = HashSet::new();
        let mut set = Self {
            dialects: Vec::with_capacity(dialects.len()),
            element_processors: Vec::new(),
            text_processors: PerMode::default(),
            comment_processors: PerMode::default(),
        };

        for configuration in dialects {
            let dialect = configuration.dialect();
            let name = dialect.name();
            if name.trim().is_empty() {
                return Err(MarkupError::configuration("Dialect name cannot be empty"));
            }
            if !names.insert(name.to_owned()) {
                return Err(MarkupError::configuration(format!(
                    "Dialect '{name}' is registered more than once"
                )));
            }

            let processor_dialect = Arc::new(ProcessorDialect::new(
                name,
                configuration.prefix().map(str::to_owned),
                dialect.precedence(),
            ));
            for registration in dialect.processors(configuration.prefix()) {
                if !addresses.insert(registration.address().addr()) {
                    return Err(MarkupError::configuration(format!(
                        "A processor of dialect '{name}' is registered more than once"
                    )));
                }
                let mode = registration.template_mode();
                match registration {
                    ProcessorRegistration::ElementTag(processor) => {
                        check_element_processor(name, processor.as_ref())?;
                        set.element_processors
                            .push(ProcessorRef::new(processor, Arc::clone(&processor_dialect)));
                    }
                    ProcessorRegistration::Text(processor) => {
                        set.text_processors
                            .get_mut(mode)
                            .push(ProcessorRef::new(processor, Arc::clone(&processor_dialect)));
                    }
                    ProcessorRegistration::Comment(processor) => {
                        set.comment_processors
                            .get_mut(mode)
                            .push(ProcessorRef::new(processor, Arc::clone(&processor_dialect)));
                    }
                }
            }
            set.dialects.push(processor_dialect);
        }

        for mode in TemplateMode::ALL {
            let text = set.text_processors.get_mut(mode);
            sort_by_precedence(text);
            check_total_order(text)?;
            let comment = set.comment_processors.get_mut(mode);
            sort_by_precedence(comment);
            check_total_order(comment)?;
        }
        sort_by_precedence(&mut set.element_processors);

        Ok(set)
    }

    #[must_use]
    pub fn dialects(&self) -> &[Arc<ProcessorDialect>] {
        &self.dialects
    }

    /// Element processors of every mode, sorted by precedence.
    #[must_use]
    pub fn element_processors(&self) -> &[ElementProcessorRef] {
        &self.element_processors
    }

    #[must_use]
    pub fn text_processors(&self, mode: TemplateMode) -> &[TextProcessorRef] {
        self.text_processors.get(mode)
    }

    #[must_use]
    pub fn comment_processors(&self, mode: TemplateMode) -> &[CommentProcessorRef] {
        self.comment_processors.get(mode)
    }

    /// Total number of processors across all kinds and modes.
    #[must_use]
    pub fn processor_count(&self) -> usize {
        self.element_processors.len()
            + TemplateMode::ALL
                .iter()
                .map(|&mode| self.text_processors(mode).len() + self.comment_processors(mode).len())
                .sum::<usize>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use weft_markup::event::{ProcessableTag, Text};
    use weft_markup::{
        AttributeName, ElementStructureHandler, MatchingAttributeName, Processor, ProcessorContext,
        TextProcessor,
    };

    struct Attribute {
        matching: Option<MatchingAttributeName>,
        mode: TemplateMode,
        precedence: i32,
    }

    impl Processor for Attribute {
        fn template_mode(&self) -> TemplateMode {
            self.mode
        }

        fn precedence(&self) -> i32 {
            self.precedence
        }
    }

    impl ElementTagProcessor for Attribute {
        fn matching_attribute_name(&self) -> Option<&MatchingAttributeName> {
            self.matching.as_ref()
        }

        fn process(
            &self,
            _context: &ProcessorContext<'_>,
            _tag: &mut ProcessableTag,
            _structure_handler: &mut ElementStructureHandler,
        ) -> Result<(), MarkupError> {
            Ok(())
        }
    }

    struct Passthrough(i32);

    impl Processor for Passthrough {
        fn template_mode(&self) -> TemplateMode {
            TemplateMode::Html
        }

        fn precedence(&self) -> i32 {
            self.0
        }
    }

    impl TextProcessor for Passthrough {
        fn process(&self, _context: &ProcessorContext<'_>, _text: &mut Text) -> Result<(), MarkupError> {
            Ok(())
        }
    }

    /// Dialect handing out a fixed list of registrations.
    struct Fixed {
        name: &'static str,
        precedence: i32,
        registrations: Vec<ProcessorRegistration>,
    }

    impl Dialect for Fixed {
        fn name(&self) -> &str {
            self.name
        }

        fn prefix(&self) -> Option<&str> {
            Some("th")
        }

        fn precedence(&self) -> i32 {
            self.precedence
        }

        fn processors(&self, _prefix: Option<&str>) -> Vec<ProcessorRegistration> {
            self.registrations.clone()
        }
    }

    fn attribute(mode: TemplateMode, matching_mode: TemplateMode, precedence: i32) -> ProcessorRegistration {
        let name = AttributeName::parse(matching_mode, "th:x").unwrap();
        ProcessorRegistration::element_tag(Attribute {
            matching: Some(MatchingAttributeName::for_attribute_name(matching_mode, name)),
            mode,
            precedence,
        })
    }

    fn dialect(name: &'static str, precedence: i32, registrations: Vec<ProcessorRegistration>) -> DialectConfiguration {
        DialectConfiguration::new(Arc::new(Fixed {
            name,
            precedence,
            registrations,
        }))
    }

    fn configuration_message(result: Result<DialectSetConfiguration, MarkupError>) -> String {
        match result {
            Err(MarkupError::Configuration(message)) => message,
            other => panic!("expected a configuration error, got {other:?}"),
        }
    }

    #[test]
    fn test_build_collects_and_sorts() {
        let set = DialectSetConfiguration::build(&[
            dialect("late", 2000, vec![attribute(TemplateMode::Html, TemplateMode::Html, 1)]),
            dialect(
                "early",
                10,
                vec![
                    attribute(TemplateMode::Html, TemplateMode::Html, 5),
                    ProcessorRegistration::text(Passthrough(2)),
                    ProcessorRegistration::text(Passthrough(1)),
                ],
            ),
        ])
        .unwrap();

        let order: Vec<_> = set
            .element_processors()
            .iter()
            .map(|p| p.dialect().name().to_owned())
            .collect();
        assert_eq!(order, ["early", "late"]);
        let text: Vec<_> = set
            .text_processors(TemplateMode::Html)
            .iter()
            .map(|p| p.processor().precedence())
            .collect();
        assert_eq!(text, [1, 2]);
        assert!(set.text_processors(TemplateMode::Xml).is_empty());
        assert_eq!(set.processor_count(), 4);
        assert_eq!(set.dialects()[0].prefix(), Some("th"));
    }

    #[test]
    fn test_prefix_override() {
        let fixed = Arc::new(Fixed {
            name: "d",
            precedence: 1,
            registrations: Vec::new(),
        });
        let set = DialectSetConfiguration::build(&[DialectConfiguration::with_prefix(fixed, Some("x"))]).unwrap();
        assert_eq!(set.dialects()[0].prefix(), Some("x"));
    }

    #[test]
    fn test_duplicate_dialect_names() {
        let message = configuration_message(DialectSetConfiguration::build(&[
            dialect("same", 1, Vec::new()),
            dialect("same", 2, Vec::new()),
        ]));
        assert!(message.contains("same"), "{message}");
    }

    #[test]
    fn test_duplicate_processor_instances() {
        let shared = attribute(TemplateMode::Html, TemplateMode::Html, 1);
        let message = configuration_message(DialectSetConfiguration::build(&[
            dialect("a", 1, vec![shared.clone()]),
            dialect("b", 2, vec![shared]),
        ]));
        assert!(message.contains("more than once"), "{message}");
    }

    #[test]
    fn test_processor_without_matching_name_applies_to_every_element() {
        let unmatched = ProcessorRegistration::element_tag(Attribute {
            matching: None,
            mode: TemplateMode::Html,
            precedence: 1,
        });
        let set = DialectSetConfiguration::build(&[dialect("a", 1, vec![unmatched])]).unwrap();
        assert_eq!(set.element_processors().len(), 1);
    }

    #[test]
    fn test_matching_name_for_other_mode() {
        let message = configuration_message(DialectSetConfiguration::build(&[dialect(
            "a",
            1,
            vec![attribute(TemplateMode::Html, TemplateMode::Xml, 1)],
        )]));
        assert!(message.contains("another template mode"), "{message}");
    }

    #[test]
    fn test_text_processor_precedence_tie() {
        let result = DialectSetConfiguration::build(&[dialect(
            "a",
            1,
            vec![
                ProcessorRegistration::text(Passthrough(3)),
                ProcessorRegistration::text(Passthrough(3)),
            ],
        )]);
        assert!(matches!(result, Err(MarkupError::IllegalState(_))));
    }
}
