//! Processor contracts.
//!
//! Processors are registered once, at configuration time, through a
//! [`ProcessorRegistration`] that fixes their kind. Each registration is
//! paired with the dialect that contributed it in a [`ProcessorRef`], which
//! defines the total execution order: dialect precedence first, then
//! processor precedence, lower values first.
//!
//! # Thread Safety
//!
//! Processors are shared by every concurrent render and must be
//! `Send + Sync`. All per-render state travels through the arguments of
//! `process`.

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use crate::error::MarkupError;
use crate::event::{Comment, ProcessableTag, Text};
use crate::model::ModelFactory;
use crate::name::{MatchingAttributeName, MatchingElementName};
use crate::structure::ElementStructureHandler;
use crate::template_mode::TemplateMode;
use crate::variables::LocalVariables;

/// Properties shared by every processor kind.
pub trait Processor: Send + Sync {
    /// Template mode this processor applies to.
    fn template_mode(&self) -> TemplateMode;

    /// Execution order within its dialect; lower runs first.
    fn precedence(&self) -> i32;
}

/// Processor applied to open and standalone element tags.
///
/// At least one of [`matching_element_name`](Self::matching_element_name) and
/// [`matching_attribute_name`](Self::matching_attribute_name) must be set.
pub trait ElementTagProcessor: Processor {
    fn matching_element_name(&self) -> Option<&MatchingElementName> {
        None
    }

    fn matching_attribute_name(&self) -> Option<&MatchingAttributeName> {
        None
    }

    /// Inspect or modify `tag` and report at most one structural decision.
    ///
    /// The tag is a pooled buffer: clone it to keep it past this call.
    fn process(
        &self,
        context: &ProcessorContext<'_>,
        tag: &mut ProcessableTag,
        structure_handler: &mut ElementStructureHandler,
    ) -> Result<(), MarkupError>;
}

/// Processor applied to text events.
pub trait TextProcessor: Processor {
    fn process(&self, context: &ProcessorContext<'_>, text: &mut Text) -> Result<(), MarkupError>;
}

/// Processor applied to comment events.
pub trait CommentProcessor: Processor {
    fn process(
        &self,
        context: &ProcessorContext<'_>,
        comment: &mut Comment,
    ) -> Result<(), MarkupError>;
}

/// A processor together with its kind, chosen once at registration.
#[derive(Clone)]
pub enum ProcessorRegistration {
    ElementTag(Arc<dyn ElementTagProcessor>),
    Text(Arc<dyn TextProcessor>),
    Comment(Arc<dyn CommentProcessor>),
}

impl ProcessorRegistration {
    pub fn element_tag(processor: impl ElementTagProcessor + 'static) -> Self {
        Self::ElementTag(Arc::new(processor))
    }

    pub fn text(processor: impl TextProcessor + 'static) -> Self {
        Self::Text(Arc::new(processor))
    }

    pub fn comment(processor: impl CommentProcessor + 'static) -> Self {
        Self::Comment(Arc::new(processor))
    }

    #[must_use]
    pub fn template_mode(&self) -> TemplateMode {
        match self {
            Self::ElementTag(p) => p.template_mode(),
            Self::Text(p) => p.template_mode(),
            Self::Comment(p) => p.template_mode(),
        }
    }

    #[must_use]
    pub fn precedence(&self) -> i32 {
        match self {
            Self::ElementTag(p) => p.precedence(),
            Self::Text(p) => p.precedence(),
            Self::Comment(p) => p.precedence(),
        }
    }

    /// Address of the processor instance, used for identity checks.
    #[must_use]
    pub fn address(&self) -> *const () {
        match self {
            Self::ElementTag(p) => Arc::as_ptr(p).cast::<()>(),
            Self::Text(p) => Arc::as_ptr(p).cast::<()>(),
            Self::Comment(p) => Arc::as_ptr(p).cast::<()>(),
        }
    }
}

impl fmt::Debug for ProcessorRegistration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self {
            Self::ElementTag(_) => "ElementTag",
            Self::Text(_) => "Text",
            Self::Comment(_) => "Comment",
        };
        f.debug_struct("ProcessorRegistration")
            .field("kind", &kind)
            .field("template_mode", &self.template_mode())
            .field("precedence", &self.precedence())
            .finish()
    }
}

/// The dialect a processor was contributed by.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessorDialect {
    name: String,
    prefix: Option<String>,
    precedence: i32,
}

impl ProcessorDialect {
    #[must_use]
    pub fn new(name: impl Into<String>, prefix: Option<String>, precedence: i32) -> Self {
        Self {
            name: name.into(),
            prefix,
            precedence,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    #[must_use]
    pub fn precedence(&self) -> i32 {
        self.precedence
    }
}

/// A registered processor and its dialect.
///
/// Cloning is cheap. Two refs are the same processor only if they point to
/// the same instance.
pub struct ProcessorRef<P: ?Sized> {
    processor: Arc<P>,
    dialect: Arc<ProcessorDialect>,
}

/// Registered element tag processor.
pub type ElementProcessorRef = ProcessorRef<dyn ElementTagProcessor>;
/// Registered text processor.
pub type TextProcessorRef = ProcessorRef<dyn TextProcessor>;
/// Registered comment processor.
pub type CommentProcessorRef = ProcessorRef<dyn CommentProcessor>;

impl<P: ?Sized + Processor> ProcessorRef<P> {
    #[must_use]
    pub fn new(processor: Arc<P>, dialect: Arc<ProcessorDialect>) -> Self {
        Self { processor, dialect }
    }

    #[must_use]
    pub fn processor(&self) -> &P {
        &self.processor
    }

    #[must_use]
    pub fn dialect(&self) -> &ProcessorDialect {
        &self.dialect
    }

    /// Order by dialect precedence, then processor precedence.
    #[must_use]
    pub fn compare_precedence(&self, other: &Self) -> Ordering {
        self.dialect
            .precedence
            .cmp(&other.dialect.precedence)
            .then_with(|| self.processor.precedence().cmp(&other.processor.precedence()))
    }

    /// Whether both refs point to the same processor instance.
    #[must_use]
    pub fn is_same(&self, other: &Self) -> bool {
        std::ptr::addr_eq(Arc::as_ptr(&self.processor), Arc::as_ptr(&other.processor))
    }
}

impl<P: ?Sized> Clone for ProcessorRef<P> {
    fn clone(&self) -> Self {
        Self {
            processor: Arc::clone(&self.processor),
            dialect: Arc::clone(&self.dialect),
        }
    }
}

impl<P: ?Sized + Processor> fmt::Debug for ProcessorRef<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessorRef")
            .field("dialect", &self.dialect.name)
            .field("dialect_precedence", &self.dialect.precedence)
            .field("precedence", &self.processor.precedence())
            .finish()
    }
}

/// Stable sort by precedence. Ties are left in input order.
pub fn sort_by_precedence<P: ?Sized + Processor>(processors: &mut [ProcessorRef<P>]) {
    processors.sort_by(ProcessorRef::compare_precedence);
}

/// Fail if two distinct processors in a sorted list share a precedence.
///
/// # Errors
///
/// Returns [`MarkupError::IllegalState`] naming both dialects.
pub fn check_total_order<P: ?Sized + Processor>(
    processors: &[ProcessorRef<P>],
) -> Result<(), MarkupError> {
    for pair in processors.windows(2) {
        if pair[0].compare_precedence(&pair[1]) == Ordering::Equal && !pair[0].is_same(&pair[1]) {
            return Err(precedence_tie(&pair[0], &pair[1]));
        }
    }
    Ok(())
}

pub(crate) fn precedence_tie<P: ?Sized + Processor>(
    first: &ProcessorRef<P>,
    second: &ProcessorRef<P>,
) -> MarkupError {
    MarkupError::illegal_state(format!(
        "Two different processors have the same precedence {}/{} (dialects '{}' and '{}')",
        first.dialect.precedence,
        first.processor.precedence(),
        first.dialect.name,
        second.dialect.name,
    ))
}

/// Everything a processor can read about the render it runs in.
pub struct ProcessorContext<'a> {
    template_name: &'a str,
    template_mode: TemplateMode,
    variables: &'a LocalVariables,
    model_factory: &'a ModelFactory,
}

impl<'a> ProcessorContext<'a> {
    #[must_use]
    pub fn new(
        template_name: &'a str,
        template_mode: TemplateMode,
        variables: &'a LocalVariables,
        model_factory: &'a ModelFactory,
    ) -> Self {
        Self {
            template_name,
            template_mode,
            variables,
            model_factory,
        }
    }

    #[must_use]
    pub fn template_name(&self) -> &str {
        self.template_name
    }

    #[must_use]
    pub fn template_mode(&self) -> TemplateMode {
        self.template_mode
    }

    /// Variables in scope at the current element.
    #[must_use]
    pub fn variables(&self) -> &LocalVariables {
        self.variables
    }

    /// Factory for building replacement models.
    #[must_use]
    pub fn model_factory(&self) -> &ModelFactory {
        self.model_factory
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;

    #[test]
    fn test_compare_precedence_uses_dialect_first() {
        let low_dialect = ProcessorRef::new(
            Arc::new(NoopProcessor::for_attribute(TemplateMode::Html, "a:x", 900))
                as Arc<dyn ElementTagProcessor>,
            Arc::new(ProcessorDialect::new("a", None, 10)),
        );
        let high_dialect = ProcessorRef::new(
            Arc::new(NoopProcessor::for_attribute(TemplateMode::Html, "b:x", 100))
                as Arc<dyn ElementTagProcessor>,
            Arc::new(ProcessorDialect::new("b", None, 20)),
        );
        assert_eq!(low_dialect.compare_precedence(&high_dialect), Ordering::Less);
    }

    #[test]
    fn test_identity_is_by_instance() {
        let first = element_ref(NoopProcessor::for_attribute(TemplateMode::Html, "th:x", 1));
        let copy = first.clone();
        let other = element_ref(NoopProcessor::for_attribute(TemplateMode::Html, "th:x", 1));
        assert!(first.is_same(&copy));
        assert!(!first.is_same(&other));
    }

    #[test]
    fn test_check_total_order_rejects_ties() {
        let mut processors = vec![
            element_ref(NoopProcessor::for_attribute(TemplateMode::Html, "th:a", 5)),
            element_ref(NoopProcessor::for_attribute(TemplateMode::Html, "th:b", 5)),
        ];
        sort_by_precedence(&mut processors);
        let err = check_total_order(&processors).unwrap_err();
        assert!(matches!(err, MarkupError::IllegalState(_)));
    }

    #[test]
    fn test_sort_by_precedence() {
        let mut processors = vec![
            element_ref(NoopProcessor::for_attribute(TemplateMode::Html, "th:a", 30)),
            element_ref(NoopProcessor::for_attribute(TemplateMode::Html, "th:b", 10)),
            element_ref(NoopProcessor::for_attribute(TemplateMode::Html, "th:c", 20)),
        ];
        sort_by_precedence(&mut processors);
        let order: Vec<_> = processors.iter().map(|p| p.processor().precedence()).collect();
        assert_eq!(order, [10, 20, 30]);
        assert!(check_total_order(&processors).is_ok());
    }

    #[test]
    fn test_registration_reports_kind_properties() {
        let registration = ProcessorRegistration::element_tag(NoopProcessor::for_element(
            TemplateMode::Xml,
            "item",
            7,
        ));
        assert_eq!(registration.template_mode(), TemplateMode::Xml);
        assert_eq!(registration.precedence(), 7);
        let copy = registration.clone();
        assert_eq!(registration.address(), copy.address());
    }
}
