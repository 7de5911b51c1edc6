//! Engine configuration: validated dialects plus the definition registries
//! built from their processors.

use std::fmt;
use std::sync::Arc;

use weft_config::{Config, TemplateModeConfig};
use weft_markup::{
    AttributeDefinitions, CommentProcessorRef, ElementDefinitions, ModelFactory, TemplateMode,
    TextProcessorRef,
};

use crate::dialect::{Dialect, DialectConfiguration, DialectSetConfiguration};
use crate::error::ProcessingError;

/// Everything a render needs that does not change between templates.
///
/// Built once and shared: definitions are interned lazily behind their own
/// locks, so concurrent renders can use one configuration.
pub struct EngineConfiguration {
    template_mode: TemplateMode,
    dialect_set: DialectSetConfiguration,
    element_definitions: Arc<ElementDefinitions>,
    attribute_definitions: Arc<AttributeDefinitions>,
}

impl EngineConfiguration {
    /// Validate `dialects` and build the definition registries.
    pub fn new(template_mode: TemplateMode, dialects: &[DialectConfiguration]) -> Result<Self, ProcessingError> {
        let dialect_set = DialectSetConfiguration::build(dialects)?;
        let element_definitions = Arc::new(ElementDefinitions::new(dialect_set.element_processors())?);
        let attribute_definitions = Arc::new(AttributeDefinitions::new(dialect_set.element_processors())?);

        tracing::info!(
            template_mode = %template_mode,
            dialects = dialect_set.dialects().len(),
            processors = dialect_set.processor_count(),
            "Engine configured"
        );

        Ok(Self {
            template_mode,
            dialect_set,
            element_definitions,
            attribute_definitions,
        })
    }

    /// Build from a loaded `weft.toml`.
    ///
    /// Dialects disabled in `config` are left out, and a configured prefix
    /// replaces the dialect's own. Config entries naming no known dialect are
    /// logged and ignored.
    pub fn from_config(config: &Config, dialects: Vec<Arc<dyn Dialect>>) -> Result<Self, ProcessingError> {
        config.validate()?;

        for name in config.dialects.keys() {
            if !dialects.iter().any(|d| d.name() == name) {
                tracing::warn!(dialect = %name, "Configured dialect is not registered");
            }
        }

        let mut configurations = Vec::with_capacity(dialects.len());
        for dialect in dialects {
            match config.dialect(dialect.name()) {
                Some(settings) if !settings.enabled => {
                    tracing::debug!(dialect = dialect.name(), "Dialect disabled");
                }
                Some(settings) if settings.prefix.is_some() => {
                    configurations.push(DialectConfiguration::with_prefix(dialect, settings.prefix.as_deref()));
                }
                _ => configurations.push(DialectConfiguration::new(dialect)),
            }
        }

        let template_mode = match config.engine.template_mode {
            TemplateModeConfig::Html => TemplateMode::Html,
            TemplateModeConfig::Xml => TemplateMode::Xml,
        };
        Self::new(template_mode, &configurations)
    }

    /// Mode used by [`TemplateEngine::process`](crate::TemplateEngine::process).
    #[must_use]
    pub fn template_mode(&self) -> TemplateMode {
        self.template_mode
    }

    #[must_use]
    pub fn dialect_set(&self) -> &DialectSetConfiguration {
        &self.dialect_set
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
    pub fn text_processors(&self, template_mode: TemplateMode) -> &[TextProcessorRef] {
        self.dialect_set.text_processors(template_mode)
    }

    #[must_use]
    pub fn comment_processors(&self, template_mode: TemplateMode) -> &[CommentProcessorRef] {
        self.dialect_set.comment_processors(template_mode)
    }

    /// A model factory sharing this configuration's registries.
    #[must_use]
    pub fn model_factory(&self, template_mode: TemplateMode) -> ModelFactory {
        ModelFactory::new(
            template_mode,
            Arc::clone(&self.element_definitions),
            Arc::clone(&self.attribute_definitions),
        )
    }
}

impl fmt::Debug for EngineConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineConfiguration")
            .field("template_mode", &self.template_mode)
            .field("dialect_set", &self.dialect_set)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use weft_markup::event::Text;
    use weft_markup::{MarkupError, Processor, ProcessorContext, ProcessorRegistration, TextProcessor};

    struct Marker;

    impl Processor for Marker {
        fn template_mode(&self) -> TemplateMode {
            TemplateMode::Xml
        }

        fn precedence(&self) -> i32 {
            1
        }
    }

    impl TextProcessor for Marker {
        fn process(&self, _context: &ProcessorContext<'_>, _text: &mut Text) -> Result<(), MarkupError> {
            Ok(())
        }
    }

    struct Named(&'static str);

    impl Dialect for Named {
        fn name(&self) -> &str {
            self.0
        }

        fn prefix(&self) -> Option<&str> {
            Some("own")
        }

        fn processors(&self, _prefix: Option<&str>) -> Vec<ProcessorRegistration> {
            vec![ProcessorRegistration::text(Marker)]
        }
    }

    fn dialects() -> Vec<Arc<dyn Dialect>> {
        vec![Arc::new(Named("first")), Arc::new(Named("second"))]
    }

    #[test]
    fn test_from_config_defaults() {
        let configuration = EngineConfiguration::from_config(&Config::default(), vec![Arc::new(Named("only"))]).unwrap();
        assert_eq!(configuration.template_mode(), TemplateMode::Html);
        assert_eq!(configuration.text_processors(TemplateMode::Xml).len(), 1);
        assert!(configuration.text_processors(TemplateMode::Html).is_empty());
        assert_eq!(configuration.dialect_set().dialects()[0].prefix(), Some("own"));
    }

    #[test]
    fn test_from_config_applies_mode_prefix_and_enabled() {
        let config = Config::from_toml_str(
            r#"
[engine]
template_mode = "xml"

[dialects.first]
prefix = "f"

[dialects.second]
enabled = false
"#,
        )
        .unwrap();
        let configuration = EngineConfiguration::from_config(&config, dialects()).unwrap();

        assert_eq!(configuration.template_mode(), TemplateMode::Xml);
        let names: Vec<_> = configuration
            .dialect_set()
            .dialects()
            .iter()
            .map(|d| (d.name().to_owned(), d.prefix().map(str::to_owned)))
            .collect();
        assert_eq!(names, [("first".to_owned(), Some("f".to_owned()))]);
    }

    #[test]
    fn test_enabled_dialects_with_tied_processors_fail() {
        let result = EngineConfiguration::from_config(&Config::default(), dialects());
        assert!(matches!(
            result,
            Err(ProcessingError::Markup(MarkupError::IllegalState(_)))
        ));
    }

    #[test]
    fn test_model_factory_uses_requested_mode() {
        let configuration = EngineConfiguration::new(TemplateMode::Html, &[]).unwrap();
        assert_eq!(configuration.model_factory(TemplateMode::Xml).template_mode(), TemplateMode::Xml);
        assert!(Arc::ptr_eq(
            configuration.model_factory(TemplateMode::Html).element_definitions(),
            configuration.element_definitions()
        ));
    }
}
