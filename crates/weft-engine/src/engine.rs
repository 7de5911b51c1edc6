//! Template engine facade.

use std::io::Write;
use std::sync::Arc;
use std::time::Instant;

use weft_markup::{LocalVariables, TemplateEvent, TemplateMode};

use crate::adapter::TemplateHandlerAdapter;
use crate::configuration::EngineConfiguration;
use crate::error::ProcessingError;
use crate::handler::{CollectingHandler, TemplateHandler};
use crate::output::OutputTemplateHandler;
use crate::parser::MarkupParser;
use crate::processor_handler::ProcessorTemplateHandler;

/// Processes templates against a shared [`EngineConfiguration`].
///
/// Cheap to clone; clones share the configuration and its registries.
#[derive(Debug, Clone)]
pub struct TemplateEngine {
    configuration: Arc<EngineConfiguration>,
}

impl TemplateEngine {
    #[must_use]
    pub fn new(configuration: EngineConfiguration) -> Self {
        Self {
            configuration: Arc::new(configuration),
        }
    }

    #[must_use]
    pub fn configuration(&self) -> &EngineConfiguration {
        &self.configuration
    }

    /// Process `source` in the configured template mode and write the result.
    pub fn process(&self, template_name: &str, source: &str, writer: &mut dyn Write) -> Result<(), ProcessingError> {
        self.process_with_mode(
            template_name,
            self.configuration.template_mode(),
            source,
            LocalVariables::new(),
            writer,
        )
    }

    /// Like [`process`](Self::process), with `variables` in scope for every processor.
    pub fn process_with_variables(
        &self,
        template_name: &str,
        source: &str,
        variables: LocalVariables,
        writer: &mut dyn Write,
    ) -> Result<(), ProcessingError> {
        self.process_with_mode(
            template_name,
            self.configuration.template_mode(),
            source,
            variables,
            writer,
        )
    }

    /// Process `source` as `template_mode`.
    ///
    /// Output already written when an error occurs is left in `writer`.
    pub fn process_with_mode(
        &self,
        template_name: &str,
        template_mode: TemplateMode,
        source: &str,
        variables: LocalVariables,
        writer: &mut dyn Write,
    ) -> Result<(), ProcessingError> {
        let start = Instant::now();
        let configuration = &*self.configuration;

        let mut output = OutputTemplateHandler::new(template_name, writer);
        let mut processor_handler = ProcessorTemplateHandler::new(
            template_name,
            configuration.model_factory(template_mode),
            configuration.text_processors(template_mode),
            configuration.comment_processors(template_mode),
            variables,
            &mut output,
        );
        self.tokenize(template_name, template_mode, source, &mut processor_handler)?;

        tracing::info!(
            template = template_name,
            template_mode = %template_mode,
            elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Processed template"
        );
        Ok(())
    }

    /// Process `source` in the configured mode and return the output.
    pub fn process_to_string(&self, template_name: &str, source: &str) -> Result<String, ProcessingError> {
        let mut out = Vec::with_capacity(source.len());
        self.process(template_name, source, &mut out)?;
        Ok(String::from_utf8_lossy(&out).into_owned())
    }

    /// Tokenize and balance `source` without running any processor.
    pub fn parse(
        &self,
        template_name: &str,
        template_mode: TemplateMode,
        source: &str,
    ) -> Result<Vec<TemplateEvent>, ProcessingError> {
        let mut collector = CollectingHandler::new();
        self.tokenize(template_name, template_mode, source, &mut collector)?;
        Ok(collector.into_events())
    }

    fn tokenize(
        &self,
        template_name: &str,
        template_mode: TemplateMode,
        source: &str,
        handler: &mut dyn TemplateHandler,
    ) -> Result<(), ProcessingError> {
        let configuration = &*self.configuration;
        let element_definitions = configuration.element_definitions();
        let mut adapter = TemplateHandlerAdapter::new(
            template_name,
            template_mode,
            Arc::clone(element_definitions),
            Arc::clone(configuration.attribute_definitions()),
            handler,
        );
        let source: Arc<str> = Arc::from(source);
        MarkupParser::new(template_mode, Arc::clone(element_definitions)).parse(template_name, &source, &mut adapter)
    }
}
