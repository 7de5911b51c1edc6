//! Processor-driven template engine.
//!
//! A template is tokenized by [`MarkupParser`], balanced into template events
//! by [`TemplateHandlerAdapter`], run through the processors of every
//! configured [`Dialect`] by [`ProcessorTemplateHandler`] and written out by
//! [`OutputTemplateHandler`]. [`TemplateEngine`] wires the chain together.
//!
//! # Example
//!
//! ```
//! use weft_engine::{EngineConfiguration, TemplateEngine};
//! use weft_markup::TemplateMode;
//!
//! let engine = TemplateEngine::new(EngineConfiguration::new(TemplateMode::Html, &[])?);
//! let output = engine.process_to_string("home", "<p>Hello<br></p>")?;
//! assert_eq!(output, "<p>Hello<br></p>");
//! # Ok::<(), weft_engine::ProcessingError>(())
//! ```

mod adapter;
mod configuration;
mod dialect;
mod engine;
mod error;
pub mod handler;
mod iterator;
mod output;
pub mod parser;
mod processor_handler;
mod queue;

pub use adapter::TemplateHandlerAdapter;
pub use configuration::EngineConfiguration;
pub use dialect::{DEFAULT_DIALECT_PRECEDENCE, Dialect, DialectConfiguration, DialectSetConfiguration};
pub use engine::TemplateEngine;
pub use error::ProcessingError;
pub use handler::{CollectingHandler, TemplateHandler};
pub use iterator::ElementProcessorIterator;
pub use output::OutputTemplateHandler;
pub use parser::{MarkupHandler, MarkupParser};
pub use processor_handler::ProcessorTemplateHandler;
pub use queue::EngineEventQueue;

#[cfg(test)]
mod tests {
    use super::*;

    static_assertions::assert_impl_all!(TemplateEngine: Send, Sync, Clone);
    static_assertions::assert_impl_all!(EngineConfiguration: Send, Sync);
    static_assertions::assert_impl_all!(DialectSetConfiguration: Send, Sync);
}
