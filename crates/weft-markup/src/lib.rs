//! Markup model for the Weft template engine.
//!
//! This crate holds everything processors and the engine share:
//!
//! - [`ElementName`] / [`AttributeName`]: canonical names, split into an
//!   optional dialect prefix and a local name
//! - [`ElementDefinitions`] / [`AttributeDefinitions`]: thread-safe registries
//!   interning one definition per name, with the processors that statically
//!   apply to it
//! - [`event`]: one mutable, reusable type per markup construct
//! - [`ElementTagProcessor`], [`TextProcessor`], [`CommentProcessor`]: the
//!   processor contracts
//! - [`ElementStructureHandler`]: how a processor reports structural decisions
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use weft_markup::{AttributeDefinitions, ElementDefinitions, ModelFactory, TemplateMode};
//!
//! let factory = ModelFactory::new(
//!     TemplateMode::Html,
//!     Arc::new(ElementDefinitions::new(&[])?),
//!     Arc::new(AttributeDefinitions::new(&[])?),
//! );
//! let model = factory.element_with_text("p", &[("class", "lead")], "Hello")?;
//! assert_eq!(model.to_string(), "<p class=\"lead\">Hello</p>");
//! # Ok::<(), weft_markup::MarkupError>(())
//! ```

mod definition;
mod definitions;
mod error;
pub mod event;
mod model;
mod name;
mod processor;
mod repository;
pub mod span;
mod standard;
mod structure;
mod template_mode;
mod variables;

pub use definition::{AttributeDefinition, ElementDefinition, ElementType};
pub use definitions::{AttributeDefinitions, ElementDefinitions};
pub use error::MarkupError;
pub use event::{Location, TemplateEvent};
pub use model::{ModelFactory, TemplateModel};
pub use name::{AttributeName, ElementName, MatchingAttributeName, MatchingElementName};
pub use processor::{
    CommentProcessor, CommentProcessorRef, ElementProcessorRef, ElementTagProcessor, Processor,
    ProcessorContext, ProcessorDialect, ProcessorRef, ProcessorRegistration, TextProcessor,
    TextProcessorRef, check_total_order, sort_by_precedence,
};
pub use structure::{ElementStructureHandler, LocalVariableChange, StructureDecision};
pub use template_mode::TemplateMode;
pub use variables::LocalVariables;
