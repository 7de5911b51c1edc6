//! Template handler chain.
//!
//! Handlers form a singly-linked pipeline that receives events in document
//! order. Every method forwards to [`next_handler`](TemplateHandler::next_handler)
//! by default, so a handler only overrides the events it cares about; the
//! last handler of the chain (usually the output) returns `None`.
//!
//! Events are passed as `&mut` to pooled instances owned by the caller. A
//! handler that needs an event after returning must clone it.

use weft_markup::TemplateEvent;
use weft_markup::event::{
    AutoCloseElementTag, AutoOpenElementTag, CdataSection, CloseElementTag, Comment, DocType,
    OpenElementTag, ProcessingInstruction, StandaloneElementTag, Text, UnmatchedCloseElementTag,
    XmlDeclaration,
};

use crate::error::ProcessingError;

macro_rules! forward {
    ($self:ident, $method:ident $(, $arg:ident)?) => {
        match $self.next_handler() {
            Some(next) => next.$method($($arg)?),
            None => Ok(()),
        }
    };
}

/// A step of the processing pipeline.
pub trait TemplateHandler {
    /// The handler events are forwarded to.
    fn next_handler(&mut self) -> Option<&mut dyn TemplateHandler> {
        None
    }

    fn handle_template_start(&mut self) -> Result<(), ProcessingError> {
        forward!(self, handle_template_start)
    }

    fn handle_template_end(&mut self) -> Result<(), ProcessingError> {
        forward!(self, handle_template_end)
    }

    fn handle_text(&mut self, text: &mut Text) -> Result<(), ProcessingError> {
        forward!(self, handle_text, text)
    }

    fn handle_comment(&mut self, comment: &mut Comment) -> Result<(), ProcessingError> {
        forward!(self, handle_comment, comment)
    }

    fn handle_cdata_section(&mut self, cdata_section: &mut CdataSection) -> Result<(), ProcessingError> {
        forward!(self, handle_cdata_section, cdata_section)
    }

    fn handle_doc_type(&mut self, doc_type: &mut DocType) -> Result<(), ProcessingError> {
        forward!(self, handle_doc_type, doc_type)
    }

    fn handle_xml_declaration(&mut self, xml_declaration: &mut XmlDeclaration) -> Result<(), ProcessingError> {
        forward!(self, handle_xml_declaration, xml_declaration)
    }

    fn handle_processing_instruction(
        &mut self,
        processing_instruction: &mut ProcessingInstruction,
    ) -> Result<(), ProcessingError> {
        forward!(self, handle_processing_instruction, processing_instruction)
    }

    fn handle_open_element(&mut self, tag: &mut OpenElementTag) -> Result<(), ProcessingError> {
        forward!(self, handle_open_element, tag)
    }

    fn handle_standalone_element(&mut self, tag: &mut StandaloneElementTag) -> Result<(), ProcessingError> {
        forward!(self, handle_standalone_element, tag)
    }

    fn handle_close_element(&mut self, tag: &mut CloseElementTag) -> Result<(), ProcessingError> {
        forward!(self, handle_close_element, tag)
    }

    fn handle_auto_open_element(&mut self, tag: &mut AutoOpenElementTag) -> Result<(), ProcessingError> {
        forward!(self, handle_auto_open_element, tag)
    }

    fn handle_auto_close_element(&mut self, tag: &mut AutoCloseElementTag) -> Result<(), ProcessingError> {
        forward!(self, handle_auto_close_element, tag)
    }

    fn handle_unmatched_close_element(
        &mut self,
        tag: &mut UnmatchedCloseElementTag,
    ) -> Result<(), ProcessingError> {
        forward!(self, handle_unmatched_close_element, tag)
    }
}

/// Dispatch a boxed event to the matching handler method.
pub fn dispatch(handler: &mut dyn TemplateHandler, event: &mut TemplateEvent) -> Result<(), ProcessingError> {
    match event {
        TemplateEvent::Text(e) => handler.handle_text(e),
        TemplateEvent::Comment(e) => handler.handle_comment(e),
        TemplateEvent::CdataSection(e) => handler.handle_cdata_section(e),
        TemplateEvent::DocType(e) => handler.handle_doc_type(e),
        TemplateEvent::XmlDeclaration(e) => handler.handle_xml_declaration(e),
        TemplateEvent::ProcessingInstruction(e) => handler.handle_processing_instruction(e),
        TemplateEvent::OpenElement(e) => handler.handle_open_element(e),
        TemplateEvent::StandaloneElement(e) => handler.handle_standalone_element(e),
        TemplateEvent::CloseElement(e) => handler.handle_close_element(e),
        TemplateEvent::AutoOpenElement(e) => handler.handle_auto_open_element(e),
        TemplateEvent::AutoCloseElement(e) => handler.handle_auto_close_element(e),
        TemplateEvent::UnmatchedCloseElement(e) => handler.handle_unmatched_close_element(e),
    }
}

/// Terminal handler collecting clones of every event it receives.
#[derive(Debug, Default)]
pub struct CollectingHandler {
    events: Vec<TemplateEvent>,
}

impl CollectingHandler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn events(&self) -> &[TemplateEvent] {
        &self.events
    }

    #[must_use]
    pub fn into_events(self) -> Vec<TemplateEvent> {
        self.events
    }

    fn collect(&mut self, event: impl Into<TemplateEvent>) -> Result<(), ProcessingError> {
        self.events.push(event.into());
        Ok(())
    }
}

impl TemplateHandler for CollectingHandler {
    fn handle_text(&mut self, text: &mut Text) -> Result<(), ProcessingError> {
        self.collect(text.clone())
    }

    fn handle_comment(&mut self, comment: &mut Comment) -> Result<(), ProcessingError> {
        self.collect(comment.clone())
    }

    fn handle_cdata_section(&mut self, cdata_section: &mut CdataSection) -> Result<(), ProcessingError> {
        self.collect(cdata_section.clone())
    }

    fn handle_doc_type(&mut self, doc_type: &mut DocType) -> Result<(), ProcessingError> {
        self.collect(doc_type.clone())
    }

    fn handle_xml_declaration(&mut self, xml_declaration: &mut XmlDeclaration) -> Result<(), ProcessingError> {
        self.collect(xml_declaration.clone())
    }

    fn handle_processing_instruction(
        &mut self,
        processing_instruction: &mut ProcessingInstruction,
    ) -> Result<(), ProcessingError> {
        self.collect(processing_instruction.clone())
    }

    fn handle_open_element(&mut self, tag: &mut OpenElementTag) -> Result<(), ProcessingError> {
        self.collect(tag.clone())
    }

    fn handle_standalone_element(&mut self, tag: &mut StandaloneElementTag) -> Result<(), ProcessingError> {
        self.collect(tag.clone())
    }

    fn handle_close_element(&mut self, tag: &mut CloseElementTag) -> Result<(), ProcessingError> {
        self.collect(tag.clone())
    }

    fn handle_auto_open_element(&mut self, tag: &mut AutoOpenElementTag) -> Result<(), ProcessingError> {
        self.collect(tag.clone())
    }

    fn handle_auto_close_element(&mut self, tag: &mut AutoCloseElementTag) -> Result<(), ProcessingError> {
        self.collect(tag.clone())
    }

    fn handle_unmatched_close_element(
        &mut self,
        tag: &mut UnmatchedCloseElementTag,
    ) -> Result<(), ProcessingError> {
        self.collect(tag.clone())
    }
}
