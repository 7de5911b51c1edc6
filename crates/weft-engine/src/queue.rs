//! Replayable event queues.
//!
//! A queue holds owned events and replays them through a handler chain. Each
//! event is copied into a reusable buffer of its kind before dispatch, so
//! handlers may mutate what they receive while the queued originals stay
//! intact and can be replayed again.

use weft_markup::event::{
    AutoCloseElementTag, AutoOpenElementTag, CdataSection, CloseElementTag, Comment, DocType,
    OpenElementTag, ProcessingInstruction, StandaloneElementTag, Text, UnmatchedCloseElementTag,
    XmlDeclaration,
};
use weft_markup::{MarkupError, TemplateEvent, TemplateModel};

use crate::error::ProcessingError;
use crate::handler::TemplateHandler;

/// Copy `event` into the pooled buffer of its kind, creating it on first use.
fn reuse<'a, T: Clone>(slot: &'a mut Option<T>, event: &T, reset: fn(&mut T, &T)) -> &'a mut T {
    match slot {
        Some(buffer) => reset(buffer, event),
        None => *slot = Some(event.clone()),
    }
    slot.get_or_insert_with(|| event.clone())
}

/// Growable event buffer with one reusable instance per event kind.
#[derive(Debug, Default)]
pub struct EngineEventQueue {
    events: Vec<TemplateEvent>,
    text: Option<Text>,
    comment: Option<Comment>,
    cdata_section: Option<CdataSection>,
    doc_type: Option<DocType>,
    xml_declaration: Option<XmlDeclaration>,
    processing_instruction: Option<ProcessingInstruction>,
    open_element: Option<OpenElementTag>,
    standalone_element: Option<StandaloneElementTag>,
    close_element: Option<CloseElementTag>,
    auto_open_element: Option<AutoOpenElementTag>,
    auto_close_element: Option<AutoCloseElementTag>,
    unmatched_close_element: Option<UnmatchedCloseElementTag>,
}

impl EngineEventQueue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn add(&mut self, event: TemplateEvent) {
        self.events.push(event);
    }

    fn check_index(&self, index: usize) -> Result<(), MarkupError> {
        if index > self.events.len() {
            return Err(MarkupError::invalid_argument(format!(
                "Index {index} is out of bounds for a queue of {} events",
                self.events.len()
            )));
        }
        Ok(())
    }

    /// Insert `event` at `index`, shifting later events.
    pub fn insert(&mut self, index: usize, event: TemplateEvent) -> Result<(), MarkupError> {
        self.check_index(index)?;
        self.events.insert(index, event);
        Ok(())
    }

    /// Append a copy of every event of `model`.
    pub fn add_model(&mut self, model: &TemplateModel) {
        self.events.extend(model.iter().cloned());
    }

    /// Insert a copy of every event of `model` at `index`, keeping their order.
    pub fn insert_model(&mut self, index: usize, model: &TemplateModel) -> Result<(), MarkupError> {
        self.check_index(index)?;
        let tail = self.events.split_off(index);
        self.events.extend(model.iter().cloned());
        self.events.extend(tail);
        Ok(())
    }

    /// Append a copy of every event queued in `other`.
    pub fn add_queue(&mut self, other: &Self) {
        self.events.extend(other.events.iter().cloned());
    }

    /// Insert a copy of every event queued in `other` at `index`, keeping their order.
    pub fn insert_queue(&mut self, index: usize, other: &Self) -> Result<(), MarkupError> {
        self.check_index(index)?;
        let tail = self.events.split_off(index);
        self.events.extend(other.events.iter().cloned());
        self.events.extend(tail);
        Ok(())
    }

    /// Drop queued events, keeping buffers and capacity.
    pub fn reset(&mut self) {
        self.events.clear();
    }

    /// Replay every queued event through `handler`, in order.
    ///
    /// With `reset_after`, the queue is emptied once every event was
    /// handled successfully.
    pub fn process(&mut self, handler: &mut dyn TemplateHandler, reset_after: bool) -> Result<(), ProcessingError> {
        for event in &self.events {
            match event {
                TemplateEvent::Text(e) => {
                    handler.handle_text(reuse(&mut self.text, e, Text::reset_as_clone_of))?;
                }
                TemplateEvent::Comment(e) => {
                    handler.handle_comment(reuse(&mut self.comment, e, Comment::reset_as_clone_of))?;
                }
                TemplateEvent::CdataSection(e) => {
                    handler.handle_cdata_section(reuse(
                        &mut self.cdata_section,
                        e,
                        CdataSection::reset_as_clone_of,
                    ))?;
                }
                TemplateEvent::DocType(e) => {
                    handler.handle_doc_type(reuse(&mut self.doc_type, e, DocType::reset_as_clone_of))?;
                }
                TemplateEvent::XmlDeclaration(e) => {
                    handler.handle_xml_declaration(reuse(
                        &mut self.xml_declaration,
                        e,
                        XmlDeclaration::reset_as_clone_of,
                    ))?;
                }
                TemplateEvent::ProcessingInstruction(e) => {
                    handler.handle_processing_instruction(reuse(
                        &mut self.processing_instruction,
                        e,
                        ProcessingInstruction::reset_as_clone_of,
                    ))?;
                }
                TemplateEvent::OpenElement(e) => {
                    handler.handle_open_element(reuse(
                        &mut self.open_element,
                        e,
                        OpenElementTag::reset_as_clone_of,
                    ))?;
                }
                TemplateEvent::StandaloneElement(e) => {
                    handler.handle_standalone_element(reuse(
                        &mut self.standalone_element,
                        e,
                        StandaloneElementTag::reset_as_clone_of,
                    ))?;
                }
                TemplateEvent::CloseElement(e) => {
                    handler.handle_close_element(reuse(
                        &mut self.close_element,
                        e,
                        CloseElementTag::reset_as_clone_of,
                    ))?;
                }
                TemplateEvent::AutoOpenElement(e) => {
                    handler.handle_auto_open_element(reuse(
                        &mut self.auto_open_element,
                        e,
                        AutoOpenElementTag::reset_as_clone_of,
                    ))?;
                }
                TemplateEvent::AutoCloseElement(e) => {
                    handler.handle_auto_close_element(reuse(
                        &mut self.auto_close_element,
                        e,
                        AutoCloseElementTag::reset_as_clone_of,
                    ))?;
                }
                TemplateEvent::UnmatchedCloseElement(e) => {
                    handler.handle_unmatched_close_element(reuse(
                        &mut self.unmatched_close_element,
                        e,
                        UnmatchedCloseElementTag::reset_as_clone_of,
                    ))?;
                }
            }
        }
        if reset_after {
            self.reset();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::CollectingHandler;
    use pretty_assertions::assert_eq;

    /// Mutates every text it sees.
    struct Mangler<'a> {
        next: &'a mut CollectingHandler,
    }

    impl TemplateHandler for Mangler<'_> {
        fn next_handler(&mut self) -> Option<&mut dyn TemplateHandler> {
            Some(&mut *self.next)
        }

        fn handle_text(&mut self, text: &mut Text) -> Result<(), ProcessingError> {
            text.set_text("mangled");
            self.next.handle_text(text)
        }
    }

    fn rendered(events: &[TemplateEvent]) -> String {
        events.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_process_replays_in_order() {
        let mut queue = EngineEventQueue::new();
        queue.add(Text::new("b").into());
        queue.insert(0, Comment::new("a").into()).unwrap();
        queue.add(CdataSection::new("c").into());

        let mut collector = CollectingHandler::new();
        queue.process(&mut collector, true).unwrap();
        assert_eq!(rendered(collector.events()), "<!--a-->b<![CDATA[c]]>");
        assert!(queue.is_empty());
    }

    #[test]
    fn test_handlers_mutate_buffers_not_queued_events() {
        let mut queue = EngineEventQueue::new();
        queue.add(Text::new("one").into());
        queue.add(Text::new("two").into());

        let mut collector = CollectingHandler::new();
        queue
            .process(&mut Mangler { next: &mut collector }, false)
            .unwrap();
        assert_eq!(rendered(collector.events()), "mangledmangled");

        let mut second = CollectingHandler::new();
        queue.process(&mut second, false).unwrap();
        assert_eq!(rendered(second.events()), "onetwo");
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn test_insert_out_of_bounds() {
        let mut queue = EngineEventQueue::new();
        assert!(queue.insert(1, Text::new("x").into()).is_err());
    }

    #[test]
    fn test_add_model_and_queue() {
        let model = TemplateModel::from(vec![Text::new("m").into()]);
        let mut first = EngineEventQueue::new();
        first.add_model(&model);
        let mut second = EngineEventQueue::new();
        second.add(Comment::new("q").into());
        first.add_queue(&second);

        let mut collector = CollectingHandler::new();
        first.process(&mut collector, false).unwrap();
        assert_eq!(rendered(collector.events()), "m<!--q-->");
    }

    #[test]
    fn test_insert_model_and_queue_at_index() {
        let mut queue = EngineEventQueue::new();
        queue.add(Text::new("a").into());
        queue.add(Text::new("d").into());

        let model = TemplateModel::from(vec![Text::new("b").into(), Comment::new("c").into()]);
        queue.insert_model(1, &model).unwrap();
        let mut other = EngineEventQueue::new();
        other.add(Comment::new("start").into());
        queue.insert_queue(0, &other).unwrap();

        assert!(queue.insert_model(6, &model).is_err());
        assert!(queue.insert_queue(6, &other).is_err());
        assert_eq!(queue.len(), 5);

        let mut collector = CollectingHandler::new();
        queue.process(&mut collector, false).unwrap();
        assert_eq!(rendered(collector.events()), "<!--start-->ab<!--c-->d");
    }
}
