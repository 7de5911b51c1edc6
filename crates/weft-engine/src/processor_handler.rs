//! The handler that runs processors.
//!
//! [`ProcessorTemplateHandler`] sits between the tokenizer adapter and the
//! output. For every open or standalone tag it executes the applicable
//! element processors in precedence order, then applies their structural
//! decisions to the event stream:
//!
//! | Decision | Open tag | Body | Close tag |
//! |----------|----------|------|-----------|
//! | set body | kept | replaced | kept |
//! | remove body | kept | dropped | kept |
//! | remove all but first child | kept | first child element and non-elements | kept |
//! | remove tags | dropped | kept | dropped |
//! | replace with | dropped | dropped, model emitted instead | dropped |
//! | remove element | dropped | dropped | dropped |
//! | iterate | element gathered and replayed once per item | | |
//!
//! Decisions that keep the open tag let the remaining processors run; the
//! others stop processing of the tag. Processable models are replayed through
//! this handler (so their tags get processed too), the others go straight to
//! the next handler.

use serde_json::{Value, json};
use weft_markup::event::{
    AutoCloseElementTag, AutoOpenElementTag, CdataSection, CloseElementTag, Comment, DocType,
    ElementTag, OpenElementTag, ProcessableTag, ProcessingInstruction, StandaloneElementTag, Text,
    UnmatchedCloseElementTag, XmlDeclaration,
};
use weft_markup::{
    CommentProcessorRef, ElementStructureHandler, LocalVariableChange, LocalVariables, ModelFactory,
    ProcessorContext, StructureDecision, TemplateEvent, TemplateMode, TemplateModel, TextProcessorRef,
};

use crate::error::ProcessingError;
use crate::handler::{TemplateHandler, dispatch};
use crate::iterator::ElementProcessorIterator;
use crate::queue::EngineEventQueue;

/// What happens to the body of an element being processed.
#[derive(Debug, Clone, Copy)]
enum Body {
    Process,
    Skip,
    FirstChild { seen: bool },
}

/// An element whose close tag has not been seen yet.
#[derive(Debug)]
struct Frame {
    body: Body,
    /// Depth inside a dropped subtree of the body.
    skip_depth: usize,
    emit_close: bool,
}

impl Frame {
    fn skipping() -> Self {
        Self {
            body: Body::Skip,
            skip_depth: 0,
            emit_close: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EventKind {
    Open,
    Standalone,
    Close,
    Other,
}

enum BodyChange {
    Replace(TemplateModel, bool),
    Remove,
    FirstChild,
}

/// Decisions that end processing of a tag.
enum Ending {
    Replace(TemplateModel, bool),
    Remove,
    Iterate(Iteration),
}

struct Iteration {
    variable: String,
    status_variable: Option<String>,
    items: Vec<Value>,
    /// Progress on the iterated tag, so replays only run the remaining processors.
    iterator: ElementProcessorIterator,
    scope: Scope,
}

/// Minor decisions taken on a tag before it was iterated, restored in every iteration.
#[derive(Default)]
struct Scope {
    local_variables: Vec<(String, LocalVariableChange)>,
    selection_target: Option<Value>,
    text_inlining: Option<bool>,
}

impl Scope {
    fn apply(&self, variables: &mut LocalVariables) {
        for (name, change) in &self.local_variables {
            match change {
                LocalVariableChange::Set(value) => variables.set_variable(name, value.clone()),
                LocalVariableChange::Remove => variables.remove_variable(name),
            }
        }
        if let Some(target) = &self.selection_target {
            variables.set_selection_target(target.clone());
        }
        if let Some(active) = self.text_inlining {
            variables.set_text_inlining(active);
        }
    }
}

/// Accumulated decisions of every processor executed on one tag.
#[derive(Default)]
struct TagOutcome {
    remove_tags: bool,
    after: Option<(TemplateModel, bool)>,
    body: Option<BodyChange>,
    ending: Option<Ending>,
}

/// An iterated element being buffered until its close tag.
struct Gathering {
    model: TemplateModel,
    depth: usize,
    iteration: Iteration,
}

/// Open tags that can start an element: parsed and auto-inserted ones.
trait OpeningTag: Clone + Into<TemplateEvent> {
    fn processable(&mut self) -> &mut ProcessableTag;

    fn forward(&mut self, next: &mut dyn TemplateHandler) -> Result<(), ProcessingError>;
}

impl OpeningTag for OpenElementTag {
    fn processable(&mut self) -> &mut ProcessableTag {
        self.tag_mut()
    }

    fn forward(&mut self, next: &mut dyn TemplateHandler) -> Result<(), ProcessingError> {
        next.handle_open_element(self)
    }
}

impl OpeningTag for AutoOpenElementTag {
    fn processable(&mut self) -> &mut ProcessableTag {
        self.tag_mut()
    }

    fn forward(&mut self, next: &mut dyn TemplateHandler) -> Result<(), ProcessingError> {
        next.handle_auto_open_element(self)
    }
}

/// Runs processors and applies their decisions for one render.
pub struct ProcessorTemplateHandler<'a> {
    template_name: String,
    template_mode: TemplateMode,
    model_factory: ModelFactory,
    text_processors: &'a [TextProcessorRef],
    comment_processors: &'a [CommentProcessorRef],
    next: &'a mut dyn TemplateHandler,
    variables: LocalVariables,
    structure: ElementStructureHandler,
    frames: Vec<Frame>,
    /// Frames below this index belong to the stream around a model being replayed.
    floor: usize,
    gathering: Option<Gathering>,
    resume: Option<ElementProcessorIterator>,
    iterators: Vec<ElementProcessorIterator>,
    queues: Vec<EngineEventQueue>,
}

impl<'a> ProcessorTemplateHandler<'a> {
    pub fn new(
        template_name: &str,
        model_factory: ModelFactory,
        text_processors: &'a [TextProcessorRef],
        comment_processors: &'a [CommentProcessorRef],
        variables: LocalVariables,
        next: &'a mut dyn TemplateHandler,
    ) -> Self {
        Self {
            template_name: template_name.to_owned(),
            template_mode: model_factory.template_mode(),
            model_factory,
            text_processors,
            comment_processors,
            next,
            variables,
            structure: ElementStructureHandler::new(),
            frames: Vec::new(),
            floor: 0,
            gathering: None,
            resume: None,
            iterators: Vec::new(),
            queues: Vec::new(),
        }
    }

    #[must_use]
    pub fn variables(&self) -> &LocalVariables {
        &self.variables
    }

    /// Whether an event reaches processing, given the element it appears in.
    fn admit(&mut self, kind: EventKind) -> bool {
        if self.frames.len() <= self.floor {
            return true;
        }
        let Some(frame) = self.frames.last_mut() else {
            return true;
        };
        if frame.skip_depth > 0 {
            match kind {
                EventKind::Open => frame.skip_depth += 1,
                EventKind::Close => frame.skip_depth -= 1,
                EventKind::Standalone | EventKind::Other => {}
            }
            return false;
        }
        match (&mut frame.body, kind) {
            (_, EventKind::Close) | (Body::Process, _) | (Body::FirstChild { .. }, EventKind::Other) => true,
            (Body::Skip, EventKind::Open) => {
                frame.skip_depth = 1;
                false
            }
            (Body::Skip, _) => false,
            (Body::FirstChild { seen }, EventKind::Open | EventKind::Standalone) => {
                if !*seen {
                    *seen = true;
                    return true;
                }
                if kind == EventKind::Open {
                    frame.skip_depth = 1;
                }
                false
            }
        }
    }

    /// Buffer `event` for the pending iteration; runs it once the element closes.
    fn gather(&mut self, event: TemplateEvent) -> Result<(), ProcessingError> {
        let Some(gathering) = self.gathering.as_mut() else {
            return Ok(());
        };
        let mut complete = false;
        if event.is_element_open() {
            gathering.depth += 1;
        } else if event.is_element_close() {
            if gathering.depth == 0 {
                complete = true;
            } else {
                gathering.depth -= 1;
            }
        }
        gathering.model.add(event);
        if complete {
            return self.flush_gathering();
        }
        Ok(())
    }

    fn flush_gathering(&mut self) -> Result<(), ProcessingError> {
        match self.gathering.take() {
            Some(gathering) => self.iterate(&gathering.model, gathering.iteration),
            None => Ok(()),
        }
    }

    fn iterate(&mut self, model: &TemplateModel, iteration: Iteration) -> Result<(), ProcessingError> {
        let size = iteration.items.len();
        for (index, item) in iteration.items.into_iter().enumerate() {
            self.variables.increase_level();
            iteration.scope.apply(&mut self.variables);
            self.variables.set_variable(&iteration.variable, item);
            if let Some(status) = &iteration.status_variable {
                let status_value = json!({
                    "index": index,
                    "count": index + 1,
                    "size": size,
                    "first": index == 0,
                    "last": index + 1 == size,
                });
                self.variables.set_variable(status, status_value);
            }
            self.resume = Some(iteration.iterator.clone());
            let result = self.replay(model, true);
            self.resume = None;
            self.variables.decrease_level();
            result?;
        }
        Ok(())
    }

    /// Emit `model`, through this handler when processable.
    fn replay(&mut self, model: &TemplateModel, processable: bool) -> Result<(), ProcessingError> {
        if model.is_empty() {
            return Ok(());
        }
        if !processable {
            for event in model {
                let mut event = event.clone();
                dispatch(&mut *self.next, &mut event)?;
            }
            return Ok(());
        }

        let floor = std::mem::replace(&mut self.floor, self.frames.len());
        let mut queue = self.queues.pop().unwrap_or_default();
        queue.add_model(model);
        let mut result = queue.process(self, true);
        if result.is_ok() {
            // an iterated element the model never closed
            result = self.flush_gathering();
        }
        queue.reset();
        self.queues.push(queue);

        // elements the model left open
        while self.frames.len() > self.floor {
            self.frames.pop();
            self.variables.decrease_level();
        }
        self.floor = floor;
        result
    }

    /// Execute every applicable processor on `tag`, collecting decisions.
    fn run_processors(&mut self, tag: &mut ProcessableTag) -> Result<TagOutcome, ProcessingError> {
        let mut iterator = match self.resume.take() {
            Some(iterator) => iterator,
            None => {
                let mut iterator = self.iterators.pop().unwrap_or_default();
                iterator.reset();
                iterator
            }
        };
        self.structure.reset();

        let mut outcome = TagOutcome::default();
        let mut scope = Scope::default();
        while let Some(processor) = iterator.next(tag)? {
            tracing::trace!(
                dialect = processor.dialect().name(),
                precedence = processor.processor().precedence(),
                element = tag.element_name(),
                "Executing processor"
            );
            self.structure.reset_all_but_local_variables();
            let context = ProcessorContext::new(
                &self.template_name,
                self.template_mode,
                &self.variables,
                &self.model_factory,
            );
            processor
                .processor()
                .process(&context, tag, &mut self.structure)
                .map_err(|err| ProcessingError::processor(&self.template_name, tag.location(), &err))?;

            self.apply_minor_decisions();
            if let Some(target) = self.structure.selection_target() {
                scope.selection_target = Some(target.clone());
            }
            if let Some(active) = self.structure.text_inlining() {
                scope.text_inlining = Some(active);
            }

            let Some(decision) = self.structure.take_decision() else {
                continue;
            };
            tracing::debug!(
                decision = decision.kind(),
                element = tag.element_name(),
                template = %self.template_name,
                "Applying structure decision"
            );
            match decision {
                StructureDecision::InsertBefore { model } => self.replay(&model, false)?,
                StructureDecision::InsertImmediatelyAfter { model, processable } => {
                    outcome.after = Some((model, processable));
                }
                StructureDecision::SetBody { model, processable } => {
                    outcome.body = Some(BodyChange::Replace(model, processable));
                }
                StructureDecision::RemoveBody => outcome.body = Some(BodyChange::Remove),
                StructureDecision::RemoveAllButFirstChild => outcome.body = Some(BodyChange::FirstChild),
                StructureDecision::RemoveTags => outcome.remove_tags = true,
                StructureDecision::ReplaceWith { model, processable } => {
                    outcome.ending = Some(Ending::Replace(model, processable));
                    break;
                }
                StructureDecision::RemoveElement => {
                    outcome.ending = Some(Ending::Remove);
                    break;
                }
                StructureDecision::IterateElement {
                    iteration_variable,
                    status_variable,
                    items,
                } => {
                    scope.local_variables = self
                        .structure
                        .local_variable_changes()
                        .map(|(name, change)| (name.to_owned(), change.clone()))
                        .collect();
                    outcome.ending = Some(Ending::Iterate(Iteration {
                        variable: iteration_variable,
                        status_variable,
                        items,
                        iterator: iterator.clone(),
                        scope,
                    }));
                    break;
                }
            }
        }

        self.structure.reset();
        self.iterators.push(iterator);
        Ok(outcome)
    }

    fn apply_minor_decisions(&mut self) {
        for (name, change) in self.structure.local_variable_changes() {
            match change {
                LocalVariableChange::Set(value) => self.variables.set_variable(name, value.clone()),
                LocalVariableChange::Remove => self.variables.remove_variable(name),
            }
        }
        if let Some(target) = self.structure.selection_target() {
            self.variables.set_selection_target(target.clone());
        }
        if let Some(active) = self.structure.text_inlining() {
            self.variables.set_text_inlining(active);
        }
    }

    fn process_open<T: OpeningTag>(&mut self, tag: &mut T) -> Result<(), ProcessingError> {
        self.variables.increase_level();
        let outcome = self.run_processors(tag.processable())?;

        match outcome.ending {
            Some(Ending::Remove) => self.frames.push(Frame::skipping()),
            Some(Ending::Replace(model, processable)) => {
                self.frames.push(Frame::skipping());
                self.replay(&model, processable)?;
            }
            Some(Ending::Iterate(iteration)) => {
                // every replay opens its own level
                self.variables.decrease_level();
                self.gathering = Some(Gathering {
                    model: TemplateModel::from(vec![tag.clone().into()]),
                    depth: 0,
                    iteration,
                });
            }
            None => {
                if !outcome.remove_tags {
                    tag.forward(&mut *self.next)?;
                }
                let body = match outcome.body {
                    None => Body::Process,
                    Some(BodyChange::Replace(..) | BodyChange::Remove) => Body::Skip,
                    Some(BodyChange::FirstChild) => Body::FirstChild { seen: false },
                };
                self.frames.push(Frame {
                    body,
                    skip_depth: 0,
                    emit_close: !outcome.remove_tags,
                });
                if let Some((model, processable)) = outcome.after {
                    self.replay(&model, processable)?;
                }
                if let Some(BodyChange::Replace(model, processable)) = outcome.body {
                    self.replay(&model, processable)?;
                }
            }
        }
        Ok(())
    }

    fn process_standalone(&mut self, tag: &mut StandaloneElementTag) -> Result<(), ProcessingError> {
        self.variables.increase_level();
        let outcome = self.run_processors(tag.tag_mut())?;

        if let Some(Ending::Iterate(iteration)) = outcome.ending {
            self.variables.decrease_level();
            let model = TemplateModel::from(vec![tag.clone().into()]);
            return self.iterate(&model, iteration);
        }

        let result = self.emit_standalone(tag, outcome);
        self.variables.decrease_level();
        result
    }

    fn emit_standalone(&mut self, tag: &mut StandaloneElementTag, outcome: TagOutcome) -> Result<(), ProcessingError> {
        match outcome.ending {
            Some(Ending::Remove | Ending::Iterate(_)) => return Ok(()),
            Some(Ending::Replace(model, processable)) => return self.replay(&model, processable),
            None => {}
        }

        let Some(BodyChange::Replace(body, body_processable)) = outcome.body else {
            if !outcome.remove_tags {
                self.next.handle_standalone_element(tag)?;
            }
            if let Some((model, processable)) = outcome.after {
                self.replay(&model, processable)?;
            }
            return Ok(());
        };

        // a body on a standalone tag turns it into an open/close pair
        let processable_tag = tag.tag().clone();
        let mut close = CloseElementTag::new(ElementTag::new(
            std::sync::Arc::clone(processable_tag.element_definition()),
            processable_tag.element_name(),
            processable_tag.location(),
        ));
        if !outcome.remove_tags {
            self.next.handle_open_element(&mut OpenElementTag::new(processable_tag))?;
        }
        if let Some((model, processable)) = outcome.after {
            self.replay(&model, processable)?;
        }
        self.replay(&body, body_processable)?;
        if !outcome.remove_tags {
            self.next.handle_close_element(&mut close)?;
        }
        Ok(())
    }

    fn close_frame(&mut self) -> Option<Frame> {
        if self.frames.len() <= self.floor {
            return None;
        }
        let frame = self.frames.pop()?;
        self.variables.decrease_level();
        Some(frame)
    }
}

impl TemplateHandler for ProcessorTemplateHandler<'_> {
    fn next_handler(&mut self) -> Option<&mut dyn TemplateHandler> {
        Some(&mut *self.next)
    }

    fn handle_template_end(&mut self) -> Result<(), ProcessingError> {
        self.flush_gathering()?;
        self.next.handle_template_end()
    }

    fn handle_text(&mut self, text: &mut Text) -> Result<(), ProcessingError> {
        if self.gathering.is_some() {
            return self.gather(text.clone().into());
        }
        if !self.admit(EventKind::Other) {
            return Ok(());
        }
        if self.variables.is_text_inlining_active() {
            let context = ProcessorContext::new(
                &self.template_name,
                self.template_mode,
                &self.variables,
                &self.model_factory,
            );
            for processor in self.text_processors {
                processor
                    .processor()
                    .process(&context, text)
                    .map_err(|err| ProcessingError::processor(&self.template_name, text.location(), &err))?;
            }
        }
        self.next.handle_text(text)
    }

    fn handle_comment(&mut self, comment: &mut Comment) -> Result<(), ProcessingError> {
        if self.gathering.is_some() {
            return self.gather(comment.clone().into());
        }
        if !self.admit(EventKind::Other) {
            return Ok(());
        }
        let context = ProcessorContext::new(
            &self.template_name,
            self.template_mode,
            &self.variables,
            &self.model_factory,
        );
        for processor in self.comment_processors {
            processor
                .processor()
                .process(&context, comment)
                .map_err(|err| ProcessingError::processor(&self.template_name, comment.location(), &err))?;
        }
        self.next.handle_comment(comment)
    }

    fn handle_cdata_section(&mut self, cdata_section: &mut CdataSection) -> Result<(), ProcessingError> {
        if self.gathering.is_some() {
            return self.gather(cdata_section.clone().into());
        }
        if !self.admit(EventKind::Other) {
            return Ok(());
        }
        self.next.handle_cdata_section(cdata_section)
    }

    fn handle_doc_type(&mut self, doc_type: &mut DocType) -> Result<(), ProcessingError> {
        if self.gathering.is_some() {
            return self.gather(doc_type.clone().into());
        }
        if !self.admit(EventKind::Other) {
            return Ok(());
        }
        self.next.handle_doc_type(doc_type)
    }

    fn handle_xml_declaration(&mut self, xml_declaration: &mut XmlDeclaration) -> Result<(), ProcessingError> {
        if self.gathering.is_some() {
            return self.gather(xml_declaration.clone().into());
        }
        if !self.admit(EventKind::Other) {
            return Ok(());
        }
        self.next.handle_xml_declaration(xml_declaration)
    }

    fn handle_processing_instruction(
        &mut self,
        processing_instruction: &mut ProcessingInstruction,
    ) -> Result<(), ProcessingError> {
        if self.gathering.is_some() {
            return self.gather(processing_instruction.clone().into());
        }
        if !self.admit(EventKind::Other) {
            return Ok(());
        }
        self.next.handle_processing_instruction(processing_instruction)
    }

    fn handle_open_element(&mut self, tag: &mut OpenElementTag) -> Result<(), ProcessingError> {
        if self.gathering.is_some() {
            return self.gather(tag.clone().into());
        }
        if !self.admit(EventKind::Open) {
            return Ok(());
        }
        self.process_open(tag)
    }

    fn handle_auto_open_element(&mut self, tag: &mut AutoOpenElementTag) -> Result<(), ProcessingError> {
        if self.gathering.is_some() {
            return self.gather(tag.clone().into());
        }
        if !self.admit(EventKind::Open) {
            return Ok(());
        }
        self.process_open(tag)
    }

    fn handle_standalone_element(&mut self, tag: &mut StandaloneElementTag) -> Result<(), ProcessingError> {
        if self.gathering.is_some() {
            return self.gather(tag.clone().into());
        }
        if !self.admit(EventKind::Standalone) {
            return Ok(());
        }
        self.process_standalone(tag)
    }

    fn handle_close_element(&mut self, tag: &mut CloseElementTag) -> Result<(), ProcessingError> {
        if self.gathering.is_some() {
            return self.gather(tag.clone().into());
        }
        if !self.admit(EventKind::Close) {
            return Ok(());
        }
        match self.close_frame() {
            Some(frame) if !frame.emit_close => Ok(()),
            _ => self.next.handle_close_element(tag),
        }
    }

    fn handle_auto_close_element(&mut self, tag: &mut AutoCloseElementTag) -> Result<(), ProcessingError> {
        if self.gathering.is_some() {
            return self.gather(tag.clone().into());
        }
        if !self.admit(EventKind::Close) {
            return Ok(());
        }
        match self.close_frame() {
            Some(frame) if !frame.emit_close => Ok(()),
            _ => self.next.handle_auto_close_element(tag),
        }
    }

    fn handle_unmatched_close_element(
        &mut self,
        tag: &mut UnmatchedCloseElementTag,
    ) -> Result<(), ProcessingError> {
        if self.gathering.is_some() {
            return self.gather(tag.clone().into());
        }
        if !self.admit(EventKind::Other) {
            return Ok(());
        }
        self.next.handle_unmatched_close_element(tag)
    }
}
