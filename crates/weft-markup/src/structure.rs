//! Structural decisions reported by element processors.
//!
//! A processor never restructures the document itself. It records at most one
//! major decision (replace the body, remove the element, iterate...) plus any
//! number of minor ones (local variables, selection target, text inlining) on
//! an [`ElementStructureHandler`], and the engine applies them once the
//! processor returns.

use serde_json::Value;

use crate::event::Text;
use crate::model::TemplateModel;

/// The structural outcome of one processor execution.
#[derive(Debug, Clone, PartialEq)]
pub enum StructureDecision {
    /// Replace everything between the open and close tags.
    SetBody { model: TemplateModel, processable: bool },
    /// Emit `model` before the element. Never processed.
    InsertBefore { model: TemplateModel },
    /// Emit `model` right after the open tag, before the body.
    InsertImmediatelyAfter { model: TemplateModel, processable: bool },
    /// Replace the whole element, tags included.
    ReplaceWith { model: TemplateModel, processable: bool },
    /// Drop the element, tags and body.
    RemoveElement,
    /// Drop the open and close tags, keep the body.
    RemoveTags,
    /// Keep the tags, drop the body.
    RemoveBody,
    /// Keep non-element children and the first child element only.
    RemoveAllButFirstChild,
    /// Render the element once per item.
    IterateElement {
        iteration_variable: String,
        status_variable: Option<String>,
        items: Vec<Value>,
    },
}

impl StructureDecision {
    /// Short name for logs.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::SetBody { .. } => "set_body",
            Self::InsertBefore { .. } => "insert_before",
            Self::InsertImmediatelyAfter { .. } => "insert_immediately_after",
            Self::ReplaceWith { .. } => "replace_with",
            Self::RemoveElement => "remove_element",
            Self::RemoveTags => "remove_tags",
            Self::RemoveBody => "remove_body",
            Self::RemoveAllButFirstChild => "remove_all_but_first_child",
            Self::IterateElement { .. } => "iterate_element",
        }
    }
}

/// A pending change to a local variable.
#[derive(Debug, Clone, PartialEq)]
pub enum LocalVariableChange {
    Set(Value),
    Remove,
}

/// Mailbox a processor writes its decisions to.
///
/// Reused across processors and tags: the engine calls
/// [`reset_all_but_local_variables`](Self::reset_all_but_local_variables)
/// between processors of one tag and [`reset`](Self::reset) between tags.
#[derive(Debug, Default)]
pub struct ElementStructureHandler {
    decision: Option<StructureDecision>,
    local_variables: Vec<(String, LocalVariableChange)>,
    selection_target: Option<Value>,
    text_inlining: Option<bool>,
}

impl ElementStructureHandler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear every decision.
    pub fn reset(&mut self) {
        self.reset_all_but_local_variables();
        self.local_variables.clear();
    }

    /// Clear every decision except local variable changes, which accumulate
    /// across the processors of one tag.
    pub fn reset_all_but_local_variables(&mut self) {
        self.decision = None;
        self.selection_target = None;
        self.text_inlining = None;
    }

    fn decide(&mut self, decision: StructureDecision) {
        self.decision = Some(decision);
    }

    /// Replace the body with a single text.
    pub fn set_body_text(&mut self, text: &str, processable: bool) {
        let mut model = TemplateModel::new();
        model.add(Text::new(text).into());
        self.set_body(model, processable);
    }

    pub fn set_body(&mut self, model: TemplateModel, processable: bool) {
        self.decide(StructureDecision::SetBody { model, processable });
    }

    pub fn insert_before(&mut self, model: TemplateModel) {
        self.decide(StructureDecision::InsertBefore { model });
    }

    pub fn insert_immediately_after(&mut self, model: TemplateModel, processable: bool) {
        self.decide(StructureDecision::InsertImmediatelyAfter { model, processable });
    }

    /// Replace the whole element with a single text.
    pub fn replace_with_text(&mut self, text: &str, processable: bool) {
        let mut model = TemplateModel::new();
        model.add(Text::new(text).into());
        self.replace_with(model, processable);
    }

    pub fn replace_with(&mut self, model: TemplateModel, processable: bool) {
        self.decide(StructureDecision::ReplaceWith { model, processable });
    }

    pub fn remove_element(&mut self) {
        self.decide(StructureDecision::RemoveElement);
    }

    pub fn remove_tags(&mut self) {
        self.decide(StructureDecision::RemoveTags);
    }

    pub fn remove_body(&mut self) {
        self.decide(StructureDecision::RemoveBody);
    }

    pub fn remove_all_but_first_child(&mut self) {
        self.decide(StructureDecision::RemoveAllButFirstChild);
    }

    /// Render the element once per item, with `iteration_variable` bound to
    /// the item and `status_variable`, if given, bound to
    /// `{index, count, size, first, last}`.
    pub fn iterate_element(
        &mut self,
        iteration_variable: &str,
        status_variable: Option<&str>,
        items: Vec<Value>,
    ) {
        self.decide(StructureDecision::IterateElement {
            iteration_variable: iteration_variable.to_owned(),
            status_variable: status_variable.map(str::to_owned),
            items,
        });
    }

    pub fn set_local_variable(&mut self, name: &str, value: Value) {
        self.change_local_variable(name, LocalVariableChange::Set(value));
    }

    pub fn remove_local_variable(&mut self, name: &str) {
        self.change_local_variable(name, LocalVariableChange::Remove);
    }

    fn change_local_variable(&mut self, name: &str, change: LocalVariableChange) {
        match self.local_variables.iter_mut().find(|(n, _)| n == name) {
            Some((_, slot)) => *slot = change,
            None => self.local_variables.push((name.to_owned(), change)),
        }
    }

    pub fn set_selection_target(&mut self, target: Value) {
        self.selection_target = Some(target);
    }

    pub fn set_text_inlining(&mut self, active: bool) {
        self.text_inlining = Some(active);
    }

    #[must_use]
    pub fn decision(&self) -> Option<&StructureDecision> {
        self.decision.as_ref()
    }

    /// Take the major decision, leaving none.
    pub fn take_decision(&mut self) -> Option<StructureDecision> {
        self.decision.take()
    }

    /// Pending local variable changes, in first-change order.
    pub fn local_variable_changes(&self) -> impl Iterator<Item = (&str, &LocalVariableChange)> {
        self.local_variables
            .iter()
            .map(|(name, change)| (name.as_str(), change))
    }

    #[must_use]
    pub fn selection_target(&self) -> Option<&Value> {
        self.selection_target.as_ref()
    }

    #[must_use]
    pub fn text_inlining(&self) -> Option<bool> {
        self.text_inlining
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_last_major_decision_wins() {
        let mut handler = ElementStructureHandler::new();
        handler.remove_body();
        handler.set_body_text("hello", false);
        match handler.decision() {
            Some(StructureDecision::SetBody { model, processable }) => {
                assert_eq!(model.to_string(), "hello");
                assert!(!processable);
            }
            other => panic!("unexpected decision: {other:?}"),
        }
        handler.remove_element();
        assert_eq!(handler.decision(), Some(&StructureDecision::RemoveElement));
    }

    #[test]
    fn test_local_variables_last_write_per_name() {
        let mut handler = ElementStructureHandler::new();
        handler.set_local_variable("a", json!(1));
        handler.set_local_variable("b", json!(2));
        handler.remove_local_variable("a");
        let changes: Vec<_> = handler.local_variable_changes().collect();
        assert_eq!(
            changes,
            [
                ("a", &LocalVariableChange::Remove),
                ("b", &LocalVariableChange::Set(json!(2)))
            ]
        );
    }

    #[test]
    fn test_reset_all_but_local_variables() {
        let mut handler = ElementStructureHandler::new();
        handler.set_local_variable("a", json!(1));
        handler.set_selection_target(json!({}));
        handler.set_text_inlining(false);
        handler.remove_tags();

        handler.reset_all_but_local_variables();
        assert!(handler.decision().is_none());
        assert!(handler.selection_target().is_none());
        assert!(handler.text_inlining().is_none());
        assert_eq!(handler.local_variable_changes().count(), 1);

        handler.reset();
        assert_eq!(handler.local_variable_changes().count(), 0);
    }

    #[test]
    fn test_iterate_element() {
        let mut handler = ElementStructureHandler::new();
        handler.iterate_element("item", Some("stat"), vec![json!(1), json!(2)]);
        let decision = handler.take_decision().unwrap();
        assert_eq!(decision.kind(), "iterate_element");
        assert!(handler.decision().is_none());
    }
}
