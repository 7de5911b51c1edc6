//! Per-tag processor iteration.
//!
//! Processors may add or remove attributes of the tag they run on, which can
//! change the set of processors that apply to it. The iterator hands out each
//! applicable processor exactly once, picking up processors introduced by
//! earlier ones even when they sort before processors already executed.
//!
//! # Algorithm
//!
//! ```text
//! next(tag)
//!   ├─ attributes unchanged since last call → scan forward from last position
//!   └─ attributes changed
//!        ├─ recompute the tag's processors (sorted)
//!        ├─ merge old and new lists in lock-step, carrying "visited" flags
//!        │    same instance  → carry flag
//!        │    new sorts first → unvisited (must run)
//!        │    old sorts first → dropped
//!        └─ scan from the start
//! ```

use std::cmp::Ordering;

use weft_markup::event::ProcessableTag;
use weft_markup::{ElementProcessorRef, MarkupError};

/// Stateful "next not-yet-executed processor" cursor for one tag.
///
/// Cloning snapshots the visited flags and position, so a replay can resume
/// with exactly the processors that had not run yet.
#[derive(Debug, Clone, Default)]
pub struct ElementProcessorIterator {
    processors: Vec<ElementProcessorRef>,
    visited: Vec<bool>,
    version: Option<u64>,
    position: usize,
}

impl ElementProcessorIterator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget everything, keeping allocated capacity.
    pub fn reset(&mut self) {
        self.processors.clear();
        self.visited.clear();
        self.version = None;
        self.position = 0;
    }

    pub fn reset_as_clone_of(&mut self, original: &Self) {
        self.clone_from(original);
    }

    /// Next processor to execute on `tag`, marking it visited.
    ///
    /// # Errors
    ///
    /// Returns [`MarkupError::IllegalState`] when two different processors
    /// share a precedence.
    pub fn next(&mut self, tag: &mut ProcessableTag) -> Result<Option<ElementProcessorRef>, MarkupError> {
        let version = tag.attributes().version();
        if self.version != Some(version) {
            let current = tag.associated_processors()?;
            self.reconcile(current)?;
            self.version = Some(version);
        }

        while self.position < self.processors.len() {
            let index = self.position;
            self.position += 1;
            if !self.visited[index] {
                self.visited[index] = true;
                return Ok(Some(self.processors[index].clone()));
            }
        }
        Ok(None)
    }

    fn reconcile(&mut self, current: &[ElementProcessorRef]) -> Result<(), MarkupError> {
        let mut visited = vec![false; current.len()];
        let (mut new_index, mut old_index) = (0, 0);

        while new_index < current.len() && old_index < self.processors.len() {
            let new = &current[new_index];
            let old = &self.processors[old_index];
            if new.is_same(old) {
                visited[new_index] = self.visited[old_index];
                new_index += 1;
                old_index += 1;
                continue;
            }
            match new.compare_precedence(old) {
                Ordering::Less => new_index += 1,
                Ordering::Greater => old_index += 1,
                Ordering::Equal => {
                    return Err(MarkupError::illegal_state(format!(
                        "Processors of dialects '{}' and '{}' have the same precedence",
                        new.dialect().name(),
                        old.dialect().name(),
                    )));
                }
            }
        }

        self.processors.clear();
        self.processors.extend_from_slice(current);
        self.visited = visited;
        self.position = 0;
        Ok(())
    }
}
