//! Element-scoped local variables.
//!
//! Levels follow element nesting: the engine opens a level at every open tag
//! and closes it at the matching close tag. A variable set at a level is
//! visible to every deeper level until that level closes; a removal hides
//! the variable the same way.

use serde_json::Value;

#[derive(Debug, Clone, Default)]
struct Level {
    // None marks a removal that hides outer values
    variables: Vec<(String, Option<Value>)>,
    selection_target: Option<Value>,
    text_inlining: Option<bool>,
}

impl Level {
    fn set(&mut self, name: &str, value: Option<Value>) {
        match self.variables.iter_mut().find(|(n, _)| n == name) {
            Some((_, slot)) => *slot = value,
            None => self.variables.push((name.to_owned(), value)),
        }
    }
}

/// Level-scoped variable store for one render.
#[derive(Debug, Clone)]
pub struct LocalVariables {
    levels: Vec<Level>,
}

impl Default for LocalVariables {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalVariables {
    #[must_use]
    pub fn new() -> Self {
        Self {
            levels: vec![Level::default()],
        }
    }

    /// Build a store whose root level holds `variables`.
    pub fn with_variables<I, K>(variables: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        let mut local = Self::new();
        for (name, value) in variables {
            local.set_variable(&name.into(), value);
        }
        local
    }

    /// Current nesting depth; the root level is 0.
    #[must_use]
    pub fn level(&self) -> usize {
        self.levels.len() - 1
    }

    pub fn increase_level(&mut self) {
        self.levels.push(Level::default());
    }

    /// Close the current level. The root level is never closed.
    pub fn decrease_level(&mut self) {
        if self.levels.len() > 1 {
            self.levels.pop();
        }
    }

    fn current(&mut self) -> &mut Level {
        let last = self.levels.len() - 1;
        &mut self.levels[last]
    }

    pub fn set_variable(&mut self, name: &str, value: Value) {
        self.current().set(name, Some(value));
    }

    /// Hide `name` until the current level closes.
    pub fn remove_variable(&mut self, name: &str) {
        self.current().set(name, None);
    }

    #[must_use]
    pub fn variable(&self, name: &str) -> Option<&Value> {
        self.levels
            .iter()
            .rev()
            .find_map(|level| level.variables.iter().find(|(n, _)| n == name))
            .and_then(|(_, value)| value.as_ref())
    }

    #[must_use]
    pub fn contains_variable(&self, name: &str) -> bool {
        self.variable(name).is_some()
    }

    /// Names of every visible variable, innermost first.
    #[must_use]
    pub fn variable_names(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        let mut visible = Vec::new();
        for level in self.levels.iter().rev() {
            for (name, value) in &level.variables {
                if seen.contains(&name.as_str()) {
                    continue;
                }
                seen.push(name);
                if value.is_some() {
                    visible.push(name.as_str());
                }
            }
        }
        visible
    }

    /// Innermost selection target.
    #[must_use]
    pub fn selection_target(&self) -> Option<&Value> {
        self.levels
            .iter()
            .rev()
            .find_map(|level| level.selection_target.as_ref())
    }

    pub fn set_selection_target(&mut self, target: Value) {
        self.current().selection_target = Some(target);
    }

    /// Whether text processors run at the current level. Defaults to `true`.
    #[must_use]
    pub fn is_text_inlining_active(&self) -> bool {
        self.levels
            .iter()
            .rev()
            .find_map(|level| level.text_inlining)
            .unwrap_or(true)
    }

    pub fn set_text_inlining(&mut self, active: bool) {
        self.current().text_inlining = Some(active);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_variables_scoped_to_levels() {
        let mut variables = LocalVariables::with_variables([("user", json!("ann"))]);
        variables.increase_level();
        variables.set_variable("item", json!(1));
        variables.set_variable("user", json!("bob"));
        assert_eq!(variables.level(), 1);
        assert_eq!(variables.variable("user"), Some(&json!("bob")));
        assert_eq!(variables.variable("item"), Some(&json!(1)));

        variables.decrease_level();
        assert_eq!(variables.variable("user"), Some(&json!("ann")));
        assert!(!variables.contains_variable("item"));
    }

    #[test]
    fn test_remove_hides_outer_value_until_level_closes() {
        let mut variables = LocalVariables::with_variables([("a", json!(1))]);
        variables.increase_level();
        variables.remove_variable("a");
        assert_eq!(variables.variable("a"), None);
        assert!(variables.variable_names().is_empty());
        variables.decrease_level();
        assert_eq!(variables.variable("a"), Some(&json!(1)));
    }

    #[test]
    fn test_root_level_never_closes() {
        let mut variables = LocalVariables::new();
        variables.set_variable("x", json!(true));
        variables.decrease_level();
        variables.decrease_level();
        assert_eq!(variables.level(), 0);
        assert!(variables.contains_variable("x"));
    }

    #[test]
    fn test_variable_names_innermost_first() {
        let mut variables = LocalVariables::with_variables([("a", json!(1)), ("b", json!(2))]);
        variables.increase_level();
        variables.set_variable("c", json!(3));
        variables.set_variable("a", json!(4));
        assert_eq!(variables.variable_names(), ["c", "a", "b"]);
    }

    #[test]
    fn test_selection_target_and_inlining() {
        let mut variables = LocalVariables::new();
        assert!(variables.is_text_inlining_active());
        assert!(variables.selection_target().is_none());

        variables.increase_level();
        variables.set_selection_target(json!({"name": "x"}));
        variables.set_text_inlining(false);
        variables.increase_level();
        assert_eq!(variables.selection_target(), Some(&json!({"name": "x"})));
        assert!(!variables.is_text_inlining_active());

        variables.decrease_level();
        variables.decrease_level();
        assert!(variables.is_text_inlining_active());
        assert!(variables.selection_target().is_none());
    }
}
