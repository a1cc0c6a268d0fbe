//! Task Registry: pipeline definitions keyed by name.

use crate::task::{Task, task_id};
use crate::{Error, Result};
use std::collections::HashMap;

/// Pipeline definitions keyed by bare task name or `workspace#task`.
#[derive(Debug, Clone, Default)]
pub struct TaskRegistry {
    tasks: HashMap<String, Task>,
}

impl TaskRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a definition keyed by `task.name`, replacing any previous one.
    pub fn add(&mut self, task: Task) {
        self.tasks.insert(task.name.clone(), task);
    }

    /// Get the definition registered under exactly `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Task> {
        self.tasks.get(name)
    }

    /// Check if a definition is registered under exactly `name`.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.tasks.contains_key(name)
    }

    /// Resolve the definition governing `task` when it runs in `workspace`.
    ///
    /// A `workspace#task` entry wins over the bare `task` entry.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TaskNotFound`] if neither entry exists.
    pub fn resolve(&self, workspace: &str, task: &str) -> Result<&Task> {
        let id = task_id(workspace, task);
        self.tasks
            .get(&id)
            .or_else(|| self.tasks.get(task))
            .ok_or_else(|| Error::TaskNotFound {
                task_id: id,
                task: task.to_string(),
            })
    }

    /// Number of registered definitions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Check if the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Iterate over all registered definitions.
    pub fn iter(&self) -> impl Iterator<Item = &Task> {
        self.tasks.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_replaces_existing_definition() {
        let mut registry = TaskRegistry::new();
        registry.add(Task::new("build").with_deps(["codegen"]));
        registry.add(Task::new("build"));

        assert_eq!(registry.len(), 1);
        assert!(registry.get("build").unwrap().deps.is_empty());
    }

    #[test]
    fn test_resolve_prefers_workspace_override() {
        let mut registry = TaskRegistry::new();
        registry.add(Task::new("dev"));
        registry.add(Task::new("web#dev").with_persistent(true));

        assert!(registry.resolve("web", "dev").unwrap().persistent);
        assert!(!registry.resolve("api", "dev").unwrap().persistent);
    }

    #[test]
    fn test_resolve_override_without_bare_definition() {
        let mut registry = TaskRegistry::new();
        registry.add(Task::new("web#dev"));

        assert!(registry.resolve("web", "dev").is_ok());
        let err = registry.resolve("api", "dev").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Could not find \"api#dev\" or \"dev\" in pipeline"
        );
    }
}
