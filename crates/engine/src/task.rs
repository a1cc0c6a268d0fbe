//! Task pipeline definitions and task identifiers.
//!
//! A task identifier names one concrete execution: `<workspace>#<task>`.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Separator between the workspace and task name in a task identifier.
pub const TASK_DELIMITER: &str = "#";

/// Prefix marking a `dependsOn` entry as a topological dependency.
pub const TOPOLOGICAL_PREFIX: &str = "^";

/// Build the identifier of `task` running in `workspace`.
#[must_use]
pub fn task_id(workspace: &str, task: &str) -> String {
    format!("{workspace}{TASK_DELIMITER}{task}")
}

/// Split a task identifier into `(workspace, task)`.
///
/// Returns `None` when the identifier is not workspace-qualified.
#[must_use]
pub fn split_task_id(id: &str) -> Option<(&str, &str)> {
    id.split_once(TASK_DELIMITER)
        .filter(|(workspace, task)| !workspace.is_empty() && !task.is_empty())
}

/// Whether `name` is workspace-qualified (`workspace#task`).
#[must_use]
pub fn is_package_task(name: &str) -> bool {
    split_task_id(name).is_some()
}

/// A named pipeline definition.
///
/// Registered under a bare name it applies to every workspace; registered
/// under `workspace#task` it overrides the bare definition for that workspace.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Registry key: bare task name or `workspace#task`.
    pub name: String,
    /// Tasks that must complete in every workspace this one depends on.
    #[serde(default)]
    pub topo_deps: HashSet<String>,
    /// Tasks that must complete first, bare (same workspace) or workspace-qualified.
    #[serde(default)]
    pub deps: HashSet<String>,
    /// The task never terminates on its own (dev servers, watchers).
    #[serde(default)]
    pub persistent: bool,
}

impl Task {
    /// Create a task with no dependencies.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Create a task from `dependsOn`-style entries.
    ///
    /// `^build` becomes a topological dependency on `build`; every other
    /// entry is kept as a same-workspace or workspace-qualified dependency.
    #[must_use]
    pub fn from_depends_on<I, S>(name: impl Into<String>, depends_on: I, persistent: bool) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut task = Self::new(name).with_persistent(persistent);
        for entry in depends_on {
            let entry = entry.as_ref();
            match entry.strip_prefix(TOPOLOGICAL_PREFIX) {
                Some(topo) => task.topo_deps.insert(topo.to_string()),
                None => task.deps.insert(entry.to_string()),
            };
        }
        task
    }

    /// Set the topological dependencies.
    #[must_use]
    pub fn with_topo_deps<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.topo_deps = names.into_iter().map(Into::into).collect();
        self
    }

    /// Set the direct dependencies.
    #[must_use]
    pub fn with_deps<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.deps = names.into_iter().map(Into::into).collect();
        self
    }

    /// Mark the task as persistent or not.
    #[must_use]
    pub fn with_persistent(mut self, persistent: bool) -> Self {
        self.persistent = persistent;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_id_round_trip() {
        let id = task_id("workspace-a", "build");
        assert_eq!(id, "workspace-a#build");
        assert_eq!(split_task_id(&id), Some(("workspace-a", "build")));
    }

    #[test]
    fn test_split_task_id_rejects_bare_names() {
        assert_eq!(split_task_id("build"), None);
        assert_eq!(split_task_id("#build"), None);
        assert_eq!(split_task_id("web#"), None);
        assert!(!is_package_task("build"));
        assert!(is_package_task("@scope/web#build"));
    }

    #[test]
    fn test_split_task_id_uses_first_delimiter() {
        assert_eq!(split_task_id("web#lint#fix"), Some(("web", "lint#fix")));
    }

    #[test]
    fn test_from_depends_on() {
        let task = Task::from_depends_on("build", ["^build", "codegen", "ui#tokens"], false);

        assert_eq!(task.topo_deps, HashSet::from(["build".to_string()]));
        assert_eq!(
            task.deps,
            HashSet::from(["codegen".to_string(), "ui#tokens".to_string()])
        );
        assert!(!task.persistent);
    }

    #[test]
    fn test_deserialize_task() {
        let task: Task = serde_json::from_str(
            r#"{"name": "dev", "topoDeps": ["dev"], "persistent": true}"#,
        )
        .unwrap();

        assert_eq!(
            task,
            Task::new("dev")
                .with_topo_deps(["dev"])
                .with_persistent(true)
        );
        assert!(task.deps.is_empty());
    }
}
