//! Project graph collaborators: workspace dependencies and implemented scripts.

use pipegraph_task_graph::Dag;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Answers whether a workspace implements a task.
///
/// A workspace that does not implement a task is never expected to run it.
pub trait ScriptRegistry {
    /// Whether `workspace` implements `task`.
    fn implements(&self, workspace: &str, task: &str) -> bool;
}

impl ScriptRegistry for HashMap<String, HashSet<String>> {
    fn implements(&self, workspace: &str, task: &str) -> bool {
        self.get(workspace).is_some_and(|tasks| tasks.contains(task))
    }
}

/// Manifest data for one workspace.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageInfo {
    /// Workspace name.
    pub name: String,
    /// Task name to command. Only the keys matter here.
    #[serde(default)]
    pub scripts: HashMap<String, String>,
}

impl PackageInfo {
    /// Create a package with no scripts.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            scripts: HashMap::new(),
        }
    }

    /// Add a script.
    #[must_use]
    pub fn with_script(mut self, task: impl Into<String>, command: impl Into<String>) -> Self {
        self.scripts.insert(task.into(), command.into());
        self
    }
}

/// Workspace dependency graph plus per-workspace manifests.
///
/// An edge `a -> b` in `workspace_graph` means workspace `a` depends on `b`.
#[derive(Debug, Clone, Default)]
pub struct CompleteGraph {
    /// Dependencies between workspaces.
    pub workspace_graph: Dag,
    /// Manifest data keyed by workspace name.
    pub package_infos: HashMap<String, PackageInfo>,
}

impl CompleteGraph {
    /// Create a project graph with no manifests.
    #[must_use]
    pub fn new(workspace_graph: Dag) -> Self {
        Self {
            workspace_graph,
            package_infos: HashMap::new(),
        }
    }

    /// Register the manifest of a workspace, adding it to the workspace graph.
    pub fn add_package(&mut self, info: PackageInfo) {
        self.workspace_graph.add_vertex(&info.name);
        self.package_infos.insert(info.name.clone(), info);
    }
}

impl ScriptRegistry for CompleteGraph {
    fn implements(&self, workspace: &str, task: &str) -> bool {
        self.package_infos
            .get(workspace)
            .is_some_and(|info| info.scripts.contains_key(task))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_complete_graph_implements() {
        let mut project = CompleteGraph::default();
        project.add_package(PackageInfo::new("web").with_script("dev", "next dev"));

        assert!(project.workspace_graph.contains("web"));
        assert!(project.implements("web", "dev"));
        assert!(!project.implements("web", "build"));
        assert!(!project.implements("api", "dev"));
    }

    #[test]
    fn test_script_set_implements() {
        let scripts = HashMap::from([(
            "web".to_string(),
            HashSet::from(["build".to_string()]),
        )]);

        assert!(scripts.implements("web", "build"));
        assert!(!scripts.implements("web", "dev"));
    }

    #[test]
    fn test_deserialize_package_info() {
        let info: PackageInfo = serde_json::from_str(
            r#"{"name": "web", "scripts": {"build": "tsc", "dev": "tsc -w"}}"#,
        )
        .unwrap();

        assert_eq!(info.name, "web");
        assert_eq!(info.scripts.len(), 2);
    }
}
