//! Persistent dependency validation.
//!
//! A persistent task never completes, so nothing may wait for it.

use crate::engine::Engine;
use crate::project::ScriptRegistry;
use crate::task::split_task_id;
use crate::{Error, Result};
use std::fmt;
use tracing::{debug, trace};

/// An edge whose dependency is a persistent task.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PersistentDependencyViolation {
    /// The persistent task being depended on.
    pub persistent_task: String,
    /// The task that would wait on it forever.
    pub dependent: String,
}

impl fmt::Display for PersistentDependencyViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "\"{}\" is a persistent task, \"{}\" cannot depend on it",
            self.persistent_task, self.dependent
        )
    }
}

impl Engine<'_> {
    /// Reject every edge of the task graph that targets a persistent task.
    ///
    /// All edges are checked before returning. A dependency only counts when
    /// its workspace implements the task per `scripts`. Dependencies with no
    /// resolvable definition are not persistent and are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PersistentDependencies`] listing every violation, in
    /// no particular order, or [`Error::CycleDetected`] if edges added with
    /// [`Engine::add_dep`] made the graph cyclic.
    #[tracing::instrument(name = "validate_persistent_dependencies", skip_all)]
    pub fn validate_persistent_dependencies<S>(&self, scripts: &S) -> Result<()>
    where
        S: ScriptRegistry + Sync,
    {
        let graph = self.task_graph();

        let failures = graph.walk(|dependent| {
            let violations: Vec<PersistentDependencyViolation> = graph
                .down_edges(dependent)
                .into_iter()
                .filter(|dependency| self.is_running_persistent(dependency, scripts))
                .map(|dependency| PersistentDependencyViolation {
                    persistent_task: dependency.to_string(),
                    dependent: dependent.to_string(),
                })
                .collect();

            if violations.is_empty() {
                Ok(())
            } else {
                Err(violations)
            }
        })?;

        let violations: Vec<_> = failures.into_iter().flatten().collect();
        if violations.is_empty() {
            return Ok(());
        }

        debug!(count = violations.len(), "Persistent dependency violations found");
        Err(Error::PersistentDependencies { violations })
    }

    /// Whether `id` is governed by a persistent definition and its workspace runs it.
    fn is_running_persistent<S>(&self, id: &str, scripts: &S) -> bool
    where
        S: ScriptRegistry,
    {
        let Some((workspace, task)) = split_task_id(id) else {
            return false;
        };

        match self.tasks().resolve(workspace, task) {
            Ok(definition) => definition.persistent && scripts.implements(workspace, task),
            Err(_) => {
                trace!(task = id, "No definition for dependency, skipping");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{EngineBuildingOptions, Task};
    use pipegraph_task_graph::Dag;
    use std::collections::{HashMap, HashSet};

    fn all_scripts(workspaces: &[&str], tasks: &[&str]) -> HashMap<String, HashSet<String>> {
        workspaces
            .iter()
            .map(|w| {
                (
                    (*w).to_string(),
                    tasks.iter().map(|t| (*t).to_string()).collect(),
                )
            })
            .collect()
    }

    #[test]
    fn test_violation_message() {
        let violation = PersistentDependencyViolation {
            persistent_task: "ui#dev".to_string(),
            dependent: "web#dev".to_string(),
        };
        assert_eq!(
            violation.to_string(),
            "\"ui#dev\" is a persistent task, \"web#dev\" cannot depend on it"
        );
    }

    #[test]
    fn test_empty_graph_is_valid() {
        let workspaces = Dag::new();
        let engine = Engine::new(&workspaces);
        assert!(
            engine
                .validate_persistent_dependencies(&all_scripts(&[], &[]))
                .is_ok()
        );
    }

    #[test]
    fn test_collects_every_violation() {
        let mut workspaces = Dag::new();
        workspaces.connect("web", "ui");
        workspaces.connect("docs", "ui");

        let mut engine = Engine::new(&workspaces);
        engine.add_task(Task::new("dev").with_topo_deps(["dev"]).with_persistent(true));

        let scripts = all_scripts(&["web", "docs", "ui"], &["dev"]);
        engine
            .prepare(
                &EngineBuildingOptions::new(["web", "docs", "ui"], ["dev"]),
                &scripts,
            )
            .unwrap();

        let Err(Error::PersistentDependencies { violations }) =
            engine.validate_persistent_dependencies(&scripts)
        else {
            panic!("expected persistent dependency violations");
        };

        let found: HashSet<PersistentDependencyViolation> = violations.into_iter().collect();
        let expected: HashSet<PersistentDependencyViolation> = ["web#dev", "docs#dev"]
            .into_iter()
            .map(|dependent| PersistentDependencyViolation {
                persistent_task: "ui#dev".to_string(),
                dependent: dependent.to_string(),
            })
            .collect();
        assert_eq!(found, expected);
    }

    #[test]
    fn test_unimplemented_persistent_dependency_is_ignored() {
        let mut workspaces = Dag::new();
        workspaces.add_vertex("web");

        let mut engine = Engine::new(&workspaces);
        engine.add_task(Task::new("dev").with_persistent(true));
        engine.add_dep("web#build", "web#dev").unwrap();

        assert!(
            engine
                .validate_persistent_dependencies(&all_scripts(&["web"], &["build"]))
                .is_ok()
        );
        assert!(
            engine
                .validate_persistent_dependencies(&all_scripts(&["web"], &["build", "dev"]))
                .is_err()
        );
    }

    #[test]
    fn test_manual_cycle_is_reported() {
        let mut workspaces = Dag::new();
        workspaces.add_vertex("web");

        let mut engine = Engine::new(&workspaces);
        engine.add_dep("web#a", "web#b").unwrap();
        engine.add_dep("web#b", "web#a").unwrap();

        assert!(matches!(
            engine.validate_persistent_dependencies(&all_scripts(&["web"], &[])),
            Err(Error::CycleDetected { .. })
        ));
    }
}
