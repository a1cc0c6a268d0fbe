//! Error types for task-execution graph construction and validation.

use crate::validation::PersistentDependencyViolation;
use miette::Diagnostic;
use thiserror::Error;

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building or validating a task-execution graph.
#[derive(Error, Debug, Clone, Diagnostic)]
pub enum Error {
    /// No pipeline definition governs a referenced task.
    #[error("Could not find \"{task_id}\" or \"{task}\" in pipeline")]
    #[diagnostic(
        code(pipegraph::engine::task_not_found),
        help("Define the task in the pipeline, or remove the dependency on it")
    )]
    TaskNotFound {
        /// Workspace-qualified identifier that was looked up first.
        task_id: String,
        /// Bare task name that was looked up second.
        task: String,
    },

    /// Expansion produced a dependency cycle.
    #[error("Cycle detected in task graph between: {}", .cycle.join(", "))]
    #[diagnostic(
        code(pipegraph::engine::cycle_detected),
        help("Tasks cannot depend on each other in a loop; remove one of the listed dependencies")
    )]
    CycleDetected {
        /// Task identifiers taking part in the cycle.
        cycle: Vec<String>,
    },

    /// A task identifier is not of the form `<workspace>#<task>`.
    #[error("Invalid task identifier '{id}': expected '<workspace>#<task>'")]
    #[diagnostic(code(pipegraph::engine::invalid_task_id))]
    InvalidTaskId {
        /// The rejected identifier.
        id: String,
    },

    /// A task identifier names a workspace missing from the workspace graph.
    #[error("Found {task_id}, but {workspace} package is not in the workspace")]
    #[diagnostic(
        code(pipegraph::engine::unknown_workspace),
        help("Check the workspace name in the task identifier")
    )]
    UnknownWorkspace {
        /// The identifier that referenced the workspace.
        task_id: String,
        /// The missing workspace.
        workspace: String,
    },

    /// One or more tasks depend on a persistent task.
    #[error("{}", join_violations(.violations))]
    #[diagnostic(
        code(pipegraph::engine::persistent_dependency),
        help("Persistent tasks never finish; remove them from the dependencies of other tasks")
    )]
    PersistentDependencies {
        /// Every offending edge, in discovery order.
        violations: Vec<PersistentDependencyViolation>,
    },
}

impl From<pipegraph_task_graph::Error> for Error {
    fn from(err: pipegraph_task_graph::Error) -> Self {
        match err {
            pipegraph_task_graph::Error::CycleDetected { cycle } => Self::CycleDetected { cycle },
        }
    }
}

fn join_violations(violations: &[PersistentDependencyViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}
