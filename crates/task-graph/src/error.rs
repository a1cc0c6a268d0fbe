//! Error types for graph operations.

use miette::Diagnostic;
use thiserror::Error;

/// Result type for graph operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during graph operations.
#[derive(Error, Debug, Clone, Diagnostic)]
pub enum Error {
    /// A dependency cycle was detected in the graph.
    #[error("Cycle detected in task graph between: {}", .cycle.join(", "))]
    #[diagnostic(
        code(pipegraph::task_graph::cycle_detected),
        help("Remove one of the dependencies between the listed vertices")
    )]
    CycleDetected {
        /// Vertices taking part in the cycle, sorted by name.
        cycle: Vec<String>,
    },
}
