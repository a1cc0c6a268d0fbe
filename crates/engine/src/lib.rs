//! Task-execution graph engine for monorepo pipelines.
//!
//! Given a workspace dependency graph and a set of pipeline definitions, the
//! [`Engine`] builds a graph of concrete `workspace#task` executions and
//! checks that no task waits on a persistent (never-terminating) task.
//! Nothing is executed here; a separate executor walks the resulting graph.
//!
//! # Key Types
//!
//! - [`Task`]: a pipeline definition (topological deps, direct deps, persistence)
//! - [`TaskRegistry`]: definitions keyed by bare or workspace-qualified name
//! - [`Engine`]: graph construction and persistent dependency validation
//! - [`CompleteGraph`]: workspace graph plus manifests, the default [`ScriptRegistry`]
//!
//! # Example
//!
//! ```
//! use pipegraph_engine::{CompleteGraph, Engine, EngineBuildingOptions, PackageInfo, Task};
//!
//! let mut project = CompleteGraph::default();
//! project.add_package(PackageInfo::new("web").with_script("build", "tsc"));
//! project.add_package(PackageInfo::new("ui").with_script("build", "tsc"));
//! project.workspace_graph.connect("web", "ui");
//!
//! let mut engine = Engine::new(&project.workspace_graph);
//! engine.add_task(Task::from_depends_on("build", ["^build"], false));
//!
//! engine.prepare(&EngineBuildingOptions::new(["web", "ui"], ["build"]), &project)?;
//! assert!(engine.task_graph().has_edge("web#build", "ui#build"));
//!
//! engine.validate_persistent_dependencies(&project)?;
//! # Ok::<(), pipegraph_engine::Error>(())
//! ```

mod engine;
mod error;
mod project;
mod registry;
mod task;
mod validation;

pub use engine::{Engine, EngineBuildingOptions};
pub use error::{Error, Result};
pub use project::{CompleteGraph, PackageInfo, ScriptRegistry};
pub use registry::TaskRegistry;
pub use task::{
    TASK_DELIMITER, TOPOLOGICAL_PREFIX, Task, is_package_task, split_task_id, task_id,
};
pub use validation::PersistentDependencyViolation;
