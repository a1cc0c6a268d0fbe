//! Directed graph primitives for pipegraph.
//!
//! This crate provides a string-keyed directed graph used for both workspace
//! dependency graphs and task-execution graphs. It is independent of how tasks
//! are defined, so it can be tested and swapped in isolation.
//!
//! # Key Types
//!
//! - [`Dag`]: vertices identified by name, edges meaning "depends on"
//! - [`ParallelGroups`]: vertices grouped by dependency level
//!
//! # Example
//!
//! ```
//! use pipegraph_task_graph::Dag;
//!
//! let mut graph = Dag::new();
//! graph.connect("web#build", "ui#build");
//! graph.connect("web#test", "web#build");
//!
//! assert_eq!(graph.down_edges("web#build"), vec!["ui#build"]);
//! assert!(!graph.has_cycles());
//!
//! let order = graph.topological_order()?;
//! assert_eq!(order.first().map(String::as_str), Some("ui#build"));
//! # Ok::<(), pipegraph_task_graph::Error>(())
//! ```

mod error;
mod graph;
mod traversal;

pub use error::{Error, Result};
pub use graph::Dag;
pub use petgraph::graph::NodeIndex;
pub use traversal::ParallelGroups;
