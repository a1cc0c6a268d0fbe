//! Concurrent traversal of a [`Dag`].
//!
//! Vertices are visited level by level, so every vertex is visited after all
//! of the vertices it depends on. Vertices within one level are independent
//! of each other and are handed to the rayon pool in parallel.

use crate::{Dag, Result};
use rayon::iter::{IntoParallelRefIterator, ParallelIterator};
use std::sync::{Mutex, PoisonError};
use tracing::debug;

/// Groups of vertices that can be visited in parallel, dependencies first.
pub type ParallelGroups = Vec<Vec<String>>;

impl Dag {
    /// Visit every vertex with `visitor`, running independent vertices concurrently.
    ///
    /// A failing visitor does not stop the walk: every vertex is visited and
    /// all errors are returned together. The order of the returned errors
    /// depends on worker scheduling.
    ///
    /// # Errors
    ///
    /// Returns an error if the graph contains cycles; no vertex is visited in that case.
    pub fn walk<F, E>(&self, visitor: F) -> Result<Vec<E>>
    where
        F: Fn(&str) -> std::result::Result<(), E> + Sync,
        E: Send,
    {
        let levels: ParallelGroups = self.levels()?;
        let errors = Mutex::new(Vec::new());

        debug!(
            vertices = self.vertex_count(),
            levels = levels.len(),
            "Walking graph"
        );

        for level in &levels {
            level.par_iter().for_each(|vertex| {
                if let Err(err) = visitor(vertex) {
                    errors
                        .lock()
                        .unwrap_or_else(PoisonError::into_inner)
                        .push(err);
                }
            });
        }

        Ok(errors.into_inner().unwrap_or_else(PoisonError::into_inner))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_walk_visits_every_vertex_once() {
        let mut graph = Dag::new();
        graph.connect("app#build", "lib#build");
        graph.connect("app#test", "app#build");
        graph.add_vertex("docs#build");

        let visited = Mutex::new(Vec::new());
        let errors: Vec<()> = graph
            .walk(|vertex| {
                visited.lock().unwrap().push(vertex.to_string());
                Ok(())
            })
            .unwrap();

        assert!(errors.is_empty());
        let mut visited = visited.into_inner().unwrap();
        visited.sort();
        assert_eq!(
            visited,
            vec!["app#build", "app#test", "docs#build", "lib#build"]
        );
    }

    #[test]
    fn test_walk_visits_dependencies_first() {
        let mut graph = Dag::new();
        graph.connect("c", "b");
        graph.connect("b", "a");

        let order = Mutex::new(Vec::new());
        graph
            .walk(|vertex| -> std::result::Result<(), ()> {
                order.lock().unwrap().push(vertex.to_string());
                Ok(())
            })
            .unwrap();

        assert_eq!(order.into_inner().unwrap(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_walk_collects_all_errors() {
        let mut graph = Dag::new();
        for name in ["a", "b", "c", "d"] {
            graph.add_vertex(name);
        }
        graph.connect("d", "a");

        let errors = graph
            .walk(|vertex| {
                if vertex == "a" || vertex == "d" {
                    Err(format!("{vertex} failed"))
                } else {
                    Ok(())
                }
            })
            .unwrap();

        let mut errors = errors;
        errors.sort();
        assert_eq!(errors, vec!["a failed", "d failed"]);
    }

    #[test]
    fn test_walk_rejects_cycles() {
        let mut graph = Dag::new();
        graph.connect("a", "b");
        graph.connect("b", "a");

        let calls: Mutex<HashMap<String, usize>> = Mutex::new(HashMap::new());
        let result = graph.walk(|vertex| -> std::result::Result<(), ()> {
            *calls
                .lock()
                .unwrap()
                .entry(vertex.to_string())
                .or_default() += 1;
            Ok(())
        });

        assert!(result.is_err());
        assert!(calls.into_inner().unwrap().is_empty());
    }
}
