//! Graph Builder: expands pipeline definitions into a task-execution graph.
//!
//! Every node of the task-execution graph is a `workspace#task` identifier.
//! An edge `a -> b` means `b` must complete before `a` may start.

use crate::project::ScriptRegistry;
use crate::registry::TaskRegistry;
use crate::task::{Task, is_package_task, split_task_id, task_id};
use crate::{Error, Result};
use pipegraph_task_graph::Dag;
use rayon::iter::{IntoParallelRefIterator, ParallelIterator};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, trace};

/// Scope of a [`Engine::prepare`] call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineBuildingOptions {
    /// Workspaces in scope.
    pub packages: HashSet<String>,
    /// Task names requested to run.
    pub task_names: Vec<String>,
    /// Only schedule the requested task names, ignoring dependencies on any other task.
    #[serde(default)]
    pub tasks_only: bool,
}

impl EngineBuildingOptions {
    /// Request `task_names` in every workspace of `packages`.
    #[must_use]
    pub fn new<P, T>(packages: P, task_names: T) -> Self
    where
        P: IntoIterator,
        P::Item: Into<String>,
        T: IntoIterator,
        T::Item: Into<String>,
    {
        Self {
            packages: packages.into_iter().map(Into::into).collect(),
            task_names: task_names.into_iter().map(Into::into).collect(),
            tasks_only: false,
        }
    }

    /// Restrict the run to the requested task names.
    #[must_use]
    pub fn with_tasks_only(mut self, tasks_only: bool) -> Self {
        self.tasks_only = tasks_only;
        self
    }

    fn in_scope(&self, task: &str) -> bool {
        !self.tasks_only || self.task_names.iter().any(|name| name == task)
    }
}

/// One node and the dependencies its definition introduces.
struct Expansion {
    task_id: String,
    dependencies: Vec<String>,
}

/// Builds and validates task-execution graphs for one workspace graph.
pub struct Engine<'a> {
    /// Dependencies between workspaces; read-only.
    workspace_graph: &'a Dag,
    /// Pipeline definitions.
    tasks: TaskRegistry,
    /// The task-execution graph from the last successful `prepare`.
    task_graph: Dag,
    /// Edges inserted with `add_dep`, replayed on every `prepare`.
    manual_deps: Vec<(String, String)>,
}

impl<'a> Engine<'a> {
    /// Create an engine bound to a workspace dependency graph.
    #[must_use]
    pub fn new(workspace_graph: &'a Dag) -> Self {
        Self {
            workspace_graph,
            tasks: TaskRegistry::new(),
            task_graph: Dag::new(),
            manual_deps: Vec::new(),
        }
    }

    /// Register a pipeline definition, replacing any with the same name.
    pub fn add_task(&mut self, task: Task) {
        debug!("Registered task '{}'", task.name);
        self.tasks.add(task);
    }

    /// The registered pipeline definitions.
    #[must_use]
    pub fn tasks(&self) -> &TaskRegistry {
        &self.tasks
    }

    /// The task-execution graph.
    #[must_use]
    pub fn task_graph(&self) -> &Dag {
        &self.task_graph
    }

    /// Insert an edge making `dependent` wait for `dependency`.
    ///
    /// Both are `workspace#task` identifiers and are added as nodes if absent.
    /// The edge is kept across later [`Engine::prepare`] calls.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidTaskId`] for an identifier that is not
    /// workspace-qualified, or [`Error::UnknownWorkspace`] when its workspace
    /// is not in the workspace graph.
    pub fn add_dep(&mut self, dependent: &str, dependency: &str) -> Result<()> {
        for id in [dependent, dependency] {
            let (workspace, _) = split_task_id(id).ok_or_else(|| Error::InvalidTaskId {
                id: id.to_string(),
            })?;
            if !self.workspace_graph.contains(workspace) {
                return Err(Error::UnknownWorkspace {
                    task_id: id.to_string(),
                    workspace: workspace.to_string(),
                });
            }
        }

        self.task_graph.connect(dependent, dependency);
        self.manual_deps
            .push((dependent.to_string(), dependency.to_string()));
        Ok(())
    }

    /// Build the task-execution graph for the requested scope.
    ///
    /// Each requested task is added for every workspace in scope that has a
    /// definition for it. Dependencies are then expanded until no new nodes
    /// appear: topological dependencies only reach workspaces that implement
    /// the task, direct dependencies are always added.
    ///
    /// The graph is rebuilt from scratch, keeping edges from [`Engine::add_dep`].
    /// On failure the previous graph is left untouched.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TaskNotFound`] if a dependency has no definition, or
    /// [`Error::CycleDetected`] if the expanded graph contains a cycle.
    #[tracing::instrument(
        name = "engine_prepare",
        skip(self, opts, scripts),
        fields(packages = opts.packages.len(), tasks = ?opts.task_names)
    )]
    pub fn prepare<S>(&mut self, opts: &EngineBuildingOptions, scripts: &S) -> Result<()>
    where
        S: ScriptRegistry + Sync,
    {
        let mut graph = Dag::new();
        for (dependent, dependency) in &self.manual_deps {
            graph.connect(dependent, dependency);
        }

        let mut visited: HashSet<String> = HashSet::new();
        let mut frontier = Vec::new();
        for workspace in &opts.packages {
            for task in &opts.task_names {
                // Requested tasks are optional per workspace; dependencies are not
                if self.tasks.resolve(workspace, task).is_err() {
                    trace!(workspace = %workspace, task = %task, "No definition, skipping");
                    continue;
                }
                let id = task_id(workspace, task);
                if visited.insert(id.clone()) {
                    frontier.push(id);
                }
            }
        }

        debug!(initial = frontier.len(), "Expanding task graph");

        while !frontier.is_empty() {
            let expansions = frontier
                .par_iter()
                .map(|id| self.expand(id, opts, scripts))
                .collect::<Result<Vec<_>>>()?;

            let mut next = Vec::new();
            for expansion in expansions {
                graph.add_vertex(&expansion.task_id);
                for dependency in expansion.dependencies {
                    graph.connect(&expansion.task_id, &dependency);
                    if visited.insert(dependency.clone()) {
                        next.push(dependency);
                    }
                }
            }
            frontier = next;
        }

        graph.validate()?;

        debug!(
            tasks = graph.vertex_count(),
            edges = graph.edge_count(),
            "Task graph prepared"
        );
        self.task_graph = graph;
        Ok(())
    }

    /// Compute the dependencies of one node from its definition.
    fn expand<S>(&self, id: &str, opts: &EngineBuildingOptions, scripts: &S) -> Result<Expansion>
    where
        S: ScriptRegistry,
    {
        let (workspace, task_name) = split_task_id(id).ok_or_else(|| Error::InvalidTaskId {
            id: id.to_string(),
        })?;
        let task = self.tasks.resolve(workspace, task_name)?;
        let mut dependencies = Vec::new();

        if !task.topo_deps.is_empty() {
            for dep_workspace in self.workspace_graph.down_edges(workspace) {
                for topo in task.topo_deps.iter().filter(|name| opts.in_scope(name)) {
                    if scripts.implements(dep_workspace, topo) {
                        dependencies.push(task_id(dep_workspace, topo));
                    } else {
                        trace!(
                            task = id,
                            workspace = dep_workspace,
                            dependency = %topo,
                            "Dependency workspace does not implement task"
                        );
                    }
                }
            }
        }

        for dep in &task.deps {
            let dep_id = if is_package_task(dep) {
                dep.clone()
            } else {
                task_id(workspace, dep)
            };
            let dep_task = split_task_id(&dep_id).map_or(dep.as_str(), |(_, name)| name);
            if opts.in_scope(dep_task) {
                dependencies.push(dep_id);
            }
        }

        Ok(Expansion {
            task_id: id.to_string(),
            dependencies,
        })
    }
}
