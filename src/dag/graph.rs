// src/dag/graph.rs

use std::collections::{BTreeMap, BTreeSet};

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;

use crate::errors::{PipelineError, Result};
use crate::paths::PathTable;
use crate::types::{AssetClass, TaskId};

/// Internal node structure: stores immediate deps and dependents.
#[derive(Debug, Clone, Default)]
struct TaskNode {
    /// Direct dependencies: tasks that must be terminal before this one runs.
    deps: Vec<TaskId>,
    /// Direct dependents: tasks that depend on this one.
    dependents: Vec<TaskId>,
}

/// Validated dependency graph of one run.
#[derive(Debug, Clone)]
pub struct TaskGraph {
    /// Tasks in declaration order.
    order: Vec<TaskId>,
    nodes: BTreeMap<TaskId, TaskNode>,
}

impl TaskGraph {
    /// Build a graph from its tasks and `(dependency, dependent)` edges.
    ///
    /// Fails on a duplicate task, an edge naming an undeclared task, or a
    /// cycle.
    pub fn new(
        tasks: impl IntoIterator<Item = TaskId>,
        edges: impl IntoIterator<Item = (TaskId, TaskId)>,
    ) -> Result<Self> {
        let mut order = Vec::new();
        let mut nodes: BTreeMap<TaskId, TaskNode> = BTreeMap::new();

        for task in tasks {
            if nodes.insert(task, TaskNode::default()).is_some() {
                return Err(PipelineError::ConfigError(format!(
                    "task '{task}' appears more than once in the plan"
                )));
            }
            order.push(task);
        }

        let mut seen = BTreeSet::new();
        for (dep, task) in edges {
            for end in [dep, task] {
                if !nodes.contains_key(&end) {
                    return Err(PipelineError::ConfigError(format!(
                        "dependency edge {dep} -> {task} references unknown task '{end}'"
                    )));
                }
            }
            if dep == task {
                return Err(PipelineError::GraphCycle(format!(
                    "task '{task}' depends on itself"
                )));
            }
            if !seen.insert((dep, task)) {
                continue;
            }
            if let Some(node) = nodes.get_mut(&task) {
                node.deps.push(dep);
            }
            if let Some(node) = nodes.get_mut(&dep) {
                node.dependents.push(task);
            }
        }

        let graph = Self { order, nodes };
        graph.check_acyclic()?;
        Ok(graph)
    }

    fn check_acyclic(&self) -> Result<()> {
        // Edge direction: dep -> task.
        let mut graph: DiGraphMap<TaskId, ()> = DiGraphMap::new();
        for task in &self.order {
            graph.add_node(*task);
        }
        for (task, node) in &self.nodes {
            for dep in &node.deps {
                graph.add_edge(*dep, *task, ());
            }
        }

        match toposort(&graph, None) {
            Ok(_) => Ok(()),
            Err(cycle) => Err(PipelineError::GraphCycle(format!(
                "cycle detected in task graph involving task '{}'",
                cycle.node_id()
            ))),
        }
    }

    /// All tasks, in declaration order.
    pub fn tasks(&self) -> impl Iterator<Item = TaskId> + '_ {
        self.order.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn contains(&self, task: TaskId) -> bool {
        self.nodes.contains_key(&task)
    }

    pub fn dependencies_of(&self, task: TaskId) -> &[TaskId] {
        self.nodes
            .get(&task)
            .map(|n| n.deps.as_slice())
            .unwrap_or(&[])
    }

    pub fn dependents_of(&self, task: TaskId) -> &[TaskId] {
        self.nodes
            .get(&task)
            .map(|n| n.dependents.as_slice())
            .unwrap_or(&[])
    }

    /// Tasks without dependencies; these are triggered to start a run.
    pub fn roots(&self) -> Vec<TaskId> {
        self.tasks()
            .filter(|task| self.dependencies_of(*task).is_empty())
            .collect()
    }

    /// Asset classes built by this graph.
    pub fn asset_classes(&self) -> Vec<AssetClass> {
        self.tasks()
            .filter_map(|task| match task {
                TaskId::Build(class) => Some(class),
                _ => None,
            })
            .collect()
    }

    /// Every class built by this graph must have a path entry. Checked before
    /// anything runs.
    pub fn check_paths(&self, paths: &PathTable) -> Result<()> {
        for class in self.asset_classes() {
            paths.entry(class)?;
        }
        Ok(())
    }

    /// Tasks grouped by the earliest step at which they can start. Tasks in
    /// the same stage run concurrently.
    pub fn stages(&self) -> Vec<Vec<TaskId>> {
        let mut level: BTreeMap<TaskId, usize> = BTreeMap::new();
        let mut stages: Vec<Vec<TaskId>> = Vec::new();

        // Declaration order of a lowered plan is already topological, but
        // the graph can be built from arbitrary edges, so iterate until
        // every task has a level.
        let mut remaining: Vec<TaskId> = self.order.clone();
        while !remaining.is_empty() {
            let before = remaining.len();
            remaining.retain(|task| {
                let deps = self.dependencies_of(*task);
                if !deps.iter().all(|d| level.contains_key(d)) {
                    return true;
                }
                let lvl = deps.iter().map(|d| level[d] + 1).max().unwrap_or(0);
                level.insert(*task, lvl);
                if stages.len() <= lvl {
                    stages.resize_with(lvl + 1, Vec::new);
                }
                stages[lvl].push(*task);
                false
            });
            if remaining.len() == before {
                break;
            }
        }
        stages
    }
}
