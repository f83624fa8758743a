// src/dag/plan.rs

use std::fmt;

use crate::cli::Command;
use crate::dag::graph::TaskGraph;
use crate::errors::Result;
use crate::types::{AssetClass, TaskId};

/// A run declared as a composition of tasks.
///
/// `Series` runs its children one after the other, each starting once the
/// previous one is terminal. `Parallel` starts all of its children together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Plan {
    Task(TaskId),
    Series(Vec<Plan>),
    Parallel(Vec<Plan>),
}

impl Plan {
    pub fn task(task: TaskId) -> Self {
        Plan::Task(task)
    }

    pub fn series(children: impl IntoIterator<Item = Plan>) -> Self {
        Plan::Series(children.into_iter().collect())
    }

    pub fn parallel(children: impl IntoIterator<Item = Plan>) -> Self {
        Plan::Parallel(children.into_iter().collect())
    }

    /// Every default asset class, built concurrently.
    pub fn all_builds() -> Self {
        Self::parallel(
            AssetClass::DEFAULT_BUILD
                .into_iter()
                .map(|class| Plan::task(TaskId::Build(class))),
        )
    }

    /// `clean -> parallel(builds) -> parallel(watch, serve)`
    pub fn develop() -> Self {
        Self::series([
            Plan::task(TaskId::Clean),
            Self::all_builds(),
            Self::parallel([Plan::task(TaskId::Watch), Plan::task(TaskId::Serve)]),
        ])
    }

    /// `clean -> parallel(builds)`
    pub fn build() -> Self {
        Self::series([Plan::task(TaskId::Clean), Self::all_builds()])
    }

    pub fn sprite() -> Self {
        Plan::task(TaskId::Build(AssetClass::Sprite))
    }

    pub fn clean() -> Self {
        Plan::task(TaskId::Clean)
    }

    pub fn for_command(command: Command) -> Self {
        match command {
            Command::Develop => Self::develop(),
            Command::Build => Self::build(),
            Command::Sprite => Self::sprite(),
            Command::Clean => Self::clean(),
        }
    }

    /// Tasks in declaration order.
    pub fn tasks(&self) -> Vec<TaskId> {
        let mut out = Vec::new();
        self.collect_tasks(&mut out);
        out
    }

    fn collect_tasks(&self, out: &mut Vec<TaskId>) {
        match self {
            Plan::Task(task) => out.push(*task),
            Plan::Series(children) | Plan::Parallel(children) => {
                for child in children {
                    child.collect_tasks(out);
                }
            }
        }
    }

    /// Turn the composition into a dependency graph.
    ///
    /// Every task of a series step depends on every exit task of the step
    /// before it. Empty groups are transparent.
    pub fn lower(&self) -> Result<TaskGraph> {
        let mut edges = Vec::new();
        self.lower_into(&[], &mut edges);
        TaskGraph::new(self.tasks(), edges)
    }

    /// Returns the exit tasks of this plan.
    fn lower_into(&self, upstream: &[TaskId], edges: &mut Vec<(TaskId, TaskId)>) -> Vec<TaskId> {
        match self {
            Plan::Task(task) => {
                edges.extend(upstream.iter().map(|dep| (*dep, *task)));
                vec![*task]
            }
            Plan::Series(children) => {
                let mut current = upstream.to_vec();
                for child in children {
                    let exits = child.lower_into(&current, edges);
                    if !exits.is_empty() {
                        current = exits;
                    }
                }
                current
            }
            Plan::Parallel(children) => children
                .iter()
                .flat_map(|child| child.lower_into(upstream, edges))
                .collect(),
        }
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (name, children) = match self {
            Plan::Task(task) => return write!(f, "{task}"),
            Plan::Series(children) => ("series", children),
            Plan::Parallel(children) => ("parallel", children),
        };
        write!(f, "{name}(")?;
        for (idx, child) in children.iter().enumerate() {
            if idx > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{child}")?;
        }
        f.write_str(")")
    }
}
