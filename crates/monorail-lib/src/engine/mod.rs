//! The task engine: `(package, script)` units, the remaining-work list,
//! and the parallel executor that drives it with prerequisite ordering
//! and failure short-circuit.

use std::{
    collections::{HashMap, HashSet},
    path::PathBuf,
    sync::Arc,
};

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::{error, warn};

mod builder;

pub use builder::{build_task_list, synthesize_tasks};

/// A single schedulable unit of work: one script of one package. Carries
/// everything needed to execute without re-entering the package graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    pub package: String,
    pub package_dir: PathBuf,
    pub script: String,
    pub command_line: String,
    /// Task names that must leave the remaining list before this task may
    /// start. Names that never existed in the global map are ignored at
    /// schedule time.
    pub prereqs: Vec<String>,
}

impl Task {
    /// The globally unique task identifier, `package:script`.
    pub fn name(&self) -> String {
        task_name(&self.package, &self.script)
    }
}

pub fn task_name(package: &str, script: &str) -> String {
    format!("{package}:{script}")
}

/// Executes one task end to end. The production implementation spawns
/// subprocesses; executor tests substitute a recording mock.
#[async_trait]
pub trait TaskRunner: Send + Sync + 'static {
    async fn run(&self, task: &Task) -> anyhow::Result<()>;
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("task {name} failed")]
    TaskFailed {
        name: String,
        #[source]
        source: anyhow::Error,
    },
    #[error("tasks cannot be scheduled, their prerequisites form a loop: {remaining}")]
    Stalled { remaining: String },
}

struct TaskResult {
    name: String,
    outcome: anyhow::Result<()>,
}

/// The remaining work of one run. Completed tasks are removed; a task is
/// ready once none of its prerequisites remain as keys.
#[derive(Default)]
pub struct TaskList {
    tasks: HashMap<String, Arc<Task>>,
}

impl TaskList {
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tasks.contains_key(name)
    }

    fn is_ready(&self, task: &Task) -> bool {
        task.prereqs
            .iter()
            .all(|prereq| !self.tasks.contains_key(prereq))
    }

    /// Drives the list to completion. Each ready task runs on its own
    /// worker; completions are linearized over a single result channel.
    /// The first failure stops all further starts, the in-flight workers
    /// are drained to completion, and that first error is returned.
    pub async fn execute<R: TaskRunner>(mut self, runner: Arc<R>) -> Result<(), Error> {
        let (results_tx, mut results) = mpsc::channel(self.tasks.len().max(1));
        let mut started: HashSet<String> = HashSet::new();
        let mut in_flight = 0usize;
        let mut failure = None;

        while !self.tasks.is_empty() && failure.is_none() {
            let ready: Vec<Arc<Task>> = self
                .tasks
                .values()
                .filter(|task| !started.contains(&task.name()) && self.is_ready(task))
                .cloned()
                .collect();
            for task in ready {
                started.insert(task.name());
                in_flight += 1;
                let results_tx = results_tx.clone();
                let runner = Arc::clone(&runner);
                tokio::spawn(async move {
                    let outcome = runner.run(&task).await;
                    let _ = results_tx
                        .send(TaskResult {
                            name: task.name(),
                            outcome,
                        })
                        .await;
                });
            }
            if in_flight == 0 {
                // Nothing is running and nothing became ready: the
                // remaining prerequisites can never be satisfied.
                let mut remaining: Vec<&str> =
                    self.tasks.keys().map(String::as_str).collect();
                remaining.sort_unstable();
                return Err(Error::Stalled {
                    remaining: remaining.join(", "),
                });
            }

            // Take exactly one result so anything newly unblocked starts
            // before the next wait.
            let Some(result) = results.recv().await else {
                break;
            };
            in_flight -= 1;
            self.tasks.remove(&result.name);
            if let Err(source) = result.outcome {
                error!("ERROR in {}: {source:#}", result.name);
                failure = Some(Error::TaskFailed {
                    name: result.name,
                    source,
                });
                // No new work starts, but every in-flight worker reports
                // before we return.
                while in_flight > 0 {
                    let Some(drained) = results.recv().await else {
                        break;
                    };
                    in_flight -= 1;
                    self.tasks.remove(&drained.name);
                    if let Err(err) = drained.outcome {
                        warn!("{} also failed: {err:#}", drained.name);
                    }
                }
            }
        }

        match failure {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

impl FromIterator<Arc<Task>> for TaskList {
    fn from_iter<I: IntoIterator<Item = Arc<Task>>>(iter: I) -> Self {
        TaskList {
            tasks: iter.into_iter().map(|task| (task.name(), task)).collect(),
        }
    }
}
