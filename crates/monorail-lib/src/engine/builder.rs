use std::{
    collections::{HashMap, VecDeque},
    sync::Arc,
};

use monorail_repository::{package_graph::PackageGraph, pipeline::Pipeline};

use super::{task_name, Task, TaskList};

/// Produces the global task map: one task per `(package, script)` pair,
/// with prerequisites derived from the pipeline entry for the script.
///
/// A sibling directive `cmd` adds the same package's `cmd` task; a
/// cascade directive `^cmd` adds every workspace dependency's `cmd`
/// task. A sibling directive naming the script itself is dropped so a
/// careless pipeline cannot introduce a self-loop. Prerequisite names
/// are synthesized whether or not the named task exists; resolution
/// happens later.
pub fn synthesize_tasks(graph: &PackageGraph, pipeline: &Pipeline) -> HashMap<String, Arc<Task>> {
    let mut tasks = HashMap::new();
    for (package, info) in graph.packages() {
        for (script, command_line) in &info.package_json.scripts {
            let mut prereqs = Vec::new();
            if let Some(directives) = pipeline.directives(script) {
                for directive in directives {
                    if directive.cascade {
                        for dep in &info.internal_dependencies {
                            prereqs.push(task_name(dep, &directive.command));
                        }
                    } else if directive.command != *script {
                        prereqs.push(task_name(package, &directive.command));
                    }
                }
            }
            let task = Arc::new(Task {
                package: package.clone(),
                package_dir: info.package_dir.clone(),
                script: script.clone(),
                command_line: command_line.clone(),
                prereqs,
            });
            tasks.insert(task.name(), task);
        }
    }
    tasks
}

/// Selects the tasks to run for one invocation: every task whose script
/// is `command` (restricted to `target`'s package when given) plus the
/// transitive closure of their prerequisites, keeping only names that
/// resolve in the global map.
pub fn build_task_list(
    global: &HashMap<String, Arc<Task>>,
    command: &str,
    target: Option<&str>,
) -> TaskList {
    let mut selected: HashMap<String, Arc<Task>> = HashMap::new();
    let mut queue: VecDeque<Arc<Task>> = global
        .values()
        .filter(|task| {
            task.script == command && target.map_or(true, |target| task.package == target)
        })
        .cloned()
        .collect();

    while let Some(task) = queue.pop_front() {
        if selected.insert(task.name(), Arc::clone(&task)).is_some() {
            continue;
        }
        for prereq in &task.prereqs {
            if !selected.contains_key(prereq) {
                if let Some(found) = global.get(prereq) {
                    queue.push_back(Arc::clone(found));
                }
            }
        }
    }

    TaskList { tasks: selected }
}
