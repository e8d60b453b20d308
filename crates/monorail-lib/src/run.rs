use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use tracing::debug;

use monorail_paths::find_repo_root;
use monorail_repository::{
    package_graph::{self, PackageGraph},
    package_json::{self, PackageJson, MANIFEST_FILE},
    pipeline::Pipeline,
};

use crate::{engine, process::CommandRunner};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("no workspace found: no .git directory above {}", cwd.display())]
    WorkspaceNotFound { cwd: PathBuf },
    #[error("unable to load the root manifest: {0}")]
    RootManifest(#[from] package_json::Error),
    #[error(transparent)]
    Graph(#[from] package_graph::Error),
    #[error("package \"{name}\" does not exist in the workspace")]
    TargetNotFound { name: String },
    #[error(transparent)]
    Execute(#[from] engine::Error),
}

/// Runs `script` across the workspace enclosing `cwd`: rediscovers the
/// workspace, builds the package graph, expands the script into its task
/// closure under the pipeline, and executes it. Nothing is persisted
/// between invocations.
pub async fn run(cwd: &Path, script: &str, target: Option<&str>) -> Result<(), Error> {
    let repo_root = find_repo_root(cwd).ok_or_else(|| Error::WorkspaceNotFound {
        cwd: cwd.to_path_buf(),
    })?;
    let root_package_json = PackageJson::load(&repo_root.join(MANIFEST_FILE))?;
    let pipeline = Pipeline::compile(&root_package_json.lage.pipeline);
    let graph = PackageGraph::builder(&repo_root, root_package_json)
        .build()
        .await?;
    debug!(
        "found {} packages under {}",
        graph.len(),
        repo_root.display()
    );

    if let Some(target) = target {
        if !graph.contains(target) {
            return Err(Error::TargetNotFound {
                name: target.to_string(),
            });
        }
    }

    let tasks = engine::synthesize_tasks(&graph, &pipeline);
    let list = engine::build_task_list(&tasks, script, target);
    debug!("running {} of {} tasks", list.len(), tasks.len());

    let runner = Arc::new(CommandRunner::new(graph.package_manager()));
    list.execute(runner).await?;
    Ok(())
}
