use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

use itertools::Itertools;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use monorail_paths::find_with_glob;

use super::{PackageGraph, PackageInfo};
use crate::{
    package_json::{PackageJson, MANIFEST_FILE},
    package_manager::PackageManager,
};

/// Builds a `PackageGraph` by discovering workspace manifests, loading
/// them in parallel, and connecting inter-package dependency edges with a
/// pre-insertion cycle check.
pub struct PackageGraphBuilder<'a> {
    repo_root: &'a Path,
    root_package_json: PackageJson,
    package_jsons: Option<HashMap<PathBuf, PackageJson>>,
    package_manager: Option<PackageManager>,
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(
        "Failed to add package \"{name}\" from \"{path}\", it already exists at \
         \"{existing_path}\""
    )]
    DuplicatePackage {
        name: String,
        path: String,
        existing_path: String,
    },
    #[error("Cycle detected: {path}")]
    CycleDetected { path: String },
}

impl<'a> PackageGraphBuilder<'a> {
    pub fn new(repo_root: &'a Path, root_package_json: PackageJson) -> Self {
        Self {
            repo_root,
            root_package_json,
            package_jsons: None,
            package_manager: None,
        }
    }

    /// Supply manifests directly instead of discovering them on disk,
    /// keyed by manifest file path. Used by tests.
    pub fn with_package_jsons(
        mut self,
        package_jsons: Option<HashMap<PathBuf, PackageJson>>,
    ) -> Self {
        self.package_jsons = package_jsons;
        self
    }

    pub fn with_package_manager(mut self, package_manager: Option<PackageManager>) -> Self {
        self.package_manager = package_manager;
        self
    }

    pub async fn build(self) -> Result<PackageGraph, Error> {
        let package_manager = self
            .package_manager
            .unwrap_or_else(|| PackageManager::detect(self.repo_root));
        let manifests = match self.package_jsons {
            Some(manifests) => manifests,
            None => load_manifests(self.repo_root, &self.root_package_json).await,
        };

        let mut packages = HashMap::new();
        // Sorted insertion keeps duplicate reports independent of walk order.
        for (path, package_json) in manifests
            .into_iter()
            .sorted_by(|(a, _), (b, _)| a.cmp(b))
        {
            if package_json.name.is_empty() {
                debug!(
                    "ignoring package.json at {} since it has no name",
                    path.display()
                );
                continue;
            }
            let name = package_json.name.clone();
            let package_dir = path
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| self.repo_root.to_path_buf());
            let entry = PackageInfo {
                package_json,
                package_dir,
                ..Default::default()
            };
            if let Some(existing) = packages.insert(name.clone(), entry) {
                let path = packages
                    .get(&name)
                    .map(|info: &PackageInfo| info.package_dir.display().to_string())
                    .unwrap_or_default();
                return Err(Error::DuplicatePackage {
                    name,
                    path,
                    existing_path: existing.package_dir.display().to_string(),
                });
            }
        }

        connect_dependencies(&mut packages)?;

        Ok(PackageGraph {
            packages,
            package_manager,
        })
    }
}

/// Walks the workspace globs, then fans the manifest loads out one task
/// per file, joining before returning. Unreadable or unparsable manifests
/// are skipped with a warning and contribute nothing.
async fn load_manifests(
    repo_root: &Path,
    root_package_json: &PackageJson,
) -> HashMap<PathBuf, PackageJson> {
    let globs = root_package_json.workspaces.packages().to_vec();
    let mut loads = JoinSet::new();
    for path in find_with_glob(MANIFEST_FILE, repo_root, &globs) {
        loads.spawn_blocking(move || {
            let package_json = PackageJson::load(&path);
            (path, package_json)
        });
    }

    let mut manifests = HashMap::new();
    while let Some(joined) = loads.join_next().await {
        let Ok((path, loaded)) = joined else {
            continue;
        };
        match loaded {
            Ok(package_json) => {
                manifests.insert(path, package_json);
            }
            Err(err) => warn!("skipping manifest {}: {err}", path.display()),
        }
    }
    manifests
}

/// Splits every package's declared dependencies into workspace-internal
/// edges and external name/version records. Each internal edge is checked
/// before insertion: if the dependency can already reach the dependent,
/// the edge would close a cycle and the build fails with the full path.
fn connect_dependencies(packages: &mut HashMap<String, PackageInfo>) -> Result<(), Error> {
    let names: Vec<String> = packages.keys().cloned().sorted().collect();
    for name in &names {
        let declared: Vec<(String, String)> = packages
            .get(name)
            .map(|info| {
                info.package_json
                    .all_dependencies()
                    .map(|(dep, version)| (dep.clone(), version.clone()))
                    .collect()
            })
            .unwrap_or_default();
        for (dep, version) in declared {
            if packages.contains_key(&dep) {
                if let Some(chain) = find_path(packages, &dep, name) {
                    let path = std::iter::once(name.as_str())
                        .chain(chain.iter().map(String::as_str))
                        .chain(std::iter::once(name.as_str()))
                        .join(" -> ");
                    return Err(Error::CycleDetected { path });
                }
                if let Some(info) = packages.get_mut(name) {
                    info.internal_dependencies.insert(dep);
                }
            } else if let Some(info) = packages.get_mut(name) {
                info.external_dependencies.insert(dep, version);
            }
        }
    }
    Ok(())
}

/// Returns the chain of package names from `from` to the package whose
/// edge reaches `target`, following only edges inserted so far; `None`
/// when `target` is unreachable. An empty chain means `from == target`.
fn find_path(
    packages: &HashMap<String, PackageInfo>,
    from: &str,
    target: &str,
) -> Option<Vec<String>> {
    if from == target {
        return Some(Vec::new());
    }
    let info = packages.get(from)?;
    for dep in &info.internal_dependencies {
        if let Some(mut chain) = find_path(packages, dep, target) {
            chain.insert(0, from.to_string());
            return Some(chain);
        }
    }
    None
}

#[cfg(test)]
mod test {
    use super::*;

    use std::collections::HashSet;

    use serde_json::json;

    fn manifest(value: serde_json::Value) -> PackageJson {
        PackageJson::from_value(value).unwrap()
    }

    fn injected(
        packages: &[(&str, serde_json::Value)],
    ) -> HashMap<PathBuf, PackageJson> {
        packages
            .iter()
            .map(|(dir, value)| {
                (
                    PathBuf::from(format!("/repo/{dir}/package.json")),
                    manifest(value.clone()),
                )
            })
            .collect()
    }

    async fn build(packages: &[(&str, serde_json::Value)]) -> Result<PackageGraph, Error> {
        PackageGraph::builder(Path::new("/repo"), manifest(json!({ "name": "root" })))
            .with_package_manager(Some(PackageManager::Npm))
            .with_package_jsons(Some(injected(packages)))
            .build()
            .await
    }

    #[tokio::test]
    async fn test_internal_and_external_dependencies_are_split() {
        let graph = build(&[
            (
                "a",
                json!({
                    "name": "a",
                    "dependencies": { "b": "*", "left-pad": "1.3.0" },
                }),
            ),
            ("b", json!({ "name": "b" })),
        ])
        .await
        .unwrap();

        let a = graph.package_info("a").unwrap();
        assert!(a.internal_dependencies.contains("b"));
        assert_eq!(
            a.external_dependencies.get("left-pad").map(String::as_str),
            Some("1.3.0")
        );
        assert!(!a.external_dependencies.contains_key("b"));
        assert_eq!(a.package_dir, PathBuf::from("/repo/a"));
    }

    #[tokio::test]
    async fn test_dev_dependencies_also_form_edges() {
        let graph = build(&[
            (
                "a",
                json!({ "name": "a", "devDependencies": { "b": "*" } }),
            ),
            ("b", json!({ "name": "b" })),
        ])
        .await
        .unwrap();

        assert!(graph
            .package_info("a")
            .unwrap()
            .internal_dependencies
            .contains("b"));
    }

    #[tokio::test]
    async fn test_every_declared_dependency_lands_in_exactly_one_partition() {
        let graph = build(&[
            (
                "a",
                json!({
                    "name": "a",
                    "dependencies": { "b": "*", "chalk": "5.0.0" },
                    "devDependencies": { "c": "*", "jest": "29.0.0" },
                }),
            ),
            ("b", json!({ "name": "b" })),
            ("c", json!({ "name": "c" })),
        ])
        .await
        .unwrap();

        let a = graph.package_info("a").unwrap();
        for (dep, _) in a.package_json.all_dependencies() {
            let internal = a.internal_dependencies.contains(dep);
            let external = a.external_dependencies.contains_key(dep);
            assert!(
                internal != external,
                "{dep} must be internal xor external"
            );
        }
    }

    #[tokio::test]
    async fn test_two_package_cycle_is_rejected() {
        let err = build(&[
            ("a", json!({ "name": "a", "dependencies": { "b": "*" } })),
            ("b", json!({ "name": "b", "dependencies": { "a": "*" } })),
        ])
        .await
        .unwrap_err();

        let message = err.to_string();
        assert!(message.starts_with("Cycle detected: "), "{message}");
        assert_eq!(message, "Cycle detected: b -> a -> b");
    }

    #[tokio::test]
    async fn test_three_package_cycle_reports_full_path() {
        let err = build(&[
            ("a", json!({ "name": "a", "dependencies": { "b": "*" } })),
            ("b", json!({ "name": "b", "dependencies": { "c": "*" } })),
            ("c", json!({ "name": "c", "dependencies": { "a": "*" } })),
        ])
        .await
        .unwrap_err();

        assert_eq!(err.to_string(), "Cycle detected: c -> a -> b -> c");
    }

    #[tokio::test]
    async fn test_self_dependency_is_a_cycle() {
        let err = build(&[(
            "a",
            json!({ "name": "a", "dependencies": { "a": "*" } }),
        )])
        .await
        .unwrap_err();

        assert_eq!(err.to_string(), "Cycle detected: a -> a");
    }

    #[tokio::test]
    async fn test_duplicate_package_names_are_rejected() {
        let err = build(&[
            ("first", json!({ "name": "dup" })),
            ("second", json!({ "name": "dup" })),
        ])
        .await
        .unwrap_err();

        assert!(matches!(err, Error::DuplicatePackage { .. }));
        let message = err.to_string();
        assert!(message.contains("dup"), "{message}");
        assert!(message.contains("first"), "{message}");
        assert!(message.contains("second"), "{message}");
    }

    #[tokio::test]
    async fn test_manifests_without_a_name_are_ignored() {
        let graph = build(&[
            ("a", json!({ "name": "a" })),
            ("nameless", json!({ "version": "1.0.0" })),
        ])
        .await
        .unwrap();

        assert_eq!(graph.len(), 1);
        assert!(graph.contains("a"));
    }

    #[tokio::test]
    async fn test_successful_graph_is_acyclic() {
        // Diamond: a -> {b, c} -> d.
        let graph = build(&[
            (
                "a",
                json!({ "name": "a", "dependencies": { "b": "*", "c": "*" } }),
            ),
            ("b", json!({ "name": "b", "dependencies": { "d": "*" } })),
            ("c", json!({ "name": "c", "dependencies": { "d": "*" } })),
            ("d", json!({ "name": "d" })),
        ])
        .await
        .unwrap();

        // DFS from every node must terminate without revisiting a node on
        // the current path.
        fn descend(
            graph: &PackageGraph,
            name: &str,
            on_path: &mut HashSet<String>,
        ) {
            assert!(on_path.insert(name.to_string()), "cycle through {name}");
            for dep in &graph.package_info(name).unwrap().internal_dependencies {
                descend(graph, dep, on_path);
            }
            on_path.remove(name);
        }
        for (name, _) in graph.packages() {
            descend(&graph, name, &mut HashSet::new());
        }
    }

    #[tokio::test]
    async fn test_discovers_and_loads_manifests_from_disk() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();
        let write = |dir: &str, contents: serde_json::Value| {
            let dir = root.join(dir);
            std::fs::create_dir_all(&dir).unwrap();
            std::fs::write(dir.join("package.json"), contents.to_string()).unwrap();
        };
        write(
            "packages/app",
            json!({ "name": "app", "dependencies": { "lib": "*" } }),
        );
        write("packages/lib", json!({ "name": "lib" }));
        // Broken manifests are tolerated and contribute nothing.
        let broken = root.join("packages/broken");
        std::fs::create_dir_all(&broken).unwrap();
        std::fs::write(broken.join("package.json"), "{ nope").unwrap();

        let root_json = manifest(json!({
            "name": "root",
            "workspaces": { "packages": ["packages/*"] },
        }));
        let graph = PackageGraph::builder(root, root_json)
            .build()
            .await
            .unwrap();

        assert_eq!(graph.len(), 2);
        assert!(graph
            .package_info("app")
            .unwrap()
            .internal_dependencies
            .contains("lib"));
        assert_eq!(graph.package_manager(), PackageManager::Yarn);
    }
}
