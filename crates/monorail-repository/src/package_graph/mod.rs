use std::{
    collections::{BTreeMap, BTreeSet, HashMap},
    path::{Path, PathBuf},
};

use crate::{package_json::PackageJson, package_manager::PackageManager};

mod builder;

pub use builder::{Error, PackageGraphBuilder};

/// The workspace's packages and their dependency relation. Packages are
/// owned by a single flat map keyed by name; edges are name sets resolved
/// against that map on use, never owning pointers. The relation is
/// guaranteed acyclic once `build` succeeds, and the graph is frozen from
/// then on.
#[derive(Debug)]
pub struct PackageGraph {
    packages: HashMap<String, PackageInfo>,
    package_manager: PackageManager,
}

/// One discovered package: its manifest, the absolute directory holding
/// it, and its dependencies split into workspace-internal names and
/// external name/version pairs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageInfo {
    pub package_json: PackageJson,
    pub package_dir: PathBuf,
    pub internal_dependencies: BTreeSet<String>,
    pub external_dependencies: BTreeMap<String, String>,
}

impl PackageGraph {
    pub fn builder(repo_root: &Path, root_package_json: PackageJson) -> PackageGraphBuilder<'_> {
        PackageGraphBuilder::new(repo_root, root_package_json)
    }

    /// Number of workspace packages (the root manifest is not a package).
    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.packages.contains_key(name)
    }

    pub fn package_info(&self, name: &str) -> Option<&PackageInfo> {
        self.packages.get(name)
    }

    pub fn packages(&self) -> impl Iterator<Item = (&String, &PackageInfo)> {
        self.packages.iter()
    }

    pub fn package_manager(&self) -> PackageManager {
        self.package_manager
    }
}
