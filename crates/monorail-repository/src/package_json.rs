use std::{collections::BTreeMap, io, path::Path, path::PathBuf};

use serde::Deserialize;

/// Base name of the manifest file discovered under every workspace glob.
pub const MANIFEST_FILE: &str = "package.json";

/// The subset of `package.json` the runner consumes. Unknown fields are
/// tolerated and dropped. A manifest with an empty `name` never becomes a
/// package.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PackageJson {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub private: bool,
    #[serde(default)]
    pub scripts: BTreeMap<String, String>,
    #[serde(default)]
    pub dependencies: BTreeMap<String, String>,
    #[serde(default, rename = "devDependencies")]
    pub dev_dependencies: BTreeMap<String, String>,
    #[serde(default)]
    pub workspaces: Workspaces,
    #[serde(default)]
    pub lage: RunnerConfig,
}

/// Workspace glob declarations from the root manifest. Both npm forms are
/// accepted: a bare array of globs, or an object with a `packages` array.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum Workspaces {
    Globs(Vec<String>),
    Grouped {
        #[serde(default)]
        packages: Vec<String>,
    },
}

/// Runner configuration carried by the root manifest under the `lage` key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RunnerConfig {
    #[serde(default)]
    pub pipeline: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("unable to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("unable to parse package.json: {0}")]
    Parse(#[from] serde_json::Error),
}

impl Default for Workspaces {
    fn default() -> Self {
        Workspaces::Globs(Vec::new())
    }
}

impl Workspaces {
    pub fn packages(&self) -> &[String] {
        match self {
            Workspaces::Globs(globs) => globs,
            Workspaces::Grouped { packages } => packages,
        }
    }
}

impl PackageJson {
    pub fn load(path: &Path) -> Result<PackageJson, Error> {
        let contents = std::fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_str(&contents)?)
    }

    pub fn from_value(value: serde_json::Value) -> Result<PackageJson, Error> {
        Ok(serde_json::from_value(value)?)
    }

    /// `dependencies` then `devDependencies`, in that order.
    pub fn all_dependencies(&self) -> impl Iterator<Item = (&String, &String)> {
        self.dependencies.iter().chain(self.dev_dependencies.iter())
    }
}
