//! Workspace model: the `package.json` manifest, the inter-package
//! dependency graph, pipeline directives, and package manager detection.

pub mod package_graph;
pub mod package_json;
pub mod package_manager;
pub mod pipeline;
