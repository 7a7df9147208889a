//! Declarative graph descriptions.
//!
//! Manifest evaluation happens upstream; what reaches xcforge is a TOML description of the
//! projects, their targets and each target's dependencies:
//!
//! ```toml
//! [[projects]]
//! path = "App"
//!
//! [[projects.targets]]
//! name = "App"
//! product = "app"
//! platform = "ios"
//! dependencies = [
//!     { target = "Core" },
//!     { target = "Shared", path = "../Shared" },
//!     { library = "Vendor/libCrypto.a", linking = "static" },
//!     { xcframework = "Vendor/Analytics.xcframework" },
//!     { package = "Alamofire" },
//!     { external = "RxSwift" },
//! ]
//! ```
//!
//! Project paths are relative to the description file; dependency paths are relative to
//! the project that declares them. External dependencies name products installed by
//! `xcforge dependencies` and are looked up in `Dependencies/graph.json` next to the
//! description.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Component, Path, PathBuf};
use tracing::debug;

use super::{
    FrameworkKind, FrameworkNode, Graph, GraphBuilder, GraphNode, LibraryNode, Linking, NodeId,
    PackageProductNode, Platform, Product, Target, TargetNode,
};
use crate::constants::DEPENDENCIES_DIRECTORY;
use crate::core::XcforgeError;
use crate::dependencies::DependenciesGraph;

/// Root of a graph description file.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GraphDescription {
    #[serde(default)]
    pub projects: Vec<ProjectDescription>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProjectDescription {
    pub path: PathBuf,
    #[serde(default)]
    pub targets: Vec<TargetDescription>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TargetDescription {
    pub name: String,
    pub product: Product,
    pub platform: Platform,
    #[serde(default)]
    pub dependencies: Vec<DependencyDescription>,
}

/// A single dependency entry of a target.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum DependencyDescription {
    Target {
        target: String,
        #[serde(default)]
        path: Option<PathBuf>,
    },
    Library {
        library: PathBuf,
        #[serde(default = "static_linking")]
        linking: Linking,
    },
    Framework {
        framework: PathBuf,
        #[serde(default = "dynamic_linking")]
        linking: Linking,
    },
    XcFramework {
        xcframework: PathBuf,
        #[serde(default = "dynamic_linking")]
        linking: Linking,
    },
    External {
        external: String,
        #[serde(default = "dynamic_linking")]
        linking: Linking,
    },
    Package {
        package: String,
    },
}

const fn static_linking() -> Linking {
    Linking::Static
}

const fn dynamic_linking() -> Linking {
    Linking::Dynamic
}

impl GraphDescription {
    /// Read and parse a description file.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(XcforgeError::ManifestNotFound {
                path: path.display().to_string(),
            }
            .into());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read graph description {}", path.display()))?;

        Self::parse(&content, path)
    }

    /// Parse description text; `origin` is used for error messages only.
    pub fn parse(content: &str, origin: &Path) -> Result<Self> {
        toml::from_str(content).map_err(|e| {
            anyhow::Error::from(XcforgeError::ManifestParseError {
                file: origin.display().to_string(),
                reason: e.to_string(),
            })
        })
    }

    /// Build the graph, resolving relative paths against `root`.
    ///
    /// Precompiled nodes and package products referenced by several targets become a
    /// single node.
    pub fn into_graph(self, root: &Path) -> Result<Graph, XcforgeError> {
        let mut builder = GraphBuilder::new();

        let projects: Vec<(PathBuf, Vec<TargetDescription>)> = self
            .projects
            .into_iter()
            .map(|project| (normalize(&root.join(&project.path)), project.targets))
            .collect();

        for (project_path, targets) in &projects {
            for target in targets {
                builder.add_node(GraphNode::Target(TargetNode::new(
                    project_path.clone(),
                    Target::new(target.name.clone(), target.product, target.platform),
                )))?;
            }
        }

        let needs_externals = projects.iter().flat_map(|(_, targets)| targets).any(|target| {
            target
                .dependencies
                .iter()
                .any(|dependency| matches!(dependency, DependencyDescription::External { .. }))
        });
        let directory = root.join(DEPENDENCIES_DIRECTORY);
        let graph = if needs_externals {
            DependenciesGraph::load(&directory)?
        } else {
            DependenciesGraph::default()
        };
        let externals = InstalledProducts {
            directory,
            graph,
        };

        for (project_path, targets) in &projects {
            for target in targets {
                let from = NodeId::new(project_path.clone(), target.name.clone());
                for dependency in &target.dependencies {
                    let to = resolve_dependency(
                        &mut builder,
                        project_path,
                        target.platform,
                        dependency,
                        &externals,
                    )?;
                    builder.add_dependency(&from, &to)?;
                }
            }
        }

        debug!(target: "graph", "Loaded {} projects from description", projects.len());
        builder.build()
    }
}

/// Load a description file and build its graph, rooted at the file's directory.
pub fn load_graph(path: &Path) -> Result<Graph> {
    let description = GraphDescription::load(path)?;
    let root = path.parent().map(Path::to_path_buf).unwrap_or_default();
    Ok(description.into_graph(&root)?)
}

/// Products installed under the description's `Dependencies` directory.
struct InstalledProducts {
    directory: PathBuf,
    graph: DependenciesGraph,
}

fn resolve_dependency(
    builder: &mut GraphBuilder,
    project_path: &Path,
    platform: Platform,
    dependency: &DependencyDescription,
    externals: &InstalledProducts,
) -> Result<NodeId, XcforgeError> {
    match dependency {
        DependencyDescription::Target {
            target,
            path,
        } => {
            let path = path
                .as_ref()
                .map_or_else(|| project_path.to_path_buf(), |p| normalize(&project_path.join(p)));
            let id = NodeId::new(path, target.clone());
            match builder.node(&id) {
                Some(node) if node.as_target().is_none() => Err(XcforgeError::TargetNotFound {
                    name: id.name,
                    path: id.path.display().to_string(),
                }),
                _ => Ok(id),
            }
        }
        DependencyDescription::Library {
            library,
            linking,
        } => builder.ensure_node(GraphNode::Library(LibraryNode::new(
            normalize(&project_path.join(library)),
            *linking,
        ))),
        DependencyDescription::Framework {
            framework,
            linking,
        } => builder.ensure_node(GraphNode::Framework(FrameworkNode::new(
            normalize(&project_path.join(framework)),
            FrameworkKind::Framework,
            *linking,
        ))),
        DependencyDescription::XcFramework {
            xcframework,
            linking,
        } => builder.ensure_node(GraphNode::Framework(FrameworkNode::new(
            normalize(&project_path.join(xcframework)),
            FrameworkKind::XcFramework,
            *linking,
        ))),
        DependencyDescription::External {
            external,
            linking,
        } => {
            let node = externals
                .graph
                .framework_node(external, platform, *linking, &externals.directory)
                .ok_or_else(|| XcforgeError::ExternalDependencyNotFound {
                    name: external.clone(),
                    platform: platform.to_string(),
                    path: externals.directory.display().to_string(),
                })?;
            builder.ensure_node(node)
        }
        DependencyDescription::Package {
            package,
        } => builder.ensure_node(GraphNode::Package(PackageProductNode::new(
            project_path.to_path_buf(),
            package.clone(),
        ))),
    }
}

/// Lexically resolve `.` and `..` components without touching the file system.
fn normalize(path: &Path) -> PathBuf {
    let mut result = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !result.pop() {
                    result.push("..");
                }
            }
            other => result.push(other.as_os_str()),
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const DESCRIPTION: &str = r#"
[[projects]]
path = "App"

[[projects.targets]]
name = "App"
product = "app"
platform = "ios"
dependencies = [
    { target = "Core" },
    { target = "Shared", path = "../Shared" },
    { library = "Vendor/libCrypto.a" },
    { package = "Alamofire" },
]

[[projects.targets]]
name = "Core"
product = "framework"
platform = "ios"
dependencies = [
    { library = "./Vendor/libCrypto.a" },
    { xcframework = "Vendor/Analytics.xcframework", linking = "static" },
]

[[projects]]
path = "Shared"

[[projects.targets]]
name = "Shared"
product = "static_library"
platform = "ios"
"#;

    #[test]
    fn test_into_graph_resolves_references() {
        let description = GraphDescription::parse(DESCRIPTION, Path::new("graph.toml")).unwrap();
        let graph = description.into_graph(Path::new("/Workspace")).unwrap();

        // App, Core, Shared, libCrypto, Alamofire, Analytics
        assert_eq!(graph.node_count(), 6);

        let app = NodeId::new("/Workspace/App", "App");
        let deps: Vec<String> = graph.dependencies(&app).iter().map(|n| n.to_string()).collect();
        assert_eq!(
            deps,
            vec![
                "Target \"Core\"",
                "Target \"Shared\"",
                "Library \"Crypto\"",
                "Package \"Alamofire\""
            ]
        );

        // The library is shared between App and Core
        let core = NodeId::new("/Workspace/App", "Core");
        let core_deps = graph.dependencies(&core);
        assert_eq!(core_deps[0].id(), graph.dependencies(&app)[2].id());
        assert!(core_deps[1].is_static_product());
    }

    #[test]
    fn test_package_named_like_a_target_conflicts() {
        let text = r#"
[[projects]]
path = "App"

[[projects.targets]]
name = "App"
product = "app"
platform = "ios"
dependencies = [{ package = "Core" }]

[[projects.targets]]
name = "Core"
product = "framework"
platform = "ios"
"#;
        let description = GraphDescription::parse(text, Path::new("graph.toml")).unwrap();
        let error = description.into_graph(Path::new("/Workspace")).unwrap_err();
        assert!(matches!(error, XcforgeError::ConflictingNode { name, .. } if name == "Core"));
    }

    #[test]
    fn test_framework_linked_both_ways_conflicts() {
        let text = r#"
[[projects]]
path = "App"

[[projects.targets]]
name = "App"
product = "app"
platform = "ios"
dependencies = [{ target = "Core" }, { framework = "Vendor/X.framework", linking = "static" }]

[[projects.targets]]
name = "Core"
product = "framework"
platform = "ios"
dependencies = [{ framework = "Vendor/X.framework" }]
"#;
        let description = GraphDescription::parse(text, Path::new("graph.toml")).unwrap();
        let error = description.into_graph(Path::new("/Workspace")).unwrap_err();
        match error {
            XcforgeError::ConflictingNode {
                existing,
                requested,
                ..
            } => {
                assert!(existing.contains("static"));
                assert!(requested.contains("dynamic"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_target_reference_to_package_product() {
        let text = r#"
[[projects]]
path = "App"

[[projects.targets]]
name = "App"
product = "app"
platform = "ios"
dependencies = [{ package = "X" }, { target = "X" }]
"#;
        let description = GraphDescription::parse(text, Path::new("graph.toml")).unwrap();
        let error = description.into_graph(Path::new("/Workspace")).unwrap_err();
        assert!(matches!(error, XcforgeError::TargetNotFound { name, .. } if name == "X"));
    }

    const EXTERNAL_DESCRIPTION: &str = r#"
[[projects]]
path = "App"

[[projects.targets]]
name = "App"
product = "app"
platform = "ios"
dependencies = [{ target = "Core" }, { external = "Alamofire" }]

[[projects.targets]]
name = "Core"
product = "framework"
platform = "ios"
dependencies = [{ external = "Alamofire" }]
"#;

    #[test]
    fn test_external_dependency_resolves_installed_product() {
        let temp = TempDir::new().unwrap();
        let dependencies = temp.path().join("Dependencies");
        fs::create_dir_all(dependencies.join("Carthage/iOS/Alamofire.framework")).unwrap();
        DependenciesGraph::scan(&dependencies).unwrap().save(&dependencies).unwrap();
        let path = temp.path().join("graph.toml");
        fs::write(&path, EXTERNAL_DESCRIPTION).unwrap();

        let graph = load_graph(&path).unwrap();

        let app = NodeId::new(temp.path().join("App"), "App");
        let deps = graph.dependencies(&app);
        assert_eq!(deps[1].to_string(), "Framework \"Alamofire\"");
        assert_eq!(
            deps[1].path(),
            dependencies.join("Carthage").join("iOS").join("Alamofire.framework")
        );
        // App and Core share the installed product
        assert_eq!(graph.node_count(), 3);
    }

    #[test]
    fn test_external_dependency_not_installed() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("graph.toml");
        fs::write(&path, EXTERNAL_DESCRIPTION).unwrap();

        let error = load_graph(&path).unwrap_err();
        assert!(matches!(
            error.downcast_ref::<XcforgeError>(),
            Some(XcforgeError::ExternalDependencyNotFound { name, platform, .. })
                if name == "Alamofire" && platform == "iOS"
        ));
    }

    #[test]
    fn test_unknown_target_reference() {
        let text = r#"
[[projects]]
path = "App"

[[projects.targets]]
name = "App"
product = "app"
platform = "ios"
dependencies = [{ target = "Missing" }]
"#;
        let description = GraphDescription::parse(text, Path::new("graph.toml")).unwrap();
        let error = description.into_graph(Path::new("/")).unwrap_err();
        assert!(matches!(error, XcforgeError::TargetNotFound { name, .. } if name == "Missing"));
    }

    #[test]
    fn test_parse_error_is_typed() {
        let error = GraphDescription::parse("[[projects]]\npath = 3", Path::new("graph.toml"))
            .unwrap_err();
        assert!(matches!(
            error.downcast_ref::<XcforgeError>(),
            Some(XcforgeError::ManifestParseError { .. })
        ));
    }

    #[test]
    fn test_load_missing_file() {
        let temp = TempDir::new().unwrap();
        let error = load_graph(&temp.path().join("graph.toml")).unwrap_err();
        assert!(matches!(
            error.downcast_ref::<XcforgeError>(),
            Some(XcforgeError::ManifestNotFound { .. })
        ));
    }

    #[test]
    fn test_load_graph_from_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("graph.toml");
        fs::write(&path, DESCRIPTION).unwrap();

        let graph = load_graph(&path).unwrap();
        assert!(graph.find_target("Shared").is_some());
        assert_eq!(graph.entry_nodes().len(), 1);
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize(Path::new("/a/b/../c/./d")), PathBuf::from("/a/c/d"));
    }
}
