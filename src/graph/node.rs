//! Node types of the project graph.
//!
//! A [`GraphNode`] is a closed set of variants: targets defined in a project, precompiled
//! libraries, precompiled frameworks (`.framework` and `.xcframework`) and package
//! products resolved by an external package manager. Nodes are identified by a
//! [`NodeId`], the pair of path and name.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Identity of a node: unique per (path, name) pair within a graph.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    /// Project path for targets and package products, binary path for precompiled nodes.
    pub path: PathBuf,
    /// Node name.
    pub name: String,
}

impl NodeId {
    /// Create a new node identity.
    pub fn new(path: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.path.display())
    }
}

/// Kind of product a target builds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Product {
    App,
    StaticLibrary,
    DynamicLibrary,
    Framework,
    StaticFramework,
    UnitTests,
    UiTests,
    Bundle,
    AppExtension,
    CommandLineTool,
}

impl Product {
    /// Products whose code is copied into whatever links them.
    #[must_use]
    pub const fn is_static(self) -> bool {
        matches!(self, Self::StaticLibrary | Self::StaticFramework)
    }

    /// Test bundles, which are hosted by an app when they depend on one.
    #[must_use]
    pub const fn is_tests_bundle(self) -> bool {
        matches!(self, Self::UnitTests | Self::UiTests)
    }

    /// Products that run the linker over their static dependencies.
    ///
    /// Static products and resource bundles pass their static dependencies through to
    /// whoever links them.
    #[must_use]
    pub const fn can_link_static_products(self) -> bool {
        matches!(
            self,
            Self::App
                | Self::DynamicLibrary
                | Self::Framework
                | Self::UnitTests
                | Self::UiTests
                | Self::AppExtension
                | Self::CommandLineTool
        )
    }

    /// Stable name used in descriptions and cache keys.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::App => "app",
            Self::StaticLibrary => "static_library",
            Self::DynamicLibrary => "dynamic_library",
            Self::Framework => "framework",
            Self::StaticFramework => "static_framework",
            Self::UnitTests => "unit_tests",
            Self::UiTests => "ui_tests",
            Self::Bundle => "bundle",
            Self::AppExtension => "app_extension",
            Self::CommandLineTool => "command_line_tool",
        }
    }
}

impl fmt::Display for Product {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Platform a target or dependency is built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Ios,
    Macos,
    Tvos,
    Watchos,
}

impl Platform {
    /// Name as spelled by Xcode tooling (`iOS`, `macOS`, ...).
    #[must_use]
    pub const fn case_value(self) -> &'static str {
        match self {
            Self::Ios => "iOS",
            Self::Macos => "macOS",
            Self::Tvos => "tvOS",
            Self::Watchos => "watchOS",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.case_value())
    }
}

/// How a precompiled binary is linked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Linking {
    Static,
    Dynamic,
}

impl Linking {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Static => "static",
            Self::Dynamic => "dynamic",
        }
    }
}

/// A target declared in a project.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Target {
    pub name: String,
    pub product: Product,
    pub platform: Platform,
}

impl Target {
    pub fn new(name: impl Into<String>, product: Product, platform: Platform) -> Self {
        Self {
            name: name.into(),
            product,
            platform,
        }
    }
}

/// A target together with the project it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TargetNode {
    pub project_path: PathBuf,
    pub target: Target,
}

impl TargetNode {
    pub fn new(project_path: impl Into<PathBuf>, target: Target) -> Self {
        Self {
            project_path: project_path.into(),
            target,
        }
    }
}

/// A precompiled library (`.a` or `.dylib`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LibraryNode {
    pub path: PathBuf,
    pub name: String,
    pub linking: Linking,
}

impl LibraryNode {
    /// The node name is the file stem with any `lib` prefix removed.
    pub fn new(path: impl Into<PathBuf>, linking: Linking) -> Self {
        let path = path.into();
        let stem = file_stem(&path);
        let name = stem.strip_prefix("lib").filter(|s| !s.is_empty()).unwrap_or(stem.as_str()).to_string();
        Self {
            path,
            name,
            linking,
        }
    }
}

/// Flavour of precompiled framework.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameworkKind {
    Framework,
    XcFramework,
}

/// A precompiled `.framework` or `.xcframework`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FrameworkNode {
    pub path: PathBuf,
    pub name: String,
    pub kind: FrameworkKind,
    pub linking: Linking,
}

impl FrameworkNode {
    pub fn new(path: impl Into<PathBuf>, kind: FrameworkKind, linking: Linking) -> Self {
        let path = path.into();
        let name = file_stem(&path);
        Self {
            path,
            name,
            kind,
            linking,
        }
    }
}

/// A product of an externally resolved package.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PackageProductNode {
    pub project_path: PathBuf,
    pub product: String,
}

impl PackageProductNode {
    pub fn new(project_path: impl Into<PathBuf>, product: impl Into<String>) -> Self {
        Self {
            project_path: project_path.into(),
            product: product.into(),
        }
    }
}

/// A node of the project graph.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum GraphNode {
    Target(TargetNode),
    Library(LibraryNode),
    Framework(FrameworkNode),
    Package(PackageProductNode),
}

impl GraphNode {
    /// Identity of this node.
    #[must_use]
    pub fn id(&self) -> NodeId {
        NodeId::new(self.path(), self.name())
    }

    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Target(node) => &node.target.name,
            Self::Library(node) => &node.name,
            Self::Framework(node) => &node.name,
            Self::Package(node) => &node.product,
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::Target(node) => &node.project_path,
            Self::Library(node) => &node.path,
            Self::Framework(node) => &node.path,
            Self::Package(node) => &node.project_path,
        }
    }

    #[must_use]
    pub const fn as_target(&self) -> Option<&TargetNode> {
        match self {
            Self::Target(node) => Some(node),
            _ => None,
        }
    }

    /// Whether linking this node copies its code into the linker's binary.
    ///
    /// Package products are treated as static.
    #[must_use]
    pub const fn is_static_product(&self) -> bool {
        match self {
            Self::Target(node) => node.target.product.is_static(),
            Self::Library(node) => matches!(node.linking, Linking::Static),
            Self::Framework(node) => matches!(node.linking, Linking::Static),
            Self::Package(_) => true,
        }
    }

    /// Human readable kind used in lint messages.
    #[must_use]
    pub const fn kind_label(&self) -> &'static str {
        match self {
            Self::Target(_) => "Target",
            Self::Library(_) => "Library",
            Self::Framework(_) => "Framework",
            Self::Package(_) => "Package",
        }
    }
}

impl fmt::Display for GraphNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} \"{}\"", self.kind_label(), self.name())
    }
}

fn file_stem(path: &Path) -> String {
    path.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default()
}
