//! Index of the precompiled products installed by the backends.
//!
//! After an installation the Carthage and Swift package output directories are scanned
//! for `.framework` and `.xcframework` bundles. The result is written to
//! `Dependencies/graph.json`, which the graph description loader reads to resolve
//! `{ external = "<name>" }` dependencies into framework nodes without rescanning.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

use crate::constants::{CARTHAGE_DIRECTORY, GRAPH_FILE, SWIFT_PACKAGE_MANAGER_DIRECTORY};
use crate::core::XcforgeError;
use crate::graph::{FrameworkKind, FrameworkNode, GraphNode, Linking, Platform};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductKind {
    Framework,
    Xcframework,
}

/// A precompiled product found in a backend's output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstalledProduct {
    /// Path relative to the dependencies directory.
    pub path: PathBuf,
    pub kind: ProductKind,
    /// Platform, when the product lives in a per-platform directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<Platform>,
}

/// Every installed product, keyed by `<platform>/<name>` or `<name>`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependenciesGraph {
    pub products: BTreeMap<String, InstalledProduct>,
}

impl DependenciesGraph {
    /// Scan the backends' output directories under `dependencies_directory`.
    ///
    /// Missing output directories contribute nothing. Bundles are not descended into, so
    /// frameworks nested inside an xcframework are not reported separately.
    pub fn scan(dependencies_directory: &Path) -> Result<Self> {
        let mut products = BTreeMap::new();

        for root in [CARTHAGE_DIRECTORY, SWIFT_PACKAGE_MANAGER_DIRECTORY] {
            let root = dependencies_directory.join(root);
            if !root.is_dir() {
                continue;
            }

            let mut walker = WalkDir::new(&root).sort_by_file_name().into_iter();
            while let Some(entry) = walker.next() {
                let entry = entry.with_context(|| format!("Failed to scan {}", root.display()))?;
                let Some(kind) = product_kind(entry.path()) else {
                    continue;
                };
                if entry.file_type().is_dir() {
                    walker.skip_current_dir();
                }

                let relative = entry.path().strip_prefix(dependencies_directory)?.to_path_buf();
                let platform = entry
                    .path()
                    .parent()
                    .and_then(Path::file_name)
                    .and_then(|name| platform_from_directory(&name.to_string_lossy()));
                let name = entry
                    .path()
                    .file_stem()
                    .map(|stem| stem.to_string_lossy().into_owned())
                    .unwrap_or_default();
                let key = match platform {
                    Some(platform) => format!("{}/{name}", platform.case_value()),
                    None => name,
                };

                debug!(target: "dependencies", "Found {} at {}", key, relative.display());
                products.insert(
                    key,
                    InstalledProduct {
                        path: relative,
                        kind,
                        platform,
                    },
                );
            }
        }

        Ok(Self {
            products,
        })
    }

    /// Write `graph.json` into `dependencies_directory`.
    pub fn save(&self, dependencies_directory: &Path) -> Result<()> {
        fs::create_dir_all(dependencies_directory)?;
        let path = dependencies_directory.join(GRAPH_FILE);
        let content =
            serde_json::to_string_pretty(self).context("Failed to serialize dependencies graph")?;
        fs::write(&path, content)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }

    /// Read `graph.json` from `dependencies_directory`.
    ///
    /// Nothing installed yet reads as an empty graph.
    pub fn load(dependencies_directory: &Path) -> Result<Self, XcforgeError> {
        let path = dependencies_directory.join(GRAPH_FILE);
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path).map_err(|_| XcforgeError::FileSystemError {
            operation: "read dependencies graph".to_string(),
            path: path.display().to_string(),
        })?;
        serde_json::from_str(&content).map_err(|e| XcforgeError::ManifestParseError {
            file: path.display().to_string(),
            reason: e.to_string(),
        })
    }

    /// The product installed as `name` for `platform`.
    ///
    /// Platform-specific builds win over platform-independent ones such as xcframeworks.
    #[must_use]
    pub fn product(&self, name: &str, platform: Platform) -> Option<&InstalledProduct> {
        self.products
            .get(&format!("{}/{name}", platform.case_value()))
            .or_else(|| self.products.get(name))
    }

    /// Graph node for the product installed as `name` for `platform`.
    #[must_use]
    pub fn framework_node(
        &self,
        name: &str,
        platform: Platform,
        linking: Linking,
        dependencies_directory: &Path,
    ) -> Option<GraphNode> {
        self.product(name, platform).map(|product| {
            let kind = match product.kind {
                ProductKind::Framework => FrameworkKind::Framework,
                ProductKind::Xcframework => FrameworkKind::XcFramework,
            };
            GraphNode::Framework(FrameworkNode::new(
                dependencies_directory.join(&product.path),
                kind,
                linking,
            ))
        })
    }
}

fn product_kind(path: &Path) -> Option<ProductKind> {
    match path.extension()?.to_str()? {
        "framework" => Some(ProductKind::Framework),
        "xcframework" => Some(ProductKind::Xcframework),
        _ => None,
    }
}

// Carthage names its per-platform build directories after the SDK.
fn platform_from_directory(name: &str) -> Option<Platform> {
    match name {
        "iOS" => Some(Platform::Ios),
        "Mac" | "macOS" => Some(Platform::Macos),
        "tvOS" => Some(Platform::Tvos),
        "watchOS" => Some(Platform::Watchos),
        _ => None,
    }
}
