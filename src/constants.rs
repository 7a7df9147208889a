//! File and directory names shared by the dependency backends.
//!
//! Installed dependencies live under `<project>/Dependencies/`:
//!
//! ```text
//! Dependencies/
//! ├── Lockfiles/               # Cartfile.resolved, Package.resolved
//! ├── .build/                  # build state restored on the next run
//! ├── Carthage/                # built frameworks, one directory per platform
//! ├── SwiftPackageManager/     # resolved package checkouts
//! └── graph.json               # precompiled products found in the directories above
//! ```

/// Dependency manifest at the project root.
pub const DEPENDENCIES_MANIFEST: &str = "Dependencies.toml";

/// Directory, relative to the project root, that holds installed dependencies.
pub const DEPENDENCIES_DIRECTORY: &str = "Dependencies";

/// Lockfiles saved after each backend run.
pub const LOCKFILES_DIRECTORY: &str = "Lockfiles";

/// Intermediate build state kept between runs so tools can skip unchanged work.
pub const DERIVED_DIRECTORY: &str = ".build";

pub const CARTHAGE_DIRECTORY: &str = "Carthage";

pub const SWIFT_PACKAGE_MANAGER_DIRECTORY: &str = "SwiftPackageManager";

pub const CARTFILE: &str = "Cartfile";

pub const CARTFILE_RESOLVED: &str = "Cartfile.resolved";

pub const PACKAGE_MANIFEST: &str = "Package.swift";

pub const PACKAGE_RESOLVED: &str = "Package.resolved";

/// Dependencies graph written next to the installed products.
pub const GRAPH_FILE: &str = "graph.json";
