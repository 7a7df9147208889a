//! xcforge - graph analysis, artifact caching and dependency orchestration for Xcode projects
//!
//! xcforge works on the dependency graph of a generated Xcode workspace. It reads a
//! declarative description of projects and targets, builds an acyclic graph from it and
//! runs analyses on top: a linter that catches static products linked into more than one
//! binary, and a content hasher that derives cache keys for every target. Prebuilt
//! products are moved to and from a remote HTTP cache addressed by those keys, and
//! third-party dependencies are installed through Carthage and Swift Package Manager.
//!
//! # Core Modules
//!
//! ## Graph
//! - [`graph`] - Graph nodes, construction, cycle detection and the TOML description format
//! - [`linter`] - Graph linters; currently the static products linter
//! - [`hashing`] - SHA-256 content hashing and per-target cache keys
//!
//! ## Artifacts and Dependencies
//! - [`cache`] - Remote cache client, cancellable file uploads and artifact archives
//! - [`dependencies`] - `Dependencies.toml`, installation planning, Carthage and SwiftPM backends
//!
//! ## Supporting Modules
//! - [`cli`] - Command-line interface
//! - [`config`] - Global configuration (`~/.xcforge/config.toml`)
//! - [`constants`] - File and directory names shared across modules
//! - [`core`] - Error types and user-facing error formatting
//!
//! # Graph Description Format
//!
//! ```toml
//! [[projects]]
//! path = "App"
//!
//! [[projects.targets]]
//! name = "App"
//! product = "app"
//! platform = "ios"
//! dependencies = [{ target = "Core" }, { library = "Vendor/libCrypto.a" }]
//!
//! [[projects.targets]]
//! name = "Core"
//! product = "static_library"
//! platform = "ios"
//! ```
//!
//! # Command-Line Usage
//!
//! ```bash
//! # Report static products linked more than once
//! xcforge lint --graph graph.toml
//!
//! # Print cache keys for the Debug configuration
//! xcforge hash --graph graph.toml --configuration Debug
//!
//! # Store a prebuilt framework under its key
//! xcforge cache store Build/Core.framework --hash <key>
//!
//! # Install third-party dependencies pinned by the lockfiles
//! xcforge dependencies fetch --path ./MyApp
//! ```

// Graph analysis
pub mod graph;
pub mod hashing;
pub mod linter;

// Artifacts and dependencies
pub mod cache;
pub mod dependencies;

// Supporting modules
pub mod cli;
pub mod config;
pub mod constants;
pub mod core;

// test_utils module is available for both unit tests and integration tests
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
