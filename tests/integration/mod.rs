//! Integration test suite for xcforge
//!
//! End-to-end tests that run the `xcforge` binary against graph descriptions, dependency
//! manifests and a mock remote cache.
//!
//! # Running Integration Tests
//!
//! ```bash
//! cargo test --test integration
//! ```
//!
//! # Test Organization
//!
//! - **cache**: Uploading and fetching artifacts
//! - **dependencies**: Dependency manifest handling
//! - **graph**: Dependency tree output
//! - **hash**: Cache key output
//! - **lint**: Static products linting

mod cache;
mod dependencies;
mod graph;
mod hash;
mod lint;

use assert_cmd::Command;
use std::path::Path;

/// `xcforge` with a global config path that never exists, so the user's config is not read.
pub fn xcforge(config_dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("xcforge").unwrap();
    cmd.env("XCFORGE_CONFIG", config_dir.join("config.toml")).env_remove("RUST_LOG");
    cmd
}
