//! Command-line interface for xcforge.
//!
//! This module defines the argument structure with `clap` derive macros and routes each
//! subcommand to its implementation.
//!
//! # Commands
//!
//! - `lint` - Report static products linked into more than one binary
//! - `graph` - Print the dependency tree of a graph description
//! - `hash` - Print the cache key of every target
//! - `cache` - Upload or fetch artifacts from the remote cache
//! - `dependencies` - Fetch or update third-party dependencies
//!
//! # Global Options
//!
//! - `--verbose` / `-v` - Debug logging
//! - `--quiet` / `-q` - No logging
//! - `--config` / `-c` - Alternate global config file (also `XCFORGE_CONFIG`)
//!
//! # Examples
//!
//! ```bash
//! xcforge lint --graph graph.toml
//! xcforge hash --graph graph.toml --target App --configuration Debug
//! xcforge cache upload App.framework.zip --url https://cache.example.com/abc/App.zip
//! xcforge dependencies fetch --path ./MyApp
//! ```

mod cache;
mod dependencies;
mod graph;
mod hash;
mod lint;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::GlobalConfig;

/// Settings derived from global flags, shared by every command.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    /// `EnvFilter` directive for the subscriber; `None` disables logging.
    pub log_level: Option<String>,

    /// Global config file chosen with `--config`.
    pub config_path: Option<PathBuf>,
}

impl CliConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the global configuration this invocation should use.
    pub async fn global_config(&self) -> Result<GlobalConfig> {
        GlobalConfig::load_with_optional(self.config_path.clone()).await
    }
}

/// Project graph linting, artifact caching and dependency orchestration.
#[derive(Parser)]
#[command(
    name = "xcforge",
    about = "Lint project graphs, cache build artifacts and install Xcode dependencies",
    version,
    author,
    long_about = "xcforge analyzes project dependency graphs for static-linking conflicts, \
                  derives content-addressed cache keys for targets, transfers prebuilt \
                  artifacts to and from a remote cache, and drives Carthage and Swift \
                  Package Manager installations."
)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable logging
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Path to the global config file
    #[arg(short, long, global = true, env = "XCFORGE_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Report static products linked into more than one binary
    Lint(lint::LintCommand),

    /// Print the dependency tree of a graph description
    Graph(graph::GraphCommand),

    /// Print target cache keys
    Hash(hash::HashCommand),

    /// Transfer artifacts to and from the remote cache
    Cache(cache::CacheCommand),

    /// Fetch or update third-party dependencies
    Dependencies(dependencies::DependenciesCommand),
}

impl Cli {
    pub async fn execute(self) -> Result<()> {
        let config = self.build_config();
        self.execute_with_config(config).await
    }

    /// Derive shared settings from the global flags.
    ///
    /// `RUST_LOG` wins over the default level but not over `--verbose` or `--quiet`.
    #[must_use]
    pub fn build_config(&self) -> CliConfig {
        let log_level = if self.verbose {
            Some("debug".to_string())
        } else if self.quiet {
            None
        } else {
            Some(std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()))
        };

        CliConfig {
            log_level,
            config_path: self.config.clone(),
        }
    }

    pub async fn execute_with_config(self, config: CliConfig) -> Result<()> {
        match self.command {
            Commands::Lint(cmd) => cmd.execute(),
            Commands::Graph(cmd) => cmd.execute(),
            Commands::Hash(cmd) => cmd.execute(),
            Commands::Cache(cmd) => cmd.execute(&config).await,
            Commands::Dependencies(cmd) => cmd.execute(&config).await,
        }
    }
}
