//! Configuration management for xcforge
//!
//! Project-level inputs (the graph description and `Dependencies.toml`) are parsed by the
//! modules that own them. This module only covers the user configuration file, see
//! [`global`].

pub mod global;

pub use global::{CacheConfig, DependenciesConfig, GlobalConfig};
