//! `Dependencies.toml`, the project's third-party dependency declarations.
//!
//! ```toml
//! [[carthage]]
//! origin = "github"
//! path = "Alamofire/Alamofire"
//! requirement = { up_to_next_major = "5.0.0" }
//! platforms = ["ios", "macos"]
//!
//! [[swift_package]]
//! url = "https://github.com/apple/swift-argument-parser"
//! requirement = { exact = "1.2.0" }
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use crate::core::XcforgeError;
use crate::graph::Platform;

/// Version constraint on a dependency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Requirement {
    Exact(String),
    UpToNextMajor(String),
    UpToNextMinor(String),
    Branch(String),
    Revision(String),
}

/// Where Carthage fetches a dependency from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CarthageOrigin {
    /// `owner/repo` on GitHub.
    Github,
    /// Any git URL.
    Git,
    /// URL of a binary project specification.
    Binary,
}

impl CarthageOrigin {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Github => "github",
            Self::Git => "git",
            Self::Binary => "binary",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CarthageDependency {
    pub origin: CarthageOrigin,
    /// `owner/repo` for GitHub, a URL otherwise.
    pub path: String,
    pub requirement: Requirement,
    pub platforms: BTreeSet<Platform>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SwiftPackageDependency {
    pub url: String,
    pub requirement: Requirement,
    #[serde(default)]
    pub platforms: BTreeSet<Platform>,
}

/// Every dependency a project declares, grouped by the tool that installs it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Dependencies {
    #[serde(default, rename = "carthage")]
    pub carthage: Vec<CarthageDependency>,
    #[serde(default, rename = "swift_package")]
    pub swift_packages: Vec<SwiftPackageDependency>,
}

impl Requirement {
    #[must_use]
    pub fn value(&self) -> &str {
        match self {
            Self::Exact(value)
            | Self::UpToNextMajor(value)
            | Self::UpToNextMinor(value)
            | Self::Branch(value)
            | Self::Revision(value) => value,
        }
    }
}

impl Dependencies {
    /// Read `Dependencies.toml`.
    ///
    /// Values are written verbatim into generated `Cartfile` and `Package.swift` string
    /// literals, so quotes, backslashes and control characters are rejected.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(XcforgeError::ManifestNotFound {
                path: path.display().to_string(),
            }
            .into());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read dependencies manifest {}", path.display()))?;
        let dependencies: Self = toml::from_str(&content).map_err(|e| {
            anyhow::Error::from(XcforgeError::ManifestParseError {
                file: path.display().to_string(),
                reason: e.to_string(),
            })
        })?;
        dependencies.validate().map_err(|reason| XcforgeError::ManifestParseError {
            file: path.display().to_string(),
            reason,
        })?;
        Ok(dependencies)
    }

    fn validate(&self) -> Result<(), String> {
        let carthage = self
            .carthage
            .iter()
            .flat_map(|dependency| [dependency.path.as_str(), dependency.requirement.value()]);
        let swift_packages = self
            .swift_packages
            .iter()
            .flat_map(|dependency| [dependency.url.as_str(), dependency.requirement.value()]);

        match carthage.chain(swift_packages).find(|value| !is_literal_safe(value)) {
            Some(value) => Err(format!(
                "{value:?} contains a quote, backslash or control character"
            )),
            None => Ok(()),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.carthage.is_empty() && self.swift_packages.is_empty()
    }
}

fn is_literal_safe(value: &str) -> bool {
    !value.chars().any(|c| c == '"' || c == '\\' || c.is_control())
}
