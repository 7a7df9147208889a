//! Swift Package Manager backend.
//!
//! Mirrors the Carthage flow: a generated `Package.swift` is resolved in a temporary
//! directory seeded with the previous `Package.resolved` and `.build` checkouts, then
//! the lockfile goes to `Dependencies/Lockfiles` and the `.build` directory to
//! `Dependencies/SwiftPackageManager`.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;
use tracing::{debug, info};

use super::command::ToolCommand;
use super::manifest::{Dependencies, Requirement, SwiftPackageDependency};
use super::plan::Backend;
use super::{DependencyInstaller, InstallFuture, InstallMethod, copy_directory, copy_file};
use crate::constants::{
    DERIVED_DIRECTORY, LOCKFILES_DIRECTORY, PACKAGE_MANIFEST, PACKAGE_RESOLVED,
    SWIFT_PACKAGE_MANAGER_DIRECTORY,
};
use crate::core::XcforgeError;

const TOOL: &str = "swift";
const PACKAGE_NAME: &str = "XcforgeDependencies";

/// Installs Swift package dependencies.
#[derive(Debug, Clone, Default)]
pub struct SwiftPackageInteractor {
    executable: Option<PathBuf>,
    temp_root: Option<PathBuf>,
    timeout: Option<Duration>,
}

impl SwiftPackageInteractor {
    /// `executable` overrides the `swift` found in `PATH`.
    #[must_use]
    pub const fn new(executable: Option<PathBuf>) -> Self {
        Self {
            executable,
            temp_root: None,
            timeout: None,
        }
    }

    /// Kill the tool if it runs longer than `timeout`.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_temp_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.temp_root = Some(root.into());
        self
    }

    pub fn locate(&self) -> Result<PathBuf, XcforgeError> {
        let program = self.executable.as_deref().unwrap_or_else(|| Path::new(TOOL));
        which::which(program).map_err(|_| XcforgeError::ToolNotFound {
            tool: "Swift Package Manager".to_string(),
        })
    }

    pub async fn install_packages(
        &self,
        dependencies_directory: &Path,
        method: InstallMethod,
        dependencies: &[SwiftPackageDependency],
    ) -> Result<()> {
        let program = self.locate()?;

        let staging = match &self.temp_root {
            Some(root) => TempDir::new_in(root),
            None => TempDir::new(),
        }
        .context("Failed to create staging directory")?;
        let temp = staging.path();

        let lockfile = dependencies_directory.join(LOCKFILES_DIRECTORY).join(PACKAGE_RESOLVED);
        let temp_lockfile = temp.join(PACKAGE_RESOLVED);
        let build_directory = temp.join(DERIVED_DIRECTORY);
        let saved_build_directory = dependencies_directory.join(SWIFT_PACKAGE_MANAGER_DIRECTORY);

        if saved_build_directory.exists() {
            debug!(target: "dependencies", "Restoring package checkouts");
            copy_directory(&saved_build_directory, &build_directory)?;
        }
        if lockfile.exists() {
            debug!(target: "dependencies", "Restoring {}", PACKAGE_RESOLVED);
            copy_file(&lockfile, &temp_lockfile)?;
        }

        fs::write(temp.join(PACKAGE_MANIFEST), package_manifest(dependencies))
            .with_context(|| format!("Failed to write {PACKAGE_MANIFEST}"))?;

        let command = swift_package_command(&program, method, temp).with_timeout(self.timeout);
        info!(target: "dependencies", "{}", command.display());
        command.execute_success().await?;

        if !temp_lockfile.exists() {
            return Err(XcforgeError::LockfileNotFound {
                tool: "Swift Package Manager".to_string(),
                lockfile: PACKAGE_RESOLVED.to_string(),
            }
            .into());
        }
        copy_file(&temp_lockfile, &lockfile)?;

        if !build_directory.exists() {
            return Err(XcforgeError::OutputDirectoryNotFound {
                tool: "Swift Package Manager".to_string(),
                directory: DERIVED_DIRECTORY.to_string(),
            }
            .into());
        }
        copy_directory(&build_directory, &saved_build_directory)?;

        Ok(())
    }
}

impl DependencyInstaller for SwiftPackageInteractor {
    fn backend(&self) -> Backend {
        Backend::SwiftPackageManager
    }

    fn install<'a>(
        &'a self,
        dependencies_directory: &'a Path,
        method: InstallMethod,
        dependencies: &'a Dependencies,
    ) -> InstallFuture<'a> {
        Box::pin(self.install_packages(dependencies_directory, method, &dependencies.swift_packages))
    }
}

/// `Package.swift` declaring `dependencies`.
#[must_use]
pub fn package_manifest(dependencies: &[SwiftPackageDependency]) -> String {
    let mut content = String::from("// swift-tools-version:5.3\nimport PackageDescription\n\n");
    content.push_str("let package = Package(\n");
    content.push_str(&format!("    name: \"{PACKAGE_NAME}\",\n"));
    content.push_str("    dependencies: [\n");
    for dependency in dependencies {
        content.push_str(&format!(
            "        .package(url: \"{}\", {}),\n",
            dependency.url,
            package_requirement(&dependency.requirement)
        ));
    }
    content.push_str("    ]\n)\n");
    content
}

fn package_requirement(requirement: &Requirement) -> String {
    match requirement {
        Requirement::Exact(version) => format!(".exact(\"{version}\")"),
        Requirement::UpToNextMajor(version) => format!(".upToNextMajor(from: \"{version}\")"),
        Requirement::UpToNextMinor(version) => format!(".upToNextMinor(from: \"{version}\")"),
        Requirement::Branch(branch) => format!(".branch(\"{branch}\")"),
        Requirement::Revision(revision) => format!(".revision(\"{revision}\")"),
    }
}

/// `swift package resolve` (fetch) or `swift package update` (update) in `path`.
#[must_use]
pub fn swift_package_command(program: &Path, method: InstallMethod, path: &Path) -> ToolCommand {
    let subcommand = match method {
        InstallMethod::Fetch => "resolve",
        InstallMethod::Update => "update",
    };
    ToolCommand::new(TOOL, program)
        .args(["package".to_string(), "--package-path".to_string(), path.display().to_string()])
        .arg(subcommand)
        .current_dir(path)
}
