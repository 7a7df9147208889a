//! Carthage backend.
//!
//! An installation runs in a fresh temporary directory:
//!
//! 1. Restore `Carthage/Build` and `Cartfile.resolved` from the previous run, if any.
//! 2. Write a `Cartfile` for the declared dependencies.
//! 3. Run `carthage bootstrap` (fetch) or `carthage update` (update).
//! 4. Save `Cartfile.resolved` to `Dependencies/Lockfiles`, the built frameworks to
//!    `Dependencies/Carthage` and the build directory to `Dependencies/.build`.
//!
//! The temporary directory is removed on every exit path.

use anyhow::{Context, Result};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;
use tracing::{debug, info};

use super::command::ToolCommand;
use super::manifest::{CarthageDependency, Dependencies, Requirement};
use super::plan::Backend;
use super::{DependencyInstaller, InstallFuture, InstallMethod, copy_directory, copy_file};
use crate::constants::{
    CARTFILE, CARTFILE_RESOLVED, CARTHAGE_DIRECTORY, DERIVED_DIRECTORY, LOCKFILES_DIRECTORY,
};
use crate::core::XcforgeError;
use crate::graph::Platform;

const TOOL: &str = "carthage";

/// Installs Carthage dependencies.
#[derive(Debug, Clone, Default)]
pub struct CarthageInteractor {
    executable: Option<PathBuf>,
    temp_root: Option<PathBuf>,
    timeout: Option<Duration>,
}

impl CarthageInteractor {
    /// `executable` overrides the `carthage` found in `PATH`.
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

    /// Create staging directories under `root` instead of the system temp directory.
    #[must_use]
    pub fn with_temp_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.temp_root = Some(root.into());
        self
    }

    /// Resolve the executable, failing with [`XcforgeError::ToolNotFound`].
    pub fn locate(&self) -> Result<PathBuf, XcforgeError> {
        let program = self.executable.as_deref().unwrap_or_else(|| Path::new(TOOL));
        which::which(program).map_err(|_| XcforgeError::ToolNotFound {
            tool: "Carthage".to_string(),
        })
    }

    /// Install `dependencies` into `dependencies_directory`.
    pub async fn install_carthage(
        &self,
        dependencies_directory: &Path,
        method: InstallMethod,
        dependencies: &[CarthageDependency],
    ) -> Result<()> {
        let program = self.locate()?;

        let platforms: BTreeSet<Platform> =
            dependencies.iter().flat_map(|dependency| dependency.platforms.iter().copied()).collect();

        let staging = match &self.temp_root {
            Some(root) => TempDir::new_in(root),
            None => TempDir::new(),
        }
        .context("Failed to create staging directory")?;
        let temp = staging.path();

        let lockfile = dependencies_directory.join(LOCKFILES_DIRECTORY).join(CARTFILE_RESOLVED);
        let temp_lockfile = temp.join(CARTFILE_RESOLVED);
        let build_directory = temp.join(CARTHAGE_DIRECTORY).join("Build");
        let derived_build_directory = dependencies_directory
            .join(DERIVED_DIRECTORY)
            .join(CARTHAGE_DIRECTORY)
            .join("Build");

        if derived_build_directory.exists() {
            debug!(target: "dependencies", "Restoring Carthage build directory");
            copy_directory(&derived_build_directory, &build_directory)?;
        }
        if lockfile.exists() {
            debug!(target: "dependencies", "Restoring {}", CARTFILE_RESOLVED);
            copy_file(&lockfile, &temp_lockfile)?;
        }

        fs::write(temp.join(CARTFILE), cartfile_content(dependencies))
            .with_context(|| format!("Failed to write {CARTFILE}"))?;

        let command = carthage_command(&program, method, temp, &platforms).with_timeout(self.timeout);
        info!(target: "dependencies", "{}", command.display());
        command.execute_success().await?;

        if !temp_lockfile.exists() {
            return Err(XcforgeError::LockfileNotFound {
                tool: "Carthage".to_string(),
                lockfile: CARTFILE_RESOLVED.to_string(),
            }
            .into());
        }
        copy_file(&temp_lockfile, &lockfile)?;

        if !build_directory.exists() {
            return Err(XcforgeError::OutputDirectoryNotFound {
                tool: "Carthage".to_string(),
                directory: "Carthage/Build".to_string(),
            }
            .into());
        }
        copy_directory(&build_directory, &dependencies_directory.join(CARTHAGE_DIRECTORY))?;
        copy_directory(&build_directory, &derived_build_directory)?;

        Ok(())
    }
}

impl DependencyInstaller for CarthageInteractor {
    fn backend(&self) -> Backend {
        Backend::Carthage
    }

    fn install<'a>(
        &'a self,
        dependencies_directory: &'a Path,
        method: InstallMethod,
        dependencies: &'a Dependencies,
    ) -> InstallFuture<'a> {
        Box::pin(self.install_carthage(dependencies_directory, method, &dependencies.carthage))
    }
}

/// `Cartfile` declaring `dependencies`, one per line.
#[must_use]
pub fn cartfile_content(dependencies: &[CarthageDependency]) -> String {
    let mut content = String::new();
    for dependency in dependencies {
        content.push_str(&format!(
            "{} \"{}\" {}\n",
            dependency.origin.as_str(),
            dependency.path,
            cartfile_requirement(&dependency.requirement)
        ));
    }
    content
}

fn cartfile_requirement(requirement: &Requirement) -> String {
    match requirement {
        Requirement::Exact(version) => format!("== {version}"),
        Requirement::UpToNextMajor(version) => {
            let mut parts = version.split('.');
            let major = parts.next().unwrap_or("0");
            let minor = parts.next().unwrap_or("0");
            format!("~> {major}.{minor}")
        }
        Requirement::UpToNextMinor(version) => format!("~> {version}"),
        Requirement::Branch(reference) | Requirement::Revision(reference) => {
            format!("\"{reference}\"")
        }
    }
}

/// The `carthage` invocation for `method`, run in `path`.
///
/// Platforms are passed sorted so that identical inputs produce identical commands.
#[must_use]
pub fn carthage_command(
    program: &Path,
    method: InstallMethod,
    path: &Path,
    platforms: &BTreeSet<Platform>,
) -> ToolCommand {
    let subcommand = match method {
        InstallMethod::Fetch => "bootstrap",
        InstallMethod::Update => "update",
    };

    let mut command = ToolCommand::new(TOOL, program)
        .arg(subcommand)
        .args(["--project-directory".to_string(), path.display().to_string()]);

    if !platforms.is_empty() {
        let platforms: Vec<&str> = platforms.iter().map(|platform| platform.case_value()).collect();
        command = command.args(["--platform".to_string(), platforms.join(",")]);
    }

    command.args(["--cache-builds", "--new-resolver"]).current_dir(path)
}
