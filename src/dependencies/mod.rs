//! Third-party dependency installation.
//!
//! The [`DependenciesController`] reads what a project declares in `Dependencies.toml`,
//! plans which package-manager backends must run ([`plan`]) and runs them one after the
//! other. Each backend stages its work in a temporary directory, restores the state of
//! the previous run, invokes its tool and saves the lockfile and build products under
//! `<project>/Dependencies/`. Once every backend succeeded the installed products are
//! indexed in `Dependencies/graph.json` ([`graph`]).
//!
//! # Failure Semantics
//!
//! The first backend failure (tool not found, tool failure, lockfile or output directory
//! missing) aborts the installation. Backends that already finished keep their results;
//! nothing is rolled back.

pub mod carthage;
pub mod command;
pub mod graph;
pub mod manifest;
pub mod plan;
pub mod swift_package;

pub use carthage::CarthageInteractor;
pub use graph::DependenciesGraph;
pub use manifest::Dependencies;
pub use plan::{Backend, InstallationPlan};
pub use swift_package::SwiftPackageInteractor;

use anyhow::{Context, Result};
use std::fmt;
use std::fs;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use tracing::info;
use walkdir::WalkDir;

use crate::config::DependenciesConfig;
use crate::constants::DEPENDENCIES_DIRECTORY;
use crate::core::XcforgeError;

/// How backends treat existing lockfiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InstallMethod {
    /// Install the versions pinned by the lockfile, resolving only what is missing.
    Fetch,
    /// Re-resolve every dependency to the newest allowed version.
    Update,
}

impl InstallMethod {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Fetch => "fetch",
            Self::Update => "update",
        }
    }
}

impl fmt::Display for InstallMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Future returned by [`DependencyInstaller::install`].
pub type InstallFuture<'a> = Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>>;

/// A package-manager backend.
pub trait DependencyInstaller: Send + Sync {
    /// Which backend this installer implements.
    fn backend(&self) -> Backend;

    /// Install this backend's share of `dependencies` into `dependencies_directory`.
    ///
    /// # Arguments
    ///
    /// * `dependencies_directory` - `<project>/Dependencies`
    /// * `method` - Fetch or update
    /// * `dependencies` - Everything the project declares; the backend picks its own
    fn install<'a>(
        &'a self,
        dependencies_directory: &'a Path,
        method: InstallMethod,
        dependencies: &'a Dependencies,
    ) -> InstallFuture<'a>;
}

/// Runs the backends an installation needs, sequentially.
pub struct DependenciesController {
    installers: Vec<Box<dyn DependencyInstaller>>,
}

impl DependenciesController {
    /// Controller with the built-in backends, honouring executable overrides and the
    /// tool timeout.
    #[must_use]
    pub fn new(config: &DependenciesConfig) -> Self {
        Self::with_installers(vec![
            Box::new(
                CarthageInteractor::new(config.carthage_path.clone())
                    .with_timeout(config.timeout()),
            ),
            Box::new(
                SwiftPackageInteractor::new(config.swift_path.clone())
                    .with_timeout(config.timeout()),
            ),
        ])
    }

    #[must_use]
    pub fn with_installers(installers: Vec<Box<dyn DependencyInstaller>>) -> Self {
        Self {
            installers,
        }
    }

    /// Install `dependencies` for the project at `path`.
    ///
    /// Returns the plan that was executed.
    pub async fn install(
        &self,
        path: &Path,
        method: InstallMethod,
        dependencies: &Dependencies,
    ) -> Result<InstallationPlan> {
        let plan = InstallationPlan::new(dependencies, method);
        let dependencies_directory = path.join(DEPENDENCIES_DIRECTORY);

        for step in &plan.steps {
            let installer = self
                .installers
                .iter()
                .find(|installer| installer.backend() == step.backend)
                .ok_or_else(|| XcforgeError::Other {
                    message: format!("No installer registered for {}", step.backend),
                })?;

            info!(
                target: "dependencies",
                "Running {} for {} dependencies ({method})",
                step.backend,
                step.dependency_count
            );
            installer.install(&dependencies_directory, method, dependencies).await?;
        }

        if !plan.is_empty() {
            let graph = DependenciesGraph::scan(&dependencies_directory)?;
            graph.save(&dependencies_directory)?;
        }

        Ok(plan)
    }
}

/// Copy a file, replacing `to` and creating its parent directories.
pub(crate) fn copy_file(from: &Path, to: &Path) -> Result<()> {
    if let Some(parent) = to.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    fs::copy(from, to)
        .with_context(|| format!("Failed to copy {} to {}", from.display(), to.display()))?;
    Ok(())
}

/// Recursively copy a directory, replacing anything already at `to`.
pub(crate) fn copy_directory(from: &Path, to: &Path) -> Result<()> {
    if to.exists() {
        fs::remove_dir_all(to)
            .with_context(|| format!("Failed to remove directory: {}", to.display()))?;
    }
    fs::create_dir_all(to)
        .with_context(|| format!("Failed to create directory: {}", to.display()))?;

    for entry in WalkDir::new(from).min_depth(1) {
        let entry = entry.with_context(|| format!("Failed to walk {}", from.display()))?;
        let target: PathBuf = to.join(entry.path().strip_prefix(from)?);
        let file_type = entry.file_type();

        if file_type.is_dir() {
            fs::create_dir_all(&target)?;
        } else if file_type.is_symlink() {
            copy_symlink(entry.path(), &target)?;
        } else {
            fs::copy(entry.path(), &target).with_context(|| {
                format!("Failed to copy {} to {}", entry.path().display(), target.display())
            })?;
        }
    }
    Ok(())
}

#[cfg(unix)]
fn copy_symlink(from: &Path, to: &Path) -> Result<()> {
    let destination = fs::read_link(from)?;
    std::os::unix::fs::symlink(destination, to)?;
    Ok(())
}

#[cfg(not(unix))]
fn copy_symlink(from: &Path, to: &Path) -> Result<()> {
    fs::copy(from, to)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;

    use crate::dependencies::manifest::{
        CarthageDependency, CarthageOrigin, Requirement, SwiftPackageDependency,
    };
    use crate::graph::Platform;

    /// Records calls and optionally fails, standing in for a real tool.
    struct RecordingInstaller {
        backend: Backend,
        calls: Arc<Mutex<Vec<(Backend, InstallMethod)>>>,
        fail: bool,
    }

    impl DependencyInstaller for RecordingInstaller {
        fn backend(&self) -> Backend {
            self.backend
        }

        fn install<'a>(
            &'a self,
            dependencies_directory: &'a Path,
            method: InstallMethod,
            _dependencies: &'a Dependencies,
        ) -> InstallFuture<'a> {
            Box::pin(async move {
                self.calls.lock().unwrap().push((self.backend, method));
                if self.fail {
                    return Err(XcforgeError::ToolNotFound {
                        tool: self.backend.name().to_string(),
                    }
                    .into());
                }
                fs::create_dir_all(dependencies_directory.join(self.backend.name()))?;
                Ok(())
            })
        }
    }

    fn dependencies() -> Dependencies {
        Dependencies {
            carthage: vec![CarthageDependency {
                origin: CarthageOrigin::Github,
                path: "Alamofire/Alamofire".to_string(),
                requirement: Requirement::Exact("5.0.4".to_string()),
                platforms: [Platform::Ios].into_iter().collect(),
            }],
            swift_packages: vec![SwiftPackageDependency {
                url: "https://github.com/apple/swift-log".to_string(),
                requirement: Requirement::UpToNextMajor("1.0.0".to_string()),
                platforms: Default::default(),
            }],
        }
    }

    fn controller(
        calls: &Arc<Mutex<Vec<(Backend, InstallMethod)>>>,
        failing: Option<Backend>,
    ) -> DependenciesController {
        DependenciesController::with_installers(
            Backend::ALL
                .into_iter()
                .map(|backend| {
                    Box::new(RecordingInstaller {
                        backend,
                        calls: Arc::clone(calls),
                        fail: failing == Some(backend),
                    }) as Box<dyn DependencyInstaller>
                })
                .collect(),
        )
    }

    #[tokio::test]
    async fn test_runs_backends_in_order() {
        let temp = TempDir::new().unwrap();
        let calls = Arc::new(Mutex::new(Vec::new()));

        let plan =
            controller(&calls, None).install(temp.path(), InstallMethod::Fetch, &dependencies()).await.unwrap();

        assert_eq!(plan.steps.len(), 2);
        assert_eq!(
            *calls.lock().unwrap(),
            vec![
                (Backend::Carthage, InstallMethod::Fetch),
                (Backend::SwiftPackageManager, InstallMethod::Fetch)
            ]
        );
        assert!(temp.path().join("Dependencies/graph.json").is_file());
    }

    #[tokio::test]
    async fn test_first_failure_aborts_without_rollback() {
        let temp = TempDir::new().unwrap();
        let calls = Arc::new(Mutex::new(Vec::new()));

        let error = controller(&calls, Some(Backend::SwiftPackageManager))
            .install(temp.path(), InstallMethod::Update, &dependencies())
            .await
            .unwrap_err();

        assert!(matches!(
            error.downcast_ref::<XcforgeError>(),
            Some(XcforgeError::ToolNotFound { .. })
        ));
        assert_eq!(calls.lock().unwrap().len(), 2);
        // carthage's output survives the later failure
        assert!(temp.path().join("Dependencies/carthage").is_dir());
        assert!(!temp.path().join("Dependencies/graph.json").exists());
    }

    #[tokio::test]
    async fn test_failure_stops_later_backends() {
        let temp = TempDir::new().unwrap();
        let calls = Arc::new(Mutex::new(Vec::new()));

        let result = controller(&calls, Some(Backend::Carthage))
            .install(temp.path(), InstallMethod::Fetch, &dependencies())
            .await;

        assert!(result.is_err());
        assert_eq!(*calls.lock().unwrap(), vec![(Backend::Carthage, InstallMethod::Fetch)]);
    }

    #[tokio::test]
    async fn test_nothing_declared() {
        let temp = TempDir::new().unwrap();
        let calls = Arc::new(Mutex::new(Vec::new()));

        let plan = controller(&calls, None)
            .install(temp.path(), InstallMethod::Fetch, &Dependencies::default())
            .await
            .unwrap();

        assert!(plan.is_empty());
        assert!(calls.lock().unwrap().is_empty());
        assert!(!temp.path().join("Dependencies").exists());
    }

    #[test]
    fn test_copy_directory_replaces_destination() {
        let temp = TempDir::new().unwrap();
        let from = temp.path().join("from");
        let to = temp.path().join("to");
        fs::create_dir_all(from.join("iOS/Alamofire.framework")).unwrap();
        fs::write(from.join("iOS/Alamofire.framework/Alamofire"), "binary").unwrap();
        fs::create_dir_all(&to).unwrap();
        fs::write(to.join("stale"), "old").unwrap();

        copy_directory(&from, &to).unwrap();

        assert!(to.join("iOS/Alamofire.framework/Alamofire").is_file());
        assert!(!to.join("stale").exists());
    }

    #[test]
    fn test_copy_file_creates_parents() {
        let temp = TempDir::new().unwrap();
        let from = temp.path().join("Cartfile.resolved");
        fs::write(&from, "github \"Alamofire/Alamofire\" \"5.0.4\"").unwrap();
        let to = temp.path().join("Lockfiles/Cartfile.resolved");

        copy_file(&from, &to).unwrap();
        copy_file(&from, &to).unwrap();

        assert_eq!(fs::read_to_string(to).unwrap(), "github \"Alamofire/Alamofire\" \"5.0.4\"");
    }
}
