//! Which backends an installation runs, in which order.

use std::fmt;

use super::InstallMethod;
use super::manifest::Dependencies;

/// A package-manager backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Backend {
    Carthage,
    SwiftPackageManager,
}

impl Backend {
    /// Every backend, in the order installations run them.
    pub const ALL: [Self; 2] = [Self::Carthage, Self::SwiftPackageManager];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Carthage => "carthage",
            Self::SwiftPackageManager => "swift package manager",
        }
    }

    /// Number of dependencies this backend is responsible for.
    #[must_use]
    pub fn dependency_count(self, dependencies: &Dependencies) -> usize {
        match self {
            Self::Carthage => dependencies.carthage.len(),
            Self::SwiftPackageManager => dependencies.swift_packages.len(),
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedStep {
    pub backend: Backend,
    pub dependency_count: usize,
}

/// The ordered backend runs for one installation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallationPlan {
    pub method: InstallMethod,
    pub steps: Vec<PlannedStep>,
}

impl InstallationPlan {
    /// Plan an installation: backends without dependencies are skipped.
    #[must_use]
    pub fn new(dependencies: &Dependencies, method: InstallMethod) -> Self {
        let steps = Backend::ALL
            .into_iter()
            .filter_map(|backend| {
                let dependency_count = backend.dependency_count(dependencies);
                (dependency_count > 0).then_some(PlannedStep {
                    backend,
                    dependency_count,
                })
            })
            .collect();
        Self {
            method,
            steps,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn backends(&self) -> impl Iterator<Item = Backend> + '_ {
        self.steps.iter().map(|step| step.backend)
    }
}

impl fmt::Display for InstallationPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.steps.is_empty() {
            return write!(f, "Nothing to {}", self.method);
        }
        for (i, step) in self.steps.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            let noun = if step.dependency_count == 1 { "dependency" } else { "dependencies" };
            write!(f, "{} {}: {} {}", self.method, step.backend, step.dependency_count, noun)?;
        }
        Ok(())
    }
}
