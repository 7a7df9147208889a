use anyhow::Result;
use clap::{Args, ValueEnum};
use colored::Colorize;
use std::path::PathBuf;

use super::CliConfig;
use crate::constants::DEPENDENCIES_MANIFEST;
use crate::dependencies::{Dependencies, DependenciesController, InstallMethod, InstallationPlan};

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum Method {
    /// Install what the lockfiles pin
    Fetch,
    /// Resolve to the newest allowed versions
    Update,
}

impl From<Method> for InstallMethod {
    fn from(method: Method) -> Self {
        match method {
            Method::Fetch => Self::Fetch,
            Method::Update => Self::Update,
        }
    }
}

/// Command to install the dependencies declared in `Dependencies.toml`.
///
/// Backends run in a fixed order (Carthage, then Swift Package Manager) and the first
/// failure stops the installation.
#[derive(Args, Debug)]
pub struct DependenciesCommand {
    #[arg(value_enum)]
    method: Method,

    /// Project directory containing Dependencies.toml
    #[arg(short, long, default_value = ".")]
    path: PathBuf,

    /// Print what would run without invoking any tool
    #[arg(long)]
    dry_run: bool,
}

impl DependenciesCommand {
    pub async fn execute(self, config: &CliConfig) -> Result<()> {
        let dependencies = Dependencies::load(&self.path.join(DEPENDENCIES_MANIFEST))?;
        let method = InstallMethod::from(self.method);

        if self.dry_run {
            println!("{}", InstallationPlan::new(&dependencies, method));
            return Ok(());
        }

        let global = config.global_config().await?;
        let plan = DependenciesController::new(&global.dependencies)
            .install(&self.path, method, &dependencies)
            .await?;

        if plan.is_empty() {
            println!("{plan}");
        } else {
            println!("{}", plan.to_string().green());
        }
        Ok(())
    }
}
