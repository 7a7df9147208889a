//! xcforge CLI entry point
//!
//! Parses arguments, installs the tracing subscriber and runs the selected command.
//! Failures are printed with context and suggestions and exit with status 1.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;
use xcforge_cli::cli;
use xcforge_cli::core::user_friendly_error;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    let config = cli.build_config();

    // Logs go to stderr so command output stays pipeable
    if let Some(level) = &config.log_level {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::new(level))
            .with_writer(std::io::stderr)
            .with_target(false)
            .try_init();
    }

    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    match cli.execute_with_config(config).await {
        Ok(()) => Ok(()),
        Err(e) => {
            let error_ctx = user_friendly_error(e);
            error_ctx.display();
            std::process::exit(1);
        }
    }
}
