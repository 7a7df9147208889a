//! Lint a project graph for static products linked more than once.

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;

use crate::graph::description::load_graph;
use crate::linter::{LintingIssue, lint_graph};

/// Command to lint a graph description.
///
/// Warnings are printed but never fail the command; only a graph that cannot be built
/// (missing file, invalid description, circular dependency) exits with an error.
#[derive(Args, Debug)]
pub struct LintCommand {
    /// Path to the graph description
    #[arg(short, long, default_value = "graph.toml")]
    graph: PathBuf,
}

impl LintCommand {
    pub fn execute(self) -> Result<()> {
        let issues = self.lint()?;
        if issues.is_empty() {
            println!("{}", "No linting issues found".green());
        } else {
            for issue in &issues {
                issue.display();
            }
        }
        Ok(())
    }

    fn lint(&self) -> Result<Vec<LintingIssue>> {
        let graph = load_graph(&self.graph)?;
        Ok(lint_graph(&graph))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::fixtures::GraphFixture;
    use tempfile::TempDir;

    #[test]
    fn test_lint_reports_duplicate_static_links() {
        let temp = TempDir::new().unwrap();
        let path = GraphFixture::DuplicateStaticLink.write_to(temp.path()).unwrap();

        let issues = LintCommand {
            graph: path,
        }
        .lint()
        .unwrap();

        assert_eq!(issues.len(), 1);
        assert!(issues[0].reason.contains("\"Core\""));
    }

    #[test]
    fn test_lint_hosted_tests_are_clean() {
        let temp = TempDir::new().unwrap();
        let path = GraphFixture::HostedTests.write_to(temp.path()).unwrap();

        let issues = LintCommand {
            graph: path,
        }
        .lint()
        .unwrap();

        assert!(issues.is_empty());
    }

    #[test]
    fn test_lint_missing_graph() {
        let temp = TempDir::new().unwrap();
        let result = LintCommand {
            graph: temp.path().join("missing.toml"),
        }
        .execute();
        assert!(result.is_err());
    }
}
