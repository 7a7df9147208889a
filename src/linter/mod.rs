//! Graph linting.
//!
//! Linters inspect a built [`Graph`] and report [`LintingIssue`]s. Warnings never abort
//! generation; callers print them and carry on.

pub mod static_products;

pub use static_products::StaticProductsGraphLinter;

use colored::Colorize;
use std::fmt;

use crate::graph::Graph;

/// How serious a linting issue is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Severity {
    Warning,
    Error,
}

/// A single problem found while linting.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LintingIssue {
    pub reason: String,
    pub severity: Severity,
}

impl LintingIssue {
    pub fn warning(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
            severity: Severity::Warning,
        }
    }

    /// Print the issue to stderr, colored by severity.
    pub fn display(&self) {
        match self.severity {
            Severity::Warning => eprintln!("{}: {}", "warning".yellow().bold(), self.reason),
            Severity::Error => eprintln!("{}: {}", "error".red().bold(), self.reason),
        }
    }
}

impl fmt::Display for LintingIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self.severity {
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        write!(f, "{label}: {}", self.reason)
    }
}

/// A check run over a whole graph.
pub trait GraphLinter {
    fn lint(&self, graph: &Graph) -> Vec<LintingIssue>;
}

/// Run every graph linter and collect their issues in linter order.
#[must_use]
pub fn lint_graph(graph: &Graph) -> Vec<LintingIssue> {
    let linters: Vec<Box<dyn GraphLinter>> = vec![Box::new(StaticProductsGraphLinter::new())];
    linters.iter().flat_map(|linter| linter.lint(graph)).collect()
}
