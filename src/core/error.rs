//! Error handling for xcforge
//!
//! This module provides the error types and user-friendly error reporting used across
//! xcforge. The error system follows two principles:
//! 1. **Strongly-typed errors** for precise handling in code
//! 2. **User-friendly messages** with actionable suggestions for CLI users
//!
//! # Architecture
//!
//! - [`XcforgeError`] - Enumerated failure cases for graph construction, hashing,
//!   configuration and dependency installation
//! - [`ErrorKind`] - Whether a failure is user-actionable ([`ErrorKind::Abort`]) or points
//!   at a defect or remote misbehaviour worth reporting ([`ErrorKind::Bug`])
//! - [`ErrorContext`] - Wrapper adding details and suggestions for display
//!
//! Upload failures have their own type, [`crate::cache::UploadError`], because they are
//! delivered through the asynchronous upload task rather than propagated with `?`.
//!
//! # Examples
//!
//! ```rust,no_run
//! use xcforge_cli::core::{XcforgeError, user_friendly_error};
//!
//! let error = XcforgeError::ToolNotFound {
//!     tool: "carthage".to_string(),
//! };
//! let ctx = user_friendly_error(anyhow::Error::from(error));
//! ctx.display(); // Shows colored error with suggestions
//! ```

use colored::Colorize;
use std::fmt;
use thiserror::Error;

/// Classification of a failure, used when reporting it to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Execution stops with a descriptive, user-actionable message.
    Abort,
    /// Unexpected failure; surfaced with full diagnostic context for triage.
    Bug,
}

/// The main error type for xcforge operations
///
/// # Error Categories
///
/// ## Graph
/// - [`ManifestNotFound`] - Graph description file missing
/// - [`ManifestParseError`] - Graph or dependencies description could not be parsed
/// - [`TargetNotFound`] - A dependency references a target that doesn't exist
/// - [`DuplicateNode`] - Two nodes share the same identity
/// - [`ConflictingNode`] - The same dependency is declared with a different kind or linking
/// - [`ExternalDependencyNotFound`] - An external dependency has not been installed
/// - [`CircularDependency`] - Dependency cycle detected during traversal
///
/// ## Dependency backends
/// - [`ToolNotFound`] - Package manager executable not available
/// - [`LockfileNotFound`] - Tool ran but produced no lockfile
/// - [`OutputDirectoryNotFound`] - Tool ran but produced no build output
/// - [`ToolCommandFailed`] - Tool exited with a non-zero status
///
/// ## Remote cache
/// - [`RemoteCacheError`] - Unexpected status while looking up or downloading an artifact
/// - [`ArtifactNotFound`] - No artifact stored under a key
///
/// ## Files
/// - [`UnreachableFileSize`] - File size or content could not be read
/// - [`FileSystemError`] - General file system operation failed
///
/// [`ManifestNotFound`]: XcforgeError::ManifestNotFound
/// [`ManifestParseError`]: XcforgeError::ManifestParseError
/// [`TargetNotFound`]: XcforgeError::TargetNotFound
/// [`DuplicateNode`]: XcforgeError::DuplicateNode
/// [`ConflictingNode`]: XcforgeError::ConflictingNode
/// [`ExternalDependencyNotFound`]: XcforgeError::ExternalDependencyNotFound
/// [`CircularDependency`]: XcforgeError::CircularDependency
/// [`ToolNotFound`]: XcforgeError::ToolNotFound
/// [`LockfileNotFound`]: XcforgeError::LockfileNotFound
/// [`OutputDirectoryNotFound`]: XcforgeError::OutputDirectoryNotFound
/// [`ToolCommandFailed`]: XcforgeError::ToolCommandFailed
/// [`RemoteCacheError`]: XcforgeError::RemoteCacheError
/// [`ArtifactNotFound`]: XcforgeError::ArtifactNotFound
/// [`UnreachableFileSize`]: XcforgeError::UnreachableFileSize
/// [`FileSystemError`]: XcforgeError::FileSystemError
#[derive(Error, Debug, Clone)]
pub enum XcforgeError {
    /// Graph description file not found
    #[error("Couldn't find manifest at path: '{path}'")]
    ManifestNotFound {
        /// Path that was expected to contain the description
        path: String,
    },

    /// Description parsing error
    #[error("Invalid manifest file syntax in {file}: {reason}")]
    ManifestParseError {
        /// Path to the file that failed to parse
        file: String,
        /// Specific reason for the parsing failure
        reason: String,
    },

    /// A dependency references an unknown target
    #[error("Couldn't find target '{name}' at '{path}'")]
    TargetNotFound {
        /// Name of the missing target
        name: String,
        /// Project path the target was looked up in
        path: String,
    },

    /// Two nodes claim the same (path, name) identity
    #[error("Found more than one node named '{name}' at '{path}'")]
    DuplicateNode {
        /// Name shared by both nodes
        name: String,
        /// Path shared by both nodes
        path: String,
    },

    /// A dependency is declared twice with a different kind or linking
    #[error("'{name}' at '{path}' is declared both as {existing} and as {requested}")]
    ConflictingNode {
        /// Name shared by both declarations
        name: String,
        /// Path shared by both declarations
        path: String,
        /// Declaration seen first
        existing: String,
        /// Conflicting declaration
        requested: String,
    },

    /// No installed product matches an external dependency
    #[error("Couldn't find external dependency '{name}' for {platform} in '{path}'")]
    ExternalDependencyNotFound {
        /// Product name
        name: String,
        /// Platform of the depending target
        platform: String,
        /// Dependencies directory that was searched
        path: String,
    },

    /// Circular dependency detected in the project graph
    ///
    /// Raised by the depth-first traversal when a node is reached again while it is still
    /// on the active visiting stack. `from` is the node whose dependency closes the cycle
    /// and `to` the node that was already being visited.
    #[error(
        "Found circular dependency between the target '{from_name}' at '{from_path}' and the target '{to_name}' at '{to_path}'"
    )]
    CircularDependency {
        /// Name of the node declaring the offending dependency
        from_name: String,
        /// Path of the node declaring the offending dependency
        from_path: String,
        /// Name of the node already on the visiting stack
        to_name: String,
        /// Path of the node already on the visiting stack
        to_path: String,
    },

    /// Package manager executable not found in PATH
    #[error(
        "{tool} was not found in the environment. It's possible that the tool is not installed or hasn't been exposed to your environment."
    )]
    ToolNotFound {
        /// Executable that could not be located
        tool: String,
    },

    /// Lockfile missing after a successful tool run
    #[error("{lockfile} was not found after {tool} installation.")]
    LockfileNotFound {
        /// Tool that ran
        tool: String,
        /// Lockfile name that was expected
        lockfile: String,
    },

    /// Build output missing after a successful tool run
    #[error("{directory} directory was not found after {tool} installation.")]
    OutputDirectoryNotFound {
        /// Tool that ran
        tool: String,
        /// Directory that was expected
        directory: String,
    },

    /// Tool exited with a failure status
    #[error("{tool} exited with status {status}")]
    ToolCommandFailed {
        /// Tool that ran
        tool: String,
        /// Exit status description
        status: String,
    },

    /// File size could not be determined
    #[error("Could not get the file size at path {path}")]
    UnreachableFileSize {
        /// Path of the unreadable file
        path: String,
    },

    /// File system error
    #[error("File system error: {operation} ({path})")]
    FileSystemError {
        /// The file system operation that failed
        operation: String,
        /// Path where the file system error occurred
        path: String,
    },

    /// Remote cache answered a lookup or download with an unexpected status
    #[error("Remote cache returned status {status} for {url}")]
    RemoteCacheError {
        /// HTTP status code
        status: u16,
        /// Requested artifact URL
        url: String,
    },

    /// The remote cache holds no artifact under the key
    #[error("No artifact {name} for {hash} in the remote cache")]
    ArtifactNotFound {
        /// Artifact name
        name: String,
        /// Cache key that was looked up
        hash: String,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    ConfigError {
        /// Description of the configuration error
        message: String,
    },

    /// Other error
    #[error("{message}")]
    Other {
        /// Generic error message
        message: String,
    },
}

impl XcforgeError {
    /// Classify the error for reporting.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::ManifestNotFound { .. }
            | Self::ManifestParseError { .. }
            | Self::TargetNotFound { .. }
            | Self::DuplicateNode { .. }
            | Self::ConflictingNode { .. }
            | Self::ExternalDependencyNotFound { .. }
            | Self::CircularDependency { .. }
            | Self::ToolNotFound { .. }
            | Self::LockfileNotFound { .. }
            | Self::OutputDirectoryNotFound { .. }
            | Self::ToolCommandFailed { .. }
            | Self::UnreachableFileSize { .. }
            | Self::FileSystemError { .. }
            | Self::ArtifactNotFound { .. }
            | Self::ConfigError { .. } => ErrorKind::Abort,
            Self::RemoteCacheError { .. } | Self::Other { .. } => ErrorKind::Bug,
        }
    }
}

/// Error context wrapper that provides user-friendly error information
///
/// When displayed, errors show:
/// 1. **Error**: The main error message in red
/// 2. **Details**: Additional context about the error in yellow (optional)
/// 3. **Suggestion**: Actionable steps to resolve the issue in green (optional)
///
/// # Examples
///
/// ```rust,no_run
/// use xcforge_cli::core::{ErrorContext, XcforgeError};
///
/// let context = ErrorContext::new(XcforgeError::ManifestNotFound {
///     path: "graph.toml".to_string(),
/// })
/// .with_suggestion("Pass --graph with the path to your graph description")
/// .with_details("xcforge needs a graph description to analyze");
///
/// context.display();
/// ```
#[derive(Debug)]
pub struct ErrorContext {
    /// The underlying error
    pub error: XcforgeError,
    /// Optional suggestion for resolving the error
    pub suggestion: Option<String>,
    /// Optional additional details about the error
    pub details: Option<String>,
}

impl ErrorContext {
    /// Create a new error context with no suggestion or details.
    #[must_use]
    pub const fn new(error: XcforgeError) -> Self {
        Self {
            error,
            suggestion: None,
            details: None,
        }
    }

    /// Add a suggestion for resolving the error
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Add additional details explaining the error
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Display the error context to stderr with terminal colors
    pub fn display(&self) {
        eprintln!("{}: {}", "error".red().bold(), self.error);

        if let Some(details) = &self.details {
            eprintln!("{}: {}", "details".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {}", "suggestion".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

impl std::error::Error for ErrorContext {}

/// Convert any error to a user-friendly [`ErrorContext`] with actionable suggestions
///
/// Recognizes [`XcforgeError`], [`crate::cache::UploadError`] and [`std::io::Error`];
/// anything else is reported with its full cause chain.
#[must_use]
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    if let Some(xcforge_error) = error.downcast_ref::<XcforgeError>() {
        let context = create_error_context(xcforge_error.clone());
        return match xcforge_error.kind() {
            ErrorKind::Abort => context,
            ErrorKind::Bug => with_diagnostics(context, &error),
        };
    }

    if let Some(upload_error) = error.downcast_ref::<crate::cache::UploadError>() {
        let details = match upload_error.kind() {
            ErrorKind::Abort => "The artifact could not be read from disk",
            ErrorKind::Bug => {
                "The remote cache rejected or failed the upload. Please report this with the output above"
            }
        };
        return ErrorContext::new(XcforgeError::Other {
            message: upload_error.to_string(),
        })
        .with_details(details);
    }

    if let Some(io_error) = error.downcast_ref::<std::io::Error>() {
        match io_error.kind() {
            std::io::ErrorKind::PermissionDenied => {
                return ErrorContext::new(XcforgeError::FileSystemError {
                    operation: "file access".to_string(),
                    path: "unknown".to_string(),
                })
                .with_suggestion("Check file ownership and permissions")
                .with_details("xcforge doesn't have permission to read or write the file");
            }
            std::io::ErrorKind::NotFound => {
                return ErrorContext::new(XcforgeError::FileSystemError {
                    operation: "file access".to_string(),
                    path: "unknown".to_string(),
                })
                .with_suggestion("Check that the file or directory exists and the path is correct");
            }
            _ => {}
        }
    }

    // Generic error - include the full error chain for better diagnostics
    let mut message = error.to_string();

    let chain: Vec<String> =
        error.chain().skip(1).map(std::string::ToString::to_string).collect();

    if !chain.is_empty() {
        message.push_str("\n\nCaused by:");
        for (i, cause) in chain.iter().enumerate() {
            message.push_str(&format!("\n  {}: {}", i + 1, cause));
        }
    }

    ErrorContext::new(XcforgeError::Other {
        message,
    })
}

// Bug-class failures list the surrounding context and ask to be reported.
fn with_diagnostics(context: ErrorContext, error: &anyhow::Error) -> ErrorContext {
    let message = context.error.to_string();
    let mut details: Vec<String> = error
        .chain()
        .map(ToString::to_string)
        .filter(|cause| *cause != message)
        .map(|cause| format!("while: {cause}"))
        .collect();
    details.push(
        "This is unexpected. Re-run with --verbose and report it with the output above".to_string(),
    );
    let details = match &context.details {
        Some(existing) => format!("{existing}\n{}", details.join("\n")),
        None => details.join("\n"),
    };
    context.with_details(details)
}

fn create_error_context(error: XcforgeError) -> ErrorContext {
    match &error {
        XcforgeError::ToolNotFound { tool } => {
            let suggestion = format!(
                "Install {tool} or set its path in the [dependencies] section of ~/.xcforge/config.toml"
            );
            ErrorContext::new(error).with_suggestion(suggestion)
        }

        XcforgeError::LockfileNotFound { .. } | XcforgeError::OutputDirectoryNotFound { .. } => {
            ErrorContext::new(error)
                .with_suggestion("Re-run the command with --verbose to see the tool output")
                .with_details("The tool finished without producing the files xcforge expects")
        }

        XcforgeError::CircularDependency { .. } => ErrorContext::new(error)
            .with_suggestion("Review your dependency graph and remove circular references")
            .with_details(
                "Targets cannot depend on themselves directly or indirectly",
            ),

        XcforgeError::ManifestNotFound { .. } => ErrorContext::new(error)
            .with_suggestion("Pass the path to an existing graph description with --graph"),

        XcforgeError::ConflictingNode { .. } => ErrorContext::new(error)
            .with_suggestion("Declare the dependency the same way in every target that uses it"),

        XcforgeError::ExternalDependencyNotFound { .. } => ErrorContext::new(error)
            .with_suggestion("Declare it in Dependencies.toml and run `xcforge dependencies fetch`"),

        XcforgeError::TargetNotFound { .. } => ErrorContext::new(error)
            .with_suggestion("Check the dependency name and the project path it points to"),

        XcforgeError::ManifestParseError { .. } => ErrorContext::new(error).with_suggestion(
            "Check the TOML syntax. Common issues: missing quotes, unmatched brackets, unknown product names",
        ),

        XcforgeError::RemoteCacheError { .. } => ErrorContext::new(error)
            .with_suggestion("Check the [cache] url in ~/.xcforge/config.toml"),

        XcforgeError::UnreachableFileSize { .. } => ErrorContext::new(error)
            .with_suggestion("Check that the artifact exists and is readable"),

        _ => ErrorContext::new(error),
    }
}
