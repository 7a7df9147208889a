//! Core types shared across xcforge.
//!
//! Every operation that can fail returns a [`Result`](anyhow::Result); typed failures are
//! [`XcforgeError`] values so callers can match on them, and [`user_friendly_error`] turns
//! any error into an [`ErrorContext`] for display.
//!
//! ```rust
//! use xcforge_cli::core::{ErrorKind, XcforgeError};
//!
//! let error = XcforgeError::UnreachableFileSize {
//!     path: "/tmp/Framework.zip".to_string(),
//! };
//! assert_eq!(error.kind(), ErrorKind::Abort);
//! ```

pub mod error;

pub use error::{ErrorContext, ErrorKind, XcforgeError, user_friendly_error};
