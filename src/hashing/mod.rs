//! Content hashing for cache keys.
//!
//! Every digest is the lowercase hexadecimal SHA-256 of its input, so it can be used
//! directly as a path component in remote cache URLs.
//!
//! ```rust
//! use xcforge_cli::hashing::{ContentHasher, ContentHashing};
//!
//! let hasher = ContentHasher::new();
//! let a = hasher.hash_strings(&["App", "Core"]);
//! let b = hasher.hash_strings(&["Core", "App"]);
//! assert_ne!(a, b);
//! assert_eq!(hasher.hash_str("App"), hasher.hash_str("App"));
//! ```

pub mod graph;

pub use graph::GraphContentHasher;

use anyhow::Result;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::Path;
use tracing::trace;

use crate::core::XcforgeError;

/// Computes digests of strings and files.
pub trait ContentHashing {
    /// Digest of a single string.
    fn hash_str(&self, string: &str) -> String;

    /// Digest of the strings concatenated in order.
    fn hash_strings<S: AsRef<str>>(&self, strings: &[S]) -> String;

    /// Digest of a file's bytes.
    fn hash_file(&self, path: &Path) -> Result<String>;
}

/// SHA-256 implementation of [`ContentHashing`].
#[derive(Debug, Default, Clone, Copy)]
pub struct ContentHasher;

impl ContentHasher {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl ContentHashing for ContentHasher {
    fn hash_str(&self, string: &str) -> String {
        hex::encode(Sha256::digest(string.as_bytes()))
    }

    fn hash_strings<S: AsRef<str>>(&self, strings: &[S]) -> String {
        let mut hasher = Sha256::new();
        for string in strings {
            hasher.update(string.as_ref().as_bytes());
        }
        hex::encode(hasher.finalize())
    }

    fn hash_file(&self, path: &Path) -> Result<String> {
        let size = fs::metadata(path)
            .ok()
            .filter(|metadata| metadata.is_file())
            .map(|metadata| metadata.len())
            .ok_or_else(|| XcforgeError::UnreachableFileSize {
                path: path.display().to_string(),
            })?;

        let content = fs::read(path).map_err(|_| XcforgeError::FileSystemError {
            operation: "read file for hashing".to_string(),
            path: path.display().to_string(),
        })?;

        trace!(target: "hashing", "Hashing {} ({} bytes)", path.display(), size);
        Ok(hex::encode(Sha256::digest(&content)))
    }
}
