//! Artifact upload to the remote cache.
//!
//! An upload is a single PUT of a zip archive. It runs as its own tokio task so that the
//! caller can cancel it while the transfer is in flight: cancelling drops the request
//! future, which aborts the underlying connection, and the task resolves to
//! [`UploadError::Cancelled`].
//!
//! ```rust,no_run
//! use std::path::Path;
//! use xcforge_cli::cache::FileUploader;
//!
//! # async fn example() -> Result<(), xcforge_cli::cache::UploadError> {
//! let uploader = FileUploader::new();
//! let task = uploader.upload(
//!     Path::new("App.framework.zip"),
//!     "9f86d08...",
//!     "https://cache.example.com/9f86d08/App.zip",
//! );
//! assert!(task.wait().await?);
//! # Ok(())
//! # }
//! ```

use reqwest::header::{CONTENT_ENCODING, CONTENT_LENGTH, CONTENT_TYPE};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::core::ErrorKind;

/// Failures delivered by an [`UploadTask`].
#[derive(Debug, Error)]
pub enum UploadError {
    /// The artifact's size or content could not be read; no request was sent.
    #[error("Could not get the file size at path {path}")]
    UnreachableFileSize {
        path: String,
    },

    /// The request never produced a response.
    #[error("Received a session error while uploading file at path {path}")]
    Network {
        path: String,
        #[source]
        source: reqwest::Error,
    },

    /// The server answered with a non-2xx status.
    #[error(
        "Got error code: {status} returned by the server, when uploading file at path {path}. Response: {response}"
    )]
    ServerSide {
        path: String,
        status: u16,
        response: String,
    },

    /// The reply could not be interpreted as an HTTP response, or its body could not be
    /// read.
    #[error("Received unexpected response from the network while uploading file at path {path}")]
    InvalidResponse {
        path: String,
    },

    /// The upload was cancelled before it completed.
    #[error("Upload of file at path {path} was cancelled")]
    Cancelled {
        path: String,
    },

    /// The upload task panicked.
    #[error("Upload task for file at path {path} failed: {reason}")]
    TaskFailed {
        path: String,
        reason: String,
    },
}

impl UploadError {
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::UnreachableFileSize { .. } | Self::Cancelled { .. } => ErrorKind::Abort,
            Self::Network { .. }
            | Self::ServerSide { .. }
            | Self::InvalidResponse { .. }
            | Self::TaskFailed { .. } => ErrorKind::Bug,
        }
    }

    /// HTTP status of a server-side failure.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::ServerSide { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Uploads artifacts with a shared HTTP client.
///
/// Cloning is cheap; clones share the client's connection pool but no upload state.
#[derive(Debug, Clone, Default)]
pub struct FileUploader {
    client: reqwest::Client,
}

impl FileUploader {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an uploader whose requests give up after `timeout`.
    pub fn with_timeout(timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client))
    }

    #[must_use]
    pub const fn with_client(client: reqwest::Client) -> Self {
        Self {
            client,
        }
    }

    /// Start uploading `file` to `url`.
    ///
    /// `hash` is the artifact's cache key; it only appears in logs since the URL already
    /// addresses the artifact. Must be called from within a tokio runtime.
    pub fn upload(&self, file: &Path, hash: &str, url: &str) -> UploadTask {
        let token = CancellationToken::new();
        let path = file.to_path_buf();
        debug!(target: "cache", "Uploading {} ({hash}) to {url}", path.display());

        let request = upload_file(self.client.clone(), path.clone(), url.to_string());
        let cancelled = token.clone();
        let task_path = path.clone();
        let handle = tokio::spawn(async move {
            tokio::select! {
                biased;
                () = cancelled.cancelled() => {
                    warn!(target: "cache", "Upload of {} cancelled", task_path.display());
                    Err(UploadError::Cancelled {
                        path: task_path.display().to_string(),
                    })
                }
                result = request => result,
            }
        });

        UploadTask {
            path,
            handle,
            token,
        }
    }
}

/// Handle to an in-flight upload.
///
/// Resolves exactly once, to `Ok(true)` or an [`UploadError`]. Dropping the handle does
/// not stop the upload; call [`UploadTask::cancel`] for that.
#[derive(Debug)]
pub struct UploadTask {
    path: PathBuf,
    handle: JoinHandle<Result<bool, UploadError>>,
    token: CancellationToken,
}

impl UploadTask {
    /// Abort the transfer. The task resolves to [`UploadError::Cancelled`] unless it had
    /// already finished.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Token that cancels this upload when triggered, for wiring to signal handlers.
    #[must_use]
    pub fn cancellation_token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Wait for the upload's single result.
    pub async fn wait(self) -> Result<bool, UploadError> {
        match self.handle.await {
            Ok(result) => result,
            Err(error) => Err(UploadError::TaskFailed {
                path: self.path.display().to_string(),
                reason: error.to_string(),
            }),
        }
    }
}

async fn upload_file(
    client: reqwest::Client,
    path: PathBuf,
    url: String,
) -> Result<bool, UploadError> {
    let path_display = path.display().to_string();
    let unreachable = || UploadError::UnreachableFileSize {
        path: path_display.clone(),
    };

    let size = tokio::fs::metadata(&path)
        .await
        .ok()
        .filter(std::fs::Metadata::is_file)
        .map(|metadata| metadata.len())
        .ok_or_else(unreachable)?;
    let data = tokio::fs::read(&path).await.map_err(|_| unreachable())?;

    let response = client
        .put(&url)
        .header(CONTENT_TYPE, "application/zip")
        .header(CONTENT_LENGTH, size.to_string())
        .header(CONTENT_ENCODING, "zip")
        .body(data)
        .send()
        .await
        .map_err(|source| {
            if is_malformed_response(&source) {
                UploadError::InvalidResponse {
                    path: path_display.clone(),
                }
            } else {
                UploadError::Network {
                    path: path_display.clone(),
                    source,
                }
            }
        })?;

    let status = response.status();
    let body = response.text().await.map_err(|_| UploadError::InvalidResponse {
        path: path_display.clone(),
    })?;

    if status.is_success() {
        debug!(target: "cache", "Uploaded {path_display} ({status})");
        Ok(true)
    } else {
        Err(UploadError::ServerSide {
            path: path_display,
            status: status.as_u16(),
            response: format!("{status} {body}").trim_end().to_string(),
        })
    }
}

/// Whether the peer answered with bytes that do not parse as an HTTP response.
fn is_malformed_response(error: &reqwest::Error) -> bool {
    let mut source: Option<&(dyn std::error::Error + 'static)> = Some(error);
    while let Some(current) = source {
        if current.downcast_ref::<hyper::Error>().is_some_and(hyper::Error::is_parse) {
            return true;
        }
        source = current.source();
    }
    false
}
