//! Remote artifact cache.
//!
//! Artifacts live at `<base>/<hash>/<name>.zip`, where `hash` is the target's cache key.
//! Lookups use HEAD, downloads GET, and stores go through [`FileUploader`].

use anyhow::{Context, Result};
use reqwest::StatusCode;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, info};

use super::archive;
use super::uploader::{FileUploader, UploadError};
use crate::core::XcforgeError;

/// Addressing scheme for artifacts in a remote cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheUrl {
    base: String,
}

impl CacheUrl {
    pub fn new(base: impl Into<String>) -> Self {
        let base = base.into();
        Self {
            base: base.trim_end_matches('/').to_string(),
        }
    }

    #[must_use]
    pub fn base(&self) -> &str {
        &self.base
    }

    /// URL of the artifact `name` stored under `hash`.
    #[must_use]
    pub fn artifact(&self, hash: &str, name: &str) -> String {
        format!("{}/{hash}/{name}.zip", self.base)
    }
}

/// Client for a remote cache.
#[derive(Debug, Clone)]
pub struct RemoteCache {
    url: CacheUrl,
    client: reqwest::Client,
    uploader: FileUploader,
}

impl RemoteCache {
    #[must_use]
    pub fn new(url: CacheUrl) -> Self {
        Self::with_client(url, reqwest::Client::new())
    }

    #[must_use]
    pub fn with_client(url: CacheUrl, client: reqwest::Client) -> Self {
        Self {
            url,
            uploader: FileUploader::with_client(client.clone()),
            client,
        }
    }

    #[must_use]
    pub const fn url(&self) -> &CacheUrl {
        &self.url
    }

    /// Whether the cache holds an artifact for `hash`.
    pub async fn exists(&self, hash: &str, name: &str) -> Result<bool> {
        let url = self.url.artifact(hash, name);
        let response = self
            .client
            .head(&url)
            .send()
            .await
            .with_context(|| format!("Failed to reach remote cache at {url}"))?;

        match response.status() {
            status if status.is_success() => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            status => Err(XcforgeError::RemoteCacheError {
                status: status.as_u16(),
                url,
            }
            .into()),
        }
    }

    /// Download the artifact for `hash` and extract it into `destination`.
    ///
    /// Returns the extracted product path, `destination/<name>`.
    pub async fn fetch(&self, hash: &str, name: &str, destination: &Path) -> Result<PathBuf> {
        let url = self.url.artifact(hash, name);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("Failed to reach remote cache at {url}"))?;

        let status = response.status();
        if !status.is_success() {
            return Err(XcforgeError::RemoteCacheError {
                status: status.as_u16(),
                url,
            }
            .into());
        }

        let bytes = response.bytes().await.context("Failed to read artifact body")?;
        let staging = TempDir::new().context("Failed to create staging directory")?;
        let archive_path = staging.path().join(format!("{name}.zip"));
        tokio::fs::write(&archive_path, &bytes).await?;

        let target = destination.to_path_buf();
        tokio::task::spawn_blocking(move || archive::extract(&archive_path, &target))
            .await
            .context("Extraction task failed")??;

        info!(target: "cache", "Fetched {name} ({hash}) into {}", destination.display());
        Ok(destination.join(name))
    }

    /// Archive `product` and upload it under `hash`, named after the product's file name.
    pub async fn store(&self, hash: &str, product: &Path) -> Result<bool> {
        let name = product
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .ok_or_else(|| XcforgeError::FileSystemError {
                operation: "resolve product name".to_string(),
                path: product.display().to_string(),
            })?;

        let staging = TempDir::new().context("Failed to create staging directory")?;
        let archive_path = staging.path().join(format!("{name}.zip"));
        let source = product.to_path_buf();
        let destination = archive_path.clone();
        tokio::task::spawn_blocking(move || archive::zip_product(&source, &destination))
            .await
            .context("Archiving task failed")??;

        let url = self.url.artifact(hash, &name);
        debug!(target: "cache", "Storing {name} at {url}");
        let stored: Result<bool, UploadError> =
            self.uploader.upload(&archive_path, hash, &url).wait().await;
        Ok(stored?)
    }
}
