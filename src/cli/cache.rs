//! Remote cache transfers.
//!
//! ```bash
//! # Upload a prebuilt archive to an explicit URL
//! xcforge cache upload Core.framework.zip --url https://cache.example.com/abc/Core.framework.zip
//!
//! # Archive a product and store it under its cache key, using [cache] url from the config
//! xcforge cache store Build/Core.framework --hash abc
//!
//! # Look an artifact up, then download and extract it
//! xcforge cache exists abc Core.framework
//! xcforge cache fetch abc Core.framework --destination Build
//! ```

use anyhow::Result;
use clap::{Args, Subcommand};
use colored::Colorize;
use std::path::{Path, PathBuf};
use tracing::info;

use super::CliConfig;
use crate::cache::{CacheUrl, FileUploader, RemoteCache, UploadTask};
use crate::config::CacheConfig;
use crate::core::XcforgeError;
use crate::hashing::{ContentHasher, ContentHashing};

/// Command to transfer artifacts to and from the remote cache.
#[derive(Args, Debug)]
pub struct CacheCommand {
    #[command(subcommand)]
    command: CacheSubcommands,
}

#[derive(Subcommand, Debug)]
enum CacheSubcommands {
    /// Upload a file as-is
    Upload {
        /// File to upload
        file: PathBuf,

        /// Destination URL; defaults to `<cache url>/<hash>/<file name>`
        #[arg(long)]
        url: Option<String>,

        /// Cache key; defaults to the file's content hash
        #[arg(long)]
        hash: Option<String>,
    },

    /// Archive a product directory and upload it under a cache key
    Store {
        /// Product to archive, for example `Build/Core.framework`
        product: PathBuf,

        /// Cache key of the product
        #[arg(long)]
        hash: String,
    },

    /// Check whether the cache holds an artifact; exits with status 1 when it does not
    Exists {
        /// Cache key of the artifact
        hash: String,

        /// Artifact name, for example `Core.framework`
        name: String,
    },

    /// Download an artifact and extract it
    Fetch {
        /// Cache key of the artifact
        hash: String,

        /// Artifact name, for example `Core.framework`
        name: String,

        /// Directory to extract into
        #[arg(short, long, default_value = ".")]
        destination: PathBuf,
    },
}

impl CacheCommand {
    pub async fn execute(self, config: &CliConfig) -> Result<()> {
        let global = config.global_config().await?;
        let settings = global.cache;

        match self.command {
            CacheSubcommands::Upload {
                file,
                url,
                hash,
            } => upload(&settings, &file, url, hash).await,
            CacheSubcommands::Store {
                product,
                hash,
            } => {
                let cache = remote_cache(&settings)?;
                cache.store(&hash, &product).await?;
                println!("{} {} ({hash})", "Stored".green(), product.display());
                Ok(())
            }
            CacheSubcommands::Exists {
                hash,
                name,
            } => {
                let cache = remote_cache(&settings)?;
                if cache.exists(&hash, &name).await? {
                    println!("{}", cache.url().artifact(&hash, &name));
                    Ok(())
                } else {
                    Err(XcforgeError::ArtifactNotFound {
                        name,
                        hash,
                    }
                    .into())
                }
            }
            CacheSubcommands::Fetch {
                hash,
                name,
                destination,
            } => {
                let cache = remote_cache(&settings)?;
                let path = cache.fetch(&hash, &name, &destination).await?;
                println!("{} {}", "Fetched".green(), path.display());
                Ok(())
            }
        }
    }
}

async fn upload(
    settings: &CacheConfig,
    file: &Path,
    url: Option<String>,
    hash: Option<String>,
) -> Result<()> {
    let hash = match hash {
        Some(hash) => hash,
        None => ContentHasher::new().hash_file(file)?,
    };
    let url = match url {
        Some(url) => url,
        None => {
            let name = file
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_default();
            cache_url(settings)?.artifact(&hash, &name)
        }
    };

    let uploader = match settings.timeout() {
        Some(timeout) => FileUploader::with_timeout(timeout)?,
        None => FileUploader::new(),
    };
    let task = uploader.upload(file, &hash, &url);
    wait_cancellable(task).await?;

    println!("{} {} to {url}", "Uploaded".green(), file.display());
    Ok(())
}

/// Wait for `task`, cancelling it on Ctrl-C.
async fn wait_cancellable(task: UploadTask) -> Result<bool> {
    let token = task.cancellation_token();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!(target: "cache", "Interrupted, cancelling upload");
            token.cancel();
        }
    });

    let result = task.wait().await;
    interrupt.abort();
    Ok(result?)
}

fn cache_url(settings: &CacheConfig) -> Result<CacheUrl, XcforgeError> {
    settings.url.as_deref().map(CacheUrl::new).ok_or_else(|| XcforgeError::ConfigError {
        message: "No remote cache configured; set url in the [cache] section".to_string(),
    })
}

fn remote_cache(settings: &CacheConfig) -> Result<RemoteCache> {
    let url = cache_url(settings)?;
    Ok(match settings.timeout() {
        Some(timeout) => {
            RemoteCache::with_client(url, reqwest::Client::builder().timeout(timeout).build()?)
        }
        None => RemoteCache::new(url),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_cache_url_requires_configuration() {
        let error = cache_url(&CacheConfig::default()).unwrap_err();
        assert!(matches!(error, XcforgeError::ConfigError { .. }));

        let settings = CacheConfig {
            url: Some("https://cache.example.com/".to_string()),
            timeout_secs: None,
        };
        assert_eq!(cache_url(&settings).unwrap().base(), "https://cache.example.com");
    }

    #[tokio::test]
    async fn test_upload_defaults_to_content_hash() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("Core.framework.zip");
        fs::write(&file, b"archive").unwrap();
        let hash = ContentHasher::new().hash_file(&file).unwrap();

        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(PUT).path(format!("/artifacts/{hash}/Core.framework.zip"));
                then.status(201);
            })
            .await;

        let settings = CacheConfig {
            url: Some(server.url("/artifacts")),
            timeout_secs: Some(30),
        };
        upload(&settings, &file, None, None).await.unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_upload_explicit_url_without_configuration() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("App.zip");
        fs::write(&file, b"archive").unwrap();

        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(PUT).path("/custom/App.zip");
                then.status(200);
            })
            .await;

        upload(&CacheConfig::default(), &file, Some(server.url("/custom/App.zip")), Some("k".to_string()))
            .await
            .unwrap();

        assert_eq!(mock.hits_async().await, 1);
    }
}
