//! Remote build-artifact cache.
//!
//! Prebuilt products are zipped ([`archive`]), addressed by their target's content hash
//! ([`CacheUrl`]) and transferred with plain HTTP: HEAD to look an artifact up, GET to
//! download it and PUT to upload it ([`FileUploader`]).
//!
//! # Cache Layout
//!
//! ```text
//! <base url>/
//! ├── <hash>/
//! │   └── App.framework.zip
//! └── <hash>/
//!     └── Core.xcframework.zip
//! ```
//!
//! Uploads of the same artifact are not deduplicated; callers that need at-most-once
//! semantics must check [`RemoteCache::exists`] first.

pub mod archive;
pub mod remote;
pub mod uploader;

pub use remote::{CacheUrl, RemoteCache};
pub use uploader::{FileUploader, UploadError, UploadTask};
