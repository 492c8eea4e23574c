//! Download pipeline for the web features manifest.
//!
//! The manifest is published as a gzip-compressed asset on the latest release
//! of a GitHub repository. Getting it takes three steps, each behind its own
//! seam so it can be swapped out in tests:
//!
//! - a [`ReleaseResolver`] finds the asset's download URL,
//! - an [`AssetFetcher`] pulls the bytes through an [`HttpClient`],
//! - a [`BodyTransform`] decodes them.
//!
//! [`ReleaseManifestDownloader`] runs the three in order. Every step observes a
//! [`Context`], so callers can cancel a download or bound it with a deadline.
//!
//! # Example
//!
//! ```no_run
//! use std::{sync::Arc, time::Duration};
//! use webfeat_dl::{
//!     Context, ManifestDownloader, ReleaseAssetSource, ReleaseManifestDownloader, UreqClient,
//! };
//!
//! fn download() -> webfeat_dl::Result<()> {
//!     let client = Arc::new(UreqClient::default());
//!     let downloader =
//!         ReleaseManifestDownloader::github(ReleaseAssetSource::default(), client.clone(), client);
//!
//!     let ctx = Context::background().with_timeout(Duration::from_secs(60));
//!     let _stream = downloader.download(&ctx)?;
//!     Ok(())
//! }
//! ```

pub mod context;
pub mod downloader;
pub mod error;
pub mod fetch;
pub mod github;
pub mod http;
pub mod http_client;
pub mod release;
pub mod traits;
pub mod transform;
pub mod types;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use context::{Context, ContextError, ContextReader};
pub use downloader::{
    ManifestDownloader, ReleaseAssetSource, ReleaseManifestDownloader, DEFAULT_ASSET_NAME,
    DEFAULT_OWNER, DEFAULT_REPOSITORY,
};
pub use error::{DownloadError, ErrorKind, Result};
pub use fetch::AssetFetcher;
pub use github::GithubResolver;
pub use http::{HttpClient, HttpResponse, TransportError};
pub use http_client::{ClientConfig, UreqClient};
pub use traits::ReleaseResolver;
pub use transform::{
    is_decode_error, is_gzip, BodyTransform, DecodeError, GzipTransform, PassthroughTransform,
    GZIP_MAGIC_BYTES,
};
pub use types::{DownloadStage, ManifestStream, ResolvedAsset};
