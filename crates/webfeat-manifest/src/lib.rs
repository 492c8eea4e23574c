//! Web features manifest decoding.
//!
//! The manifest maps web feature identifiers to the tests exercising them and
//! is published as versioned JSON:
//!
//! ```json
//! {"version": 1, "data": {"grid": ["css/css-grid/grid-001.html"]}}
//! ```
//!
//! [`JsonManifestParser`] decodes a stream produced by a
//! [`webfeat_dl::ManifestDownloader`] into [`WebFeaturesData`];
//! [`read_manifest_file`] does the same for a file on disk.
//!
//! # Example
//!
//! ```no_run
//! use webfeat_dl::Context;
//! use webfeat_manifest::read_manifest_file;
//!
//! fn count_features() -> webfeat_manifest::Result<usize> {
//!     let data = read_manifest_file(&Context::background(), "WEB_FEATURES_MANIFEST.json.gz")?;
//!     Ok(data.len())
//! }
//! ```

pub mod data;
pub mod error;
pub mod parser;

pub use data::{WebFeaturesData, MANIFEST_VERSION};
pub use error::{ErrorContext, ManifestError, Result};
pub use parser::{read_manifest_file, read_manifest_file_with, JsonManifestParser, ManifestParser};
