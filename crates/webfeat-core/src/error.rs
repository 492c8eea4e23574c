//! Error types for webfeat-core.

use miette::Diagnostic;
use thiserror::Error;
use webfeat_config::error::ConfigError;
use webfeat_dl::{DownloadError, ErrorKind};
use webfeat_manifest::ManifestError;

/// Core error type for webfeat operations.
#[derive(Error, Diagnostic, Debug)]
pub enum WebfeatError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Download(#[from] DownloadError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Manifest(#[from] ManifestError),

    #[error(transparent)]
    #[diagnostic(
        code(webfeat::network),
        help("Check the proxy setting in your configuration")
    )]
    UreqError(#[from] ureq::Error),

    #[error("Error while {action}")]
    #[diagnostic(code(webfeat::io), help("Check file permissions and disk space"))]
    IoError {
        action: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    #[diagnostic(code(webfeat::json))]
    JsonError(#[from] serde_json::Error),

    #[error("{0}")]
    #[diagnostic(code(webfeat::error))]
    Custom(String),
}

impl WebfeatError {
    /// The pipeline failure class, for errors raised by the pipeline.
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Download(err) => Some(err.kind()),
            Self::Manifest(err) => Some(err.kind()),
            _ => None,
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.kind().is_some_and(ErrorKind::is_retryable)
    }
}
