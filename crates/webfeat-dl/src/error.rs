use std::io;

use miette::Diagnostic;
use thiserror::Error;

use crate::{
    context::{context_error, ContextError},
    http::TransportError,
};

/// The failure classes callers react to.
///
/// Every pipeline error maps onto exactly one kind, so callers can decide
/// whether to retry without matching on messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    ReleaseLookup,
    AssetNotFound,
    Transport,
    EmptyBody,
    Decompression,
    MalformedManifest,
    UnsupportedVersion,
    Canceled,
    DeadlineExceeded,
}

impl ErrorKind {
    /// Whether running the same operation again may succeed.
    pub fn is_retryable(self) -> bool {
        matches!(
            self,
            ErrorKind::ReleaseLookup | ErrorKind::Transport | ErrorKind::DeadlineExceeded
        )
    }
}

#[derive(Error, Diagnostic, Debug)]
pub enum DownloadError {
    #[error("Failed to look up the latest release of {repository}: {reason}")]
    #[diagnostic(
        code(webfeat_dl::release_lookup),
        help("Check that the repository exists and has a published release")
    )]
    ReleaseLookup { repository: String, reason: String },

    #[error("No release asset named `{asset}` found")]
    #[diagnostic(
        code(webfeat_dl::asset_not_found),
        help("Available assets:\n{}", .available.join("\n"))
    )]
    AssetNotFound {
        asset: String,
        available: Vec<String>,
    },

    #[error("Failed to download {url}")]
    #[diagnostic(
        code(webfeat_dl::transport),
        help("Check your internet connection or try again later")
    )]
    Transport {
        url: String,
        #[source]
        source: TransportError,
    },

    #[error("HTTP {status}: {url}")]
    #[diagnostic(code(webfeat_dl::http_error))]
    HttpStatus { status: u16, url: String },

    #[error("Response from {url} has no body")]
    #[diagnostic(
        code(webfeat_dl::empty_body),
        help("The release asset is reachable but returned no content")
    )]
    EmptyBody { url: String },

    #[error("Failed to decompress the release asset")]
    #[diagnostic(
        code(webfeat_dl::decompression),
        help("The asset is corrupt or not in the expected compression format")
    )]
    Decompression(#[source] io::Error),

    #[error("Download canceled")]
    #[diagnostic(code(webfeat_dl::canceled))]
    Canceled,

    #[error("Download deadline exceeded")]
    #[diagnostic(
        code(webfeat_dl::deadline_exceeded),
        help("Increase the timeout or try again later")
    )]
    DeadlineExceeded,
}

pub type Result<T> = std::result::Result<T, DownloadError>;

impl DownloadError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DownloadError::ReleaseLookup { .. } => ErrorKind::ReleaseLookup,
            DownloadError::AssetNotFound { .. } => ErrorKind::AssetNotFound,
            DownloadError::Transport { .. } | DownloadError::HttpStatus { .. } => {
                ErrorKind::Transport
            }
            DownloadError::EmptyBody { .. } => ErrorKind::EmptyBody,
            DownloadError::Decompression(_) => ErrorKind::Decompression,
            DownloadError::Canceled => ErrorKind::Canceled,
            DownloadError::DeadlineExceeded => ErrorKind::DeadlineExceeded,
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.kind().is_retryable()
    }

    /// Wraps a transport failure for `url`, keeping cancellation distinct.
    pub(crate) fn transport(url: &str, err: TransportError) -> Self {
        match err {
            TransportError::Canceled => DownloadError::Canceled,
            TransportError::DeadlineExceeded => DownloadError::DeadlineExceeded,
            TransportError::Io(io_err) => {
                match context_error(&io_err) {
                    Some(ctx_err) => ctx_err.into(),
                    None => {
                        DownloadError::Transport {
                            url: url.to_string(),
                            source: TransportError::Io(io_err),
                        }
                    }
                }
            }
            source => {
                DownloadError::Transport {
                    url: url.to_string(),
                    source,
                }
            }
        }
    }

    pub(crate) fn decompression(err: io::Error) -> Self {
        match context_error(&err) {
            Some(ctx_err) => ctx_err.into(),
            None => DownloadError::Decompression(err),
        }
    }
}

impl From<ContextError> for DownloadError {
    fn from(err: ContextError) -> Self {
        match err {
            ContextError::Canceled => DownloadError::Canceled,
            ContextError::DeadlineExceeded => DownloadError::DeadlineExceeded,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_release_lookup_display() {
        let err = DownloadError::ReleaseLookup {
            repository: "web-platform-tests/wpt".to_string(),
            reason: "HTTP 500".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Failed to look up the latest release of web-platform-tests/wpt: HTTP 500"
        );
        assert_eq!(err.kind(), ErrorKind::ReleaseLookup);
        assert!(err.is_retryable());
    }

    #[test]
    fn test_asset_not_found_is_not_retryable() {
        let err = DownloadError::AssetNotFound {
            asset: "WEB_FEATURES_MANIFEST.json.gz".to_string(),
            available: vec!["MANIFEST.json.gz".to_string()],
        };
        assert!(err.to_string().contains("WEB_FEATURES_MANIFEST.json.gz"));
        assert_eq!(err.kind(), ErrorKind::AssetNotFound);
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_http_status_is_transport_kind() {
        let err = DownloadError::HttpStatus {
            status: 503,
            url: "https://example.com/a".to_string(),
        };
        assert_eq!(err.to_string(), "HTTP 503: https://example.com/a");
        assert_eq!(err.kind(), ErrorKind::Transport);
        assert!(err.is_retryable());
    }

    #[test]
    fn test_transport_keeps_cancellation_distinct() {
        let url = "https://example.com/a";
        assert!(matches!(
            DownloadError::transport(url, TransportError::Canceled),
            DownloadError::Canceled
        ));
        assert!(matches!(
            DownloadError::transport(url, TransportError::DeadlineExceeded),
            DownloadError::DeadlineExceeded
        ));
        assert!(matches!(
            DownloadError::transport(url, io::Error::other(ContextError::Canceled).into()),
            DownloadError::Canceled
        ));
        assert!(matches!(
            DownloadError::transport(url, io::Error::other("reset").into()),
            DownloadError::Transport { .. }
        ));
    }

    #[test]
    fn test_decompression_keeps_cancellation_distinct() {
        let err = DownloadError::decompression(io::Error::other(ContextError::DeadlineExceeded));
        assert_eq!(err.kind(), ErrorKind::DeadlineExceeded);

        let err = DownloadError::decompression(io::Error::new(
            io::ErrorKind::InvalidData,
            "bad header",
        ));
        assert_eq!(err.kind(), ErrorKind::Decompression);
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_retryable_kinds() {
        assert!(ErrorKind::Transport.is_retryable());
        assert!(ErrorKind::DeadlineExceeded.is_retryable());
        assert!(!ErrorKind::Canceled.is_retryable());
        assert!(!ErrorKind::EmptyBody.is_retryable());
        assert!(!ErrorKind::UnsupportedVersion.is_retryable());
        assert!(!ErrorKind::MalformedManifest.is_retryable());
    }
}
