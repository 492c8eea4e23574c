//! Error types for the manifest crate.

use std::io;

use miette::Diagnostic;
use serde_json::Number;
use thiserror::Error;
use webfeat_dl::{
    context::context_error, is_decode_error, ContextError, DecodeError, DownloadError, ErrorKind,
};

/// Errors raised while reading or decoding a manifest.
#[derive(Error, Diagnostic, Debug)]
pub enum ManifestError {
    #[error("Malformed web features manifest: {0}")]
    #[diagnostic(
        code(webfeat_manifest::malformed),
        help("The manifest must be JSON of the form {{\"version\": 1, \"data\": {{...}}}}")
    )]
    Malformed(#[source] serde_json::Error),

    #[error("Unsupported web features manifest version: {}", display_version(.found))]
    #[diagnostic(
        code(webfeat_manifest::unsupported_version),
        help("Only version 1 manifests are understood; upgrade webfeat to read newer ones")
    )]
    UnsupportedVersion { found: Option<Number> },

    #[error("Failed to decompress manifest: {0}")]
    #[diagnostic(
        code(webfeat_manifest::decompression),
        help("The manifest stream is corrupt or truncated")
    )]
    Decompression(#[source] io::Error),

    #[error("Error while {action}: {source}")]
    #[diagnostic(code(webfeat_manifest::io))]
    Io {
        action: String,
        #[source]
        source: io::Error,
    },

    #[error("Manifest parsing canceled")]
    #[diagnostic(code(webfeat_manifest::canceled))]
    Canceled,

    #[error("Manifest parsing deadline exceeded")]
    #[diagnostic(
        code(webfeat_manifest::deadline_exceeded),
        help("Increase the timeout or try again later")
    )]
    DeadlineExceeded,

    #[error(transparent)]
    #[diagnostic(transparent)]
    Download(#[from] DownloadError),
}

fn display_version(found: &Option<Number>) -> String {
    match found {
        Some(version) => version.to_string(),
        None => "missing".to_string(),
    }
}

/// A specialized Result type for manifest operations.
pub type Result<T> = std::result::Result<T, ManifestError>;

impl ManifestError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ManifestError::Malformed(_) => ErrorKind::MalformedManifest,
            ManifestError::UnsupportedVersion { .. } => ErrorKind::UnsupportedVersion,
            ManifestError::Decompression(_) => ErrorKind::Decompression,
            ManifestError::Io { .. } => ErrorKind::Transport,
            ManifestError::Canceled => ErrorKind::Canceled,
            ManifestError::DeadlineExceeded => ErrorKind::DeadlineExceeded,
            ManifestError::Download(err) => err.kind(),
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.kind().is_retryable()
    }

    /// Classifies a failed read of the manifest stream.
    ///
    /// Cancellation wins. Errors a decoder raised over corrupt or truncated
    /// data are [`ManifestError::Decompression`]; failures of the underlying
    /// stream stay I/O failures.
    pub(crate) fn read(err: io::Error) -> Self {
        if let Some(ctx_err) = context_error(&err) {
            return ctx_err.into();
        }

        if is_decode_error(&err) {
            return ManifestError::Decompression(err);
        }

        ManifestError::Io {
            action: "reading manifest stream".to_string(),
            source: err,
        }
    }
}

impl From<ContextError> for ManifestError {
    fn from(err: ContextError) -> Self {
        match err {
            ContextError::Canceled => ManifestError::Canceled,
            ContextError::DeadlineExceeded => ManifestError::DeadlineExceeded,
        }
    }
}

/// Extension trait for adding context to I/O errors.
pub trait ErrorContext<T> {
    fn with_context<C>(self, context: C) -> Result<T>
    where
        C: FnOnce() -> String;
}

impl<T> ErrorContext<T> for io::Result<T> {
    fn with_context<C>(self, context: C) -> Result<T>
    where
        C: FnOnce() -> String,
    {
        self.map_err(|err| {
            ManifestError::Io {
                action: context(),
                source: err,
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ManifestError::UnsupportedVersion {
            found: Some(2.into()),
        };
        assert_eq!(
            err.to_string(),
            "Unsupported web features manifest version: 2"
        );

        let err = ManifestError::UnsupportedVersion { found: None };
        assert_eq!(
            err.to_string(),
            "Unsupported web features manifest version: missing"
        );
    }

    #[test]
    fn test_read_error_classification() {
        let corrupt = io::Error::new(
            io::ErrorKind::InvalidInput,
            DecodeError::from(io::Error::new(io::ErrorKind::InvalidInput, "corrupt")),
        );
        assert_eq!(ManifestError::read(corrupt).kind(), ErrorKind::Decompression);

        // A plain body cut short by the network is a transport failure.
        let err = ManifestError::read(io::Error::new(io::ErrorKind::UnexpectedEof, "eof"));
        assert_eq!(err.kind(), ErrorKind::Transport);
        assert!(err.is_retryable());

        let err = ManifestError::read(io::Error::new(io::ErrorKind::ConnectionReset, "reset"));
        assert_eq!(err.kind(), ErrorKind::Transport);

        let err = ManifestError::read(io::Error::other(ContextError::DeadlineExceeded));
        assert!(matches!(err, ManifestError::DeadlineExceeded));
    }

    #[test]
    fn test_download_errors_keep_their_kind() {
        let err = ManifestError::from(DownloadError::EmptyBody {
            url: "https://example.com/a".to_string(),
        });
        assert_eq!(err.kind(), ErrorKind::EmptyBody);
        assert!(!err.is_retryable());

        let err = ManifestError::from(ContextError::Canceled);
        assert!(matches!(err, ManifestError::Canceled));
    }

    #[test]
    fn test_with_context() {
        let result: io::Result<()> = Err(io::Error::from(io::ErrorKind::NotFound));
        let err = result
            .with_context(|| "opening manifest.json".to_string())
            .unwrap_err();
        assert!(err.to_string().starts_with("Error while opening manifest.json"));
    }
}
