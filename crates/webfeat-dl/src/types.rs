use std::{fmt, io::Read};

use crate::error::ErrorKind;

/// A byte stream handed between pipeline stages.
///
/// Dropping the stream releases everything it wraps, including the
/// underlying response body.
pub type ManifestStream = Box<dyn Read + Send>;

/// The release asset picked by a resolver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAsset {
    pub name: String,
    pub download_url: String,
}

/// Where a manifest download currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadStage {
    Start,
    ResolvingAsset,
    Fetching,
    Transforming,
    Ready,
    Failed(ErrorKind),
}

impl fmt::Display for DownloadStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DownloadStage::Start => f.write_str("start"),
            DownloadStage::ResolvingAsset => f.write_str("resolving asset"),
            DownloadStage::Fetching => f.write_str("fetching"),
            DownloadStage::Transforming => f.write_str("transforming"),
            DownloadStage::Ready => f.write_str("ready"),
            DownloadStage::Failed(kind) => write!(f, "failed ({kind:?})"),
        }
    }
}
