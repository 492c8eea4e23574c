use tracing::debug;

use crate::{
    error::DownloadError,
    traits::{Asset as _, Release},
    types::ResolvedAsset,
};

/// Picks the first asset of `release` whose name is exactly `asset_name`.
///
/// Matching is case-sensitive and never falls back to partial matches.
///
/// # Errors
///
/// Returns [`DownloadError::AssetNotFound`] listing the available asset
/// names when nothing matches.
pub fn find_asset<R: Release>(release: &R, asset_name: &str) -> Result<ResolvedAsset, DownloadError> {
    release
        .assets()
        .iter()
        .find(|asset| asset.name() == asset_name)
        .map(|asset| {
            match asset.size() {
                Some(size) => debug!("Found asset {} ({} bytes)", asset.name(), size),
                None => debug!("Found asset {}", asset.name()),
            }
            ResolvedAsset {
                name: asset.name().to_string(),
                download_url: asset.url().to_string(),
            }
        })
        .ok_or_else(|| {
            DownloadError::AssetNotFound {
                asset: asset_name.to_string(),
                available: release
                    .assets()
                    .iter()
                    .map(|a| a.name().to_string())
                    .collect(),
            }
        })
}
