use crate::{context::Context, error::DownloadError, types::ResolvedAsset};

pub trait Asset {
    fn name(&self) -> &str;
    fn size(&self) -> Option<u64>;
    fn url(&self) -> &str;
}

pub trait Release {
    type Asset: Asset;

    fn name(&self) -> &str;
    fn tag(&self) -> &str;
    fn is_prerelease(&self) -> bool;
    fn published_at(&self) -> Option<&str>;
    fn assets(&self) -> &[Self::Asset];
}

/// Finds the download URL of a named asset on a repository's latest release.
pub trait ReleaseResolver: Send + Sync {
    fn resolve_asset(
        &self,
        ctx: &Context,
        owner: &str,
        repository: &str,
        asset_name: &str,
    ) -> Result<ResolvedAsset, DownloadError>;
}
