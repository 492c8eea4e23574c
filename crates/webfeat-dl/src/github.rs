use serde::Deserialize;
use tracing::debug;

use crate::{
    context::{Context, ContextReader},
    error::DownloadError,
    http::{HttpClient, TransportError},
    release::find_asset,
    traits::{Asset, Release, ReleaseResolver},
    types::ResolvedAsset,
};

pub const GITHUB_API: &str = "https://api.github.com";

#[derive(Debug, Clone, Deserialize)]
pub struct GithubRelease {
    pub name: Option<String>,
    #[serde(default)]
    pub tag_name: String,
    #[serde(default)]
    pub prerelease: bool,
    pub published_at: Option<String>,
    #[serde(default)]
    pub assets: Vec<GithubAsset>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GithubAsset {
    pub name: String,
    #[serde(default)]
    pub size: u64,
    pub browser_download_url: String,
}

impl Release for GithubRelease {
    type Asset = GithubAsset;

    /// The release's name, or an empty string if the release has no name.
    fn name(&self) -> &str {
        self.name.as_deref().unwrap_or("")
    }

    fn tag(&self) -> &str {
        &self.tag_name
    }

    fn is_prerelease(&self) -> bool {
        self.prerelease
    }

    fn published_at(&self) -> Option<&str> {
        self.published_at.as_deref()
    }

    /// The release's assets in the order the API listed them.
    fn assets(&self) -> &[Self::Asset] {
        &self.assets
    }
}

impl Asset for GithubAsset {
    fn name(&self) -> &str {
        &self.name
    }

    fn size(&self) -> Option<u64> {
        Some(self.size)
    }

    fn url(&self) -> &str {
        &self.browser_download_url
    }
}

/// Resolves release assets through the GitHub REST API.
pub struct GithubResolver<C> {
    client: C,
    api_url: String,
    token: Option<String>,
}

impl<C: HttpClient> GithubResolver<C> {
    pub fn new(client: C) -> Self {
        Self {
            client,
            api_url: GITHUB_API.to_string(),
            token: None,
        }
    }

    /// Overrides the API base URL, e.g. for GitHub Enterprise.
    pub fn api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    /// Sends `Authorization: Bearer <token>` with release lookups.
    pub fn token(mut self, token: Option<String>) -> Self {
        self.token = token;
        self
    }

    /// Fetches the latest published release of `owner/repository`.
    ///
    /// # Errors
    ///
    /// [`DownloadError::ReleaseLookup`] when the request fails, the status is
    /// not a success or the body is not a release document.
    /// [`DownloadError::Canceled`] and [`DownloadError::DeadlineExceeded`]
    /// when `ctx` stops the lookup.
    pub fn latest_release(
        &self,
        ctx: &Context,
        owner: &str,
        repository: &str,
    ) -> Result<GithubRelease, DownloadError> {
        ctx.check()?;

        let project = format!("{owner}/{repository}");
        let url = format!(
            "{}/repos/{project}/releases/latest",
            self.api_url.trim_end_matches('/')
        );
        let lookup_failed = |reason: String| {
            DownloadError::ReleaseLookup {
                repository: project.clone(),
                reason,
            }
        };

        let auth = self.token.as_ref().map(|token| format!("Bearer {token}"));
        let mut headers = vec![
            ("Accept", "application/vnd.github+json"),
            ("X-GitHub-Api-Version", "2022-11-28"),
        ];
        if let Some(auth) = &auth {
            headers.push(("Authorization", auth.as_str()));
        }

        debug!("Fetching latest release of {} from {}", project, url);

        let resp = self
            .client
            .get(ctx, &url, &headers)
            .map_err(|err| {
                match err {
                    TransportError::Canceled => DownloadError::Canceled,
                    TransportError::DeadlineExceeded => DownloadError::DeadlineExceeded,
                    err => lookup_failed(err.to_string()),
                }
            })?;

        if !resp.is_success() {
            return Err(lookup_failed(format!("HTTP {}", resp.status)));
        }

        let body = resp
            .body
            .ok_or_else(|| lookup_failed("empty response body".to_string()))?;

        serde_json::from_reader(ContextReader::new(body, ctx.clone())).map_err(|err| {
            match ctx.err() {
                Some(ctx_err) => ctx_err.into(),
                None => lookup_failed(format!("invalid release document: {err}")),
            }
        })
    }
}

impl<C: HttpClient> ReleaseResolver for GithubResolver<C> {
    fn resolve_asset(
        &self,
        ctx: &Context,
        owner: &str,
        repository: &str,
        asset_name: &str,
    ) -> Result<ResolvedAsset, DownloadError> {
        let release = self.latest_release(ctx, owner, repository)?;
        debug!(
            "Latest release {}{} (published {}) has {} assets",
            release.tag(),
            if release.is_prerelease() { " [prerelease]" } else { "" },
            release.published_at().unwrap_or("unknown"),
            release.assets().len()
        );
        find_asset(&release, asset_name)
    }
}
