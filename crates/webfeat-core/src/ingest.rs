//! Wiring of the download pipeline and the parser.

use std::{sync::Arc, time::Instant};

use tracing::{debug, info};
use webfeat_config::Config;
use webfeat_dl::{
    ClientConfig, Context, GithubResolver, HttpClient, ManifestDownloader, ReleaseAssetSource,
    ReleaseManifestDownloader, UreqClient,
};
use webfeat_manifest::{ManifestParser, WebFeaturesData};

use crate::WebfeatResult;

/// Downloads the manifest and parses it.
///
/// The download stream is handed straight to the parser, which owns it from
/// then on.
pub fn fetch_web_features(
    ctx: &Context,
    downloader: &dyn ManifestDownloader,
    parser: &dyn ManifestParser,
) -> WebfeatResult<WebFeaturesData> {
    let started = Instant::now();

    let stream = downloader.download(ctx)?;
    debug!("Manifest stream ready after {:?}", started.elapsed());

    let data = parser.parse(ctx, stream)?;
    info!(
        "Loaded {} web features ({} feature/test pairs) in {:?}",
        data.len(),
        data.test_count(),
        started.elapsed()
    );

    Ok(data)
}

/// Builds the HTTP client described by `config`.
pub fn client_from_config(config: &Config) -> WebfeatResult<UreqClient> {
    let mut client_config = ClientConfig::default();

    if let Some(user_agent) = &config.user_agent {
        client_config.user_agent = Some(user_agent.clone());
    }
    if let Some(proxy) = &config.proxy {
        client_config.proxy = Some(ureq::Proxy::new(proxy)?);
    }

    Ok(client_config.into_client())
}

/// Builds a GitHub release downloader from `config`.
pub fn downloader_from_config(config: &Config) -> WebfeatResult<ReleaseManifestDownloader> {
    let client: Arc<dyn HttpClient> = Arc::new(client_from_config(config)?);
    downloader_with_client(config, client)
}

/// Like [`downloader_from_config`], but sends every request through `client`.
pub fn downloader_with_client(
    config: &Config,
    client: Arc<dyn HttpClient>,
) -> WebfeatResult<ReleaseManifestDownloader> {
    let (owner, repository) = config.repository_parts()?;
    let source = ReleaseAssetSource::new(owner, repository, config.asset_name());

    let token = config.token();
    if token.is_some() {
        debug!("Authenticating GitHub API requests with a token");
    }

    let resolver = GithubResolver::new(client.clone())
        .api_url(config.api_url())
        .token(token);

    Ok(ReleaseManifestDownloader::new(source, resolver, client))
}

/// A context bounded by the configured timeout, if any.
pub fn context_from_config(config: &Config) -> WebfeatResult<Context> {
    let ctx = Context::background();
    Ok(match config.timeout()? {
        Some(timeout) => ctx.with_timeout(timeout),
        None => ctx,
    })
}
