use std::sync::Arc;

use tracing::{debug, warn};

use crate::{
    context::Context,
    error::DownloadError,
    fetch::AssetFetcher,
    github::GithubResolver,
    http::HttpClient,
    traits::ReleaseResolver,
    transform::{BodyTransform, GzipTransform},
    types::{DownloadStage, ManifestStream},
};

pub const DEFAULT_OWNER: &str = "web-platform-tests";
pub const DEFAULT_REPOSITORY: &str = "wpt";
pub const DEFAULT_ASSET_NAME: &str = "WEB_FEATURES_MANIFEST.json.gz";

/// Produces a decoded manifest stream.
///
/// This is the seam downstream consumers mock in their own tests.
pub trait ManifestDownloader: Send + Sync {
    fn download(&self, ctx: &Context) -> Result<ManifestStream, DownloadError>;
}

/// Which repository and asset a downloader looks for. Fixed at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseAssetSource {
    pub owner: String,
    pub repository: String,
    pub asset_name: String,
}

impl ReleaseAssetSource {
    pub fn new(
        owner: impl Into<String>,
        repository: impl Into<String>,
        asset_name: impl Into<String>,
    ) -> Self {
        Self {
            owner: owner.into(),
            repository: repository.into(),
            asset_name: asset_name.into(),
        }
    }
}

impl Default for ReleaseAssetSource {
    fn default() -> Self {
        Self::new(DEFAULT_OWNER, DEFAULT_REPOSITORY, DEFAULT_ASSET_NAME)
    }
}

/// Downloads the manifest attached to the latest release of a repository.
///
/// Resolves the asset, fetches it and applies the body transform, in that
/// order, stopping at the first failure.
///
/// # Examples
///
/// ```no_run
/// use std::{io::Read, sync::Arc};
/// use webfeat_dl::{
///     context::Context,
///     downloader::{ManifestDownloader, ReleaseAssetSource, ReleaseManifestDownloader},
///     http_client::UreqClient,
/// };
///
/// let client = Arc::new(UreqClient::default());
/// let downloader =
///     ReleaseManifestDownloader::github(ReleaseAssetSource::default(), client.clone(), client);
///
/// let mut json = String::new();
/// downloader
///     .download(&Context::background())
///     .unwrap()
///     .read_to_string(&mut json)
///     .unwrap();
/// ```
pub struct ReleaseManifestDownloader {
    source: ReleaseAssetSource,
    resolver: Box<dyn ReleaseResolver>,
    fetcher: AssetFetcher<Arc<dyn HttpClient>>,
    transform: Box<dyn BodyTransform>,
}

impl ReleaseManifestDownloader {
    pub fn new(
        source: ReleaseAssetSource,
        resolver: impl ReleaseResolver + 'static,
        asset_client: Arc<dyn HttpClient>,
    ) -> Self {
        Self {
            source,
            resolver: Box::new(resolver),
            fetcher: AssetFetcher::new(asset_client),
            transform: Box::new(GzipTransform),
        }
    }

    /// A downloader resolving releases on github.com.
    ///
    /// `api_client` talks to the GitHub API, `asset_client` fetches the asset
    /// itself; they may be the same client.
    pub fn github(
        source: ReleaseAssetSource,
        api_client: Arc<dyn HttpClient>,
        asset_client: Arc<dyn HttpClient>,
    ) -> Self {
        Self::new(source, GithubResolver::new(api_client), asset_client)
    }

    pub fn with_transform(mut self, transform: impl BodyTransform + 'static) -> Self {
        self.transform = Box::new(transform);
        self
    }

    pub fn source(&self) -> &ReleaseAssetSource {
        &self.source
    }

    fn run(&self, ctx: &Context, stage: &mut DownloadStage) -> Result<ManifestStream, DownloadError> {
        let source = &self.source;

        *stage = DownloadStage::ResolvingAsset;
        let asset = self.resolver.resolve_asset(
            ctx,
            &source.owner,
            &source.repository,
            &source.asset_name,
        )?;
        debug!("Resolved {} to {}", asset.name, asset.download_url);

        *stage = DownloadStage::Fetching;
        let raw = self.fetcher.fetch(ctx, &asset.download_url)?;

        *stage = DownloadStage::Transforming;
        let decoded = self.transform.transform(raw)?;

        *stage = DownloadStage::Ready;
        Ok(decoded)
    }
}

impl ManifestDownloader for ReleaseManifestDownloader {
    fn download(&self, ctx: &Context) -> Result<ManifestStream, DownloadError> {
        let mut stage = DownloadStage::Start;
        let result = self.run(ctx, &mut stage);

        match &result {
            Ok(_) => debug!("Manifest download {}", stage),
            Err(err) => {
                warn!(
                    "Manifest download from {}/{} failed while {}: {}",
                    self.source.owner, self.source.repository, stage, err
                );
                stage = DownloadStage::Failed(err.kind());
                debug!("Manifest download {}", stage);
            }
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use std::io::Read;

    use super::*;
    use crate::{
        error::ErrorKind,
        http::{HttpResponse, TransportError},
        test_utils::{bytes_response, gzip, json_response, MockHttpClient, RecordingTransform},
    };

    const LATEST: &str = "https://api.github.com/repos/web-platform-tests/wpt/releases/latest";
    const ASSET_URL: &str = "https://example.com/WEB_FEATURES_MANIFEST.json.gz";
    const RELEASE: &str = r#"{"assets":[{"name":"WEB_FEATURES_MANIFEST.json.gz","browser_download_url":"https://example.com/WEB_FEATURES_MANIFEST.json.gz"}]}"#;
    const MANIFEST: &str = r#"{"version":1,"data":{"grid":["test1.js","test2.js"],"subgrid":["test3.js","test4.js"]}}"#;

    fn downloader(
        api: MockHttpClient,
        assets: Arc<MockHttpClient>,
    ) -> ReleaseManifestDownloader {
        ReleaseManifestDownloader::github(ReleaseAssetSource::default(), Arc::new(api), assets)
    }

    fn read_all(mut stream: ManifestStream) -> Vec<u8> {
        let mut out = Vec::new();
        stream.read_to_end(&mut out).unwrap();
        out
    }

    #[test]
    fn test_successful_download() {
        let api = MockHttpClient::new().route(LATEST, |_| json_response(200, RELEASE));
        let assets = Arc::new(MockHttpClient::new().route(ASSET_URL, |_| {
            Ok(bytes_response(200, b"raw data".to_vec()))
        }));

        let downloader = downloader(api, assets.clone())
            .with_transform(RecordingTransform::new(b"raw data", b"transformed data"));

        let body = downloader.download(&Context::background()).unwrap();
        assert_eq!(read_all(body), b"transformed data");
        assert_eq!(assets.requests(), vec![ASSET_URL.to_string()]);
    }

    #[test]
    fn test_download_with_gzip_transform() {
        let api = MockHttpClient::new().route(LATEST, |_| json_response(200, RELEASE));
        let assets = Arc::new(MockHttpClient::new().route(ASSET_URL, |_| {
            Ok(bytes_response(200, gzip(MANIFEST.as_bytes())))
        }));

        let body = downloader(api, assets)
            .download(&Context::background())
            .unwrap();
        assert_eq!(read_all(body), MANIFEST.as_bytes());
    }

    #[test]
    fn test_release_lookup_failure_skips_fetch() {
        let api = MockHttpClient::new().route(LATEST, |_| {
            json_response(500, r#"{"message":"failed to get release"}"#)
        });
        let assets = Arc::new(MockHttpClient::new());

        let err = downloader(api, assets.clone())
            .download(&Context::background())
            .err()
            .unwrap();
        assert_eq!(err.kind(), ErrorKind::ReleaseLookup);
        assert!(assets.requests().is_empty());
    }

    #[test]
    fn test_manifest_not_found_skips_fetch() {
        let api = MockHttpClient::new().route(LATEST, |_| json_response(200, r#"{"assets":[]}"#));
        let assets = Arc::new(MockHttpClient::new());

        let err = downloader(api, assets.clone())
            .download(&Context::background())
            .err()
            .unwrap();
        assert_eq!(err.kind(), ErrorKind::AssetNotFound);
        assert!(assets.requests().is_empty());
    }

    #[test]
    fn test_differently_cased_asset_is_not_found() {
        let api = MockHttpClient::new().route(LATEST, |_| {
            json_response(
                200,
                r#"{"assets":[{"name":"web_features_manifest.json.gz","browser_download_url":"https://example.com/lower"},{"name":"WEB_FEATURES_MANIFEST.json.gz.bak","browser_download_url":"https://example.com/bak"}]}"#,
            )
        });
        let assets = Arc::new(MockHttpClient::new());

        let err = downloader(api, assets.clone())
            .download(&Context::background())
            .err()
            .unwrap();
        assert_eq!(err.kind(), ErrorKind::AssetNotFound);
        assert!(assets.requests().is_empty());
    }

    #[test]
    fn test_asset_transport_error() {
        let api = MockHttpClient::new().route(LATEST, |_| json_response(200, RELEASE));
        let assets = Arc::new(MockHttpClient::new().route(ASSET_URL, |_| {
            Err(TransportError::Io(std::io::Error::other(
                "simulated network error",
            )))
        }));

        let err = downloader(api, assets)
            .download(&Context::background())
            .err()
            .unwrap();
        assert_eq!(err.kind(), ErrorKind::Transport);
        assert!(err.is_retryable());
    }

    #[test]
    fn test_asset_error_status() {
        let api = MockHttpClient::new().route(LATEST, |_| json_response(200, RELEASE));
        let assets = Arc::new(
            MockHttpClient::new().route(ASSET_URL, |_| json_response(502, "bad gateway")),
        );

        let err = downloader(api, assets)
            .download(&Context::background())
            .err()
            .unwrap();
        assert!(matches!(err, DownloadError::HttpStatus { status: 502, .. }));
    }

    #[test]
    fn test_empty_response_body() {
        let api = MockHttpClient::new().route(LATEST, |_| json_response(200, RELEASE));
        let assets =
            Arc::new(MockHttpClient::new().route(ASSET_URL, |_| Ok(HttpResponse::new(204))));

        let err = downloader(api, assets)
            .download(&Context::background())
            .err()
            .unwrap();
        assert_eq!(err.kind(), ErrorKind::EmptyBody);
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_transform_error_propagates() {
        let api = MockHttpClient::new().route(LATEST, |_| json_response(200, RELEASE));
        let assets = Arc::new(MockHttpClient::new().route(ASSET_URL, |_| {
            Ok(bytes_response(200, b"raw data".to_vec()))
        }));

        let err = downloader(api, assets)
            .with_transform(RecordingTransform::failing(
                b"raw data",
                DownloadError::Decompression(std::io::Error::other("bad header")),
            ))
            .download(&Context::background())
            .err()
            .unwrap();
        assert_eq!(err.kind(), ErrorKind::Decompression);
    }

    #[test]
    fn test_gzip_transform_rejects_plain_body() {
        let api = MockHttpClient::new().route(LATEST, |_| json_response(200, RELEASE));
        let assets = Arc::new(
            MockHttpClient::new().route(ASSET_URL, |_| json_response(200, MANIFEST)),
        );

        let err = downloader(api, assets)
            .download(&Context::background())
            .err()
            .unwrap();
        assert_eq!(err.kind(), ErrorKind::Decompression);
    }

    #[test]
    fn test_gzip_transform_rejects_malformed_header() {
        let api = MockHttpClient::new().route(LATEST, |_| json_response(200, RELEASE));
        let assets = Arc::new(MockHttpClient::new().route(ASSET_URL, |_| {
            Ok(bytes_response(
                200,
                vec![
                    0x1f, 0x8b, 0x07, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0xff, 0x01, 0x02, 0x03,
                    0x04,
                ],
            ))
        }));

        let err = downloader(api, assets)
            .download(&Context::background())
            .err()
            .unwrap();
        assert_eq!(err.kind(), ErrorKind::Decompression);
    }

    #[test]
    fn test_canceled_context_makes_no_requests() {
        let api = Arc::new(MockHttpClient::new().route(LATEST, |_| json_response(200, RELEASE)));
        let assets = Arc::new(MockHttpClient::new());
        let downloader =
            ReleaseManifestDownloader::github(ReleaseAssetSource::default(), api.clone(), assets.clone());

        let ctx = Context::background();
        ctx.cancel();

        let err = downloader.download(&ctx).err().unwrap();
        assert_eq!(err.kind(), ErrorKind::Canceled);
        assert!(api.requests().is_empty());
        assert!(assets.requests().is_empty());
    }

    #[test]
    fn test_custom_source() {
        let source = ReleaseAssetSource::new("octo", "features", "manifest.json");
        let api = Arc::new(MockHttpClient::new().route(
            "https://api.github.com/repos/octo/features/releases/latest",
            |_| {
                json_response(
                    200,
                    r#"{"assets":[{"name":"manifest.json","browser_download_url":"https://example.com/m.json"}]}"#,
                )
            },
        ));
        let assets = Arc::new(
            MockHttpClient::new()
                .route("https://example.com/m.json", |_| json_response(200, MANIFEST)),
        );

        let downloader = ReleaseManifestDownloader::github(source.clone(), api, assets)
            .with_transform(crate::transform::PassthroughTransform);
        assert_eq!(downloader.source(), &source);

        let body = downloader.download(&Context::background()).unwrap();
        assert_eq!(read_all(body), MANIFEST.as_bytes());
    }
}
