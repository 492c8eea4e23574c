use std::io::{BufRead, BufReader};

use tracing::debug;

use crate::{
    context::{Context, ContextReader},
    error::DownloadError,
    http::{HttpClient, TransportError},
    types::ManifestStream,
};

const NO_CONTENT: u16 = 204;

/// Downloads a resolved asset through an injected [`HttpClient`].
pub struct AssetFetcher<C> {
    client: C,
}

impl<C: HttpClient> AssetFetcher<C> {
    pub fn new(client: C) -> Self {
        Self { client }
    }

    /// Issues a GET for `download_url` and returns the body as a stream.
    ///
    /// At most one buffer of the body is read up front, to tell an empty body
    /// apart from a real one; the rest streams as the caller reads.
    ///
    /// # Errors
    ///
    /// * [`DownloadError::Transport`] if the transport fails
    /// * [`DownloadError::HttpStatus`] for a non-2xx status
    /// * [`DownloadError::EmptyBody`] for `204 No Content`, a missing body or
    ///   a body with no bytes
    /// * [`DownloadError::Canceled`] / [`DownloadError::DeadlineExceeded`]
    ///   when `ctx` stops the request
    pub fn fetch(&self, ctx: &Context, download_url: &str) -> Result<ManifestStream, DownloadError> {
        ctx.check()?;

        debug!("Downloading release asset from {}", download_url);

        let resp = self
            .client
            .get(ctx, download_url, &[("Accept", "application/octet-stream")])
            .map_err(|err| DownloadError::transport(download_url, err))?;

        if !resp.is_success() {
            return Err(DownloadError::HttpStatus {
                status: resp.status,
                url: download_url.to_string(),
            });
        }

        let empty_body = || {
            DownloadError::EmptyBody {
                url: download_url.to_string(),
            }
        };

        if resp.status == NO_CONTENT || resp.content_length == Some(0) {
            return Err(empty_body());
        }

        let body = resp.body.ok_or_else(empty_body)?;
        let mut reader = BufReader::new(ContextReader::new(body, ctx.clone()));

        let buffered = reader
            .fill_buf()
            .map_err(|err| DownloadError::transport(download_url, TransportError::Io(err)))?;
        if buffered.is_empty() {
            return Err(empty_body());
        }

        Ok(Box::new(reader))
    }
}

#[cfg(test)]
mod tests {
    use std::io::{Cursor, Read};

    use super::*;
    use crate::{error::ErrorKind, http::HttpResponse, test_utils::MockHttpClient};

    const URL: &str = "https://example.com/WEB_FEATURES_MANIFEST.json.gz";

    fn fetch_with<F>(handler: F) -> Result<ManifestStream, DownloadError>
    where
        F: Fn(&[(&str, &str)]) -> Result<HttpResponse, TransportError> + Send + Sync + 'static,
    {
        let client = MockHttpClient::new().route(URL, handler);
        AssetFetcher::new(client).fetch(&Context::background(), URL)
    }

    #[test]
    fn test_fetch_streams_body() {
        let mut stream = fetch_with(|_| {
            Ok(HttpResponse::new(200)
                .with_content_length(8)
                .with_body(Cursor::new(b"raw data".to_vec())))
        })
        .unwrap();

        let mut body = String::new();
        stream.read_to_string(&mut body).unwrap();
        assert_eq!(body, "raw data");
    }

    #[test]
    fn test_fetch_transport_error() {
        let err = fetch_with(|_| {
            Err(TransportError::Io(std::io::Error::other(
                "simulated network error",
            )))
        })
        .err()
        .unwrap();
        assert_eq!(err.kind(), ErrorKind::Transport);
        assert!(matches!(err, DownloadError::Transport { ref url, .. } if url == URL));
    }

    #[test]
    fn test_fetch_error_status_with_content() {
        let err = fetch_with(|_| {
            Ok(HttpResponse::new(500).with_body(Cursor::new(b"oops".to_vec())))
        })
        .err()
        .unwrap();
        assert!(matches!(err, DownloadError::HttpStatus { status: 500, .. }));
        assert_eq!(err.kind(), ErrorKind::Transport);
    }

    #[test]
    fn test_fetch_no_content_without_body() {
        let err = fetch_with(|_| Ok(HttpResponse::new(204))).err().unwrap();
        assert_eq!(err.kind(), ErrorKind::EmptyBody);
    }

    #[test]
    fn test_fetch_ok_without_body() {
        let err = fetch_with(|_| Ok(HttpResponse::new(200))).err().unwrap();
        assert_eq!(err.kind(), ErrorKind::EmptyBody);
    }

    #[test]
    fn test_fetch_ok_with_zero_length_body() {
        let err = fetch_with(|_| Ok(HttpResponse::new(200).with_body(Cursor::new(Vec::new()))))
            .err()
            .unwrap();
        assert_eq!(err.kind(), ErrorKind::EmptyBody);
    }

    #[test]
    fn test_fetch_canceled_before_request() {
        let client = MockHttpClient::new();
        let ctx = Context::background();
        ctx.cancel();

        let err = AssetFetcher::new(&client).fetch(&ctx, URL).err().unwrap();
        assert_eq!(err.kind(), ErrorKind::Canceled);
        assert!(client.requests().is_empty());
    }

    #[test]
    fn test_fetch_canceled_mid_stream() {
        let ctx = Context::background();
        let client = MockHttpClient::new().route(URL, |_| {
            Ok(HttpResponse::new(200).with_body(Cursor::new(vec![b'x'; 64 * 1024])))
        });

        let mut stream = AssetFetcher::new(client).fetch(&ctx, URL).unwrap();
        ctx.cancel();

        let mut rest = Vec::new();
        let err = stream.read_to_end(&mut rest).unwrap_err();
        assert_eq!(
            crate::context::context_error(&err),
            Some(crate::context::ContextError::Canceled)
        );
    }
}
