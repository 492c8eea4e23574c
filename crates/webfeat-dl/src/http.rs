use std::{fmt, io::Read, sync::Arc};

use thiserror::Error;

use crate::{
    context::{Context, ContextError},
    types::ManifestStream,
};

/// Status and body of an HTTP response.
pub struct HttpResponse {
    pub status: u16,
    pub content_length: Option<u64>,
    pub body: Option<ManifestStream>,
}

impl HttpResponse {
    /// A response with the given status and no body.
    pub fn new(status: u16) -> Self {
        Self {
            status,
            content_length: None,
            body: None,
        }
    }

    pub fn with_body<R>(mut self, body: R) -> Self
    where
        R: Read + Send + 'static,
    {
        self.body = Some(Box::new(body));
        self
    }

    pub fn with_content_length(mut self, length: u64) -> Self {
        self.content_length = Some(length);
        self
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

impl fmt::Debug for HttpResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpResponse")
            .field("status", &self.status)
            .field("content_length", &self.content_length)
            .field("has_body", &self.body.is_some())
            .finish()
    }
}

/// Failure of the transport itself, before any status code is known.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("request canceled")]
    Canceled,

    #[error("request deadline exceeded")]
    DeadlineExceeded,

    #[error(transparent)]
    Network(Box<ureq::Error>),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<ureq::Error> for TransportError {
    fn from(err: ureq::Error) -> Self {
        Self::Network(Box::new(err))
    }
}

impl From<ContextError> for TransportError {
    fn from(err: ContextError) -> Self {
        match err {
            ContextError::Canceled => Self::Canceled,
            ContextError::DeadlineExceeded => Self::DeadlineExceeded,
        }
    }
}

/// The HTTP transport used by the pipeline.
///
/// Implementations must honour the context: fail fast when it is already
/// done, return promptly once it is canceled while a request is waiting on
/// the network, and bound the request by its deadline. The returned body only
/// sees cancellation between reads, so a read already blocked on a blocking
/// transport runs until data arrives or the transport's own timeout fires.
/// Retry, proxy and backoff policies belong here, not in the pipeline.
pub trait HttpClient: Send + Sync {
    fn get(
        &self,
        ctx: &Context,
        url: &str,
        headers: &[(&str, &str)],
    ) -> Result<HttpResponse, TransportError>;
}

impl<T: HttpClient + ?Sized> HttpClient for Arc<T> {
    fn get(
        &self,
        ctx: &Context,
        url: &str,
        headers: &[(&str, &str)],
    ) -> Result<HttpResponse, TransportError> {
        (**self).get(ctx, url, headers)
    }
}

impl<T: HttpClient + ?Sized> HttpClient for &T {
    fn get(
        &self,
        ctx: &Context,
        url: &str,
        headers: &[(&str, &str)],
    ) -> Result<HttpResponse, TransportError> {
        (**self).get(ctx, url, headers)
    }
}

impl<T: HttpClient + ?Sized> HttpClient for Box<T> {
    fn get(
        &self,
        ctx: &Context,
        url: &str,
        headers: &[(&str, &str)],
    ) -> Result<HttpResponse, TransportError> {
        (**self).get(ctx, url, headers)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    #[test]
    fn test_http_response_success_range() {
        assert!(HttpResponse::new(200).is_success());
        assert!(HttpResponse::new(204).is_success());
        assert!(!HttpResponse::new(199).is_success());
        assert!(!HttpResponse::new(301).is_success());
        assert!(!HttpResponse::new(500).is_success());
    }

    #[test]
    fn test_http_response_debug_hides_body() {
        let resp = HttpResponse::new(200)
            .with_content_length(3)
            .with_body(Cursor::new(b"abc".to_vec()));
        let debug = format!("{resp:?}");
        assert!(debug.contains("status: 200"));
        assert!(debug.contains("has_body: true"));
    }

    #[test]
    fn test_transport_error_from_context() {
        assert!(matches!(
            TransportError::from(ContextError::Canceled),
            TransportError::Canceled
        ));
        assert!(matches!(
            TransportError::from(ContextError::DeadlineExceeded),
            TransportError::DeadlineExceeded
        ));
    }
}
