//! Test doubles for the download pipeline.

use std::{
    io::{Cursor, Read, Write},
    sync::Mutex,
};

use flate2::{write::GzEncoder, Compression};

use crate::{
    context::Context,
    error::DownloadError,
    http::{HttpClient, HttpResponse, TransportError},
    transform::BodyTransform,
    types::ManifestStream,
};

type Handler =
    Box<dyn Fn(&[(&str, &str)]) -> Result<HttpResponse, TransportError> + Send + Sync>;

/// An [`HttpClient`] answering from per-URL handlers.
///
/// Unrouted URLs get a `404`. Every requested URL is recorded.
#[derive(Default)]
pub struct MockHttpClient {
    routes: Vec<(String, Handler)>,
    requests: Mutex<Vec<String>>,
}

impl MockHttpClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route<F>(mut self, url: &str, handler: F) -> Self
    where
        F: Fn(&[(&str, &str)]) -> Result<HttpResponse, TransportError> + Send + Sync + 'static,
    {
        self.routes.push((url.to_string(), Box::new(handler)));
        self
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

impl HttpClient for MockHttpClient {
    fn get(
        &self,
        ctx: &Context,
        url: &str,
        headers: &[(&str, &str)],
    ) -> Result<HttpResponse, TransportError> {
        ctx.check()?;
        self.requests.lock().unwrap().push(url.to_string());

        match self.routes.iter().find(|(route, _)| route == url) {
            Some((_, handler)) => handler(headers),
            None => Ok(HttpResponse::new(404)),
        }
    }
}

/// A response carrying `body` with its content length set.
pub fn json_response(status: u16, body: &str) -> Result<HttpResponse, TransportError> {
    Ok(bytes_response(status, body.as_bytes().to_vec()))
}

pub fn bytes_response(status: u16, body: Vec<u8>) -> HttpResponse {
    HttpResponse::new(status)
        .with_content_length(body.len() as u64)
        .with_body(Cursor::new(body))
}

/// Gzip-compresses `data`.
pub fn gzip(data: &[u8]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

/// A [`BodyTransform`] that checks the exact bytes it receives and replies
/// with a canned output or error.
pub struct RecordingTransform {
    expected_input: Vec<u8>,
    output: Mutex<Option<Result<Vec<u8>, DownloadError>>>,
}

impl RecordingTransform {
    pub fn new(expected_input: &[u8], output: &[u8]) -> Self {
        Self {
            expected_input: expected_input.to_vec(),
            output: Mutex::new(Some(Ok(output.to_vec()))),
        }
    }

    pub fn failing(expected_input: &[u8], err: DownloadError) -> Self {
        Self {
            expected_input: expected_input.to_vec(),
            output: Mutex::new(Some(Err(err))),
        }
    }
}

impl BodyTransform for RecordingTransform {
    fn transform(&self, mut raw: ManifestStream) -> Result<ManifestStream, DownloadError> {
        let mut input = Vec::new();
        raw.read_to_end(&mut input).unwrap();
        assert_eq!(input, self.expected_input, "unexpected transform input");

        let output = self
            .output
            .lock()
            .unwrap()
            .take()
            .expect("transform called more than once");
        output.map(|bytes| Box::new(Cursor::new(bytes)) as ManifestStream)
    }
}
