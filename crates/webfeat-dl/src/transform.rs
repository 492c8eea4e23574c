//! Stream transforms applied to a downloaded asset before parsing.

use std::{
    fmt,
    io::{self, Cursor, Read},
};

use flate2::read::GzDecoder;
use thiserror::Error;

use crate::{error::DownloadError, types::ManifestStream};

/// Magic bytes opening every gzip member.
pub const GZIP_MAGIC_BYTES: [u8; 2] = [0x1f, 0x8b];

/// Length of the fixed part of a gzip member header.
const GZIP_HEADER_LEN: usize = 10;
const GZIP_METHOD_DEFLATE: u8 = 8;
const GZIP_RESERVED_FLAGS: u8 = 0xe0;

/// Converts a raw byte stream into a decoded byte stream.
///
/// The returned stream takes ownership of `raw`, so dropping it releases
/// the raw stream as well.
pub trait BodyTransform: Send + Sync {
    fn transform(&self, raw: ManifestStream) -> Result<ManifestStream, DownloadError>;
}

/// Marks a read error raised by a decoder rather than by the stream it reads.
///
/// Use [`is_decode_error`] to tell the two apart.
#[derive(Error, Debug)]
#[error("{0}")]
pub struct DecodeError(io::Error);

impl From<io::Error> for DecodeError {
    fn from(err: io::Error) -> Self {
        Self(err)
    }
}

/// Returns `true` when `err` came from a decoder, i.e. the data itself is
/// corrupt or truncated.
pub fn is_decode_error(err: &io::Error) -> bool {
    err.get_ref()
        .is_some_and(|inner| inner.is::<DecodeError>())
}

/// Streaming gzip decompression.
///
/// The member header is read and validated eagerly, so a malformed header
/// fails the transform. The body is inflated as the caller reads.
#[derive(Debug, Clone, Copy, Default)]
pub struct GzipTransform;

impl BodyTransform for GzipTransform {
    fn transform(&self, mut raw: ManifestStream) -> Result<ManifestStream, DownloadError> {
        let mut header = [0u8; GZIP_HEADER_LEN];
        raw.read_exact(&mut header)
            .map_err(DownloadError::decompression)?;
        check_header(&header).map_err(DownloadError::Decompression)?;

        let source = SourceReader(Cursor::new(header).chain(raw));
        let mut decoder = GzDecoder::new(source);

        // The decoder parses the optional header fields on construction and
        // keeps the error until the first read.
        if decoder.header().is_none() {
            let err = match decoder.read(&mut [0u8; 0]) {
                Err(err) => untag(err),
                Ok(_) => io::Error::new(io::ErrorKind::InvalidData, "invalid gzip header"),
            };
            return Err(DownloadError::decompression(err));
        }

        Ok(Box::new(DecodeReader(decoder)))
    }
}

fn check_header(header: &[u8; GZIP_HEADER_LEN]) -> io::Result<()> {
    let invalid = |msg: String| Err(io::Error::new(io::ErrorKind::InvalidData, msg));

    if header[..2] != GZIP_MAGIC_BYTES {
        return invalid(format!(
            "invalid gzip header: expected {:02x?}, found {:02x?}",
            GZIP_MAGIC_BYTES,
            &header[..2]
        ));
    }
    if header[2] != GZIP_METHOD_DEFLATE {
        return invalid(format!(
            "unsupported gzip compression method {}",
            header[2]
        ));
    }
    if header[3] & GZIP_RESERVED_FLAGS != 0 {
        return invalid(format!("reserved gzip flags set: {:#04x}", header[3]));
    }
    Ok(())
}

/// Wraps errors of the raw stream so they pass through the decoder intact.
struct SourceError(io::Error);

impl fmt::Debug for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl fmt::Display for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl std::error::Error for SourceError {}

struct SourceReader<R>(R);

impl<R: Read> Read for SourceReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.0
            .read(buf)
            .map_err(|err| io::Error::new(err.kind(), SourceError(err)))
    }
}

/// Gives back raw stream errors untouched and marks everything else as a
/// [`DecodeError`].
fn untag(err: io::Error) -> io::Error {
    let kind = err.kind();
    match err.into_inner() {
        Some(inner) => {
            match inner.downcast::<SourceError>() {
                Ok(source) => source.0,
                Err(inner) => io::Error::new(kind, DecodeError::from(io::Error::new(kind, inner))),
            }
        }
        None => io::Error::new(kind, DecodeError::from(io::Error::from(kind))),
    }
}

struct DecodeReader<R>(R);

impl<R: Read> Read for DecodeReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.0.read(buf).map_err(untag)
    }
}

/// Hands the raw stream through untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughTransform;

impl BodyTransform for PassthroughTransform {
    fn transform(&self, raw: ManifestStream) -> Result<ManifestStream, DownloadError> {
        Ok(raw)
    }
}

/// Returns `true` when `bytes` start with the gzip magic.
pub fn is_gzip(bytes: &[u8]) -> bool {
    bytes.starts_with(&GZIP_MAGIC_BYTES)
}
