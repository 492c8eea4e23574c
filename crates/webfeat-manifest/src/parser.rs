//! Decoding of the versioned manifest envelope.

use std::{
    collections::HashMap,
    fs::File,
    io::{BufReader, Read},
    path::Path,
};

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, trace};
use webfeat_dl::{
    is_gzip, BodyTransform, Context, ContextReader, GzipTransform, ManifestStream,
    GZIP_MAGIC_BYTES,
};

use crate::{
    data::{WebFeaturesData, MANIFEST_VERSION},
    error::{ErrorContext, ManifestError, Result},
};

/// Decodes a manifest stream into [`WebFeaturesData`].
///
/// The stream is consumed and dropped on every path out of `parse`.
pub trait ManifestParser: Send + Sync {
    fn parse(&self, ctx: &Context, stream: ManifestStream) -> Result<WebFeaturesData>;
}

/// Parser for the JSON envelope `{"version": 1, "data": {<id>: [<path>...]}}`.
///
/// Unknown top-level fields are ignored. The version is checked before `data`
/// is looked at, so a newer manifest is reported as
/// [`ManifestError::UnsupportedVersion`] even when its payload has a
/// different shape.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonManifestParser;

#[derive(Deserialize)]
struct RawEnvelope {
    #[serde(default)]
    version: Value,
    #[serde(default)]
    data: Value,
}

fn malformed(msg: &str) -> ManifestError {
    ManifestError::Malformed(serde::de::Error::custom(msg))
}

impl JsonManifestParser {
    /// Parses an in-memory manifest.
    pub fn parse_slice(&self, bytes: &[u8]) -> Result<WebFeaturesData> {
        let envelope: RawEnvelope =
            serde_json::from_slice(bytes).map_err(ManifestError::Malformed)?;

        match envelope.version {
            Value::Number(version) if version.as_i64() == Some(MANIFEST_VERSION) => {}
            Value::Number(version) if version.is_i64() || version.is_u64() => {
                return Err(ManifestError::UnsupportedVersion {
                    found: Some(version),
                });
            }
            Value::Null => return Err(ManifestError::UnsupportedVersion { found: None }),
            _ => return Err(malformed("manifest version is not an integer")),
        }

        if envelope.data.is_null() {
            return Err(malformed("missing field `data`"));
        }

        let raw: HashMap<String, Vec<String>> =
            serde_json::from_value(envelope.data).map_err(ManifestError::Malformed)?;
        Ok(raw.into())
    }
}

impl ManifestParser for JsonManifestParser {
    fn parse(&self, ctx: &Context, stream: ManifestStream) -> Result<WebFeaturesData> {
        ctx.check()?;

        let mut content = Vec::new();
        ContextReader::new(stream, ctx.clone())
            .read_to_end(&mut content)
            .map_err(ManifestError::read)?;
        trace!("Read {} bytes of manifest", content.len());

        ctx.check()?;

        let data = self.parse_slice(&content)?;
        debug!("Parsed web features manifest with {} features", data.len());
        Ok(data)
    }
}

/// Reads and parses a manifest from disk.
///
/// Gzip-compressed files are detected by their magic bytes and decompressed
/// on the fly; anything else is parsed as plain JSON.
pub fn read_manifest_file<P: AsRef<Path>>(ctx: &Context, path: P) -> Result<WebFeaturesData> {
    read_manifest_file_with(ctx, path, false)
}

/// Like [`read_manifest_file`], but with `force_gzip` the file is always
/// treated as gzip, so a plain file fails with a decompression error.
pub fn read_manifest_file_with<P: AsRef<Path>>(
    ctx: &Context,
    path: P,
    force_gzip: bool,
) -> Result<WebFeaturesData> {
    let path = path.as_ref();
    let mut reader = BufReader::new(
        File::open(path).with_context(|| format!("opening manifest {}", path.display()))?,
    );

    let gzip = force_gzip || {
        let mut magic = [0u8; GZIP_MAGIC_BYTES.len()];
        let read = peek(&mut reader, &mut magic)
            .with_context(|| format!("reading manifest {}", path.display()))?;
        is_gzip(&magic[..read])
    };

    debug!(
        "Reading {}manifest from {}",
        if gzip { "gzip " } else { "" },
        path.display()
    );

    let stream: ManifestStream = if gzip {
        GzipTransform.transform(Box::new(reader))?
    } else {
        Box::new(reader)
    };

    JsonManifestParser.parse(ctx, stream)
}

/// Copies the first buffered bytes into `buf` without consuming them.
fn peek<R: Read>(reader: &mut BufReader<R>, buf: &mut [u8]) -> std::io::Result<usize> {
    use std::io::BufRead;

    let available = reader.fill_buf()?;
    let n = available.len().min(buf.len());
    buf[..n].copy_from_slice(&available[..n]);
    Ok(n)
}
