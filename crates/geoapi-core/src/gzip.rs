//! Gzip encoding of response bodies.

use std::io::Write;

use bytes::Bytes;
use flate2::write::GzEncoder;
use flate2::Compression;
use tracing::warn;

use crate::headers::{get_header, remove_header, Headers, CONTENT_ENCODING};
use crate::response::Content;

/// Compress `content` when the headers ask for `Content-Encoding: gzip`.
///
/// Without that header the content is returned untouched. Text and JSON are
/// encoded as UTF-8 first. If compression fails the header is removed and
/// the original content is returned.
pub fn apply_gzip(headers: &mut Headers, content: Content) -> Content {
    if get_header(headers, CONTENT_ENCODING) != Some("gzip") {
        return content;
    }

    let original = content.clone().into_bytes();
    match compress(&original) {
        Ok(compressed) => Content::Bytes(compressed),
        Err(e) => {
            warn!(error = %e, "Failed to gzip response, sending it uncompressed");
            remove_header(headers, CONTENT_ENCODING);
            content
        }
    }
}

fn compress(data: &[u8]) -> std::io::Result<Bytes> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    Ok(Bytes::from(encoder.finish()?))
}
