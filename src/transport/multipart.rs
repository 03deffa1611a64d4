//! `multipart/form-data` body construction for single-file uploads.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Magic-byte signatures as `(offset, bytes)` runs that must all match.
const SIGNATURES: &[(&[(usize, &[u8])], &str)] = &[
    (&[(0, b"\x89PNG\r\n\x1a\n")], "image/png"),
    (&[(0, b"\xff\xd8\xff")], "image/jpeg"),
    (&[(0, b"GIF87a")], "image/gif"),
    (&[(0, b"GIF89a")], "image/gif"),
    (&[(0, b"RIFF"), (8, b"WEBP")], "image/webp"),
    (&[(0, b"RIFF"), (8, b"WAVE")], "audio/wav"),
    // Reserved words are zero and the DIB header size fits in one byte.
    (&[(0, b"BM"), (6, b"\x00\x00\x00\x00"), (15, b"\x00\x00\x00")], "image/bmp"),
    (&[(0, b"II*\x00")], "image/tiff"),
    (&[(0, b"MM\x00*")], "image/tiff"),
    (&[(0, b"%PDF-")], "application/pdf"),
    (&[(0, b"PK\x03\x04")], "application/zip"),
    (&[(0, b"\x1f\x8b")], "application/gzip"),
    // ISO base media files are told apart by their major brand.
    (&[(4, b"ftypqt  ")], "video/quicktime"),
    (&[(4, b"ftypisom")], "video/mp4"),
    (&[(4, b"ftypiso2")], "video/mp4"),
    (&[(4, b"ftypmp41")], "video/mp4"),
    (&[(4, b"ftypmp42")], "video/mp4"),
    (&[(4, b"ftypavc1")], "video/mp4"),
    (&[(4, b"ftypM4V ")], "video/mp4"),
    (&[(4, b"ftypM4A ")], "audio/mp4"),
    (&[(4, b"ftypheic")], "image/heic"),
    (&[(4, b"ftypheix")], "image/heic"),
    (&[(4, b"ftypmif1")], "image/heif"),
    (&[(4, b"ftypavif")], "image/avif"),
    (&[(0, b"ID3")], "audio/mpeg"),
    (&[(0, b"OggS")], "audio/ogg"),
];

/// Detects a file's MIME type from its leading bytes.
///
/// The file name is never consulted.
#[must_use]
pub fn sniff_content_type(bytes: &[u8]) -> Option<&'static str> {
    SIGNATURES
        .iter()
        .find(|(runs, _)| {
            runs.iter()
                .all(|(offset, magic)| bytes.get(*offset..offset + magic.len()) == Some(*magic))
        })
        .map(|(_, mime)| *mime)
}

/// An encoded multipart body plus the boundary that delimits it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultipartBody {
    boundary: String,
    bytes: Vec<u8>,
}

impl MultipartBody {
    /// Encodes at most one file part named `field_name`.
    ///
    /// The part is omitted, leaving an empty body, when `file` is `None`
    /// or its content type cannot be sniffed.
    #[must_use]
    pub fn encode(file: Option<&[u8]>, field_name: &str) -> Self {
        Self::encode_with_boundary(file, field_name, next_boundary())
    }

    fn encode_with_boundary(file: Option<&[u8]>, field_name: &str, boundary: String) -> Self {
        let Some((data, mime)) = file.and_then(|data| sniff_content_type(data).map(|m| (data, m)))
        else {
            if file.is_some() {
                tracing::debug!("Upload part '{field_name}' dropped: unrecognised content type");
            }
            return Self {
                boundary,
                bytes: Vec::new(),
            };
        };

        let name = escape_quoted(field_name);
        let mut bytes = Vec::with_capacity(data.len() + 256);
        bytes.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
        bytes.extend_from_slice(
            format!("Content-Disposition: form-data; name=\"{name}\"; filename=\"{name}\"\r\n")
                .as_bytes(),
        );
        bytes.extend_from_slice(format!("Content-Type: {mime}\r\n\r\n").as_bytes());
        bytes.extend_from_slice(data);
        bytes.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

        Self { boundary, bytes }
    }

    /// The boundary string.
    #[must_use]
    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    /// Value for the `content-type` header.
    #[must_use]
    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }

    /// Returns true if no part was written.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Consumes the body, returning its bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

fn escape_quoted(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace(['\r', '\n'], " ")
}

fn next_boundary() -> String {
    static COUNTER: AtomicU64 = AtomicU64::new(0);
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.subsec_nanos());
    format!(
        "netlayer.boundary.{:08x}{:08x}.{}",
        std::process::id(),
        nanos,
        COUNTER.fetch_add(1, Ordering::Relaxed)
    )
}

#[cfg(test)]
#[path = "multipart_tests.rs"]
mod tests;
