//! multipart/form-data encoder
//!
//! Files are read fully into memory before encoding. That keeps the encoder
//! simple and is fine for the few-megabyte payloads a developer sends while
//! testing an endpoint; it is not meant for large uploads.

use std::fs;
use std::path::Path;

use uuid::Uuid;

use crate::constants::OCTET_STREAM;
use crate::models::{MultipartPart, PartKind};

/// Encoded multipart body and the boundary that frames it
#[derive(Clone, Debug)]
pub struct MultipartPayload {
    pub bytes: Vec<u8>,
    pub boundary: String,
}

impl MultipartPayload {
    /// Value for the request's Content-Type header
    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }
}

/// Encode `parts` in order under a freshly generated boundary.
///
/// Any unreadable file fails the whole encode.
pub fn encode(parts: &[MultipartPart]) -> std::io::Result<MultipartPayload> {
    let boundary = new_boundary();
    let mut bytes = Vec::new();

    for part in parts {
        bytes.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());

        match &part.kind {
            PartKind::Text { value } => {
                bytes.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"\r\n\r\n",
                        part.name
                    )
                    .as_bytes(),
                );
                bytes.extend_from_slice(value.as_bytes());
            }
            PartKind::File { path } => {
                // read before writing the header so a failure leaves nothing half-built
                let content = fs::read(path)?;
                bytes.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n\
                         Content-Type: {}\r\n\r\n",
                        part.name,
                        file_name(path),
                        probe_content_type(path)
                    )
                    .as_bytes(),
                );
                bytes.extend_from_slice(&content);
            }
        }

        bytes.extend_from_slice(b"\r\n");
    }

    bytes.extend_from_slice(format!("--{}--\r\n", boundary).as_bytes());

    tracing::debug!(parts = parts.len(), size = bytes.len(), %boundary, "Encoded multipart body");
    Ok(MultipartPayload { bytes, boundary })
}

/// 128 random bits, hex encoded
fn new_boundary() -> String {
    Uuid::new_v4().simple().to_string()
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Guess a content type from the file extension.
pub fn probe_content_type(path: &Path) -> &'static str {
    let ext = match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => ext.to_ascii_lowercase(),
        None => return OCTET_STREAM,
    };

    match ext.as_str() {
        "txt" | "log" => "text/plain",
        "csv" => "text/csv",
        "html" | "htm" => "text/html",
        "css" => "text/css",
        "js" | "mjs" => "text/javascript",
        "md" => "text/markdown",
        "json" => "application/json",
        "xml" => "application/xml",
        "yaml" | "yml" => "application/yaml",
        "pdf" => "application/pdf",
        "zip" => "application/zip",
        "gz" => "application/gzip",
        "tar" => "application/x-tar",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "ico" => "image/x-icon",
        "bmp" => "image/bmp",
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "mp4" => "video/mp4",
        "webm" => "video/webm",
        _ => OCTET_STREAM,
    }
}
