use crate::error::GpaError;
use base64::Engine as _;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::time::Duration;

/// Where the uploaded workbook comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum FileSource {
    Inline {
        content_base64: String,
        mime_type: Option<String>,
    },
    Url(String),
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceInfo {
    pub bytes: usize,
    pub sha256: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
}

#[derive(Debug, Clone, Copy)]
pub struct FetchLimits {
    pub timeout: Duration,
    pub max_bytes: usize,
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

pub fn load_bytes(source: &FileSource, limits: FetchLimits) -> Result<(Vec<u8>, SourceInfo), GpaError> {
    let (bytes, mime_type) = match source {
        FileSource::Inline {
            content_base64,
            mime_type,
        } => (decode_inline(content_base64)?, mime_type.clone()),
        FileSource::Url(url) => fetch_url(url, limits)?,
    };
    if bytes.len() > limits.max_bytes {
        return Err(GpaError::InvalidContent(format!(
            "file is {} bytes, limit is {}",
            bytes.len(),
            limits.max_bytes
        )));
    }
    let info = SourceInfo {
        bytes: bytes.len(),
        sha256: sha256_hex(&bytes),
        mime_type,
    };
    Ok((bytes, info))
}

/// Accepts bare base64 or a `data:<mime>;base64,` URL.
fn decode_inline(content: &str) -> Result<Vec<u8>, GpaError> {
    let payload = match content.split_once(";base64,") {
        Some((prefix, rest)) if prefix.starts_with("data:") => rest,
        _ => content,
    };
    let compact: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
    base64::engine::general_purpose::STANDARD
        .decode(compact.as_bytes())
        .map_err(|e| GpaError::InvalidContent(format!("file content is not base64: {e}")))
}

fn fetch_url(url: &str, limits: FetchLimits) -> Result<(Vec<u8>, Option<String>), GpaError> {
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(GpaError::bad_params("fileUrl must be an http(s) URL"));
    }
    let client = reqwest::blocking::Client::builder()
        .timeout(limits.timeout)
        .no_proxy()
        .build()
        .map_err(|e| GpaError::internal("preparing the download", e))?;

    tracing::debug!(url, "fetching workbook");
    let resp = client
        .get(url)
        .send()
        .map_err(|e| GpaError::Fetch(e.to_string()))?;
    let status = resp.status();
    if !status.is_success() {
        let reason = status.canonical_reason().unwrap_or("");
        return Err(GpaError::Fetch(format!("{} {}", status.as_u16(), reason).trim().to_string()));
    }
    let mime_type = resp
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_string());
    let bytes = resp
        .bytes()
        .map_err(|e| GpaError::Fetch(e.to_string()))?;
    Ok((bytes.to_vec(), mime_type))
}
