//! Request builder - turns a `RequestSpec` into a wire-ready request
//!
//! Building is permissive: headers that fail validation are skipped and
//! logged rather than failing the request. Only an unusable URL, an invalid
//! method token or an unreadable multipart file abort the build.

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::{Method, Url};

use crate::constants::{CONTENT_TYPE as CONTENT_TYPE_NAME, DEFAULT_CONTENT_TYPE};
use crate::error::BuildError;
use crate::models::{has_header, BodyDescriptor, BodyPolicy, RequestSpec};
use crate::network::multipart;

/// Normalized request, ready for the transport
#[derive(Clone, Debug)]
pub struct WireRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    /// `None` when the method carries no body or there is nothing to send
    pub body: Option<Vec<u8>>,
}

impl WireRequest {
    /// All values of a header as strings; invalid UTF-8 values are skipped.
    pub fn header_values(&self, name: &str) -> Vec<&str> {
        self.headers
            .get_all(name)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .collect()
    }

    pub fn content_type(&self) -> Option<&str> {
        self.headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok())
    }
}

/// Prefix `http://` when no http(s) scheme is given and escape spaces.
pub fn normalize_url(raw: &str) -> Result<Url, BuildError> {
    let trimmed = raw.trim();
    let lower = trimmed.to_ascii_lowercase();
    let with_scheme = if lower.starts_with("http://") || lower.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("http://{}", trimmed)
    };
    let escaped = with_scheme.replace(' ', "%20");

    Url::parse(&escaped).map_err(|e| BuildError::InvalidUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })
}

/// Build the wire request for `spec`.
pub fn build_request(spec: &RequestSpec) -> Result<WireRequest, BuildError> {
    let url = normalize_url(&spec.url)?;

    let method = Method::from_bytes(spec.method.as_str().as_bytes())
        .map_err(|_| BuildError::InvalidMethod(spec.method.as_str().to_string()))?;

    // Body first: multipart decides whether caller Content-Type headers survive
    let mut forced_content_type: Option<String> = None;
    let mut default_content_type: Option<String> = None;
    let body = match &spec.body {
        BodyDescriptor::Multipart { parts } if !parts.is_empty() => {
            let payload = multipart::encode(parts)?;
            forced_content_type = Some(payload.content_type());
            Some(payload.bytes)
        }
        BodyDescriptor::Raw {
            content,
            declared_content_type,
        } if !content.is_empty() => {
            if !has_header(&spec.headers, CONTENT_TYPE_NAME) {
                default_content_type = Some(
                    declared_content_type
                        .clone()
                        .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string()),
                );
            }
            Some(content.clone())
        }
        BodyDescriptor::Multipart { .. } | BodyDescriptor::Raw { .. } | BodyDescriptor::NoBody => {
            None
        }
    };

    let mut headers = HeaderMap::new();
    for header in &spec.headers {
        let name = header.name.trim();
        if name.is_empty() {
            continue;
        }
        if forced_content_type.is_some() && header.is(CONTENT_TYPE_NAME) {
            tracing::debug!(value = %header.value, "Dropping caller Content-Type for multipart body");
            continue;
        }
        let Ok(header_name) = HeaderName::from_bytes(name.as_bytes()) else {
            tracing::debug!(name, "Skipping header with invalid name");
            continue;
        };
        let Ok(header_value) = HeaderValue::from_str(&header.value) else {
            tracing::debug!(name, "Skipping header with invalid value");
            continue;
        };
        headers.append(header_name, header_value);
    }

    if let Some(content_type) = forced_content_type.or(default_content_type) {
        match HeaderValue::from_str(&content_type) {
            Ok(value) => {
                headers.insert(CONTENT_TYPE, value);
            }
            Err(_) => tracing::debug!(%content_type, "Skipping invalid Content-Type"),
        }
    }

    let body = match spec.method.body_policy() {
        BodyPolicy::Omit => None,
        BodyPolicy::Attach => body,
    };

    Ok(WireRequest {
        method,
        url,
        headers,
        body,
    })
}
