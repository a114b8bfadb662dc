//! Request definitions as the editor holds them, and their lowering to a
//! `RequestSpec`.
//!
//! Variables are expected to be substituted before this point; `{{...}}`
//! text is passed through untouched.

use base64::Engine;
use serde::{Deserialize, Serialize};
use url::{form_urlencoded, Url};

use crate::constants::{CONTENT_TYPE, DEFAULT_TIMEOUT_SECS};
use crate::models::{
    has_header, ApiKeyLocation, AuthType, BodyDescriptor, BodyType, ExtractRule, HeaderParam,
    HttpMethod, MultipartPart, QueryParam, RequestSpec,
};

/// A saved or live-scanned request
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestDefinition {
    pub name: String,
    pub method: HttpMethod,
    pub url: String,
    #[serde(default)]
    pub params: Vec<QueryParam>,
    #[serde(default)]
    pub headers: Vec<HeaderParam>,
    #[serde(default)]
    pub auth: AuthType,
    #[serde(default)]
    pub body_type: BodyType,
    #[serde(default)]
    pub body: String,
    /// Parts sent when `body_type` is `Multipart`
    #[serde(default)]
    pub multipart: Vec<MultipartPart>,
    #[serde(default)]
    pub extract_rules: Vec<ExtractRule>,
    #[serde(default = "default_timeout")]
    pub timeout_seconds: i64,
}

fn default_timeout() -> i64 {
    DEFAULT_TIMEOUT_SECS as i64
}

impl Default for RequestDefinition {
    fn default() -> Self {
        RequestDefinition {
            name: String::from("New Request"),
            method: HttpMethod::Get,
            url: String::new(),
            params: Vec::new(),
            headers: Vec::new(),
            auth: AuthType::None,
            body_type: BodyType::None,
            body: String::new(),
            multipart: Vec::new(),
            extract_rules: Vec::new(),
            timeout_seconds: default_timeout(),
        }
    }
}

impl RequestDefinition {
    pub fn new(method: impl Into<HttpMethod>, url: impl Into<String>) -> Self {
        RequestDefinition {
            method: method.into(),
            url: url.into(),
            ..Default::default()
        }
    }

    /// Lower to an engine request: query string, auth headers and body
    /// content type are applied here.
    pub fn to_spec(&self) -> RequestSpec {
        let mut query: Vec<QueryParam> = self
            .params
            .iter()
            .filter(|p| !p.name.trim().is_empty())
            .cloned()
            .collect();
        let mut headers = self.headers.clone();

        match &self.auth {
            AuthType::Bearer(token) => {
                if !token.trim().is_empty() {
                    headers.push(HeaderParam::new("Authorization", format!("Bearer {}", token)));
                }
            }
            AuthType::Basic { username, password } => {
                if !username.trim().is_empty() || !password.trim().is_empty() {
                    let credentials = format!("{}:{}", username, password);
                    let encoded = base64::engine::general_purpose::STANDARD.encode(credentials);
                    headers.push(HeaderParam::new("Authorization", format!("Basic {}", encoded)));
                }
            }
            AuthType::ApiKey {
                key,
                value,
                location,
            } => {
                if !key.trim().is_empty() {
                    match location {
                        ApiKeyLocation::Header => headers.push(HeaderParam::new(key, value)),
                        ApiKeyLocation::Query => query.push(QueryParam::new(key, value)),
                    }
                }
            }
            AuthType::None => {}
        }

        let body = match &self.body_type {
            BodyType::None => BodyDescriptor::NoBody,
            BodyType::Multipart if !self.multipart.is_empty() => {
                BodyDescriptor::multipart(self.multipart.clone())
            }
            BodyType::Multipart => BodyDescriptor::NoBody,
            BodyType::FormUrlEncoded(fields) => {
                let encoded = encode_pairs(
                    fields
                        .iter()
                        .filter(|f| !f.name.trim().is_empty())
                        .map(|f| (f.name.as_str(), f.value.as_str())),
                );
                raw_with_type(encoded, "application/x-www-form-urlencoded")
            }
            BodyType::Json => raw_with_type(self.body.clone(), "application/json"),
            BodyType::Xml => raw_with_type(self.body.clone(), "application/xml"),
            BodyType::Text => raw_with_type(self.body.clone(), "text/plain"),
        };

        // the editor's choice only counts when the user did not set one
        if let BodyDescriptor::Raw {
            declared_content_type: Some(declared),
            ..
        } = &body
        {
            if !has_header(&headers, CONTENT_TYPE) {
                headers.push(HeaderParam::new(CONTENT_TYPE, declared.clone()));
            }
        }

        RequestSpec {
            method: self.method.clone(),
            url: append_query(&self.url, &query),
            headers,
            body,
            timeout_seconds: self.timeout_seconds,
        }
    }
}

fn raw_with_type(content: String, content_type: &str) -> BodyDescriptor {
    BodyDescriptor::Raw {
        content: content.into_bytes(),
        declared_content_type: Some(content_type.to_string()),
    }
}

/// Append `query` to `url`. Absolute http(s) URLs go through `Url` so an
/// existing query string is extended; anything else (placeholders, missing
/// scheme) gets the encoded pairs spliced on.
fn append_query(url: &str, query: &[QueryParam]) -> String {
    if query.is_empty() {
        return url.to_string();
    }
    let pairs = query.iter().map(|p| (p.name.as_str(), p.value.as_str()));

    match Url::parse(url) {
        Ok(mut parsed) if matches!(parsed.scheme(), "http" | "https") => {
            parsed.query_pairs_mut().extend_pairs(pairs);
            parsed.into()
        }
        _ => {
            let separator = if url.contains('?') { '&' } else { '?' };
            format!("{}{}{}", url, separator, encode_pairs(pairs))
        }
    }
}

/// application/x-www-form-urlencoded `name=value&...`
fn encode_pairs<'a>(pairs: impl Iterator<Item = (&'a str, &'a str)>) -> String {
    form_urlencoded::Serializer::new(String::new())
        .extend_pairs(pairs)
        .finish()
}
