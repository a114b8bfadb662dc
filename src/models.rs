use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt::Write as _;
use std::path::PathBuf;

use crate::constants::{DEFAULT_TIMEOUT_SECS, EMPTY_BODY_DUMP};

/// HTTP method.
///
/// The well-known verbs are closed variants; anything else travels as
/// `Custom` carrying the caller's original token.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
    Custom(String),
}

/// Whether a method sends the built body on the wire.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BodyPolicy {
    /// Body is never sent, whatever the descriptor says.
    Omit,
    /// Built body is attached.
    Attach,
}

impl HttpMethod {
    /// Parse a method name case-insensitively.
    pub fn parse(s: &str) -> HttpMethod {
        let upper = s.trim().to_uppercase();
        match upper.as_str() {
            "GET" => HttpMethod::Get,
            "POST" => HttpMethod::Post,
            "PUT" => HttpMethod::Put,
            "PATCH" => HttpMethod::Patch,
            "DELETE" => HttpMethod::Delete,
            "HEAD" => HttpMethod::Head,
            "OPTIONS" => HttpMethod::Options,
            _ => HttpMethod::Custom(upper),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Head => "HEAD",
            HttpMethod::Options => "OPTIONS",
            HttpMethod::Custom(name) => name,
        }
    }

    /// GET and DELETE never carry a body; every other verb, including
    /// custom ones, carries whatever body was built.
    pub fn body_policy(&self) -> BodyPolicy {
        match self {
            HttpMethod::Get | HttpMethod::Delete => BodyPolicy::Omit,
            HttpMethod::Post
            | HttpMethod::Put
            | HttpMethod::Patch
            | HttpMethod::Head
            | HttpMethod::Options
            | HttpMethod::Custom(_) => BodyPolicy::Attach,
        }
    }

    pub fn has_body(&self) -> bool {
        self.body_policy() == BodyPolicy::Attach
    }
}

impl From<&str> for HttpMethod {
    fn from(s: &str) -> Self {
        HttpMethod::parse(s)
    }
}

/// HTTP header as entered by the user. Duplicates are allowed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderParam {
    pub name: String,
    pub value: String,
}

impl HeaderParam {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        HeaderParam {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Case-insensitive name comparison.
    pub fn is(&self, name: &str) -> bool {
        self.name.trim().eq_ignore_ascii_case(name)
    }
}

/// True if any header in `headers` is named `name` (case-insensitive).
pub fn has_header(headers: &[HeaderParam], name: &str) -> bool {
    headers.iter().any(|h| h.is(name))
}

/// Content of a single multipart part
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PartKind {
    Text { value: String },
    File { path: PathBuf },
}

/// A named part of a multipart/form-data body
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultipartPart {
    pub name: String,
    pub kind: PartKind,
}

impl MultipartPart {
    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        MultipartPart {
            name: name.into(),
            kind: PartKind::Text {
                value: value.into(),
            },
        }
    }

    pub fn file(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        MultipartPart {
            name: name.into(),
            kind: PartKind::File { path: path.into() },
        }
    }
}

/// How the request payload is represented.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BodyDescriptor {
    #[default]
    NoBody,
    Raw {
        content: Vec<u8>,
        declared_content_type: Option<String>,
    },
    Multipart {
        parts: Vec<MultipartPart>,
    },
}

impl BodyDescriptor {
    /// Raw body without a declared content type.
    pub fn raw(content: impl Into<Vec<u8>>) -> Self {
        BodyDescriptor::Raw {
            content: content.into(),
            declared_content_type: None,
        }
    }

    pub fn multipart(parts: Vec<MultipartPart>) -> Self {
        BodyDescriptor::Multipart { parts }
    }
}

/// A fully substituted request, ready for the engine.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestSpec {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<HeaderParam>,
    pub body: BodyDescriptor,
    /// Zero or negative means "use the default".
    pub timeout_seconds: i64,
}

impl RequestSpec {
    pub fn new(method: impl Into<HttpMethod>, url: impl Into<String>) -> Self {
        RequestSpec {
            method: method.into(),
            url: url.into(),
            headers: Vec::new(),
            body: BodyDescriptor::NoBody,
            timeout_seconds: DEFAULT_TIMEOUT_SECS as i64,
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push(HeaderParam::new(name, value));
        self
    }

    pub fn body(mut self, body: BodyDescriptor) -> Self {
        self.body = body;
        self
    }

    pub fn timeout(mut self, seconds: i64) -> Self {
        self.timeout_seconds = seconds;
        self
    }

    /// Timeout in seconds after normalization.
    pub fn effective_timeout_secs(&self, default_secs: u64) -> u64 {
        if self.timeout_seconds <= 0 {
            default_secs
        } else {
            self.timeout_seconds as u64
        }
    }
}

/// Outcome of one execution. `status_code == 0` means no remote status was
/// obtained; any other value came from a server.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResponseResult {
    pub status_code: u16,
    pub text_body: String,
    pub raw_body: Vec<u8>,
    pub headers: HashMap<String, Vec<String>>,
    pub duration_ms: u64,
}

impl ResponseResult {
    /// Local failure shaped as a result: no status, no body bytes, no headers.
    pub fn failure(message: impl Into<String>, duration_ms: u64) -> Self {
        ResponseResult {
            status_code: 0,
            text_body: message.into(),
            raw_body: Vec::new(),
            headers: HashMap::new(),
            duration_ms,
        }
    }

    /// True when no remote status was obtained.
    pub fn is_local_failure(&self) -> bool {
        self.status_code == 0
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }

    /// All values of a header, looked up case-insensitively.
    pub fn header_values(&self, name: &str) -> Vec<&str> {
        self.headers
            .iter()
            .filter(|(k, _)| k.eq_ignore_ascii_case(name))
            .flat_map(|(_, v)| v.iter().map(String::as_str))
            .collect()
    }

    /// `name: v1,v2` lines, sorted by name.
    pub fn headers_string(&self) -> String {
        let mut names: Vec<&String> = self.headers.keys().collect();
        names.sort();
        let mut out = String::new();
        for name in names {
            let _ = writeln!(out, "{}: {}", name, self.headers[name].join(","));
        }
        out
    }

    /// Offset / hex / ASCII rendering of the raw body, 16 bytes per line.
    pub fn hex_dump(&self) -> String {
        if self.raw_body.is_empty() {
            return EMPTY_BODY_DUMP.to_string();
        }
        let mut out = String::new();
        for (line, chunk) in self.raw_body.chunks(16).enumerate() {
            let _ = write!(out, "{:08X}  ", line * 16);
            for j in 0..16 {
                match chunk.get(j) {
                    Some(b) => {
                        let _ = write!(out, "{:02X} ", b);
                    }
                    None => out.push_str("   "),
                }
                if j == 7 {
                    out.push(' ');
                }
            }
            out.push_str(" |");
            for &b in chunk {
                out.push(if b.is_ascii_graphic() || b == b' ' {
                    b as char
                } else {
                    '.'
                });
            }
            out.push_str("|\n");
        }
        out
    }
}

/// Authentication type
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum AuthType {
    #[default]
    None,
    Bearer(String),
    Basic {
        username: String,
        password: String,
    },
    ApiKey {
        key: String,
        value: String,
        location: ApiKeyLocation,
    },
}

/// Where an API key is sent
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ApiKeyLocation {
    #[default]
    Header,
    Query,
}

/// Body kind selected in the request editor
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum BodyType {
    #[default]
    None,
    Json,
    Xml,
    Text,
    FormUrlEncoded(Vec<QueryParam>),
    Multipart,
}

/// Name/value pair used for query strings and url-encoded forms
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryParam {
    pub name: String,
    pub value: String,
}

impl QueryParam {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        QueryParam {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Rule copying a value out of a JSON response into a variable
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractRule {
    /// Variable to store into, e.g. `access_token`
    pub variable: String,
    /// Dotted JSON path, e.g. `data.token` or `data.list[0].id`
    pub path: String,
}

impl ExtractRule {
    pub fn new(variable: impl Into<String>, path: impl Into<String>) -> Self {
        ExtractRule {
            variable: variable.into(),
            path: path.into(),
        }
    }
}
