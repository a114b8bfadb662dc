use crate::models::{BodyDescriptor, HttpMethod, MultipartPart, PartKind, RequestSpec};
use anyhow::{anyhow, Result};
use base64::Engine;
use regex::Regex;
use std::sync::OnceLock;

/// Parse a cURL command into a RequestSpec
pub fn parse_curl(input: &str) -> Result<RequestSpec> {
    let normalized = sanitize(input);
    let mut tokens = tokenize(&normalized)?;

    // Skip 'curl' command if present
    if tokens.first().map(|s| s.eq_ignore_ascii_case("curl")) == Some(true) {
        tokens.remove(0);
    }

    let mut method: Option<HttpMethod> = None;
    let mut url = String::new();
    let mut spec = RequestSpec::new(HttpMethod::Get, "");
    let mut raw_body: Option<String> = None;
    let mut parts: Vec<MultipartPart> = Vec::new();

    let mut i = 0;
    while i < tokens.len() {
        let token = &tokens[i];
        let next = tokens.get(i + 1);

        match (token.as_str(), next) {
            ("-X" | "--request", Some(value)) => {
                method = Some(HttpMethod::parse(value));
                i += 1;
            }
            ("-H" | "--header", Some(value)) => {
                let (name, value) = value
                    .split_once(':')
                    .ok_or_else(|| anyhow!("Invalid header format: {}", value))?;
                spec = spec.header(name.trim(), value.trim());
                i += 1;
            }
            ("-d" | "--data" | "--data-raw" | "--data-binary" | "--data-ascii", Some(value)) => {
                raw_body = Some(value.clone());
                i += 1;
            }
            ("-F" | "--form", Some(value)) => {
                parts.push(parse_form_part(value)?);
                i += 1;
            }
            ("-u" | "--user", Some(value)) => {
                let encoded = base64::engine::general_purpose::STANDARD.encode(value);
                spec = spec.header("Authorization", format!("Basic {}", encoded));
                i += 1;
            }
            ("--url", Some(value)) => {
                url = value.clone();
                i += 1;
            }
            ("-m" | "--max-time", Some(value)) => {
                if let Ok(secs) = value.parse::<f64>() {
                    spec.timeout_seconds = secs.ceil() as i64;
                }
                i += 1;
            }
            _ => {
                // First bare word is the URL
                if !token.starts_with('-') && url.is_empty() {
                    url = token.clone();
                }
            }
        }
        i += 1;
    }

    if url.is_empty() {
        return Err(anyhow!("No URL found in cURL command"));
    }
    spec.url = url.trim_matches(|c| c == '\'' || c == '"').to_string();

    let has_payload = raw_body.is_some() || !parts.is_empty();
    spec.body = if !parts.is_empty() {
        BodyDescriptor::multipart(parts)
    } else if let Some(body) = raw_body {
        BodyDescriptor::raw(body)
    } else {
        BodyDescriptor::NoBody
    };

    // Infer POST when data is given without a method
    spec.method = match method {
        Some(m) => m,
        None if has_payload => HttpMethod::Post,
        None => HttpMethod::Get,
    };

    Ok(spec)
}

/// Straighten smart quotes and turn each stray unicode space or control
/// character into a plain space. Plain spaces, tabs and line breaks are left
/// alone so quoted bodies keep their layout.
fn sanitize(input: &str) -> String {
    static ODD_WHITESPACE: OnceLock<Regex> = OnceLock::new();

    let odd_whitespace = ODD_WHITESPACE.get_or_init(|| {
        Regex::new(r"[[\p{Z}\p{C}]&&[^ \t\r\n]]").expect("static pattern is valid")
    });

    let joined = input.replace("\\\r\n", " ").replace("\\\n", " ");
    let quotes = joined
        .replace(['\u{201C}', '\u{201D}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'");
    odd_whitespace.replace_all(&quotes, " ").trim().to_string()
}

fn parse_form_part(s: &str) -> Result<MultipartPart> {
    let (name, value) = s
        .split_once('=')
        .ok_or_else(|| anyhow!("Invalid form field: {}", s))?;
    Ok(match value.strip_prefix('@') {
        Some(path) => MultipartPart::file(name, path),
        None => MultipartPart::text(name, value),
    })
}

/// Tokenize a curl command, respecting quotes
fn tokenize(input: &str) -> Result<Vec<String>> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_single_quote = false;
    let mut in_double_quote = false;
    let mut escape_next = false;

    for c in input.chars() {
        if escape_next {
            current.push(c);
            escape_next = false;
            continue;
        }

        match c {
            '\\' if !in_single_quote => {
                escape_next = true;
            }
            '\'' if !in_double_quote => {
                in_single_quote = !in_single_quote;
            }
            '"' if !in_single_quote => {
                in_double_quote = !in_double_quote;
            }
            ' ' | '\t' | '\r' | '\n' if !in_single_quote && !in_double_quote => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            _ => {
                current.push(c);
            }
        }
    }

    if in_single_quote || in_double_quote {
        return Err(anyhow!("Unterminated quote in cURL command"));
    }
    if !current.is_empty() {
        tokens.push(current);
    }

    Ok(tokens)
}

fn quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', "'\\''"))
}

/// Format a RequestSpec as cURL command
pub fn to_curl(spec: &RequestSpec) -> String {
    let mut parts = vec!["curl".to_string()];

    if spec.method != HttpMethod::Get {
        parts.push(format!("-X {}", spec.method.as_str()));
    }

    parts.push(quote(&spec.url));

    for header in &spec.headers {
        if !header.name.trim().is_empty() {
            parts.push(format!("-H {}", quote(&format!("{}: {}", header.name, header.value))));
        }
    }

    match &spec.body {
        BodyDescriptor::NoBody => {}
        BodyDescriptor::Raw { content, .. } => {
            if !content.is_empty() {
                parts.push(format!("-d {}", quote(&String::from_utf8_lossy(content))));
            }
        }
        BodyDescriptor::Multipart { parts: form } => {
            for part in form {
                let field = match &part.kind {
                    PartKind::Text { value } => format!("{}={}", part.name, value),
                    PartKind::File { path } => format!("{}=@{}", part.name, path.display()),
                };
                parts.push(format!("-F {}", quote(&field)));
            }
        }
    }

    parts.join(" \\\n  ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::HeaderParam;

    #[test]
    fn test_parse_simple_get() {
        let curl = "curl https://api.example.com/users";
        let spec = parse_curl(curl).unwrap();
        assert_eq!(spec.url, "https://api.example.com/users");
        assert_eq!(spec.method, HttpMethod::Get);
        assert_eq!(spec.body, BodyDescriptor::NoBody);
    }

    #[test]
    fn test_parse_post_with_data() {
        let curl = r#"curl -X POST -H "Content-Type: application/json" -d '{"name":"test"}' https://api.example.com/users"#;
        let spec = parse_curl(curl).unwrap();
        assert_eq!(spec.method, HttpMethod::Post);
        assert_eq!(spec.body, BodyDescriptor::raw(r#"{"name":"test"}"#));
        assert_eq!(
            spec.headers,
            vec![HeaderParam::new("Content-Type", "application/json")]
        );
    }

    #[test]
    fn test_data_implies_post() {
        let spec = parse_curl("curl --url http://x/y --data-raw 'a=1'").unwrap();
        assert_eq!(spec.method, HttpMethod::Post);
        assert_eq!(spec.url, "http://x/y");
    }

    #[test]
    fn test_smart_quotes_and_continuations() {
        let curl = "curl \\\n  -H \u{201C}X-A: 1\u{201D} \\\n  \u{2018}http://x/\u{2019}";
        let spec = parse_curl(curl).unwrap();
        assert_eq!(spec.url, "http://x/");
        assert_eq!(spec.headers, vec![HeaderParam::new("X-A", "1")]);
    }

    #[test]
    fn test_quoted_body_keeps_layout() {
        let curl = "curl\u{00A0}-X\u{2003}POST http://x/items -d '{\n  \"name\":  \"a\tb\"\n}'";
        let spec = parse_curl(curl).unwrap();
        assert_eq!(spec.method, HttpMethod::Post);
        assert_eq!(spec.url, "http://x/items");
        assert_eq!(
            spec.body,
            BodyDescriptor::raw("{\n  \"name\":  \"a\tb\"\n}")
        );
    }

    #[test]
    fn test_crlf_separates_tokens() {
        let spec = parse_curl("curl\r\n-H 'X-A: 1'\r\nhttp://x/").unwrap();
        assert_eq!(spec.url, "http://x/");
        assert_eq!(spec.headers, vec![HeaderParam::new("X-A", "1")]);
    }

    #[test]
    fn test_form_and_user() {
        let spec = parse_curl("curl -u user:pass -F 'a=1' -F 'f=@/tmp/x.png' http://x/up").unwrap();
        assert_eq!(spec.method, HttpMethod::Post);
        assert_eq!(
            spec.body,
            BodyDescriptor::multipart(vec![
                MultipartPart::text("a", "1"),
                MultipartPart::file("f", "/tmp/x.png"),
            ])
        );
        assert_eq!(
            spec.headers,
            vec![HeaderParam::new("Authorization", "Basic dXNlcjpwYXNz")]
        );
    }

    #[test]
    fn test_missing_url_errors() {
        assert!(parse_curl("curl -X GET").is_err());
        assert!(parse_curl("curl 'http://x").is_err());
    }

    #[test]
    fn test_to_curl_round_trip() {
        let spec = RequestSpec::new("PUT", "http://x/y")
            .header("X-A", "it's")
            .body(BodyDescriptor::raw(r#"{"a":1}"#));
        let curl = to_curl(&spec);
        assert_eq!(
            curl,
            "curl \\\n  -X PUT \\\n  'http://x/y' \\\n  -H 'X-A: it'\\''s' \\\n  -d '{\"a\":1}'"
        );

        let parsed = parse_curl(&curl).unwrap();
        assert_eq!(parsed.method, HttpMethod::Put);
        assert_eq!(parsed.headers, vec![HeaderParam::new("X-A", "it's")]);
        assert_eq!(parsed.body, spec.body);
    }
}
