//! Shared cookie jar with an accept-all policy
//!
//! The jar is handed to reqwest as its cookie provider, so every completed
//! response stores its `Set-Cookie` headers and every outgoing request picks
//! up matching cookies. Cookies are accepted from any domain, third-party
//! responses included, to behave like a single permissive browser session.

use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, TimeDelta, Utc};
use cookie::Cookie;
use reqwest::cookie::CookieStore;
use reqwest::header::HeaderValue;
use reqwest::Url;

/// A cookie as held by the jar
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoredCookie {
    pub name: String,
    pub value: String,
    /// Lowercase, without a leading dot
    pub domain: String,
    /// Set when no Domain attribute was given: only the exact host matches
    pub host_only: bool,
    pub path: String,
    pub secure: bool,
    pub expires: Option<DateTime<Utc>>,
}

impl StoredCookie {
    /// Parse one `Set-Cookie` header value received from `url`.
    ///
    /// Expires is accepted in every date form browsers take (RFC 1123,
    /// RFC 850 and asctime); Max-Age wins when both are present.
    pub fn parse(header: &str, url: &Url) -> Option<StoredCookie> {
        let parsed = Cookie::parse(header).ok()?;
        let host = url.host_str()?.to_ascii_lowercase();

        let (domain, host_only) = match parsed.domain().map(|d| d.trim_start_matches('.')) {
            Some(domain) if !domain.is_empty() => (domain.to_ascii_lowercase(), false),
            _ => (host, true),
        };
        let path = match parsed.path() {
            Some(path) if path.starts_with('/') => path.to_string(),
            _ => default_path(url.path()),
        };

        let expires = match parsed.max_age() {
            Some(max_age) if max_age.whole_seconds() <= 0 => Some(DateTime::<Utc>::MIN_UTC),
            Some(max_age) => TimeDelta::try_seconds(max_age.whole_seconds())
                .and_then(|d| Utc::now().checked_add_signed(d)),
            None => parsed
                .expires_datetime()
                .and_then(|at| DateTime::from_timestamp(at.unix_timestamp(), 0)),
        };

        Some(StoredCookie {
            name: parsed.name().to_string(),
            value: parsed.value().trim_matches('"').to_string(),
            domain,
            host_only,
            path,
            secure: parsed.secure().unwrap_or(false),
            expires,
        })
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires.is_some_and(|at| at <= now)
    }

    fn same_slot(&self, other: &StoredCookie) -> bool {
        self.name == other.name && self.domain == other.domain && self.path == other.path
    }

    /// Whether this cookie should be replayed on a request to `url`.
    pub fn matches(&self, url: &Url) -> bool {
        let host = match url.host_str() {
            Some(h) => h.to_ascii_lowercase(),
            None => return false,
        };
        let domain_ok = host == self.domain
            || (!self.host_only && host.ends_with(&format!(".{}", self.domain)));
        if !domain_ok {
            return false;
        }
        if self.secure && url.scheme() != "https" {
            return false;
        }
        path_matches(url.path(), &self.path)
    }
}

/// Directory of the request path, per RFC 6265 section 5.1.4
fn default_path(path: &str) -> String {
    if !path.starts_with('/') {
        return "/".to_string();
    }
    match path.rfind('/') {
        Some(0) | None => "/".to_string(),
        Some(idx) => path[..idx].to_string(),
    }
}

fn path_matches(request_path: &str, cookie_path: &str) -> bool {
    if request_path == cookie_path {
        return true;
    }
    request_path.starts_with(cookie_path)
        && (cookie_path.ends_with('/')
            || request_path[cookie_path.len()..].starts_with('/'))
}

/// Process-wide cookie store shared by all in-flight requests
#[derive(Debug, Default)]
pub struct CookieJar {
    cookies: RwLock<Vec<StoredCookie>>,
}

impl CookieJar {
    pub fn new() -> Self {
        CookieJar::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, Vec<StoredCookie>> {
        self.cookies.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<StoredCookie>> {
        self.cookies.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Store the `Set-Cookie` values of a response received from `url`.
    pub fn store<'a>(&self, set_cookies: impl IntoIterator<Item = &'a str>, url: &Url) {
        let now = Utc::now();
        let mut cookies = self.write();
        for header in set_cookies {
            let Some(cookie) = StoredCookie::parse(header, url) else {
                tracing::debug!(%url, header, "Ignoring malformed Set-Cookie");
                continue;
            };
            cookies.retain(|c| !c.same_slot(&cookie));
            if !cookie.is_expired(now) {
                tracing::debug!(%url, name = %cookie.name, domain = %cookie.domain, "Stored cookie");
                cookies.push(cookie);
            }
        }
        cookies.retain(|c| !c.is_expired(now));
    }

    /// `Cookie` header value for a request to `url`, if any cookie matches.
    pub fn attach(&self, url: &Url) -> Option<String> {
        let now = Utc::now();
        let cookies = self.read();
        let pairs: Vec<String> = cookies
            .iter()
            .filter(|c| !c.is_expired(now) && c.matches(url))
            .map(|c| format!("{}={}", c.name, c.value))
            .collect();
        if pairs.is_empty() {
            None
        } else {
            Some(pairs.join("; "))
        }
    }

    /// Drop every stored cookie. Requests that already attached their
    /// cookies are unaffected.
    pub fn clear(&self) {
        let mut cookies = self.write();
        tracing::debug!(count = cookies.len(), "Clearing cookie jar");
        cookies.clear();
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Copy of the current contents
    pub fn snapshot(&self) -> Vec<StoredCookie> {
        self.read().clone()
    }
}

impl CookieStore for CookieJar {
    fn set_cookies(&self, cookie_headers: &mut dyn Iterator<Item = &HeaderValue>, url: &Url) {
        let values: Vec<&str> = cookie_headers.filter_map(|v| v.to_str().ok()).collect();
        self.store(values, url);
    }

    fn cookies(&self, url: &Url) -> Option<HeaderValue> {
        self.attach(url)
            .and_then(|value| HeaderValue::from_str(&value).ok())
    }
}
