//! Error types for building and sending requests.
//!
//! Nothing here escapes the executor: every variant is turned into a
//! status-0 `ResponseResult` with the error's message in the body.

use std::io;

/// Failure before anything is sent.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    /// URL could not be parsed after normalization.
    #[error("invalid url '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    /// Method token is not a valid HTTP method.
    #[error("invalid method '{0}'")]
    InvalidMethod(String),

    /// A multipart file could not be read.
    #[error("multipart encoding failed: {0}")]
    Multipart(#[from] io::Error),
}

/// Failure while the request is on the wire.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// DNS, refused connection or TLS handshake failure.
    #[error("connection failed: {0}")]
    Connect(String),

    /// Deadline expired before the response completed.
    #[error("request timed out after {0}s")]
    Timeout(u64),

    /// Redirect loop or too many hops.
    #[error("redirect failed: {0}")]
    Redirect(String),

    /// Response body could not be read.
    #[error("error reading body: {0}")]
    Body(String),

    /// Anything else reported by the HTTP stack.
    #[error("request failed: {0}")]
    Request(String),
}

impl TransportError {
    /// Classify a reqwest error, keeping the innermost cause in the message.
    pub fn from_reqwest(err: reqwest::Error, timeout_secs: u64) -> Self {
        let detail = root_cause(&err);
        if err.is_timeout() {
            TransportError::Timeout(timeout_secs)
        } else if err.is_connect() {
            TransportError::Connect(detail)
        } else if err.is_redirect() {
            TransportError::Redirect(detail)
        } else if err.is_body() || err.is_decode() {
            TransportError::Body(detail)
        } else {
            TransportError::Request(detail)
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, TransportError::Timeout(_))
    }
}

/// Display of the error followed by its innermost source, if different.
fn root_cause(err: &(dyn std::error::Error + 'static)) -> String {
    let mut inner = err;
    while let Some(source) = inner.source() {
        inner = source;
    }
    let top = err.to_string();
    let bottom = inner.to_string();
    if top == bottom {
        top
    } else {
        format!("{}: {}", top, bottom)
    }
}
