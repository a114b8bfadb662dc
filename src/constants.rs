//! Engine constants
//!
//! Centralized location for magic strings and configuration defaults.

/// Per-request deadline used when a request asks for zero or less
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Connect timeout, independent of the per-request deadline
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 15;

/// Redirect hops followed before giving up
pub const DEFAULT_MAX_REDIRECTS: usize = 10;

/// Content type injected for raw bodies without one
pub const DEFAULT_CONTENT_TYPE: &str = "application/json";

/// Fallback content type for file parts
pub const OCTET_STREAM: &str = "application/octet-stream";

pub const CONTENT_TYPE: &str = "Content-Type";

/// Prefix for results of requests that could not be built
pub const BUILD_ERROR_PREFIX: &str = "Build Error: ";

/// Prefix for results of requests that failed in flight
pub const ERROR_PREFIX: &str = "Error: ";

pub const CANCELLED_MESSAGE: &str = "Request Cancelled";

pub const EMPTY_BODY_DUMP: &str = "Empty Body";

/// Directory under $HOME holding Freeman files
pub const CONFIG_DIR_NAME: &str = ".freeman";

pub const ENGINE_CONFIG_FILE: &str = "engine.yaml";

pub const APP_NAME: &str = "Freeman Engine";

pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default User-Agent header value
pub const DEFAULT_USER_AGENT: &str = concat!("freeman-engine/", env!("CARGO_PKG_VERSION"));
