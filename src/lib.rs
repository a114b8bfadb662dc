//! # Freeman Engine
//!
//! HTTP request execution engine behind the Freeman API client.
//!
//! ## Features
//! - Any HTTP method, including custom verbs
//! - Raw and multipart/form-data bodies
//! - Shared connection pool and accept-all cookie session
//! - Per-request deadlines and cancellation
//! - Failures returned as data: `status_code == 0` plus a message
//! - Auth, query params and body types for editor requests
//! - cURL import/export and JSON variable extraction
//!
//! ## Architecture
//! - `RequestSpec` → `build_request` → `TransportClient::send`, driven by
//!   `Executor`, which always yields a `ResponseResult`
//! - `NetworkActor` wraps the executor behind channels for UI hosts
//!
//! Certificate checks are disabled by default (`EngineConfig::insecure_tls`)
//! because the engine targets local and self-signed development servers.

pub mod config;
pub mod constants;
pub mod curl;
pub mod definition;
pub mod error;
pub mod extract;
pub mod logging;
pub mod messages;
pub mod models;
pub mod network;
pub mod postprocess;

// Re-export commonly used types
pub use config::EngineConfig;
pub use curl::{parse_curl, to_curl};
pub use definition::RequestDefinition;
pub use error::{BuildError, TransportError};
pub use messages::{NetworkCommand, NetworkResponse};
pub use models::{
    ApiKeyLocation, AuthType, BodyDescriptor, BodyType, ExtractRule, HeaderParam, HttpMethod,
    MultipartPart, PartKind, QueryParam, RequestSpec, ResponseResult,
};
pub use network::{
    CookieJar, Executor, NetworkActor, ResponseHandle, TransportClient, TransportConfig,
};
