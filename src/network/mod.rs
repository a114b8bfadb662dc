//! Network layer - request building, transport and execution
//!
//! Leaf-first: `multipart` and `cookies` have no dependencies on the rest,
//! `builder` turns specs into wire requests, `transport` sends them,
//! `executor` folds outcomes into results and `actor` serves a host UI.

pub mod actor;
pub mod builder;
pub mod cookies;
pub mod executor;
pub mod multipart;
pub mod transport;

pub use actor::NetworkActor;
pub use builder::{build_request, WireRequest};
pub use cookies::CookieJar;
pub use executor::{Executor, ResponseHandle};
pub use multipart::MultipartPayload;
pub use transport::{RawResponse, TransportClient, TransportConfig};
