//! Network messages - communication between the host and the network actor

use std::collections::HashMap;

use crate::definition::RequestDefinition;
use crate::models::{RequestSpec, ResponseResult};

/// Commands sent from the host to the network actor
#[derive(Debug, Clone)]
pub enum NetworkCommand {
    /// Execute an editor request: lowered, sent, then post-processed
    ExecuteRequest {
        id: u64,
        request: RequestDefinition,
    },
    /// Execute an already lowered request as-is
    ExecuteSpec {
        id: u64,
        spec: RequestSpec,
    },
    /// Cancel a pending request
    CancelRequest(u64),
    /// Forget all cookies of the shared session
    ClearCookies,
    /// Shutdown the network actor
    Shutdown,
}

/// Responses sent from the network actor back to the host
#[derive(Debug, Clone)]
pub enum NetworkResponse {
    /// Request finished; local failures have `status_code == 0`
    Completed {
        id: u64,
        response: ResponseResult,
        /// Variables pulled out by the request's extract rules
        extracted: HashMap<String, String>,
    },
    /// Request was cancelled before it finished
    Cancelled { id: u64 },
}

impl NetworkResponse {
    /// Get the request ID from the response
    pub fn id(&self) -> u64 {
        match self {
            NetworkResponse::Completed { id, .. } => *id,
            NetworkResponse::Cancelled { id } => *id,
        }
    }
}
