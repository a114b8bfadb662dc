//! Shared HTTP transport
//!
//! One `TransportClient` is built per process (or per test) and shared by
//! reference between all requests: reqwest pools connections inside it and
//! the bound `CookieJar` gives every request the same browser-like session.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use reqwest::redirect::Policy;

use crate::config::EngineConfig;
use crate::error::TransportError;
use crate::network::builder::WireRequest;
use crate::network::cookies::CookieJar;

/// Construction settings for `TransportClient`
///
/// No `Default`: callers must spell out `insecure_tls`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransportConfig {
    /// Accept every certificate and skip host name checks. Only meant for
    /// local and self-signed development endpoints.
    pub insecure_tls: bool,
    pub connect_timeout: Duration,
    pub max_redirects: usize,
    pub user_agent: String,
}

impl From<&EngineConfig> for TransportConfig {
    fn from(config: &EngineConfig) -> Self {
        TransportConfig {
            insecure_tls: config.insecure_tls,
            connect_timeout: Duration::from_secs(config.connect_timeout_secs),
            max_redirects: config.max_redirects,
            user_agent: config.user_agent.clone(),
        }
    }
}

/// Response as read off the wire
#[derive(Clone, Debug)]
pub struct RawResponse {
    pub status: u16,
    pub headers: HashMap<String, Vec<String>>,
    pub body: Vec<u8>,
}

/// Long-lived HTTP sender with a shared cookie jar
pub struct TransportClient {
    client: reqwest::Client,
    cookies: Arc<CookieJar>,
    insecure_tls: bool,
}

impl TransportClient {
    /// Build a transport with its own empty cookie jar.
    pub fn new(config: &TransportConfig) -> Result<Self, TransportError> {
        Self::with_cookie_jar(config, Arc::new(CookieJar::new()))
    }

    /// Build a transport around an existing jar.
    pub fn with_cookie_jar(
        config: &TransportConfig,
        cookies: Arc<CookieJar>,
    ) -> Result<Self, TransportError> {
        if config.insecure_tls {
            tracing::warn!("TLS certificate and host name verification disabled");
        }

        // with rustls, accepting invalid certs also skips host name verification
        let client = reqwest::Client::builder()
            .danger_accept_invalid_certs(config.insecure_tls)
            .redirect(Policy::limited(config.max_redirects))
            .connect_timeout(config.connect_timeout)
            .cookie_provider(Arc::clone(&cookies))
            .user_agent(config.user_agent.as_str())
            .http1_only()
            .build()
            .map_err(|e| TransportError::Request(format!("failed to build client: {}", e)))?;

        Ok(TransportClient {
            client,
            cookies,
            insecure_tls: config.insecure_tls,
        })
    }

    pub fn cookie_jar(&self) -> &Arc<CookieJar> {
        &self.cookies
    }

    pub fn clear_cookies(&self) {
        self.cookies.clear();
    }

    pub fn is_insecure(&self) -> bool {
        self.insecure_tls
    }

    /// Send `request` and read the whole response, giving up at `deadline`.
    ///
    /// On expiry the in-flight future is dropped, which aborts the connection
    /// attempt or body read.
    pub async fn send(
        &self,
        request: WireRequest,
        deadline: Duration,
    ) -> Result<RawResponse, TransportError> {
        let timeout_secs = deadline.as_secs();
        let mut req_builder = self
            .client
            .request(request.method, request.url)
            .headers(request.headers);
        if let Some(body) = request.body {
            req_builder = req_builder.body(body);
        }

        let exchange = async {
            let resp = req_builder.send().await?;
            let status = resp.status().as_u16();

            let mut headers: HashMap<String, Vec<String>> = HashMap::new();
            for (name, value) in resp.headers() {
                headers
                    .entry(name.as_str().to_string())
                    .or_default()
                    .push(String::from_utf8_lossy(value.as_bytes()).into_owned());
            }

            let body = resp.bytes().await?.to_vec();
            Ok::<_, reqwest::Error>(RawResponse {
                status,
                headers,
                body,
            })
        };

        match tokio::time::timeout(deadline, exchange).await {
            Ok(Ok(raw)) => Ok(raw),
            Ok(Err(e)) => Err(TransportError::from_reqwest(e, timeout_secs)),
            Err(_) => Err(TransportError::Timeout(timeout_secs)),
        }
    }
}
