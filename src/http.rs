//! Blocking HTTP transport used by resolution and fetching.
//!
//! Every request goes through [`HttpClient`] so the network-facing stages can
//! be exercised against [`MockClient`] in tests.

use std::sync::Mutex;
use std::time::Duration;

use thiserror::Error;

/// Default bound on a single request, connect through body.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// Default cap on a downloaded body.
pub const DEFAULT_MAX_BYTES: u64 = 32 * 1024 * 1024;

/// Failure of a single HTTP request.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum HttpError {
    #[error("server responded with HTTP {0}")]
    Status(u16),

    #[error("{0}")]
    Transport(String),
}

/// Minimal GET-only client.
pub trait HttpClient {
    /// Fetches `url` and returns the body as text.
    fn get_text(&self, url: &str) -> Result<String, HttpError>;

    /// Fetches `url` and returns the raw body.
    fn get_bytes(&self, url: &str) -> Result<Vec<u8>, HttpError>;
}

/// [`HttpClient`] backed by a `ureq` agent with a global timeout.
pub struct UreqClient {
    agent: ureq::Agent,
    user_agent: String,
    max_bytes: u64,
}

impl UreqClient {
    pub fn new(timeout: Duration, max_bytes: u64, user_agent: impl Into<String>) -> Self {
        let config = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .build();
        Self {
            agent: config.into(),
            user_agent: user_agent.into(),
            max_bytes,
        }
    }

    fn call(&self, url: &str) -> Result<ureq::http::Response<ureq::Body>, HttpError> {
        tracing::debug!(url, "GET");
        self.agent
            .get(url)
            .header("User-Agent", &self.user_agent)
            .call()
            .map_err(map_ureq_error)
    }
}

impl HttpClient for UreqClient {
    fn get_text(&self, url: &str) -> Result<String, HttpError> {
        let mut response = self.call(url)?;
        response
            .body_mut()
            .with_config()
            .limit(self.max_bytes)
            .read_to_string()
            .map_err(map_ureq_error)
    }

    fn get_bytes(&self, url: &str) -> Result<Vec<u8>, HttpError> {
        let mut response = self.call(url)?;
        response
            .body_mut()
            .with_config()
            .limit(self.max_bytes)
            .read_to_vec()
            .map_err(map_ureq_error)
    }
}

fn map_ureq_error(error: ureq::Error) -> HttpError {
    match error {
        ureq::Error::StatusCode(code) => HttpError::Status(code),
        ureq::Error::Timeout(_) => HttpError::Transport("request timed out".to_string()),
        other => HttpError::Transport(other.to_string()),
    }
}

/// Canned response served by [`MockClient`].
#[derive(Clone, Debug)]
pub enum MockResponse {
    Body(Vec<u8>),
    Error(HttpError),
}

/// In-memory [`HttpClient`] for tests and offline use.
///
/// Routes are matched by URL prefix in insertion order. Unrouted URLs fail
/// with a transport error. Every requested URL is recorded.
#[derive(Debug, Default)]
pub struct MockClient {
    routes: Vec<(String, MockResponse)>,
    requests: Mutex<Vec<String>>,
}

impl MockClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serves `body` for any URL starting with `prefix`.
    pub fn with_body(mut self, prefix: impl Into<String>, body: impl Into<Vec<u8>>) -> Self {
        self.routes
            .push((prefix.into(), MockResponse::Body(body.into())));
        self
    }

    /// Fails any URL starting with `prefix` with `error`.
    pub fn with_error(mut self, prefix: impl Into<String>, error: HttpError) -> Self {
        self.routes.push((prefix.into(), MockResponse::Error(error)));
        self
    }

    /// URLs requested so far, in order.
    pub fn requests(&self) -> Vec<String> {
        self.requests
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }

    fn respond(&self, url: &str) -> Result<Vec<u8>, HttpError> {
        if let Ok(mut guard) = self.requests.lock() {
            guard.push(url.to_string());
        }
        match self.routes.iter().find(|(prefix, _)| url.starts_with(prefix)) {
            Some((_, MockResponse::Body(body))) => Ok(body.clone()),
            Some((_, MockResponse::Error(error))) => Err(error.clone()),
            None => Err(HttpError::Transport(format!("no route for {url}"))),
        }
    }
}

impl HttpClient for MockClient {
    fn get_text(&self, url: &str) -> Result<String, HttpError> {
        let body = self.respond(url)?;
        String::from_utf8(body).map_err(|e| HttpError::Transport(e.to_string()))
    }

    fn get_bytes(&self, url: &str) -> Result<Vec<u8>, HttpError> {
        self.respond(url)
    }
}
