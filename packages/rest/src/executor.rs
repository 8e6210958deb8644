//! Blocking HTTP execution abstraction.
//!
//! The `HttpExecutor` trait is the seam between the client's cache/policy
//! logic and the network. Production code uses `ReqwestExecutor`; tests swap
//! in `mock::MockExecutor` and never touch a socket.

use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, CONTENT_TYPE};

use crate::types::{Method, RawResponse};

/// TLS trust policy for the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrustMode {
    /// Validate certificates and hostnames against the system trust store.
    #[default]
    System,
    /// Skip certificate and hostname validation entirely. Only for talking
    /// to endpoints with self-signed certificates under the caller's
    /// control.
    AcceptAll,
}

/// Static transport configuration, fixed for the life of an executor.
#[derive(Debug, Clone)]
pub struct TransportOptions {
    pub timeout: Duration,
    pub user_agent: Option<String>,
    pub basic_auth: Option<(String, String)>,
    pub trust: TrustMode,
}

impl Default for TransportOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            user_agent: None,
            basic_auth: None,
            trust: TrustMode::System,
        }
    }
}

/// A fully-resolved request ready for one blocking exchange: the query
/// string is already appended and the body already serialized.
#[derive(Debug, Clone)]
pub struct PreparedRequest {
    pub method: Method,
    pub url: String,
    pub body: Option<String>,
    pub content_type: Option<&'static str>,
}

/// Trait for executing HTTP requests.
///
/// Returns the raw response for any HTTP status; only failures that produced
/// no response at all (DNS, connect, IO, TLS) are `Err`. Status
/// classification happens one layer up.
pub trait HttpExecutor: Send + Sync {
    fn execute(&self, request: &PreparedRequest) -> Result<RawResponse, String>;
}

/// Production executor using blocking reqwest.
///
/// The underlying client sends `Accept-Encoding: gzip` and transparently
/// decompresses gzip response bodies.
pub struct ReqwestExecutor {
    client: Client,
    basic_auth: Option<(String, String)>,
}

impl ReqwestExecutor {
    pub fn new(options: TransportOptions) -> Result<Self, String> {
        let mut builder = Client::builder().timeout(options.timeout);
        if let Some(agent) = &options.user_agent {
            builder = builder.user_agent(agent);
        }
        if options.trust == TrustMode::AcceptAll {
            builder = builder.danger_accept_invalid_certs(true);
        }
        let client = builder.build().map_err(|e| e.to_string())?;

        Ok(Self {
            client,
            basic_auth: options.basic_auth,
        })
    }

    /// Create with default options (30 second timeout, system trust).
    pub fn with_defaults() -> Result<Self, String> {
        Self::new(TransportOptions::default())
    }
}

impl HttpExecutor for ReqwestExecutor {
    fn execute(&self, request: &PreparedRequest) -> Result<RawResponse, String> {
        let method: http::Method = request.method.into();

        let mut req_builder = self
            .client
            .request(method, &request.url)
            .header(ACCEPT, "application/json");

        if let Some((username, password)) = &self.basic_auth {
            req_builder = req_builder.basic_auth(username, Some(password));
        }

        if let Some(content_type) = request.content_type {
            req_builder = req_builder.header(CONTENT_TYPE, content_type);
        }

        if let Some(body) = &request.body {
            req_builder = req_builder.body(body.clone());
        }

        let response = req_builder.send().map_err(|e| e.to_string())?;

        let status = response.status().as_u16();
        // Non-2xx bodies are read the same way; the server's error detail is
        // part of the result.
        let body = response.text().map_err(|e| e.to_string())?;

        Ok(RawResponse { status, body })
    }
}


#[cfg(test)]
mod tests {
    use super::mock::MockExecutor;
    use super::*;

    fn get_request(url: &str) -> PreparedRequest {
        PreparedRequest {
            method: Method::GET,
            url: url.to_string(),
            body: None,
            content_type: None,
        }
    }

    #[test]
    fn mock_returns_configured_response() {
        let executor = MockExecutor::new().with_response(
            "https://example.com/a",
            MockExecutor::success_response(r#"{"ok":true}"#),
        );
        let response = executor.execute(&get_request("https://example.com/a")).unwrap();
        assert_eq!(response.status, 200);
        assert_eq!(response.body, r#"{"ok":true}"#);
    }

    #[test]
    fn mock_falls_back_to_default_response() {
        let executor =
            MockExecutor::new().with_default_response(MockExecutor::success_response("[]"));
        let response = executor.execute(&get_request("https://example.com/any")).unwrap();
        assert_eq!(response.body, "[]");
    }

    #[test]
    fn mock_returns_404_when_nothing_matches() {
        let executor = MockExecutor::new();
        let response = executor.execute(&get_request("https://example.com/x")).unwrap();
        assert_eq!(response.status, 404);
    }

    #[test]
    fn mock_fails_when_configured() {
        let executor = MockExecutor::new().fail_with("connection refused");
        let result = executor.execute(&get_request("https://example.com/x"));
        assert_eq!(result.unwrap_err(), "connection refused");
    }

    #[test]
    fn mock_records_requests_in_order() {
        let executor =
            MockExecutor::new().with_default_response(MockExecutor::success_response(""));
        executor.execute(&get_request("https://example.com/first")).unwrap();
        executor
            .execute(&PreparedRequest {
                method: Method::POST,
                url: "https://example.com/second".to_string(),
                body: Some("message=hi".to_string()),
                content_type: Some("application/x-www-form-urlencoded"),
            })
            .unwrap();

        let recorded = executor.recorded_requests();
        assert_eq!(recorded.len(), 2);
        assert_eq!(recorded[0].url, "https://example.com/first");
        assert_eq!(recorded[1].method, Method::POST);
        assert_eq!(recorded[1].body.as_deref(), Some("message=hi"));
    }

    #[test]
    fn reqwest_executor_builds_with_defaults() {
        assert!(ReqwestExecutor::with_defaults().is_ok());
    }

    #[test]
    fn reqwest_executor_builds_with_accept_all_trust() {
        let executor = ReqwestExecutor::new(TransportOptions {
            trust: TrustMode::AcceptAll,
            user_agent: Some("chime test".to_string()),
            basic_auth: Some(("user".to_string(), "pass".to_string())),
            ..TransportOptions::default()
        });
        assert!(executor.is_ok());
    }
}
