//! Minimal HTTP transport
//!
//! Success and failure are split purely on status code: a response whose
//! status is in the request's accepted set is returned as-is, any other
//! response comes back as [`FetchFailure::Rejected`]. Requests that never
//! complete (DNS, refused connection, timeout) map to
//! [`FetchFailure::Unreachable`]. No retries happen at this layer.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use crate::error::Result;

/// HTTP method for a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<HttpMethod> for reqwest::Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Delete => reqwest::Method::DELETE,
        }
    }
}

/// A fully prepared request
#[derive(Debug, Clone, PartialEq)]
pub struct WireRequest {
    pub url: String,
    pub method: HttpMethod,
    pub headers: Vec<(String, String)>,
    /// Serialized JSON body
    pub body: String,
    /// Status codes treated as success
    pub accepted: Vec<u16>,
}

impl WireRequest {
    /// Value of the first header with this name (case-insensitive)
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Status and body of a completed exchange
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

/// Why a fetch did not produce an accepted response
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchFailure {
    /// The server answered with a status outside the accepted set
    Rejected(RawResponse),
    /// The exchange never completed
    Unreachable,
}

/// Performs a single HTTP exchange
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Transport: Send + Sync {
    async fn fetch(&self, request: WireRequest) -> std::result::Result<RawResponse, FetchFailure>;
}

/// `reqwest`-backed transport
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }

    /// Transport whose requests give up after `timeout`
    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn fetch(&self, request: WireRequest) -> std::result::Result<RawResponse, FetchFailure> {
        let mut builder = self
            .client
            .request(request.method.into(), &request.url)
            .body(request.body);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let response = match builder.send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::debug!("fetch err: {} {}: {}", request.method, request.url, e);
                return Err(FetchFailure::Unreachable);
            }
        };

        let status = response.status().as_u16();
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                tracing::debug!("Discarding unreadable body from {}: {}", request.url, e);
                String::new()
            }
        };
        let raw = RawResponse { status, body };

        if request.accepted.contains(&status) {
            Ok(raw)
        } else {
            Err(FetchFailure::Rejected(raw))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_names() {
        assert_eq!(HttpMethod::Post.as_str(), "POST");
        assert_eq!(HttpMethod::Delete.to_string(), "DELETE");
        assert_eq!(reqwest::Method::from(HttpMethod::Put), reqwest::Method::PUT);
    }

    #[test]
    fn test_header_lookup_is_case_insensitive() {
        let request = WireRequest {
            url: "http://localhost/p".to_string(),
            method: HttpMethod::Get,
            headers: vec![("Authorization".to_string(), "tok".to_string())],
            body: "{}".to_string(),
            accepted: vec![200],
        };
        assert_eq!(request.header("authorization"), Some("tok"));
        assert_eq!(request.header("cv"), None);
    }

    #[tokio::test]
    async fn test_unreachable_host_is_distinguished() {
        // Grab a free port and release it so nothing is listening there
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let transport = ReqwestTransport::with_timeout(Duration::from_secs(2)).unwrap();
        let result = transport
            .fetch(WireRequest {
                url: format!("http://127.0.0.1:{}/p/phrase", port),
                method: HttpMethod::Post,
                headers: Vec::new(),
                body: "{}".to_string(),
                accepted: vec![200, 201],
            })
            .await;
        assert_eq!(result, Err(FetchFailure::Unreachable));
    }
}
