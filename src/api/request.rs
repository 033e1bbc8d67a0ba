//! Authenticated request pipeline
//!
//! [`ServeClient::send`] wraps one logical request:
//! 1. reads the session token when the request needs auth, short-circuiting
//!    with a status-0 result if there is no usable session
//! 2. attaches the token and the client identity headers
//! 3. dispatches through the [`Transport`]
//! 4. normalizes the outcome into a [`RequestResult`]
//! 5. emits exactly one `serveReqOk`/`serveReqFail` event with the elapsed time
//! 6. notifies the optional observers
//!
//! Failures are values: every call settles to a [`Settled`] carrying a
//! `RequestResult`, never a Rust error.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::{Duration, Instant};

use secrecy::ExposeSecret;
use serde_json::Value;

use crate::api::result::{rejected_tag, RequestResult};
use crate::api::transport::{FetchFailure, HttpMethod, ReqwestTransport, Transport, WireRequest};
use crate::core::config::{ClientIdentity, Config, Endpoints};
use crate::core::credentials::{CredentialStore, TokenLookup, NEED_LOGIN};
use crate::core::telemetry::{Telemetry, TelemetryEvent};
use crate::error::Result;

/// Status codes accepted when a request does not say otherwise
pub const DEFAULT_ACCEPTED: [u16; 2] = [200, 201];

/// Timeout used by [`ServeClient::from_config`]
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Description of one logical request
#[derive(Debug, Clone, PartialEq)]
pub struct RequestSpec {
    /// Path suffix appended to the endpoint base, e.g. `/phrase`
    pub url: String,
    pub method: HttpMethod,
    /// Payload, always sent as JSON
    pub data: Value,
    /// Extra headers; auth and identity headers take precedence
    pub headers: Vec<(String, String)>,
    /// Whether the session token must be attached
    pub auth: bool,
    /// Status codes treated as success
    pub accepted: Vec<u16>,
}

impl RequestSpec {
    pub fn new(method: HttpMethod, url: &str) -> Self {
        Self {
            url: url.to_string(),
            method,
            data: Value::Object(Default::default()),
            headers: Vec::new(),
            auth: false,
            accepted: DEFAULT_ACCEPTED.to_vec(),
        }
    }

    pub fn data(mut self, data: Value) -> Self {
        self.data = data;
        self
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn auth(mut self, auth: bool) -> Self {
        self.auth = auth;
        self
    }

    pub fn accept(mut self, statuses: &[u16]) -> Self {
        self.accepted = statuses.to_vec();
        self
    }
}

/// Callback observing a settled result
pub type Observer = Box<dyn Fn(&RequestResult) + Send + Sync>;

/// Optional success/failure observers of one call
///
/// Observers see the settled result but cannot change it.
#[derive(Default)]
pub struct Observers {
    success: Option<Observer>,
    fail: Option<Observer>,
}

impl Observers {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn on_success(mut self, observer: impl Fn(&RequestResult) + Send + Sync + 'static) -> Self {
        self.success = Some(Box::new(observer));
        self
    }

    pub fn on_fail(mut self, observer: impl Fn(&RequestResult) + Send + Sync + 'static) -> Self {
        self.fail = Some(Box::new(observer));
        self
    }

    fn notify(&self, settled: &Settled) {
        let (observer, result) = match settled {
            Settled::Resolved(result) => (self.success.as_ref(), result),
            Settled::Rejected(result) => (self.fail.as_ref(), result),
        };
        let Some(observer) = observer else {
            return;
        };
        if catch_unwind(AssertUnwindSafe(|| observer(result))).is_err() {
            tracing::warn!("Request observer panicked; result left unchanged");
        }
    }
}

impl std::fmt::Debug for Observers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Observers")
            .field("success", &self.success.is_some())
            .field("fail", &self.fail.is_some())
            .finish()
    }
}

/// How a pipeline call settled
#[derive(Debug, Clone, PartialEq)]
pub enum Settled {
    /// Accepted status
    Resolved(RequestResult),
    /// Missing session, unreachable server or non-accepted status
    Rejected(RequestResult),
}

impl Settled {
    pub fn is_resolved(&self) -> bool {
        matches!(self, Settled::Resolved(_))
    }

    pub fn result(&self) -> &RequestResult {
        match self {
            Settled::Resolved(result) | Settled::Rejected(result) => result,
        }
    }

    pub fn into_result(self) -> RequestResult {
        match self {
            Settled::Resolved(result) | Settled::Rejected(result) => result,
        }
    }
}

impl From<Settled> for std::result::Result<RequestResult, RequestResult> {
    fn from(settled: Settled) -> Self {
        match settled {
            Settled::Resolved(result) => Ok(result),
            Settled::Rejected(result) => Err(result),
        }
    }
}

/// The authenticated request pipeline
///
/// Holds only shared, read-only collaborators, so concurrent calls are
/// independent of each other.
#[derive(Clone)]
pub struct ServeClient {
    endpoints: Arc<Endpoints>,
    identity: ClientIdentity,
    transport: Arc<dyn Transport>,
    credentials: Arc<dyn CredentialStore>,
    telemetry: Arc<dyn Telemetry>,
}

impl ServeClient {
    pub fn new(
        endpoints: Arc<Endpoints>,
        identity: ClientIdentity,
        transport: Arc<dyn Transport>,
        credentials: Arc<dyn CredentialStore>,
        telemetry: Arc<dyn Telemetry>,
    ) -> Self {
        Self {
            endpoints,
            identity,
            transport,
            credentials,
            telemetry,
        }
    }

    /// Pipeline over a `reqwest` transport for the configured deployment
    pub fn from_config(
        config: &Config,
        credentials: Arc<dyn CredentialStore>,
        telemetry: Arc<dyn Telemetry>,
    ) -> Result<Self> {
        let transport = ReqwestTransport::with_timeout(REQUEST_TIMEOUT)?;
        Ok(Self::new(
            Arc::new(config.endpoints()),
            config.identity(),
            Arc::new(transport),
            credentials,
            telemetry,
        ))
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    /// Send a request without observers
    pub async fn send(&self, spec: RequestSpec) -> Settled {
        self.send_observed(spec, Observers::none()).await
    }

    /// Send a request, then notify `observers` once it settled
    pub async fn send_observed(&self, spec: RequestSpec, observers: Observers) -> Settled {
        let start = Instant::now();
        let settled = self.settle(&spec).await;
        let cost = start.elapsed().as_millis() as u64;

        let name = if settled.is_resolved() {
            "serveReqOk"
        } else {
            "serveReqFail"
        };
        self.telemetry.record(
            TelemetryEvent::new(name)
                .with("url", spec.url.as_str())
                .with("method", spec.method.as_str())
                .with("cost", cost),
        );

        observers.notify(&settled);
        settled
    }

    async fn settle(&self, spec: &RequestSpec) -> Settled {
        let mut headers = spec.headers.clone();

        if spec.auth {
            match self.credentials.fetch_token().await {
                TokenLookup::Token(token) => {
                    set_header(&mut headers, "Authorization", token.expose_secret());
                }
                lookup => {
                    let marker = lookup.marker().unwrap_or(NEED_LOGIN);
                    tracing::debug!("{} {} skipped: {}", spec.method, spec.url, marker);
                    return Settled::Rejected(RequestResult::auth_missing(marker));
                }
            }
        }

        set_header(&mut headers, "c", &self.identity.client);
        set_header(&mut headers, "cv", &self.identity.version);
        if !headers
            .iter()
            .any(|(name, _)| name.eq_ignore_ascii_case("content-type"))
        {
            headers.push(("Content-Type".to_string(), "application/json".to_string()));
        }

        let request = WireRequest {
            url: self.endpoints.http_url(&spec.url),
            method: spec.method,
            headers,
            body: spec.data.to_string(),
            accepted: spec.accepted.clone(),
        };

        tracing::debug!("{} {}", request.method, request.url);

        match self.transport.fetch(request).await {
            Ok(raw) => Settled::Resolved(RequestResult::normalize(&raw, None)),
            Err(FetchFailure::Unreachable) => {
                Settled::Rejected(RequestResult::unreachable(&spec.url))
            }
            Err(FetchFailure::Rejected(raw)) => {
                let tag = rejected_tag(&spec.url);
                Settled::Rejected(RequestResult::normalize(&raw, Some(tag.as_str())))
            }
        }
    }
}

/// Insert or replace a header (case-insensitive name match)
fn set_header(headers: &mut Vec<(String, String)>, name: &str, value: &str) {
    headers.retain(|(key, _)| !key.eq_ignore_ascii_case(name));
    headers.push((name.to_string(), value.to_string()));
}
