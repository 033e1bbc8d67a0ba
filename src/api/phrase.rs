//! Phrase operations
//!
//! Fixed requests against `/phrase`; each one only picks a method, the
//! accepted statuses and whether auth is needed.

use serde_json::Value;

use crate::api::request::{Observers, RequestSpec, ServeClient, Settled};
use crate::api::transport::HttpMethod;

/// Endpoint shared by every phrase operation
pub const PHRASE_PATH: &str = "/phrase";

/// Phrase operations bound to a pipeline
#[derive(Clone, Copy)]
pub struct PhraseApi<'a> {
    client: &'a ServeClient,
}

impl<'a> PhraseApi<'a> {
    pub fn new(client: &'a ServeClient) -> Self {
        Self { client }
    }

    /// Mark a phrase as collected
    pub async fn collect(&self, data: Value, observers: Observers) -> Settled {
        self.client
            .send_observed(collect_spec(data), observers)
            .await
    }

    /// Remove a collected phrase
    pub async fn remove(&self, data: Value, observers: Observers) -> Settled {
        self.client
            .send_observed(remove_spec(data), observers)
            .await
    }

    /// Update the mark of a collected phrase
    pub async fn update_mark(&self, data: Value, observers: Observers) -> Settled {
        self.client
            .send_observed(update_mark_spec(data), observers)
            .await
    }

    /// Fire a tracking record; the outcome is not observed
    pub async fn send_event(&self, data: Value) -> Settled {
        self.client.send(send_event_spec(data)).await
    }
}

pub fn collect_spec(data: Value) -> RequestSpec {
    RequestSpec::new(HttpMethod::Post, PHRASE_PATH)
        .data(data)
        .auth(true)
        .accept(&[201])
}

pub fn remove_spec(data: Value) -> RequestSpec {
    RequestSpec::new(HttpMethod::Delete, PHRASE_PATH)
        .data(data)
        .auth(true)
        .accept(&[200])
}

pub fn update_mark_spec(data: Value) -> RequestSpec {
    RequestSpec::new(HttpMethod::Put, PHRASE_PATH)
        .data(data)
        .auth(true)
        .accept(&[200])
}

pub fn send_event_spec(data: Value) -> RequestSpec {
    RequestSpec::new(HttpMethod::Post, PHRASE_PATH)
        .data(data)
        .auth(false)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::*;
    use crate::api::request::tests::RecordingTelemetry;
    use crate::api::request::DEFAULT_ACCEPTED;
    use crate::api::transport::{FetchFailure, MockTransport, RawResponse};
    use crate::core::config::{ClientIdentity, Endpoints, Mode};
    use crate::core::credentials::{MockCredentialStore, TokenLookup};

    #[test]
    fn test_operation_specs() {
        let collect = collect_spec(json!({"phrase": "hi"}));
        assert_eq!(collect.method, HttpMethod::Post);
        assert_eq!(collect.url, "/phrase");
        assert!(collect.auth);
        assert_eq!(collect.accepted, vec![201]);
        assert_eq!(collect.data, json!({"phrase": "hi"}));

        let remove = remove_spec(json!({}));
        assert_eq!(remove.method, HttpMethod::Delete);
        assert!(remove.auth);
        assert_eq!(remove.accepted, vec![200]);

        let update = update_mark_spec(json!({}));
        assert_eq!(update.method, HttpMethod::Put);
        assert!(update.auth);
        assert_eq!(update.accepted, vec![200]);

        let event = send_event_spec(json!({"kind": "open"}));
        assert_eq!(event.method, HttpMethod::Post);
        assert_eq!(event.url, "/phrase");
        assert!(!event.auth);
        assert_eq!(event.accepted, DEFAULT_ACCEPTED.to_vec());
    }

    fn client(transport: MockTransport, credentials: MockCredentialStore) -> ServeClient {
        ServeClient::new(
            Arc::new(Endpoints::for_mode(Mode::Test)),
            ClientIdentity {
                client: "ext".to_string(),
                version: "1.0.0".to_string(),
            },
            Arc::new(transport),
            Arc::new(credentials),
            Arc::new(RecordingTelemetry::default()),
        )
    }

    #[tokio::test]
    async fn test_collect_with_ok_status_is_rejected() {
        // collect only accepts 201
        let mut transport = MockTransport::new();
        transport
            .expect_fetch()
            .withf(|request| request.accepted == vec![201])
            .returning(|_| {
                Err(FetchFailure::Rejected(RawResponse {
                    status: 200,
                    body: "{}".to_string(),
                }))
            });
        let mut credentials = MockCredentialStore::new();
        credentials
            .expect_fetch_token()
            .returning(|| TokenLookup::Token("tok".into()));

        let client = client(transport, credentials);
        let settled = PhraseApi::new(&client)
            .collect(json!({"phrase": "hi"}), Observers::none())
            .await;

        assert!(!settled.is_resolved());
        assert_eq!(settled.result().err_msg, "authReq_/phrase_err");
    }

    #[tokio::test]
    async fn test_send_event_works_logged_out() {
        let mut transport = MockTransport::new();
        transport.expect_fetch().times(1).returning(|_| {
            Ok(RawResponse {
                status: 200,
                body: String::new(),
            })
        });
        let mut credentials = MockCredentialStore::new();
        credentials.expect_fetch_token().never();

        let client = client(transport, credentials);
        let settled = PhraseApi::new(&client)
            .send_event(json!({"kind": "open"}))
            .await;

        assert!(settled.is_resolved());
        assert_eq!(settled.result().toast(), None);
    }
}
