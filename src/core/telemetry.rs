//! Fire-and-forget analytics events
//!
//! The pipeline and the QR login report what happened through [`Telemetry`].
//! Sinks must never block or fail into the caller.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use tokio::sync::mpsc;

/// A named analytics record with its parameters
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TelemetryEvent {
    pub name: String,
    pub params: Map<String, Value>,
    pub at: DateTime<Utc>,
}

impl TelemetryEvent {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: Map::new(),
            at: Utc::now(),
        }
    }

    /// Add a parameter
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.params.insert(key.to_string(), value.into());
        self
    }

    /// Look up a parameter
    pub fn param(&self, key: &str) -> Option<&Value> {
        self.params.get(key)
    }
}

/// Receiver of analytics events
pub trait Telemetry: Send + Sync {
    fn record(&self, event: TelemetryEvent);
}

/// Writes each event as one structured log line under the `telemetry` target
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingTelemetry;

impl Telemetry for TracingTelemetry {
    fn record(&self, event: TelemetryEvent) {
        let TelemetryEvent { name, params, .. } = event;
        let params = Value::Object(params);
        tracing::info!(target: "telemetry", name = %name, params = %params, "event");
    }
}

/// Forwards events into a channel for a consumer task
#[derive(Debug, Clone)]
pub struct ChannelTelemetry {
    tx: mpsc::UnboundedSender<TelemetryEvent>,
}

impl ChannelTelemetry {
    pub fn new(tx: mpsc::UnboundedSender<TelemetryEvent>) -> Self {
        Self { tx }
    }
}

impl Telemetry for ChannelTelemetry {
    fn record(&self, event: TelemetryEvent) {
        // A closed receiver just means nobody is listening any more
        let _ = self.tx.send(event);
    }
}

/// Create a channel sink and return the event receiver
pub fn channel_telemetry() -> (ChannelTelemetry, mpsc::UnboundedReceiver<TelemetryEvent>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (ChannelTelemetry::new(tx), rx)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_builder() {
        let event = TelemetryEvent::new("serveReqOk")
            .with("url", "/phrase")
            .with("cost", 12u64);
        assert_eq!(event.name, "serveReqOk");
        assert_eq!(event.param("url"), Some(&Value::from("/phrase")));
        assert_eq!(event.param("cost"), Some(&Value::from(12u64)));
        assert_eq!(event.param("missing"), None);
    }

    #[test]
    fn test_channel_sink_forwards() {
        let (sink, mut rx) = channel_telemetry();
        sink.record(TelemetryEvent::new("load_qr"));
        assert_eq!(rx.try_recv().unwrap().name, "load_qr");
    }

    #[test]
    fn test_channel_sink_survives_dropped_receiver() {
        let (sink, rx) = channel_telemetry();
        drop(rx);
        sink.record(TelemetryEvent::new("qr_ws_close"));
    }
}
