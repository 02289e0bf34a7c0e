use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// A single analytics capture: event name, the person it belongs to, and a
/// free-form property bag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsEvent {
    pub name: String,
    /// Stable identifier of the person the event is about (user id, email).
    pub distinct_id: String,
    pub properties: serde_json::Value,
}

impl AnalyticsEvent {
    pub fn new(name: impl Into<String>, distinct_id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            distinct_id: distinct_id.into(),
            properties: serde_json::Value::Null,
        }
    }

    pub fn with_properties(mut self, properties: serde_json::Value) -> Self {
        self.properties = properties;
        self
    }
}

#[derive(Debug, Error)]
pub enum AnalyticsError {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("sink error: {0}")]
    Sink(String),
}

/// Destination for analytics events. Implementations must not assume callers
/// wait for delivery; failures are logged, never surfaced to the operation
/// that produced the event.
#[async_trait]
pub trait AnalyticsSink: Send + Sync {
    async fn deliver(&self, events: Vec<AnalyticsEvent>) -> Result<(), AnalyticsError>;
}

/// Sink that writes events to the tracing log. The default in development
/// and the fallback when no external analytics backend is configured.
pub struct TracingSink;

#[async_trait]
impl AnalyticsSink for TracingSink {
    async fn deliver(&self, events: Vec<AnalyticsEvent>) -> Result<(), AnalyticsError> {
        for event in events {
            debug!(
                name = %event.name,
                distinct_id = %event.distinct_id,
                properties = %event.properties,
                "analytics event"
            );
        }
        Ok(())
    }
}

/// In-memory sink for tests: captured events can be inspected afterwards.
#[derive(Default, Clone)]
pub struct MemorySink {
    events: Arc<Mutex<Vec<AnalyticsEvent>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn captured(&self) -> Vec<AnalyticsEvent> {
        self.events.lock().expect("sink poisoned").clone()
    }
}

#[async_trait]
impl AnalyticsSink for MemorySink {
    async fn deliver(&self, events: Vec<AnalyticsEvent>) -> Result<(), AnalyticsError> {
        self.events.lock().expect("sink poisoned").extend(events);
        Ok(())
    }
}

/// Handle the application holds to capture events.
///
/// Events go onto an unbounded channel and a spawned drain task forwards them
/// to the sink, so `capture` never blocks and a failing sink can never fail
/// the operation that emitted the event.
#[derive(Clone)]
pub struct AnalyticsHandle {
    tx: mpsc::UnboundedSender<Vec<AnalyticsEvent>>,
}

impl AnalyticsHandle {
    pub fn spawn(sink: Arc<dyn AnalyticsSink>) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<Vec<AnalyticsEvent>>();
        tokio::spawn(async move {
            while let Some(batch) = rx.recv().await {
                if let Err(e) = sink.deliver(batch).await {
                    warn!("analytics delivery failed: {}", e);
                }
            }
        });
        Self { tx }
    }

    /// Fire-and-forget capture of a batch of events.
    pub fn capture(&self, events: Vec<AnalyticsEvent>) {
        if events.is_empty() {
            return;
        }
        // A closed channel means the drain task is gone (shutdown); dropping
        // events there is the contract, not an error.
        if self.tx.send(events).is_err() {
            warn!("analytics channel closed; events dropped");
        }
    }

    pub fn capture_one(&self, event: AnalyticsEvent) {
        self.capture(vec![event]);
    }
}
