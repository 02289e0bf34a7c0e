use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

/// A structured notification send request: which template, to whom, with what
/// payload. Rendering and transport (email, Slack) live behind the sender.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationRequest {
    pub template_id: String,
    pub recipients: Vec<String>,
    pub payload: serde_json::Value,
}

impl NotificationRequest {
    pub fn new(template_id: impl Into<String>, recipients: Vec<String>) -> Self {
        Self {
            template_id: template_id.into(),
            recipients,
            payload: serde_json::Value::Null,
        }
    }

    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }
}

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("invalid request: {0}")]
    Invalid(String),

    #[error("transport error: {0}")]
    Transport(String),
}

/// Seam for engagement flows (invite mails, review notifications). The core
/// state machines never call this directly.
#[async_trait]
pub trait NotificationSender: Send + Sync {
    async fn send(&self, request: NotificationRequest) -> Result<(), NotifyError>;
}

/// Logs the send request instead of delivering it. Used in development and
/// in tests.
pub struct TracingNotifier;

#[async_trait]
impl NotificationSender for TracingNotifier {
    async fn send(&self, request: NotificationRequest) -> Result<(), NotifyError> {
        if request.recipients.is_empty() {
            return Err(NotifyError::Invalid("no recipients".into()));
        }
        info!(
            template_id = %request.template_id,
            recipients = request.recipients.len(),
            "notification send"
        );
        Ok(())
    }
}
