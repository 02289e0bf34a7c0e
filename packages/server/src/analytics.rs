use common::analytics::{AnalyticsEvent, AnalyticsHandle};

/// Analytics buffered during a database transaction.
///
/// Events describing work inside an open transaction must not reach the sink
/// until the transaction commits; otherwise a rollback would leave us having
/// reported participants that never existed. Handlers push into a `Pending`,
/// commit, then dispatch.
#[derive(Default)]
pub struct Pending {
    events: Vec<AnalyticsEvent>,
}

impl Pending {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: AnalyticsEvent) {
        self.events.push(event);
    }

    pub fn push_opt(&mut self, event: Option<AnalyticsEvent>) {
        if let Some(event) = event {
            self.events.push(event);
        }
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Hand everything to the fire-and-forget channel. Call after commit.
    pub fn dispatch(self, handle: &AnalyticsHandle) {
        handle.capture(self.events);
    }
}

pub fn participant_added(
    event_id: i32,
    user_id: i32,
    kind: &str,
    status: &str,
    identity_created: bool,
) -> AnalyticsEvent {
    AnalyticsEvent::new("participant_added", user_id.to_string()).with_properties(
        serde_json::json!({
            "event_id": event_id,
            "kind": kind,
            "status_before": serde_json::Value::Null,
            "status_after": status,
            "identity_created": identity_created,
        }),
    )
}

pub fn participant_status_changed(
    event_id: i32,
    user_id: i32,
    status_before: &str,
    status_after: &str,
) -> AnalyticsEvent {
    AnalyticsEvent::new("participant_status_changed", user_id.to_string()).with_properties(
        serde_json::json!({
            "event_id": event_id,
            "status_before": status_before,
            "status_after": status_after,
        }),
    )
}

pub fn participant_applied(event_id: i32, user_id: i32, kind: &str) -> AnalyticsEvent {
    AnalyticsEvent::new("participant_applied", user_id.to_string()).with_properties(
        serde_json::json!({
            "event_id": event_id,
            "kind": kind,
        }),
    )
}
