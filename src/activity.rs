use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tracing::warn;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize)]
pub struct ActivityEntry {
    pub id: Uuid,
    pub action: String,
    pub entity_type: String,
    pub entity_id: String,
    pub entity_name: String,
    pub details: Value,
    pub recorded_at: DateTime<Utc>,
}

/// Fire-and-forget audit sink. Recording must never fail the operation that
/// triggered it; any internal failure is logged and swallowed.
#[derive(Debug, Default)]
pub struct ActivityLog {
    entries: Mutex<Vec<ActivityEntry>>,
}

impl ActivityLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(
        &self,
        action: &str,
        entity_type: &str,
        entity_id: &str,
        entity_name: &str,
        details: Value,
    ) {
        let entry = ActivityEntry {
            id: Uuid::new_v4(),
            action: action.to_string(),
            entity_type: entity_type.to_string(),
            entity_id: entity_id.to_string(),
            entity_name: entity_name.to_string(),
            details,
            recorded_at: Utc::now(),
        };

        match self.entries.lock() {
            Ok(mut entries) => entries.push(entry),
            Err(err) => warn!(error = %err, "failed to record activity entry"),
        }
    }

    pub fn entries(&self) -> Vec<ActivityEntry> {
        self.entries
            .lock()
            .map(|entries| entries.clone())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::ActivityLog;

    #[test]
    fn recorded_entries_are_readable_in_order() {
        let log = ActivityLog::new();
        log.record("created", "shipment", "s-1", "NCM Shipment T1", json!({}));
        log.record(
            "updated",
            "order",
            "o-1",
            "ORD-001",
            json!({ "field": "status" }),
        );

        let entries = log.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].action, "created");
        assert_eq!(entries[1].entity_type, "order");
        assert_eq!(entries[1].details["field"], "status");
    }
}
