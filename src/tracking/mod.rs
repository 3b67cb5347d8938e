//! Delivery status tracking.
//!
//! Keeps the latest outcome for each recipient, in the order recipients
//! were first seen, plus an append-only history of every outcome recorded
//! for that recipient during the life of the tracker.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

/// Outcome of a delivery attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    /// The provider accepted the message.
    Success,
    /// The provider reported non-delivery or raised an error.
    Failure,
}

/// One recorded delivery outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryRecord {
    /// Recipient the message was addressed to.
    pub recipient: String,
    /// Outcome.
    pub status: DeliveryStatus,
    /// Provider that produced the outcome.
    pub provider: String,
    /// When the outcome was recorded.
    pub timestamp: DateTime<Utc>,
    /// Error description when the provider raised one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DeliveryRecord {
    /// Returns true if this record is a success.
    pub fn is_success(&self) -> bool {
        self.status == DeliveryStatus::Success
    }
}

#[derive(Debug, Default)]
struct TrackerState {
    latest: HashMap<String, DeliveryRecord>,
    order: Vec<String>,
    history: HashMap<String, Vec<DeliveryRecord>>,
}

/// Tracks delivery outcomes per recipient.
#[derive(Debug, Default)]
pub struct StatusTracker {
    state: Mutex<TrackerState>,
}

impl StatusTracker {
    /// Creates an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a successful delivery.
    pub fn record_success(&self, recipient: &str, provider: &str) {
        self.record(recipient, provider, DeliveryStatus::Success, None);
    }

    /// Records a failed delivery, with the provider's error if it raised one.
    pub fn record_failure(&self, recipient: &str, provider: &str, error: Option<&str>) {
        self.record(
            recipient,
            provider,
            DeliveryStatus::Failure,
            error.map(str::to_owned),
        );
    }

    /// Latest status for a recipient.
    pub fn status_of(&self, recipient: &str) -> Option<DeliveryStatus> {
        self.state.lock().latest.get(recipient).map(|r| r.status)
    }

    /// Latest record for a recipient.
    pub fn record_of(&self, recipient: &str) -> Option<DeliveryRecord> {
        self.state.lock().latest.get(recipient).cloned()
    }

    /// Latest record per recipient, in the order recipients were first seen.
    pub fn all_records(&self) -> Vec<DeliveryRecord> {
        let state = self.state.lock();
        state
            .order
            .iter()
            .filter_map(|recipient| state.latest.get(recipient).cloned())
            .collect()
    }

    /// Every record for a recipient, oldest first.
    pub fn history(&self, recipient: &str) -> Vec<DeliveryRecord> {
        self.state
            .lock()
            .history
            .get(recipient)
            .cloned()
            .unwrap_or_default()
    }

    /// Number of distinct recipients tracked.
    pub fn len(&self) -> usize {
        self.state.lock().order.len()
    }

    /// Returns true if nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn record(
        &self,
        recipient: &str,
        provider: &str,
        status: DeliveryStatus,
        error: Option<String>,
    ) {
        let record = DeliveryRecord {
            recipient: recipient.to_owned(),
            status,
            provider: provider.to_owned(),
            timestamp: Utc::now(),
            error,
        };

        let mut state = self.state.lock();
        if !state.latest.contains_key(recipient) {
            state.order.push(recipient.to_owned());
        }
        state
            .history
            .entry(recipient.to_owned())
            .or_default()
            .push(record.clone());
        state.latest.insert(recipient.to_owned(), record);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_recipient() {
        let tracker = StatusTracker::new();
        assert!(tracker.status_of("nobody@example.com").is_none());
        assert!(tracker.history("nobody@example.com").is_empty());
        assert!(tracker.is_empty());
    }

    #[test]
    fn test_latest_record_overwrites() {
        let tracker = StatusTracker::new();
        tracker.record_failure("a@example.com", "primary", Some("Timed out: slow"));
        tracker.record_success("a@example.com", "backup");

        let record = tracker.record_of("a@example.com").unwrap();
        assert_eq!(record.status, DeliveryStatus::Success);
        assert_eq!(record.provider, "backup");
        assert!(record.error.is_none());
        assert_eq!(tracker.len(), 1);
    }

    #[test]
    fn test_all_records_keep_first_insertion_order() {
        let tracker = StatusTracker::new();
        tracker.record_success("a@example.com", "p");
        tracker.record_success("b@example.com", "p");
        tracker.record_failure("a@example.com", "q", None);

        let recipients: Vec<_> = tracker
            .all_records()
            .into_iter()
            .map(|r| (r.recipient, r.status))
            .collect();
        assert_eq!(
            recipients,
            vec![
                ("a@example.com".to_string(), DeliveryStatus::Failure),
                ("b@example.com".to_string(), DeliveryStatus::Success),
            ]
        );
    }

    #[test]
    fn test_history_keeps_every_record() {
        let tracker = StatusTracker::new();
        tracker.record_failure("a@example.com", "primary", None);
        tracker.record_failure("a@example.com", "backup", Some("Connection failed: refused"));
        tracker.record_success("a@example.com", "primary");

        let history = tracker.history("a@example.com");
        let providers: Vec<_> = history.iter().map(|r| r.provider.as_str()).collect();
        assert_eq!(providers, vec!["primary", "backup", "primary"]);
        assert_eq!(history[1].error.as_deref(), Some("Connection failed: refused"));
        assert!(history[2].is_success());
    }

    #[test]
    fn test_status_query_is_idempotent() {
        let tracker = StatusTracker::new();
        tracker.record_success("a@example.com", "p");

        assert_eq!(tracker.status_of("a@example.com"), tracker.status_of("a@example.com"));
        assert_eq!(tracker.record_of("a@example.com"), tracker.record_of("a@example.com"));
    }

    #[test]
    fn test_record_serializes() {
        let tracker = StatusTracker::new();
        tracker.record_success("a@example.com", "p");

        let json = serde_json::to_string(&tracker.all_records()).unwrap();
        assert!(json.contains("\"status\":\"success\""));
        assert!(!json.contains("\"error\""));
    }
}
