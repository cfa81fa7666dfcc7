use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

const DATE_PARAM_FORMAT: &str = "%Y-%m-%d";

/// A notification event exactly as the Insights API returned it.
///
/// The record is kept as raw JSON so that fields we do not model survive
/// into `rawLog`, and so that a badly typed field never fails a whole page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawEvent(Value);

impl RawEvent {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// Event identifier as it appeared on the wire, `None` when absent or null.
    pub fn raw_id(&self) -> Option<&Value> {
        match self.0.get("id") {
            None | Some(Value::Null) => None,
            Some(v) => Some(v),
        }
    }

    pub fn created(&self) -> Option<&str> {
        self.0["created"].as_str()
    }

    pub fn bundle(&self) -> Option<&str> {
        self.0["bundle"].as_str()
    }

    pub fn application(&self) -> Option<&str> {
        self.0["application"].as_str()
    }

    pub fn event_type(&self) -> Option<&str> {
        self.0["event_type"].as_str()
    }

    /// The embedded payload, `None` when the field is absent or null.
    pub fn payload(&self) -> Option<&Value> {
        match self.0.get("payload") {
            None | Some(Value::Null) => None,
            Some(v) => Some(v),
        }
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }
}

impl From<Value> for RawEvent {
    fn from(value: Value) -> Self {
        Self::new(value)
    }
}

/// Coarse urgency label attached to each normalized log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Info,
    Low,
    Medium,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "INFO",
            Severity::Low => "LOW",
            Severity::Medium => "MEDIUM",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogMetadata {
    pub event_timestamp: Option<String>,
    pub vendor: String,
    pub product: String,
    pub event_type: String,
}

/// Chronicle-compatible record built from one `RawEvent`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedLog {
    pub metadata: LogMetadata,
    pub category: String,
    pub severity: Severity,
    pub message: String,
    /// Passed through untouched, whatever JSON type the source used.
    pub event_id: Option<Value>,
    pub raw_log: String,
}

/// Calendar-day range (UTC) used to filter the events query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    /// The full UTC day before `now`.
    pub fn yesterday(now: DateTime<Utc>) -> Self {
        let start = (now - Duration::days(1)).date_naive();
        Self {
            start,
            end: start + Duration::days(1),
        }
    }

    pub fn start_param(&self) -> String {
        self.start.format(DATE_PARAM_FORMAT).to_string()
    }

    pub fn end_param(&self) -> String {
        self.end.format(DATE_PARAM_FORMAT).to_string()
    }
}

impl fmt::Display for DateWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} to {}", self.start_param(), self.end_param())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn yesterday_window_spans_one_day() {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 0, 30, 0).unwrap();
        let window = DateWindow::yesterday(now);
        assert_eq!(window.start_param(), "2024-02-29");
        assert_eq!(window.end_param(), "2024-03-01");
    }

    #[test]
    fn yesterday_window_crosses_year_boundary() {
        let now = Utc.with_ymd_and_hms(2025, 1, 1, 23, 59, 59).unwrap();
        let window = DateWindow::yesterday(now);
        assert_eq!(window.to_string(), "2024-12-31 to 2025-01-01");
    }

    #[test]
    fn raw_event_accessors_tolerate_odd_types() {
        let event = RawEvent::new(json!({
            "id": 42,
            "bundle": ["not", "a", "string"],
            "payload": null
        }));
        assert_eq!(event.raw_id(), Some(&json!(42)));
        assert_eq!(event.bundle(), None);
        assert_eq!(event.created(), None);
        assert!(event.payload().is_none());
    }

    #[test]
    fn raw_id_keeps_structured_ids() {
        let event = RawEvent::new(json!({"id": {"uuid": "abc", "seq": 3}}));
        assert_eq!(event.raw_id(), Some(&json!({"uuid": "abc", "seq": 3})));
        assert_eq!(RawEvent::new(json!({"id": null})).raw_id(), None);
    }

    #[test]
    fn severity_serializes_uppercase() {
        assert_eq!(serde_json::to_value(Severity::Medium).unwrap(), json!("MEDIUM"));
        assert_eq!(Severity::Info.to_string(), "INFO");
    }
}
