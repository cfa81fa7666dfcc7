use crate::common::constants::{INVALID_PAYLOAD_MARKER, UNKNOWN_FIELD, VENDOR_NAME};
use crate::common::types::{LogMetadata, NormalizedLog, RawEvent, Severity};
use serde_json::{json, Value};
use tracing::debug;

/// Event types with a non-default severity. Everything else is `Severity::Info`.
const SEVERITY_TABLE: &[(&str, Severity)] = &[
    ("Policy triggered", Severity::Medium),
    ("System became stale", Severity::Low),
    ("New system registered", Severity::Info),
];

pub fn severity_for(event_type: &str) -> Severity {
    SEVERITY_TABLE
        .iter()
        .find(|(name, _)| *name == event_type)
        .map(|(_, severity)| *severity)
        .unwrap_or(Severity::Info)
}

/// Insights sometimes drops the trailing UTC marker from `created`.
pub fn normalize_timestamp(created: &str) -> String {
    if created.is_empty() || created.ends_with('Z') {
        created.to_string()
    } else {
        format!("{created}Z")
    }
}

/// Decodes the JSON-encoded payload string.
///
/// Never fails: anything that cannot be decoded is replaced by an object that
/// carries the marker, the decode failure and the original value.
pub fn parse_payload(payload: &Value) -> Value {
    let reason = match payload {
        Value::String(raw) => match serde_json::from_str::<Value>(raw) {
            Ok(parsed) => return parsed,
            Err(e) => e.to_string(),
        },
        other => format!(
            "expected a JSON-encoded string, found {}",
            json_type_name(other)
        ),
    };
    debug!("Payload could not be decoded: {}", reason);
    json!({
        "error": INVALID_PAYLOAD_MARKER,
        "reason": reason,
        "raw": payload,
    })
}

/// Converts one Insights event into a Chronicle-compatible log.
pub fn transform_event(event: &RawEvent) -> NormalizedLog {
    let bundle = event.bundle().unwrap_or(UNKNOWN_FIELD);
    let application = event.application().unwrap_or(UNKNOWN_FIELD);
    let event_type = event.event_type().unwrap_or(UNKNOWN_FIELD);

    let parsed_payload = event
        .payload()
        .filter(|p| !is_empty_value(p))
        .map(parse_payload);

    let raw_log = match parsed_payload {
        Some(parsed) if !is_empty_value(&parsed) => parsed.to_string(),
        _ => event.as_value().to_string(),
    };

    NormalizedLog {
        metadata: LogMetadata {
            event_timestamp: event.created().map(normalize_timestamp),
            vendor: VENDOR_NAME.to_string(),
            product: bundle.to_string(),
            event_type: event_type.to_string(),
        },
        category: application.to_lowercase(),
        severity: severity_for(event_type),
        message: format!("{event_type} event from {bundle} / {application}"),
        event_id: event.raw_id().cloned(),
        raw_log,
    }
}

/// One output per input, in input order.
pub fn transform_events(events: &[RawEvent]) -> Vec<NormalizedLog> {
    events.iter().map(transform_event).collect()
}

fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
