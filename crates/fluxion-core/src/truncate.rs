use serde_json::Value;

/// Maximum characters for any string embedded in an event payload.
pub const EVENT_STR_MAX: usize = 500;

/// Maximum characters for a serialized input/output summary.
pub const SUMMARY_MAX: usize = 200;

const ELLIPSIS: char = '\u{2026}';

fn truncate_chars(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max).collect();
    out.push(ELLIPSIS);
    out
}

/// Bound a string destined for an event payload to 500 chars plus an
/// ellipsis marker (501 total).
pub fn truncate_event_str(s: &str) -> String {
    truncate_chars(s, EVENT_STR_MAX)
}

/// Bound a serialized summary to 200 chars plus an ellipsis marker.
pub fn truncate_summary(s: &str) -> String {
    truncate_chars(s, SUMMARY_MAX)
}

/// Walk a JSON value and truncate every embedded string to the event
/// payload bound. Applied once when an event is appended to the trace.
pub fn truncate_json_strings(value: Value) -> Value {
    match value {
        Value::String(s) => Value::String(truncate_event_str(&s)),
        Value::Array(items) => Value::Array(items.into_iter().map(truncate_json_strings).collect()),
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(k, v)| (k, truncate_json_strings(v)))
                .collect(),
        ),
        other => other,
    }
}
