// crates/rdap-daemon/src/output.rs
//
// Output formatting for the daemon: pretty JSON for one-shot commands,
// compact single-line JSON for the query loop.

use serde::Serialize;

/// Format a serializable value as a pretty-printed JSON string.
pub fn format_json<T: Serialize>(data: &T) -> String {
    serde_json::to_string_pretty(data).unwrap_or_else(|e| format!("JSON serialization error: {}", e))
}

/// Format a value as one line of JSON.
pub fn format_line<T: Serialize>(data: &T) -> String {
    serde_json::to_string(data)
        .unwrap_or_else(|e| format!("{{\"outcome\":\"error\",\"error\":\"{}\"}}", e))
}
