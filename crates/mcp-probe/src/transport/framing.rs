//! Message framing for newline-delimited JSON.

use serde::Serialize;
use serde_json::Value;

use crate::types::{ProbeError, ProbeResult};

/// Parse a single line of text as a JSON document.
pub fn parse_line(line: &str) -> ProbeResult<Value> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Err(ProbeError::Parse("Empty message".to_string()));
    }

    serde_json::from_str(trimmed).map_err(|e| ProbeError::Parse(e.to_string()))
}

/// Serialize a message to a JSON line (with trailing newline).
pub fn frame_message<T: Serialize>(message: &T) -> ProbeResult<String> {
    let mut json = serde_json::to_string(message).map_err(ProbeError::Json)?;
    json.push('\n');
    Ok(json)
}
