//! JSON output formatter

use anyhow::Result;
use hybridhr_core::{AnswerEnvelope, Query};

pub fn format_envelope(envelope: &AnswerEnvelope) -> Result<String> {
    Ok(serde_json::to_string_pretty(envelope)? + "\n")
}

pub fn format_query(query: &Query) -> Result<String> {
    Ok(serde_json::to_string_pretty(query)? + "\n")
}
