//! Output formatters

pub mod json;
pub mod terminal;

use crate::app::OutputFormat;
use anyhow::Result;
use hybridhr_core::{AnswerEnvelope, Query};

/// Format an answer envelope
pub fn format_envelope(envelope: &AnswerEnvelope, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => json::format_envelope(envelope),
        OutputFormat::Cli => Ok(terminal::format_envelope(envelope)),
    }
}

/// Format a routing decision
pub fn format_query(query: &Query, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => json::format_query(query),
        OutputFormat::Cli => Ok(terminal::format_query(query)),
    }
}
