//! Context assembly under a character budget

use super::{ItemContent, MergedResult, RetrievedItem};
use crate::config::ContextConfig;
use serde::{Deserialize, Serialize};

/// Appended to a single over-budget top item
pub const TRUNCATION_MARKER: &str = " [truncated]";

const DESCRIPTION_CHARS: usize = 80;

/// Source attribution for one rendered item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
    pub key: String,
    pub description: String,
}

/// Context block handed to the completion service
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssembledContext {
    pub text: String,
    /// Same order as the lines in `text`
    pub citations: Vec<Citation>,
    /// Whether any item was dropped or cut to fit the budget
    pub truncated: bool,
}

impl AssembledContext {
    pub fn is_empty(&self) -> bool {
        self.citations.is_empty()
    }
}

/// Renders merged evidence into one fact line per item
#[derive(Debug, Clone)]
pub struct ContextBuilder {
    config: ContextConfig,
}

impl ContextBuilder {
    pub fn new(config: ContextConfig) -> Self {
        Self { config }
    }

    /// Build the context text and citations, highest relevance first.
    ///
    /// Items are only dropped whole. The top item is always kept; if it alone
    /// exceeds the budget it is cut and carries [`TRUNCATION_MARKER`].
    pub fn build(&self, merged: &MergedResult) -> AssembledContext {
        let max_chars = self.config.max_chars;
        let mut lines: Vec<String> = Vec::new();
        let mut citations = Vec::new();
        let mut used = 0usize;
        let mut truncated = false;

        for (rank, item) in merged.items.iter().enumerate() {
            let line = self.render(item);
            let len = line.chars().count();

            if rank == 0 {
                if len > max_chars {
                    let keep = max_chars.saturating_sub(TRUNCATION_MARKER.chars().count());
                    let mut cut: String = line.chars().take(keep).collect();
                    cut.push_str(TRUNCATION_MARKER);
                    lines.push(cut);
                    citations.push(cite(item));
                    truncated = true;
                    break;
                }
                used = len;
            } else {
                // +1 for the newline separator
                if used + 1 + len > max_chars {
                    truncated = true;
                    break;
                }
                used += 1 + len;
            }

            lines.push(line);
            citations.push(cite(item));
        }

        if truncated {
            tracing::debug!(
                "Context truncated: kept {} of {} items",
                citations.len(),
                merged.items.len()
            );
        }

        AssembledContext {
            text: lines.join("\n"),
            citations,
            truncated,
        }
    }

    fn render(&self, item: &RetrievedItem) -> String {
        match &item.content {
            ItemContent::Record(fields) => {
                let mut present: Vec<_> = fields.iter().filter(|(_, v)| !v.is_null()).collect();
                present.sort_by(|a, b| a.0.cmp(b.0));
                let pairs: Vec<String> = present
                    .into_iter()
                    .map(|(field, value)| format!("{}: {}", field, display_value(value)))
                    .collect();
                format!("[{}] {}", item.key, pairs.join("; "))
            }
            ItemContent::Passage { text, .. } => {
                format!("[{}] {}", item.key, snippet(text, self.config.snippet_chars))
            }
        }
    }
}

fn cite(item: &RetrievedItem) -> Citation {
    let description = match &item.content {
        ItemContent::Record(fields) => match fields.get("name").and_then(|v| v.as_str()) {
            Some(name) => format!("{} record: {}", item.domain, name),
            None => format!("{} record", item.domain),
        },
        ItemContent::Passage { text, .. } => snippet(text, DESCRIPTION_CHARS),
    };
    Citation {
        key: item.key.clone(),
        description,
    }
}

fn display_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Collapse whitespace and cut to `max` characters
fn snippet(text: &str, max: usize) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() <= max {
        collapsed
    } else {
        let mut cut: String = collapsed.chars().take(max.saturating_sub(1)).collect();
        cut.push('…');
        cut
    }
}
