//! Terminal output formatter

use hybridhr_core::{AnswerEnvelope, FieldFilter, Query};

pub fn format_envelope(envelope: &AnswerEnvelope) -> String {
    let mut output = String::new();

    output.push_str(&envelope.answer);
    output.push_str("\n\n");

    let score_pct = (envelope.confidence * 100.0).round() as u32;
    output.push_str(&format!(
        "Confidence: {}% ({}) via {} search, {} sources\n",
        score_pct, envelope.band, envelope.search_method, envelope.source_count
    ));

    if !envelope.citations.is_empty() {
        output.push_str("Sources:\n");
        for citation in &envelope.citations {
            output.push_str(&format!("  {}  {}\n", citation.key, citation.description));
        }
    }

    for degradation in &envelope.degradations {
        output.push_str(&format!("Note: {}\n", degradation));
    }

    output
}

pub fn format_query(query: &Query) -> String {
    let mut output = format!("intent:   {}\nrouting:  {}\n", query.intent, query.routing);

    if let Some(ref id) = query.entity_id {
        output.push_str(&format!("entity:   {}\n", id));
    }
    if let Some(domain) = query.domain_hint {
        output.push_str(&format!("domain:   {}\n", domain));
    }
    for filter in &query.filters {
        output.push_str(&format!("filter:   {}\n", describe_filter(filter)));
    }

    output
}

fn describe_filter(filter: &FieldFilter) -> String {
    match filter {
        FieldFilter::Eq { field, value } => format!("{} = {}", field, value),
        FieldFilter::Contains { field, value } => format!("{} contains {}", field, value),
        FieldFilter::Range { field, from, to } => format!(
            "{} in [{}, {}]",
            field,
            from.as_deref().unwrap_or("..."),
            to.as_deref().unwrap_or("...")
        ),
        FieldFilter::OneOf { field, values } => format!("{} in {{{}}}", field, values.join(", ")),
    }
}
