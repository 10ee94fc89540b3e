//! Answer composition and the end-to-end pipeline

mod composer;
mod pipeline;

pub use composer::{AnswerComposer, INSUFFICIENT_INFORMATION_ANSWER, SERVICE_UNAVAILABLE_ANSWER};
pub use pipeline::Pipeline;

use crate::error::Retriever;
use crate::search::{Citation, Intent, Routing, SearchMethod};
use serde::{Deserialize, Serialize};

/// Coarse confidence bucket shown to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceBand {
    High,
    Medium,
    Low,
}

impl ConfidenceBand {
    pub fn from_score(confidence: f64) -> Self {
        if confidence >= 0.8 {
            Self::High
        } else if confidence >= 0.5 {
            Self::Medium
        } else {
            Self::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

impl std::fmt::Display for ConfidenceBand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failure the pipeline recovered from while answering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Degradation {
    /// No rule matched; both retrievers were consulted
    ClassificationAmbiguous,
    /// A retriever's gateway failed or timed out
    RetrievalUnavailable { retriever: Retriever },
    /// Neither retriever produced evidence
    NoEvidenceFound,
    /// The completion service failed twice
    CompletionServiceError,
}

impl std::fmt::Display for Degradation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ClassificationAmbiguous => f.write_str("classification ambiguous"),
            Self::RetrievalUnavailable { retriever } => {
                write!(f, "{} retrieval unavailable", retriever)
            }
            Self::NoEvidenceFound => f.write_str("no evidence found"),
            Self::CompletionServiceError => f.write_str("completion service error"),
        }
    }
}

/// What callers get back for every question
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnswerEnvelope {
    pub answer: String,
    pub confidence: f64,
    pub band: ConfidenceBand,
    pub search_method: SearchMethod,
    pub citations: Vec<Citation>,
    pub source_count: usize,
    pub routing: Routing,
    pub intent: Intent,
    pub degradations: Vec<Degradation>,
}
