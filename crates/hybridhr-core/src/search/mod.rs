//! Hybrid retrieval core
//!
//! Provides:
//! - Rule-table query classification and routing
//! - Structured retrieval through the record store gateway
//! - Semantic retrieval through the per-domain vector indices
//! - Deduplicating merge with confidence scoring
//! - Bounded context assembly with citations

mod classifier;
mod context;
mod merge;
mod semantic;
mod structured;

pub use classifier::{Intent, Query, QueryClassifier, Routing};
pub use context::{AssembledContext, Citation, ContextBuilder, TRUNCATION_MARKER};
pub use merge::ResultMerger;
pub use semantic::SemanticRetriever;
pub use structured::StructuredRetriever;

use crate::db::Record;
use serde::{Deserialize, Serialize};

/// Semantic domain an item belongs to; one vector index exists per domain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    Employee,
    Attendance,
    Leave,
    Policy,
}

impl Domain {
    /// Every domain, in the order hybrid searches visit them
    pub const ALL: [Domain; 4] = [
        Domain::Employee,
        Domain::Attendance,
        Domain::Leave,
        Domain::Policy,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Employee => "employee",
            Self::Attendance => "attendance",
            Self::Leave => "leave",
            Self::Policy => "policy",
        }
    }
}

impl std::fmt::Display for Domain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which retriever produced an item. Structured sorts before semantic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Structured,
    Semantic,
}

/// Payload of a retrieved item
#[derive(Debug, Clone, PartialEq)]
pub enum ItemContent {
    /// Field map of a structured record
    Record(Record),
    /// Free-text passage and the document it came from
    Passage { text: String, document_id: String },
}

/// A single unit of evidence from either retriever
#[derive(Debug, Clone, PartialEq)]
pub struct RetrievedItem {
    pub domain: Domain,
    pub source: SourceKind,
    pub content: ItemContent,
    /// In [0, 1]
    pub relevance: f64,
    /// `"<domain>:<record id>"`, unique within a merged result
    pub key: String,
}

impl RetrievedItem {
    /// Exact structured match
    pub fn structured(domain: Domain, record_id: &str, fields: Record) -> Self {
        Self {
            domain,
            source: SourceKind::Structured,
            content: ItemContent::Record(fields),
            relevance: 1.0,
            key: identity_key(domain, record_id),
        }
    }

    /// Nearest-neighbour hit; relevance is the similarity clamped to [0, 1]
    pub fn semantic(domain: Domain, document_id: &str, text: String, similarity: f64) -> Self {
        let relevance = if similarity.is_nan() {
            0.0
        } else {
            similarity.clamp(0.0, 1.0)
        };
        Self {
            domain,
            source: SourceKind::Semantic,
            content: ItemContent::Passage {
                text,
                document_id: document_id.to_string(),
            },
            relevance,
            key: identity_key(domain, document_id),
        }
    }
}

/// Build the deduplication key shared by both retrievers
pub fn identity_key(domain: Domain, record_id: &str) -> String {
    format!("{}:{}", domain.as_str(), record_id)
}

/// Label describing which retrievers the kept evidence came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchMethod {
    Structured,
    Semantic,
    Hybrid,
}

impl SearchMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Structured => "structured",
            Self::Semantic => "semantic",
            Self::Hybrid => "hybrid",
        }
    }
}

impl std::fmt::Display for SearchMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Routing> for SearchMethod {
    fn from(routing: Routing) -> Self {
        match routing {
            Routing::Structured => Self::Structured,
            Routing::Semantic => Self::Semantic,
            Routing::Hybrid => Self::Hybrid,
        }
    }
}

/// Ranked, deduplicated evidence with its confidence
#[derive(Debug, Clone, PartialEq)]
pub struct MergedResult {
    pub items: Vec<RetrievedItem>,
    pub confidence: f64,
    pub search_method: SearchMethod,
    /// Number of items kept
    pub source_count: usize,
}

impl MergedResult {
    /// No evidence at all; confidence is 0.0
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_key_format() {
        assert_eq!(identity_key(Domain::Employee, "EMP1005"), "employee:EMP1005");
        let item = RetrievedItem::semantic(Domain::Policy, "policy-7", "text".into(), 0.5);
        assert_eq!(item.key, "policy:policy-7");
    }

    #[test]
    fn test_semantic_relevance_is_clamped() {
        let high = RetrievedItem::semantic(Domain::Leave, "a", String::new(), 1.2);
        let low = RetrievedItem::semantic(Domain::Leave, "b", String::new(), -0.4);
        let nan = RetrievedItem::semantic(Domain::Leave, "c", String::new(), f64::NAN);
        assert_eq!(high.relevance, 1.0);
        assert_eq!(low.relevance, 0.0);
        assert_eq!(nan.relevance, 0.0);
    }

    #[test]
    fn test_structured_items_are_exact() {
        let item = RetrievedItem::structured(Domain::Employee, "EMP1", Record::new());
        assert_eq!(item.relevance, 1.0);
        assert_eq!(item.source, SourceKind::Structured);
        assert!(SourceKind::Structured < SourceKind::Semantic);
    }
}
