//! Result merging, deduplication and confidence scoring

use super::{MergedResult, RetrievedItem, Routing, SearchMethod, SourceKind};
use crate::config::ScoringConfig;
use std::collections::HashSet;

/// Deduplicates, ranks and scores evidence from both retrievers
#[derive(Debug, Clone)]
pub struct ResultMerger {
    scoring: ScoringConfig,
    max_results: usize,
}

impl ResultMerger {
    pub fn new(scoring: ScoringConfig, max_results: usize) -> Self {
        Self {
            scoring,
            max_results,
        }
    }

    /// Merge the two item lists. Pure; merging a merged result again yields the same result.
    pub fn merge(
        &self,
        routing: Routing,
        structured: &[RetrievedItem],
        semantic: &[RetrievedItem],
    ) -> MergedResult {
        // Structured first so a record seen by both retrievers keeps its exact version
        let mut seen = HashSet::new();
        let mut items: Vec<RetrievedItem> = structured
            .iter()
            .chain(semantic.iter())
            .filter(|item| seen.insert(item.key.as_str()))
            .cloned()
            .collect();

        // Stable sort: equal keys keep retrieval order
        items.sort_by(|a, b| {
            b.relevance
                .total_cmp(&a.relevance)
                .then_with(|| a.source.cmp(&b.source))
        });
        items.truncate(self.max_results);

        let confidence = self.confidence(routing, &items);
        let search_method = label(routing, &items);

        MergedResult {
            source_count: items.len(),
            items,
            confidence,
            search_method,
        }
    }

    fn confidence(&self, routing: Routing, items: &[RetrievedItem]) -> f64 {
        if items.is_empty() {
            return 0.0;
        }

        let exact_match = items
            .iter()
            .any(|i| i.source == SourceKind::Structured && i.relevance >= 1.0);
        if routing == Routing::Structured && exact_match {
            return self.scoring.structured_ceiling;
        }

        let mean = items.iter().map(|i| i.relevance).sum::<f64>() / items.len() as f64;
        let score = if items.len() == 1 {
            mean * self.scoring.single_source_penalty
        } else {
            mean
        };
        score.clamp(0.0, 1.0)
    }
}

fn label(routing: Routing, items: &[RetrievedItem]) -> SearchMethod {
    let structured = items.iter().any(|i| i.source == SourceKind::Structured);
    let semantic = items.iter().any(|i| i.source == SourceKind::Semantic);
    match (structured, semantic) {
        (true, false) => SearchMethod::Structured,
        (false, true) => SearchMethod::Semantic,
        (true, true) => SearchMethod::Hybrid,
        (false, false) => SearchMethod::from(routing),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Record;
    use crate::search::Domain;

    fn merger() -> ResultMerger {
        ResultMerger::new(ScoringConfig::default(), 5)
    }

    fn exact(id: &str) -> RetrievedItem {
        RetrievedItem::structured(Domain::Employee, id, Record::new())
    }

    fn hit(domain: Domain, id: &str, similarity: f64) -> RetrievedItem {
        RetrievedItem::semantic(domain, id, format!("passage {}", id), similarity)
    }

    #[test]
    fn test_exact_lookup_hits_ceiling() {
        let result = merger().merge(Routing::Structured, &[exact("EMP1005")], &[]);
        assert_eq!(result.items.len(), 1);
        assert_eq!(result.confidence, 0.95);
        assert_eq!(result.search_method, SearchMethod::Structured);
        assert_eq!(result.source_count, 1);
    }

    #[test]
    fn test_dedup_keeps_structured_version() {
        let semantic = [
            hit(Domain::Employee, "EMP1005", 0.7),
            hit(Domain::Policy, "p1", 0.6),
        ];
        let result = merger().merge(Routing::Hybrid, &[exact("EMP1005")], &semantic);
        assert_eq!(result.items.len(), 2);
        assert_eq!(result.items[0].source, SourceKind::Structured);
        assert_eq!(result.items[0].key, "employee:EMP1005");
        assert_eq!(result.search_method, SearchMethod::Hybrid);
        assert!((result.confidence - 0.8).abs() < 1e-9);
    }

    #[test]
    fn test_ordering_and_ties() {
        let semantic = [
            hit(Domain::Policy, "a", 0.5),
            hit(Domain::Policy, "b", 0.9),
            hit(Domain::Leave, "c", 0.5),
            hit(Domain::Policy, "d", 1.0),
        ];
        let result = merger().merge(Routing::Hybrid, &[exact("EMP1")], &semantic);
        let keys: Vec<_> = result.items.iter().map(|i| i.key.as_str()).collect();
        assert_eq!(
            keys,
            vec!["employee:EMP1", "policy:d", "policy:b", "policy:a", "leave:c"]
        );
    }

    #[test]
    fn test_truncates_to_cap() {
        let semantic: Vec<_> = (0..9)
            .map(|n| hit(Domain::Policy, &n.to_string(), 0.4 + n as f64 / 100.0))
            .collect();
        let result = merger().merge(Routing::Semantic, &[], &semantic);
        assert_eq!(result.items.len(), 5);
        assert_eq!(result.items[0].key, "policy:8");
    }

    #[test]
    fn test_single_semantic_item_is_penalised() {
        let result = merger().merge(Routing::Semantic, &[], &[hit(Domain::Policy, "p", 0.8)]);
        assert!((result.confidence - 0.68).abs() < 1e-9);
        assert_eq!(result.search_method, SearchMethod::Semantic);
    }

    #[test]
    fn test_structured_item_on_hybrid_route_uses_mean() {
        let result = merger().merge(Routing::Hybrid, &[exact("EMP1")], &[]);
        assert!((result.confidence - 0.85).abs() < 1e-9);
    }

    #[test]
    fn test_empty_merge() {
        let result = merger().merge(Routing::Semantic, &[], &[]);
        assert!(result.is_empty());
        assert_eq!(result.confidence, 0.0);
        assert_eq!(result.source_count, 0);
        assert_eq!(result.search_method, SearchMethod::Semantic);
    }

    #[test]
    fn test_merge_is_idempotent() {
        let semantic = [
            hit(Domain::Policy, "a", 0.5),
            hit(Domain::Employee, "EMP2", 0.9),
        ];
        let m = merger();
        let once = m.merge(Routing::Hybrid, &[exact("EMP2"), exact("EMP3")], &semantic);
        let (s, v): (Vec<_>, Vec<_>) = once
            .items
            .iter()
            .cloned()
            .partition(|i| i.source == SourceKind::Structured);
        let twice = m.merge(Routing::Hybrid, &s, &v);
        assert_eq!(once, twice);
    }
}
