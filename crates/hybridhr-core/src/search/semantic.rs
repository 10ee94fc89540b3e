//! Semantic retrieval through the per-domain vector indices

use super::{Domain, Query, RetrievedItem, Routing};
use crate::config::RetrievalConfig;
use crate::db::VectorIndex;
use crate::error::{HybridError, Result, Retriever};
use crate::llm::Embedder;
use futures::future::try_join_all;
use std::sync::Arc;
use tokio::time::timeout;

/// Embeds the question and searches the relevant domain indices
pub struct SemanticRetriever {
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorIndex>,
    config: RetrievalConfig,
}

impl SemanticRetriever {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        index: Arc<dyn VectorIndex>,
        config: RetrievalConfig,
    ) -> Self {
        Self {
            embedder,
            index,
            config,
        }
    }

    /// Domains searched for a query: every domain for hybrid routing or
    /// when no single domain is implied, otherwise the hinted one
    pub fn domains_for(query: &Query) -> Vec<Domain> {
        match (query.routing, query.domain_hint) {
            (Routing::Hybrid, _) | (_, None) => Domain::ALL.to_vec(),
            (_, Some(domain)) => vec![domain],
        }
    }

    /// Neighbours at or above the similarity threshold, in gateway order per domain
    pub async fn retrieve(&self, query: &Query) -> Result<Vec<RetrievedItem>> {
        let call_timeout = self.config.call_timeout();

        let vector = match timeout(call_timeout, self.embedder.embed(&query.text)).await {
            Ok(Ok(vector)) => vector,
            Ok(Err(e)) => return Err(HybridError::unavailable(Retriever::Semantic, e)),
            Err(_) => {
                return Err(HybridError::unavailable(
                    Retriever::Semantic,
                    HybridError::Timeout("embedding".to_string()),
                ))
            }
        };

        let domains = Self::domains_for(query);
        let searches = domains.iter().map(|&domain| {
            let vector = &vector;
            async move {
                match timeout(call_timeout, self.index.search(domain, vector, self.config.top_k))
                    .await
                {
                    Ok(Ok(hits)) => Ok((domain, hits)),
                    Ok(Err(e)) => Err(HybridError::unavailable(Retriever::Semantic, e)),
                    Err(_) => Err(HybridError::unavailable(
                        Retriever::Semantic,
                        HybridError::Timeout(format!("{} index", domain)),
                    )),
                }
            }
        });
        let per_domain = try_join_all(searches).await?;

        let threshold = self.config.similarity_threshold;
        let mut items = Vec::new();
        for (domain, hits) in per_domain {
            let before = hits.len();
            items.extend(
                hits.into_iter()
                    .filter(|hit| f64::from(hit.similarity) >= threshold)
                    .map(|hit| {
                        RetrievedItem::semantic(
                            domain,
                            &hit.doc_id,
                            hit.payload,
                            f64::from(hit.similarity),
                        )
                    }),
            );
            tracing::debug!(
                "{} index: {} neighbours, {} above threshold",
                domain,
                before,
                items.iter().filter(|i| i.domain == domain).count()
            );
        }

        Ok(items)
    }
}
