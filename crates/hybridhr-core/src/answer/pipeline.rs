//! End-to-end question answering
//!
//! classify -> retrieve (structured, semantic or both) -> merge -> context -> compose.
//! Every failure after startup is recovered here and recorded as a degradation.

use super::{AnswerComposer, AnswerEnvelope, Degradation};
use crate::config::{Config, RetrievalConfig, ScoringConfig};
use crate::db::{Database, RecordStore, VectorIndex};
use crate::error::{HybridError, Result, Retriever};
use crate::llm::{Embedder, HttpEmbedder, LLMClient, VLLMClient};
use crate::search::{
    ContextBuilder, Intent, Query, QueryClassifier, ResultMerger, RetrievedItem, Routing,
    SemanticRetriever, StructuredRetriever,
};
use std::sync::Arc;
use std::time::Instant;

/// Items from both retrievers plus the retrievers that failed
#[derive(Default)]
struct Retrieval {
    structured: Vec<RetrievedItem>,
    semantic: Vec<RetrievedItem>,
    unavailable: Vec<Retriever>,
}

impl Retrieval {
    fn record(&mut self, retriever: Retriever, result: Result<Vec<RetrievedItem>>) {
        match result {
            Ok(items) => match retriever {
                Retriever::Structured => self.structured = items,
                Retriever::Semantic => self.semantic = items,
            },
            Err(e) => {
                tracing::warn!("{}", e);
                self.unavailable.push(retriever);
            }
        }
    }
}

/// The single entry point callers use to answer questions
pub struct Pipeline {
    classifier: QueryClassifier,
    structured: StructuredRetriever,
    semantic: SemanticRetriever,
    merger: ResultMerger,
    context: ContextBuilder,
    composer: AnswerComposer,
    retrieval: RetrievalConfig,
    scoring: ScoringConfig,
}

impl Pipeline {
    /// Wire the pipeline from explicit gateways. Configuration errors are fatal here.
    pub fn new(
        config: &Config,
        store: Arc<dyn RecordStore>,
        index: Arc<dyn VectorIndex>,
        embedder: Arc<dyn Embedder>,
        llm: Arc<dyn LLMClient>,
    ) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            classifier: QueryClassifier::new(&config.classifier)?,
            structured: StructuredRetriever::new(store, config.retrieval.clone()),
            semantic: SemanticRetriever::new(embedder, index, config.retrieval.clone()),
            merger: ResultMerger::new(config.scoring.clone(), config.retrieval.max_results),
            context: ContextBuilder::new(config.context.clone()),
            composer: AnswerComposer::new(llm, config.retrieval.call_timeout()),
            retrieval: config.retrieval.clone(),
            scoring: config.scoring.clone(),
        })
    }

    /// Open the configured SQLite store read-only and connect to the LLM service
    pub fn from_config(config: &Config) -> Result<Self> {
        let path = config.database_path();
        if !path.exists() {
            return Err(HybridError::Config(format!(
                "database not found at {}",
                path.display()
            )));
        }

        let db = Arc::new(Database::open_read_only(&path)?);
        let llm: Arc<dyn LLMClient> = Arc::new(VLLMClient::new(config.llm_service.clone())?);
        let embedder = Arc::new(HttpEmbedder::new(Arc::clone(&llm)));

        Self::new(config, db.clone(), db, embedder, llm)
    }

    /// Classify without retrieving
    pub fn classify(&self, question: &str) -> Query {
        self.classifier.classify(question)
    }

    /// Answer a question. Never fails; degraded paths are reported in the envelope.
    pub async fn answer(&self, question: &str) -> AnswerEnvelope {
        let start = Instant::now();
        let query = self.classify(question);
        let mut degradations = Vec::new();

        if query.intent == Intent::Unknown {
            degradations.push(Degradation::ClassificationAmbiguous);
        }

        tracing::info!(
            "Routing '{}' as {} ({})",
            question,
            query.routing,
            query.intent
        );

        let retrieval = self.retrieve(&query).await;
        for &retriever in &retrieval.unavailable {
            degradations.push(Degradation::RetrievalUnavailable { retriever });
        }

        let mut merged = self
            .merger
            .merge(query.routing, &retrieval.structured, &retrieval.semantic);

        if !retrieval.unavailable.is_empty() {
            merged.confidence *= self.scoring.unavailable_penalty;
        }
        if merged.is_empty() {
            degradations.push(Degradation::NoEvidenceFound);
        }

        let context = self.context.build(&merged);
        let mut envelope = self
            .composer
            .compose(&query, context, merged.confidence, merged.search_method)
            .await;

        if !envelope.citations.is_empty() {
            envelope.source_count = merged.source_count;
        }
        degradations.append(&mut envelope.degradations);
        envelope.degradations = degradations;

        tracing::info!(
            "Answered via {} with confidence {:.2} ({} sources, {} degradations) in {}ms",
            envelope.search_method,
            envelope.confidence,
            envelope.source_count,
            envelope.degradations.len(),
            start.elapsed().as_millis()
        );

        envelope
    }

    async fn retrieve(&self, query: &Query) -> Retrieval {
        let mut retrieval = Retrieval::default();

        match query.routing {
            Routing::Structured => {
                let result = self.structured.retrieve(query).await;
                let fall_back = match &result {
                    Ok(items) => items.is_empty() && self.retrieval.semantic_fallback,
                    Err(_) => true,
                };
                retrieval.record(Retriever::Structured, result);

                if fall_back {
                    tracing::info!("No structured evidence, falling back to semantic search");
                    let result = self.semantic.retrieve(query).await;
                    retrieval.record(Retriever::Semantic, result);
                }
            }
            Routing::Semantic => {
                let result = self.semantic.retrieve(query).await;
                let unavailable = result.is_err();
                retrieval.record(Retriever::Semantic, result);

                if unavailable {
                    let result = self.structured.retrieve(query).await;
                    retrieval.record(Retriever::Structured, result);
                }
            }
            Routing::Hybrid => {
                let (structured, semantic) = futures::join!(
                    self.structured.retrieve(query),
                    self.semantic.retrieve(query)
                );
                retrieval.record(Retriever::Structured, structured);
                retrieval.record(Retriever::Semantic, semantic);
            }
        }

        retrieval
    }
}
