//! Hybridhr Core Library
//!
//! Hybrid retrieval orchestration for HR questions.
//!
//! # Features
//! - Rule-based query classification into structured, semantic or hybrid routing
//! - Exact record lookups through a read-only record store gateway
//! - Embedding search over per-domain vector indices
//! - Deduplicating merge with calibrated confidence scores
//! - Bounded context assembly and grounded answer composition with citations

pub mod answer;
pub mod config;
pub mod db;
pub mod error;
pub mod llm;
pub mod search;

pub use answer::{AnswerComposer, AnswerEnvelope, ConfidenceBand, Degradation, Pipeline};
pub use config::{
    ClassifierConfig, Config, ContextConfig, LLMServiceConfig, RetrievalConfig, ScoringConfig,
};
pub use db::{
    Collection, Database, FieldFilter, Filter, Record, RecordStore, Sort, StoredRecord, VectorHit,
    VectorIndex,
};
pub use error::{Error, HybridError, Result, Retriever};
pub use llm::{ChatMessage, Embedder, HttpEmbedder, LLMClient, VLLMClient};
pub use search::{
    AssembledContext, Citation, ContextBuilder, Domain, Intent, ItemContent, MergedResult, Query,
    QueryClassifier, ResultMerger, RetrievedItem, Routing, SearchMethod, SemanticRetriever,
    SourceKind, StructuredRetriever,
};

/// Default cache directory name
pub const CACHE_DIR_NAME: &str = "hybridhr";

/// Default config directory name
pub const CONFIG_DIR_NAME: &str = "hybridhr";
