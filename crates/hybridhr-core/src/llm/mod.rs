//! LLM integration
//!
//! Provides traits and implementations for:
//! - Query embedding via external services (vLLM, OpenAI, etc.)
//! - Chat completions used to compose answers

mod cache;
mod client;
mod http_embedder;
mod traits;

pub use cache::{embedding_cache_key, EmbeddingCache};
pub use client::{ChatMessage, LLMClient, VLLMClient};
pub use http_embedder::HttpEmbedder;
pub use traits::*;
