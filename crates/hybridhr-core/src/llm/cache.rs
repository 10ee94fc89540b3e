//! Query embedding cache
//!
//! Repeated questions skip the embedding round trip. Completions are never
//! cached: every answer is a fresh call.

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, SystemTime};

#[derive(Clone)]
struct CacheEntry {
    embedding: Vec<f32>,
    expires_at: SystemTime,
}

/// In-memory TTL cache keyed by model and text
pub struct EmbeddingCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
    ttl: Duration,
    capacity: usize,
}

impl EmbeddingCache {
    /// Create new cache with default TTL of 1 hour
    pub fn new() -> Self {
        Self::with_ttl(Duration::from_secs(3600))
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
            capacity: 4096,
        }
    }

    /// Get cached embedding if present and not expired
    pub fn get(&self, key: &str) -> Option<Vec<f32>> {
        let entries = self.entries.read().ok()?;
        let entry = entries.get(key)?;

        if SystemTime::now() < entry.expires_at {
            Some(entry.embedding.clone())
        } else {
            None
        }
    }

    pub fn set(&self, key: String, embedding: Vec<f32>) {
        let expires_at = SystemTime::now() + self.ttl;

        if let Ok(mut entries) = self.entries.write() {
            if entries.len() >= self.capacity {
                let now = SystemTime::now();
                entries.retain(|_, entry| now < entry.expires_at);
                if entries.len() >= self.capacity {
                    entries.clear();
                }
            }
            entries.insert(
                key,
                CacheEntry {
                    embedding,
                    expires_at,
                },
            );
        }
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for EmbeddingCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Generate cache key for embeddings
pub fn embedding_cache_key(model: &str, text: &str) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(model.as_bytes());
    hasher.update(&[0]);
    hasher.update(text.as_bytes());
    format!("embed:{}:{}", model, hasher.finalize().to_hex())
}
