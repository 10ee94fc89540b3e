//! Vector storage operations
//!
//! Stores embeddings as BLOBs and computes cosine similarity in Rust.

use super::gateway::{VectorHit, VectorIndex};
use super::Database;
use crate::error::Result;
use crate::search::Domain;
use async_trait::async_trait;
use chrono::Utc;
use rusqlite::params;

impl Database {
    /// Insert or replace the embedding of a document in a domain index
    pub fn insert_vector(
        &self,
        domain: Domain,
        doc_id: &str,
        embedding: &[f32],
        payload: &str,
        model: Option<&str>,
    ) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        self.conn()?.execute(
            "INSERT OR REPLACE INTO vectors (domain, doc_id, embedding, payload, model, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                domain.as_str(),
                doc_id,
                embedding_to_bytes(embedding),
                payload,
                model,
                now
            ],
        )?;
        Ok(())
    }

    /// Count vectors stored for a domain
    pub fn count_vectors(&self, domain: Domain) -> Result<usize> {
        let count: i64 = self.conn()?.query_row(
            "SELECT COUNT(*) FROM vectors WHERE domain = ?1",
            params![domain.as_str()],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    /// Get all embeddings of a domain in insertion order
    fn get_domain_embeddings(&self, domain: Domain) -> Result<Vec<(String, Vec<f32>, String)>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT doc_id, embedding, payload FROM vectors WHERE domain = ?1 ORDER BY rowid",
        )?;

        let results = stmt
            .query_map(params![domain.as_str()], |row| {
                let doc_id: String = row.get(0)?;
                let embedding_bytes: Vec<u8> = row.get(1)?;
                let payload: String = row.get(2)?;
                Ok((doc_id, bytes_to_embedding(&embedding_bytes), payload))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(results)
    }
}

#[async_trait]
impl VectorIndex for Database {
    async fn search(
        &self,
        domain: Domain,
        query_vector: &[f32],
        k: usize,
    ) -> Result<Vec<VectorHit>> {
        let stored = self.get_domain_embeddings(domain)?;

        let mut hits: Vec<VectorHit> = stored
            .into_iter()
            .map(|(doc_id, embedding, payload)| {
                if embedding.len() != query_vector.len() {
                    tracing::warn!(
                        "Dimension mismatch in {} index for {}: {} vs {}",
                        domain.as_str(),
                        doc_id,
                        embedding.len(),
                        query_vector.len()
                    );
                }
                VectorHit {
                    similarity: cosine_similarity(query_vector, &embedding),
                    doc_id,
                    payload,
                }
            })
            .collect();

        // Stable: equal similarities keep insertion order
        hits.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
        hits.truncate(k);
        Ok(hits)
    }
}

/// Convert f32 embedding to bytes
pub fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
    embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
}

/// Convert bytes to f32 embedding
pub fn bytes_to_embedding(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}

/// Compute cosine similarity between two embeddings
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a * norm_b)
}
