//! Database layer for hybridhr
//!
//! Provides SQLite-based storage behind the two read-only gateways:
//! - structured records filtered through `json_extract`
//! - per-domain embedding vectors searched by cosine similarity

pub mod gateway;
mod records;
mod schema;
pub mod vectors;

pub use gateway::{
    Collection, FieldFilter, Filter, Record, RecordStore, Sort, StoredRecord, VectorHit,
    VectorIndex,
};
pub use schema::Database;
use std::path::PathBuf;

impl Database {
    /// Get the default database path
    pub fn default_path() -> PathBuf {
        dirs::cache_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(crate::CACHE_DIR_NAME)
            .join("store.sqlite")
    }
}
