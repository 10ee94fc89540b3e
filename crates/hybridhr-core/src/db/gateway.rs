//! Read-only gateway traits for the record store and the vector index
//!
//! The core only ever reads through these traits. Storage engines sit behind
//! them and are free to implement the calls however they like.

use crate::error::Result;
use crate::search::Domain;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Field-name to value mapping of a structured record
pub type Record = serde_json::Map<String, serde_json::Value>;

/// Structured entity collections
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    Employees,
    Attendance,
    LeaveHistory,
    LeaveBalances,
}

impl Collection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Employees => "employees",
            Self::Attendance => "attendance_logs",
            Self::LeaveHistory => "leave_history",
            Self::LeaveBalances => "leave_balances",
        }
    }

    /// Semantic domain the collection's records belong to
    pub fn domain(&self) -> Domain {
        match self {
            Self::Employees => Domain::Employee,
            Self::Attendance => Domain::Attendance,
            Self::LeaveHistory | Self::LeaveBalances => Domain::Leave,
        }
    }
}

/// A record together with its store key
#[derive(Debug, Clone, PartialEq)]
pub struct StoredRecord {
    pub key: String,
    pub fields: Record,
}

/// Single predicate of a conjunctive filter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum FieldFilter {
    /// Case-insensitive equality
    Eq { field: String, value: String },
    /// Case-insensitive substring match
    Contains { field: String, value: String },
    /// Inclusive ISO-date range; either bound may be open
    Range {
        field: String,
        from: Option<String>,
        to: Option<String>,
    },
    /// Case-insensitive membership; an empty set matches nothing
    OneOf { field: String, values: Vec<String> },
}

impl FieldFilter {
    pub fn eq(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Eq {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn contains(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Contains {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn one_of(field: impl Into<String>, values: Vec<String>) -> Self {
        Self::OneOf {
            field: field.into(),
            values,
        }
    }

    pub fn field(&self) -> &str {
        match self {
            Self::Eq { field, .. }
            | Self::Contains { field, .. }
            | Self::Range { field, .. }
            | Self::OneOf { field, .. } => field,
        }
    }
}

/// Conjunction of field predicates
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filter(pub Vec<FieldFilter>);

impl Filter {
    pub fn new(filters: Vec<FieldFilter>) -> Self {
        Self(filters)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldFilter> {
        self.0.iter()
    }
}

/// Result ordering for `find_many`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sort {
    /// Store key ascending
    KeyAscending,
    /// A record field, ties broken by key ascending
    Field { name: String, ascending: bool },
}

/// Nearest-neighbour candidate returned by a vector index
#[derive(Debug, Clone, PartialEq)]
pub struct VectorHit {
    pub doc_id: String,
    pub similarity: f32,
    pub payload: String,
}

/// Read-only access to structured records
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// First record matching the filter
    async fn find_one(&self, collection: Collection, filter: &Filter)
        -> Result<Option<StoredRecord>>;

    /// Up to `limit` matching records in `sort` order
    async fn find_many(
        &self,
        collection: Collection,
        filter: &Filter,
        limit: usize,
        sort: &Sort,
    ) -> Result<Vec<StoredRecord>>;
}

/// Nearest-neighbour lookup over per-domain embedding indices
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Top `k` neighbours of `query_vector`, most similar first
    async fn search(&self, domain: Domain, query_vector: &[f32], k: usize)
        -> Result<Vec<VectorHit>>;
}
