//! Structured retrieval through the record store gateway

use super::{Intent, Query, RetrievedItem};
use crate::config::RetrievalConfig;
use crate::db::{Collection, FieldFilter, Filter, RecordStore, Sort, StoredRecord};
use crate::error::{HybridError, Result, Retriever};
use std::sync::Arc;
use tokio::time::timeout;

/// Translates classified queries into exact record lookups
pub struct StructuredRetriever {
    store: Arc<dyn RecordStore>,
    config: RetrievalConfig,
}

impl StructuredRetriever {
    pub fn new(store: Arc<dyn RecordStore>, config: RetrievalConfig) -> Self {
        Self { store, config }
    }

    /// Exact matches for entity lookups and filtered record queries.
    ///
    /// Aggregate and unknown queries with recognised filters issue a capped
    /// `find_many`; policy questions make no gateway call. Gateway errors and
    /// timeouts surface as `RetrievalUnavailable`.
    pub async fn retrieve(&self, query: &Query) -> Result<Vec<RetrievedItem>> {
        let records = match query.intent {
            Intent::EntityLookup => {
                let Some(ref id) = query.entity_id else {
                    return Ok(Vec::new());
                };
                let filter = Filter::new(vec![FieldFilter::eq("emp_id", id.as_str())]);
                let found = self
                    .bounded(self.store.find_one(Collection::Employees, &filter))
                    .await?;
                found
                    .into_iter()
                    .map(|record| (Collection::Employees, record))
                    .collect::<Vec<_>>()
            }
            Intent::AggregateFilter | Intent::Unknown => {
                if query.filters.is_empty() {
                    return Ok(Vec::new());
                }
                self.find_filtered(&query.filters).await?
            }
            Intent::PolicyQuestion => return Ok(Vec::new()),
        };

        tracing::debug!("Structured retrieval returned {} records", records.len());

        Ok(records
            .into_iter()
            .map(|(collection, record)| {
                RetrievedItem::structured(collection.domain(), &record.key, record.fields)
            })
            .collect())
    }

    /// Employee predicates go to `employees`. When leave predicates are present
    /// the matching employees' ids narrow the `leave_history` query.
    async fn find_filtered(
        &self,
        filters: &[FieldFilter],
    ) -> Result<Vec<(Collection, StoredRecord)>> {
        let (leave, employee): (Vec<_>, Vec<_>) = filters
            .iter()
            .cloned()
            .partition(|f| is_leave_field(f.field()));

        if leave.is_empty() {
            return self.find_in(Collection::Employees, employee).await;
        }

        let mut leave_filters = leave;
        if !employee.is_empty() {
            let employees = self.find_in(Collection::Employees, employee).await?;
            if employees.is_empty() {
                return Ok(Vec::new());
            }
            let ids = employees
                .iter()
                .map(|(_, record)| employee_id(record))
                .collect();
            leave_filters.push(FieldFilter::one_of("emp_id", ids));
        }

        self.find_in(Collection::LeaveHistory, leave_filters).await
    }

    async fn find_in(
        &self,
        collection: Collection,
        filters: Vec<FieldFilter>,
    ) -> Result<Vec<(Collection, StoredRecord)>> {
        let found = self
            .bounded(self.store.find_many(
                collection,
                &Filter::new(filters),
                self.config.structured_limit,
                &Sort::KeyAscending,
            ))
            .await?;
        Ok(found.into_iter().map(|record| (collection, record)).collect())
    }

    async fn bounded<T>(
        &self,
        call: impl std::future::Future<Output = Result<T>>,
    ) -> Result<T> {
        match timeout(self.config.call_timeout(), call).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(HybridError::unavailable(Retriever::Structured, e)),
            Err(_) => Err(HybridError::unavailable(
                Retriever::Structured,
                HybridError::Timeout("record store".to_string()),
            )),
        }
    }
}

fn is_leave_field(field: &str) -> bool {
    matches!(field, "leave_type" | "status")
}

/// `emp_id` field of an employee record, falling back to its store key
fn employee_id(record: &StoredRecord) -> String {
    record
        .fields
        .get("emp_id")
        .and_then(|v| v.as_str())
        .unwrap_or(&record.key)
        .to_string()
}
