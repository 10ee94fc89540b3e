//! Structured record storage
//!
//! Records are stored as JSON objects and filtered with `json_extract`.

use super::gateway::{Collection, FieldFilter, Filter, Record, RecordStore, Sort, StoredRecord};
use super::Database;
use crate::error::Result;
use async_trait::async_trait;
use chrono::Utc;
use rusqlite::params;
use rusqlite::types::Value;

impl Database {
    /// Insert or replace a record (used by the ingestion phase and tests)
    pub fn insert_record(&self, collection: Collection, key: &str, fields: &Record) -> Result<()> {
        let data = serde_json::to_string(fields)?;
        let now = Utc::now().to_rfc3339();
        self.conn()?.execute(
            "INSERT OR REPLACE INTO records (collection, key, data, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![collection.as_str(), key, data, now],
        )?;
        Ok(())
    }

    /// Count records in a collection
    pub fn count_records(&self, collection: Collection) -> Result<usize> {
        let count: i64 = self.conn()?.query_row(
            "SELECT COUNT(*) FROM records WHERE collection = ?1",
            params![collection.as_str()],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    fn query_records(
        &self,
        collection: Collection,
        filter: &Filter,
        limit: usize,
        sort: &Sort,
    ) -> Result<Vec<StoredRecord>> {
        let (where_sql, mut values) = compile_filter(collection, filter);

        let order_sql = match sort {
            Sort::KeyAscending => "ORDER BY key ASC".to_string(),
            Sort::Field { name, ascending } => {
                values.push(Value::Text(json_path(name)));
                format!(
                    "ORDER BY json_extract(data, ?{}) {}, key ASC",
                    values.len(),
                    if *ascending { "ASC" } else { "DESC" }
                )
            }
        };

        values.push(Value::Integer(limit.min(i64::MAX as usize) as i64));
        let sql = format!(
            "SELECT key, data FROM records WHERE {} {} LIMIT ?{}",
            where_sql,
            order_sql,
            values.len()
        );

        let conn = self.conn()?;
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(rusqlite::params_from_iter(values.iter()), |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(key, data)| {
                let fields: Record = serde_json::from_str(&data)?;
                Ok(StoredRecord { key, fields })
            })
            .collect()
    }
}

fn json_path(field: &str) -> String {
    format!("$.{}", field)
}

/// Compile a conjunctive filter into a WHERE clause with positional parameters
fn compile_filter(collection: Collection, filter: &Filter) -> (String, Vec<Value>) {
    let mut clauses = vec!["collection = ?1".to_string()];
    let mut values = vec![Value::Text(collection.as_str().to_string())];

    for predicate in filter.iter() {
        values.push(Value::Text(json_path(predicate.field())));
        let path_idx = values.len();

        match predicate {
            FieldFilter::Eq { value, .. } => {
                values.push(Value::Text(value.clone()));
                clauses.push(format!(
                    "LOWER(json_extract(data, ?{})) = LOWER(?{})",
                    path_idx,
                    values.len()
                ));
            }
            FieldFilter::Contains { value, .. } => {
                values.push(Value::Text(value.clone()));
                clauses.push(format!(
                    "INSTR(LOWER(json_extract(data, ?{})), LOWER(?{})) > 0",
                    path_idx,
                    values.len()
                ));
            }
            FieldFilter::Range { from, to, .. } => {
                if let Some(from) = from {
                    values.push(Value::Text(from.clone()));
                    clauses.push(format!(
                        "substr(json_extract(data, ?{}), 1, 10) >= ?{}",
                        path_idx,
                        values.len()
                    ));
                }
                if let Some(to) = to {
                    values.push(Value::Text(to.clone()));
                    clauses.push(format!(
                        "substr(json_extract(data, ?{}), 1, 10) <= ?{}",
                        path_idx,
                        values.len()
                    ));
                }
                if from.is_none() && to.is_none() {
                    clauses.push(format!("json_extract(data, ?{}) IS NOT NULL", path_idx));
                }
            }
            FieldFilter::OneOf { values: members, .. } => {
                if members.is_empty() {
                    clauses.push(format!("(0 AND json_extract(data, ?{}) IS NULL)", path_idx));
                    continue;
                }
                let mut placeholders = Vec::with_capacity(members.len());
                for member in members {
                    values.push(Value::Text(member.clone()));
                    placeholders.push(format!("LOWER(?{})", values.len()));
                }
                clauses.push(format!(
                    "LOWER(json_extract(data, ?{})) IN ({})",
                    path_idx,
                    placeholders.join(", ")
                ));
            }
        }
    }

    (clauses.join(" AND "), values)
}

#[async_trait]
impl RecordStore for Database {
    async fn find_one(
        &self,
        collection: Collection,
        filter: &Filter,
    ) -> Result<Option<StoredRecord>> {
        let mut found = self.query_records(collection, filter, 1, &Sort::KeyAscending)?;
        Ok(found.pop())
    }

    async fn find_many(
        &self,
        collection: Collection,
        filter: &Filter,
        limit: usize,
        sort: &Sort,
    ) -> Result<Vec<StoredRecord>> {
        self.query_records(collection, filter, limit, sort)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: serde_json::Value) -> Record {
        value.as_object().cloned().unwrap()
    }

    fn seeded() -> Database {
        let db = Database::open_in_memory().unwrap();
        db.initialize().unwrap();
        let rows = [
            ("EMP1003", "Ravi", "Engineering", "Singapore", "2021-06-01"),
            ("EMP1001", "Anna", "Engineering", "London", "2019-02-11"),
            ("EMP1002", "Priya Nair", "Marketing", "Singapore", "2021-01-15T00:00:00"),
        ];
        for (id, name, dept, loc, joined) in rows {
            db.insert_record(
                Collection::Employees,
                id,
                &record(json!({
                    "emp_id": id,
                    "name": name,
                    "department": dept,
                    "location": loc,
                    "joining_date": joined,
                })),
            )
            .unwrap();
        }
        db
    }

    #[tokio::test]
    async fn test_find_one_case_insensitive() {
        let db = seeded();
        let filter = Filter::new(vec![FieldFilter::eq("emp_id", "emp1002")]);
        let found = db.find_one(Collection::Employees, &filter).await.unwrap();
        assert_eq!(found.unwrap().fields["name"], json!("Priya Nair"));

        let missing = Filter::new(vec![FieldFilter::eq("emp_id", "EMP9999")]);
        assert!(db.find_one(Collection::Employees, &missing).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_find_many_conjunctive_sorted_and_capped() {
        let db = seeded();
        let filter = Filter::new(vec![FieldFilter::eq("department", "engineering")]);
        let found = db
            .find_many(Collection::Employees, &filter, 20, &Sort::KeyAscending)
            .await
            .unwrap();
        let keys: Vec<_> = found.iter().map(|r| r.key.as_str()).collect();
        assert_eq!(keys, vec!["EMP1001", "EMP1003"]);

        let capped = db
            .find_many(Collection::Employees, &Filter::default(), 2, &Sort::KeyAscending)
            .await
            .unwrap();
        assert_eq!(capped.len(), 2);

        let both = Filter::new(vec![
            FieldFilter::eq("department", "Engineering"),
            FieldFilter::eq("location", "Singapore"),
        ]);
        let found = db
            .find_many(Collection::Employees, &both, 20, &Sort::KeyAscending)
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].key, "EMP1003");
    }

    #[tokio::test]
    async fn test_contains_and_range() {
        let db = seeded();
        let by_name = Filter::new(vec![FieldFilter::contains("name", "priya")]);
        let found = db
            .find_many(Collection::Employees, &by_name, 5, &Sort::KeyAscending)
            .await
            .unwrap();
        assert_eq!(found.len(), 1);

        let joined_2021 = Filter::new(vec![FieldFilter::Range {
            field: "joining_date".to_string(),
            from: Some("2021-01-01".to_string()),
            to: Some("2021-12-31".to_string()),
        }]);
        let found = db
            .find_many(Collection::Employees, &joined_2021, 20, &Sort::KeyAscending)
            .await
            .unwrap();
        let keys: Vec<_> = found.iter().map(|r| r.key.as_str()).collect();
        assert_eq!(keys, vec!["EMP1002", "EMP1003"]);
    }

    #[tokio::test]
    async fn test_one_of_membership() {
        let db = seeded();
        let ids = Filter::new(vec![FieldFilter::one_of(
            "emp_id",
            vec!["emp1001".to_string(), "EMP1003".to_string(), "EMP9999".to_string()],
        )]);
        let found = db
            .find_many(Collection::Employees, &ids, 20, &Sort::KeyAscending)
            .await
            .unwrap();
        let keys: Vec<_> = found.iter().map(|r| r.key.as_str()).collect();
        assert_eq!(keys, vec!["EMP1001", "EMP1003"]);

        let none = Filter::new(vec![FieldFilter::one_of("emp_id", Vec::new())]);
        assert!(db
            .find_many(Collection::Employees, &none, 20, &Sort::KeyAscending)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_sort_by_field_descending() {
        let db = seeded();
        let sort = Sort::Field {
            name: "joining_date".to_string(),
            ascending: false,
        };
        let found = db
            .find_many(Collection::Employees, &Filter::default(), 20, &sort)
            .await
            .unwrap();
        assert_eq!(found[0].key, "EMP1003");
        assert_eq!(db.count_records(Collection::Employees).unwrap(), 3);
        assert_eq!(db.count_records(Collection::Attendance).unwrap(), 0);
    }
}
