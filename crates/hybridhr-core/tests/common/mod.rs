//! In-memory gateway fakes shared by the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use hybridhr_core::{
    ChatMessage, Collection, Database, Domain, Embedder, Filter, HybridError, LLMClient, Record,
    RecordStore, Result, Sort, StoredRecord, VectorHit, VectorIndex,
};
use serde_json::json;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// In-memory SQLite store seeded with a few employees and leave requests
pub fn seeded_store() -> Database {
    let db = Database::open_in_memory().unwrap();
    db.initialize().unwrap();

    let employees = [
        ("EMP1001", "Anna Lee", "Engineering", "London", "2019-04-01"),
        ("EMP1003", "Ravi Kumar", "Marketing", "Bangalore", "2022-01-10"),
        ("EMP1005", "Priya Sharma", "Marketing", "Singapore", "2021-06-15"),
        ("EMP1007", "Tom Becker", "Sales", "Berlin", "2018-09-03"),
    ];
    for (id, name, department, location, joined) in employees {
        db.insert_record(
            Collection::Employees,
            id,
            &record(json!({
                "emp_id": id,
                "name": name,
                "department": department,
                "location": location,
                "joining_date": joined,
            })),
        )
        .unwrap();
    }

    let leave = [
        ("LV001", "EMP1005", "Sick Leave", "pending"),
        ("LV002", "EMP1001", "Annual Leave", "approved"),
        ("LV003", "EMP1007", "Sick Leave", "approved"),
    ];
    for (id, emp, leave_type, status) in leave {
        db.insert_record(
            Collection::LeaveHistory,
            id,
            &record(json!({
                "emp_id": emp,
                "leave_type": leave_type,
                "status": status,
            })),
        )
        .unwrap();
    }

    db
}

pub fn record(value: serde_json::Value) -> Record {
    match value {
        serde_json::Value::Object(map) => map,
        _ => panic!("record must be a JSON object"),
    }
}

/// Record store whose every call fails
pub struct FailingStore;

#[async_trait]
impl RecordStore for FailingStore {
    async fn find_one(&self, _: Collection, _: &Filter) -> Result<Option<StoredRecord>> {
        Err(HybridError::ExternalError("record store offline".into()))
    }

    async fn find_many(
        &self,
        _: Collection,
        _: &Filter,
        _: usize,
        _: &Sort,
    ) -> Result<Vec<StoredRecord>> {
        Err(HybridError::ExternalError("record store offline".into()))
    }
}

/// Vector index returning canned hits per domain
#[derive(Default)]
pub struct FakeIndex {
    hits: HashMap<Domain, Vec<VectorHit>>,
    searched: Mutex<Vec<Domain>>,
    fail: bool,
}

impl FakeIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn with_hit(mut self, domain: Domain, doc_id: &str, similarity: f32, payload: &str) -> Self {
        self.hits.entry(domain).or_default().push(VectorHit {
            doc_id: doc_id.to_string(),
            similarity,
            payload: payload.to_string(),
        });
        self
    }

    pub fn searched(&self) -> Vec<Domain> {
        self.searched.lock().unwrap().clone()
    }
}

#[async_trait]
impl VectorIndex for FakeIndex {
    async fn search(&self, domain: Domain, _: &[f32], k: usize) -> Result<Vec<VectorHit>> {
        self.searched.lock().unwrap().push(domain);
        if self.fail {
            return Err(HybridError::ExternalError("index offline".into()));
        }
        Ok(self
            .hits
            .get(&domain)
            .map(|hits| hits.iter().take(k).cloned().collect())
            .unwrap_or_default())
    }
}

/// Embedder returning a constant vector
pub struct FakeEmbedder {
    vector: Vec<f32>,
    calls: AtomicUsize,
    fail: bool,
}

impl FakeEmbedder {
    pub fn new(vector: Vec<f32>) -> Self {
        Self {
            vector,
            calls: AtomicUsize::new(0),
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            vector: Vec::new(),
            calls: AtomicUsize::new(0),
            fail: true,
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Embedder for FakeEmbedder {
    async fn embed(&self, _: &str) -> Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(HybridError::ExternalError("embedding service offline".into()));
        }
        Ok(self.vector.clone())
    }

    fn dimensions(&self) -> usize {
        self.vector.len()
    }

    fn model_name(&self) -> &str {
        "fake-embedder"
    }
}

/// Completion service replaying scripted outcomes, then a default answer
pub struct FakeLlm {
    script: Mutex<VecDeque<Result<String>>>,
    delay: Option<Duration>,
    calls: AtomicUsize,
    prompts: Mutex<Vec<Vec<ChatMessage>>>,
}

impl FakeLlm {
    pub fn new() -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            delay: None,
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn scripted(outcomes: Vec<Result<String>>) -> Self {
        let llm = Self::new();
        *llm.script.lock().unwrap() = outcomes.into_iter().collect();
        llm
    }

    pub fn slow(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::new()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn prompts(&self) -> Vec<Vec<ChatMessage>> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl LLMClient for FakeLlm {
    async fn chat_completion(&self, messages: Vec<ChatMessage>) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(messages);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let next = self.script.lock().unwrap().pop_front();
        next.unwrap_or_else(|| Ok("Grounded answer.".to_string()))
    }

    async fn embed(&self, _: &str) -> Result<Vec<f32>> {
        Ok(vec![1.0, 0.0])
    }

    fn embedding_dimensions(&self) -> usize {
        2
    }

    fn model_name(&self) -> &str {
        "fake-llm"
    }

    fn embedding_model(&self) -> &str {
        "fake-embedder"
    }
}
