// Seed a small store and show how questions are routed, using hybridhr as a library

use hybridhr_core::{
    ClassifierConfig, Collection, Database, Domain, QueryClassifier, RecordStore, Routing,
    StructuredRetriever,
};
use serde_json::json;
use std::sync::Arc;

#[tokio::main]
async fn main() -> hybridhr_core::Result<()> {
    println!("Hybridhr Routing Example\n");

    let db_path = std::env::temp_dir().join("hybridhr_example.sqlite");
    println!("Opening store at: {}", db_path.display());
    let db = Database::open(&db_path)?;
    db.initialize()?;

    let employee = json!({
        "emp_id": "EMP1005",
        "name": "Priya Sharma",
        "department": "Marketing",
        "location": "Singapore",
        "joining_date": "2021-06-15",
    });
    if let serde_json::Value::Object(fields) = employee {
        db.insert_record(Collection::Employees, "EMP1005", &fields)?;
    }
    db.insert_vector(
        Domain::Policy,
        "policy-sick-sg",
        &[0.1, 0.9, 0.2],
        "Singapore employees receive 14 days of paid sick leave per year.",
        None,
    )?;
    println!(
        "Stored {} employees and {} policy vectors\n",
        db.count_records(Collection::Employees)?,
        db.count_vectors(Domain::Policy)?
    );

    let classifier = QueryClassifier::new(&ClassifierConfig::default())?;
    let store: Arc<dyn RecordStore> = Arc::new(db);
    let retriever = StructuredRetriever::new(store, Default::default());

    for question in [
        "Who is employee EMP1005?",
        "List all employees in Marketing who joined in 2021",
        "What is the sick leave policy for Singapore?",
        "asdkjasdkj random text",
    ] {
        let query = classifier.classify(question);
        println!("{}", question);
        println!("  intent: {}, routing: {}", query.intent, query.routing);

        if query.routing == Routing::Structured {
            for item in retriever.retrieve(&query).await? {
                println!("  match: {}", item.key);
            }
        }
        println!();
    }

    Ok(())
}
