//! Status command

use crate::app::OutputFormat;
use anyhow::{Context, Result};
use hybridhr_core::{Collection, Config, Database, Domain};

const COLLECTIONS: [Collection; 4] = [
    Collection::Employees,
    Collection::Attendance,
    Collection::LeaveHistory,
    Collection::LeaveBalances,
];

pub fn run(config: &Config, format: OutputFormat) -> Result<()> {
    let path = config.database_path();
    let db = Database::open_read_only(&path)
        .with_context(|| format!("cannot open store at {}", path.display()))?;

    let mut records = Vec::new();
    for collection in COLLECTIONS {
        records.push((collection.as_str(), db.count_records(collection)?));
    }
    let mut vectors = Vec::new();
    for domain in Domain::ALL {
        vectors.push((domain.as_str(), db.count_vectors(domain)?));
    }

    match format {
        OutputFormat::Json => {
            let to_map = |counts: &[(&str, usize)]| {
                counts
                    .iter()
                    .map(|(name, n)| (name.to_string(), serde_json::Value::from(*n)))
                    .collect::<serde_json::Map<_, _>>()
            };
            let stats = serde_json::json!({
                "database": path.display().to_string(),
                "schema_version": db.schema_version()?,
                "records": to_map(&records),
                "vectors": to_map(&vectors),
            });
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        OutputFormat::Cli => {
            println!("Database:        {}", path.display());
            println!();
            println!("Records:");
            for (name, count) in &records {
                println!("  {:<15}{}", name, count);
            }
            println!();
            println!("Vectors:");
            for (name, count) in &vectors {
                println!("  {:<15}{}", name, count);
            }
        }
    }
    Ok(())
}
