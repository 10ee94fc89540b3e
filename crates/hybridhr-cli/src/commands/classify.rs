//! Classify command

use crate::app::{OutputFormat, QuestionArgs};
use crate::output::format_query;
use anyhow::Result;
use hybridhr_core::{Config, QueryClassifier};

pub fn run(args: QuestionArgs, config: &Config, format: OutputFormat) -> Result<()> {
    let classifier = QueryClassifier::new(&config.classifier)?;
    let query = classifier.classify(&args.text());
    print!("{}", format_query(&query, format)?);
    Ok(())
}
