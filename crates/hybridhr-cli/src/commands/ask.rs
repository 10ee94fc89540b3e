//! Ask command

use crate::app::{OutputFormat, QuestionArgs};
use crate::output::format_envelope;
use anyhow::Result;
use hybridhr_core::{Config, Pipeline};

pub async fn run(args: QuestionArgs, config: &Config, format: OutputFormat) -> Result<()> {
    let pipeline = Pipeline::from_config(config)?;
    let envelope = pipeline.answer(&args.text()).await;
    print!("{}", format_envelope(&envelope, format)?);
    Ok(())
}
