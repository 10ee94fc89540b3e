//! CLI argument definitions

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "hybridhr")]
#[command(
    author,
    version,
    about = "Ask HR questions answered from employee records and policy documents"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output format
    #[arg(long, global = true, value_enum, default_value = "cli")]
    pub format: OutputFormat,

    /// Config file (defaults to the user config directory)
    #[arg(long, global = true, env = "HYBRIDHR_CONFIG")]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Answer a question
    Ask(QuestionArgs),

    /// Show how a question would be routed
    Classify(QuestionArgs),

    /// Show record and vector counts
    Status,
}

#[derive(Args)]
pub struct QuestionArgs {
    /// Question text
    #[arg(required = true)]
    pub question: Vec<String>,
}

impl QuestionArgs {
    pub fn text(&self) -> String {
        self.question.join(" ")
    }
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Cli,
    Json,
}
