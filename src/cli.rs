use crate::config::Backend;
use clap::Parser;

/// Hardens Terraform VPC configurations with an LLM rewriting agent
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// URL of the Terraform repository to analyze
    #[arg(long)]
    pub repo_url: Option<String>,

    /// Path to the example directory within the repository
    #[arg(long)]
    pub example_path: Option<String>,

    /// Directory where the repository will be cloned
    #[arg(long)]
    pub target_dir: Option<String>,

    /// Directory where rewritten files will be saved
    #[arg(long)]
    pub output_dir: Option<String>,

    /// Model to use for the rewriting agent
    #[arg(long)]
    pub model: Option<String>,

    /// Agent backend to talk to
    #[arg(long, value_enum)]
    pub backend: Option<Backend>,

    /// Compose prompts and report statistics without calling the agent
    #[arg(long)]
    pub dry_run: bool,

    /// Process all files in a single prompt instead of one call per file
    #[arg(long)]
    pub batch_process: bool,

    /// Enable debug logging
    #[arg(short, long)]
    pub debug: bool,
}
