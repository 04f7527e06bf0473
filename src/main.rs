use anyhow::Result;
use clap::Parser;
use console::style;
use std::fs;
use std::path::Path;
use tfarmor::workflow::{self, Workflow};
use tfarmor::{builder, cli, client, config, repo};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    init_tracing(cli.debug);

    let mut config = config::load_or_create()?;
    config.apply_cli(&cli);

    repo::check_dependencies()?;

    // Fail on missing credentials before any analysis work begins.
    let client = if cli.dry_run {
        None
    } else {
        Some(client::initialize_client(&config)?)
    };

    println!("Backend: {:?}", config.backend);
    println!("Model: {}", config.model);

    repo::clone_repository(&config.repo_url, Path::new(&config.target_dir))?;
    let target_dir = fs::canonicalize(&config.target_dir)?;
    let example_dir = repo::locate_example_dir(&target_dir, &config.example_path)?;
    repo::init_terraform(&example_dir)?;

    let (graph, diagnostics) = builder::build(&target_dir);
    workflow::report_graph(&graph, &diagnostics);

    let dry_run = cli.dry_run;
    let workflow = Workflow::new(config, client, example_dir, graph);
    let saved = workflow.run(dry_run, cli.batch_process).await?;

    if dry_run {
        println!("{} prompts composed, no agent calls made", style("Dry run:").yellow().bold());
        return Ok(());
    }

    // Overall success needs at least one artifact; zero is a failure,
    // distinct from the recoverable per-file skips above.
    if saved == 0 {
        anyhow::bail!("no valid Terraform files could be extracted from any agent reply");
    }

    println!("{} {} file(s) saved", style("Done:").green().bold(), saved);
    Ok(())
}

fn init_tracing(debug: bool) {
    let default_filter = if debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .init();
}
