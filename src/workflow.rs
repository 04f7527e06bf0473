//! Drives the pipeline end to end: reachability from the entry file,
//! context assembly, prompt composition, agent calls, extraction, and
//! persistence of the rewritten files.
//!
//! The run is strictly sequential. In individual mode one subject's
//! failure is logged and the loop proceeds to the next; in batch mode
//! the single agent call failing aborts the run.

use crate::config::Config;
use crate::context::ContextAssembler;
use crate::extract;
use crate::graph::DependencyGraph;
use crate::prompt::{self, PromptMode};
use crate::resolver;
use crate::tokens::TokenCounter;
use crate::{client, diagnostics::Diagnostics};
use anyhow::{Context, Result, bail};
use console::style;
use openrouter_api::{OpenRouterClient, Ready};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

pub struct Workflow {
    config: Config,
    client: Option<OpenRouterClient<Ready>>,
    example_dir: PathBuf,
    graph: DependencyGraph,
    counter: TokenCounter,
}

impl Workflow {
    pub fn new(
        config: Config,
        client: Option<OpenRouterClient<Ready>>,
        example_dir: PathBuf,
        graph: DependencyGraph,
    ) -> Self {
        Self {
            config,
            client,
            example_dir,
            graph,
            counter: TokenCounter::new(),
        }
    }

    /// Runs the pipeline and returns how many files were saved.
    pub async fn run(&self, dry_run: bool, batch: bool) -> Result<usize> {
        let entry = resolver::normalize(&self.example_dir.join("main.tf"));
        if !entry.is_file() {
            bail!("entry point file {} not found", entry.display());
        }

        if batch {
            self.run_batch(&entry, dry_run).await
        } else {
            self.run_individual(&entry, dry_run).await
        }
    }

    /// All relevant files in one prompt, one agent call.
    async fn run_batch(&self, entry: &Path, dry_run: bool) -> Result<usize> {
        let relevant = self.graph.reachable(entry);
        if relevant.is_empty() {
            warn!(
                entry = %entry.display(),
                "no files relevant to the entry point; the prompt will contain the entry alone"
            );
        } else {
            info!(count = relevant.len(), "files relevant to entry point");
        }

        // BTreeSet iteration gives the deterministic candidate order.
        let candidates: Vec<PathBuf> = relevant.into_iter().collect();
        let assembler = ContextAssembler::new(&self.counter);
        let bundle = assembler.assemble(
            entry,
            &candidates,
            self.config.soft_token_limit,
            self.config.hard_token_limit,
        );
        let prompt = prompt::compose(&PromptMode::Batch { entry }, &bundle);

        self.report_stats(entry, &prompt, bundle.files_included, bundle.token_count);
        if dry_run {
            return Ok(0);
        }

        // Batch mode has a single shot; a call failure aborts the run.
        let client = self.require_client()?;
        let reply = client::request_rewrite(client, &self.config.model, &prompt).await?;
        self.handle_reply(&reply)
    }

    /// One focused prompt per file: the subject plus its direct graph
    /// dependencies. The entry point is always processed first.
    async fn run_individual(&self, entry: &Path, dry_run: bool) -> Result<usize> {
        let mut subjects = vec![entry.to_path_buf()];
        for file in resolver::direct_tf_files(&self.example_dir) {
            let file = resolver::normalize(&file);
            if file != entry {
                subjects.push(file);
            }
        }
        info!(count = subjects.len(), "processing files individually");

        let assembler = ContextAssembler::new(&self.counter);
        let mut saved_total = 0;

        for (i, subject) in subjects.iter().enumerate() {
            let dependencies = self.graph.direct_dependencies(subject);
            let bundle = assembler.assemble(
                subject,
                &dependencies,
                self.config.soft_token_limit,
                self.config.hard_token_limit,
            );
            if bundle.files_included == 0 {
                warn!(file = %subject.display(), "nothing to include for file, skipping");
                continue;
            }

            let prompt = prompt::compose(&PromptMode::SingleTarget { target: subject }, &bundle);
            self.report_stats(subject, &prompt, bundle.files_included, bundle.token_count);
            if dry_run {
                continue;
            }

            match self.process_subject(&prompt).await {
                Ok(count) => saved_total += count,
                // Per-subject failures are absorbed; the loop moves on.
                Err(e) => warn!("failed to process {}: {e:#}", subject.display()),
            }

            if i + 1 < subjects.len() {
                info!(
                    seconds = self.config.call_delay_seconds,
                    "sleeping between agent calls"
                );
                tokio::time::sleep(Duration::from_secs(self.config.call_delay_seconds)).await;
            }
        }

        Ok(saved_total)
    }

    async fn process_subject(&self, prompt: &str) -> Result<usize> {
        let client = self.require_client()?;
        let reply = client::request_rewrite(client, &self.config.model, prompt).await?;
        self.handle_reply(&reply)
    }

    fn handle_reply(&self, reply: &str) -> Result<usize> {
        let extraction = extract::extract(reply);
        extraction.diagnostics.emit();

        if extraction.is_failure() {
            let preserved = preserve_raw_reply(Path::new(&self.config.output_dir), reply)?;
            bail!(
                "no files could be extracted from the agent reply; raw reply preserved at {}",
                preserved.display()
            );
        }

        let saved = save_files(Path::new(&self.config.output_dir), &extraction.files)?;
        Ok(saved.len())
    }

    fn require_client(&self) -> Result<&OpenRouterClient<Ready>> {
        self.client
            .as_ref()
            .context("agent client not initialized; is the API key set?")
    }

    fn report_stats(&self, subject: &Path, prompt: &str, files_included: usize, context_tokens: usize) {
        let total_tokens = self.counter.count(prompt);
        println!(
            "{} {} — {} files, {} context tokens, {} prompt tokens",
            style("prompt>").cyan().bold(),
            subject.display(),
            files_included,
            context_tokens,
            total_tokens
        );
    }
}

/// Persists extracted files into the output directory. Layout is flat:
/// extraction already reduced every name to a bare filename.
pub fn save_files(output_dir: &Path, files: &BTreeMap<String, String>) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(output_dir)
        .with_context(|| format!("could not create output directory {}", output_dir.display()))?;

    let mut saved = Vec::new();
    for (filename, content) in files {
        let path = output_dir.join(filename);
        fs::write(&path, content)
            .with_context(|| format!("could not write {}", path.display()))?;
        info!(file = %path.display(), "saved rewritten file");
        saved.push(path);
    }
    Ok(saved)
}

/// Diagnostic side channel for total extraction failure: the raw reply
/// is kept verbatim for post-mortem inspection.
pub fn preserve_raw_reply(output_dir: &Path, raw: &str) -> Result<PathBuf> {
    fs::create_dir_all(output_dir)?;
    let path = output_dir.join("raw_response.txt");
    fs::write(&path, raw)?;
    Ok(path)
}

/// Emits builder diagnostics and a one-line graph summary.
pub fn report_graph(graph: &DependencyGraph, diagnostics: &Diagnostics) {
    diagnostics.emit();
    println!(
        "Dependency graph: {} files, {} module references",
        graph.node_count(),
        graph.edge_count()
    );
}
