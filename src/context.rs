//! Token-budgeted assembly of file contents into a context bundle.
//!
//! Every included file is rendered as a labeled block: a `FILE:`
//! header line followed by the file's full raw content. Inclusion is
//! all-or-nothing per file; a file is never truncated partway.

use crate::tokens::TokenCounter;
use std::fs;
use std::iter;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct ContextSection {
    pub path: PathBuf,
    pub content: String,
}

/// Ordered, budgeted set of file contents ready for prompt rendering.
/// Produced fresh per assembly call; the reported totals are exact
/// with respect to the counter the assembler was built with.
#[derive(Debug, Clone)]
pub struct ContextBundle {
    pub sections: Vec<ContextSection>,
    pub token_count: usize,
    pub files_included: usize,
}

impl ContextBundle {
    pub fn render(&self) -> String {
        self.sections
            .iter()
            .map(|section| render_block(&section.path, &section.content))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn render_block(path: &Path, content: &str) -> String {
    format!("FILE: {}\n{}\n", path.display(), content)
}

pub struct ContextAssembler<'a> {
    counter: &'a TokenCounter,
}

impl<'a> ContextAssembler<'a> {
    pub fn new(counter: &'a TokenCounter) -> Self {
        Self { counter }
    }

    /// Assembles entry first, then candidates in the caller-supplied
    /// order (callers pass a sorted list so assembly is deterministic).
    ///
    /// When everything fits under `soft_limit` the bundle is the full
    /// set. Otherwise inclusion re-runs under the tighter `hard_limit`:
    /// the same order is walked, each file included only if the running
    /// total stays within the limit. A file that does not fit is
    /// skipped, but later smaller files are still attempted.
    pub fn assemble(
        &self,
        entry: &Path,
        candidates: &[PathBuf],
        soft_limit: usize,
        hard_limit: usize,
    ) -> ContextBundle {
        let ordered = iter::once(entry).chain(
            candidates
                .iter()
                .map(PathBuf::as_path)
                .filter(|path| *path != entry),
        );

        // (path, content, token cost of the rendered block)
        let mut blocks: Vec<(PathBuf, String, usize)> = Vec::new();
        for path in ordered {
            let content = match fs::read_to_string(path) {
                Ok(content) => content,
                Err(e) => {
                    warn!("could not read context file {}: {e}", path.display());
                    continue;
                }
            };
            // Whitespace-only files contribute no information.
            if content.trim().is_empty() {
                continue;
            }
            let tokens = self.counter.count(&render_block(path, &content));
            blocks.push((path.to_path_buf(), content, tokens));
        }

        let unbounded_total: usize = blocks.iter().map(|(_, _, tokens)| tokens).sum();
        if unbounded_total <= soft_limit {
            let files_included = blocks.len();
            return ContextBundle {
                sections: blocks
                    .into_iter()
                    .map(|(path, content, _)| ContextSection { path, content })
                    .collect(),
                token_count: unbounded_total,
                files_included,
            };
        }

        warn!(
            unbounded_total,
            soft_limit, hard_limit, "context exceeds soft limit, truncating at file granularity"
        );

        let mut sections = Vec::new();
        let mut running = 0;
        for (path, content, tokens) in blocks {
            if running + tokens <= hard_limit {
                running += tokens;
                sections.push(ContextSection { path, content });
            } else {
                debug!(
                    file = %path.display(),
                    tokens, running, hard_limit, "skipping file over token budget"
                );
            }
        }

        let files_included = sections.len();
        ContextBundle {
            sections,
            token_count: running,
            files_included,
        }
    }
}
