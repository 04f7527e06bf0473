//! Warning collector returned alongside component results.
//!
//! Components in the analysis pipeline never log directly for per-file
//! conditions; they record what happened here and the caller decides
//! what reaches the log. This keeps the builder and extractor pure and
//! testable without capturing global output.

use tracing::warn;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Diagnostics {
    entries: Vec<String>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a warning for later emission.
    pub fn warn(&mut self, message: impl Into<String>) {
        self.entries.push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }

    /// Drains the collected warnings into the log.
    pub fn emit(&self) {
        for entry in &self.entries {
            warn!("{entry}");
        }
    }
}
