//! Recovers per-file contents from the agent's free-form reply.
//!
//! The reply format is requested but not guaranteed, so this is a
//! tolerant two-stage grammar rather than a strict parser: `FILE:`
//! markers first, bare `name.tf:` lines as fallback. Extraction is
//! total; malformed input yields an empty mapping, never an error.

use crate::diagnostics::Diagnostics;
use fancy_regex::Regex as FancyRegex;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;

// Fence delimiters are formatting noise; their inner content is kept.
static FENCE_OPEN_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"```[A-Za-z0-9_-]*\n").expect("invalid fence pattern"));
static FENCE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"```").expect("invalid fence pattern"));

// Primary grammar: a `FILE: <path>.tf` marker line, content running to
// the next marker or end of text.
static FILE_MARKER_PATTERN: Lazy<FancyRegex> = Lazy::new(|| {
    FancyRegex::new(r"(?s)FILE:\s+(.+?\.tf)\s*\n(.*?)(?=FILE:|\z)").expect("invalid marker pattern")
});

// Fallback grammar: a line that is exactly `<path>.tf:`.
static BARE_NAME_PATTERN: Lazy<FancyRegex> = Lazy::new(|| {
    FancyRegex::new(r"(?s)(?:^|\n)([^:\n]+\.tf)\s*:\s*\n(.*?)(?=\n[^:\n]+\.tf\s*:\s*\n|\z)")
        .expect("invalid fallback pattern")
});

// Advisory only: content failing this check is kept regardless.
static TERRAFORM_KEYWORD_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:provider|module|resource|variable|output|locals)\s")
        .expect("invalid keyword pattern")
});

#[derive(Debug)]
pub struct Extraction {
    /// Bare filename -> trimmed content; last occurrence of a
    /// duplicated filename wins.
    pub files: BTreeMap<String, String>,
    pub diagnostics: Diagnostics,
}

impl Extraction {
    /// An empty mapping is an extraction failure: the caller must
    /// preserve the raw reply for post-mortem inspection and report
    /// the subject as failed.
    pub fn is_failure(&self) -> bool {
        self.files.is_empty()
    }
}

pub fn extract(raw: &str) -> Extraction {
    let mut diagnostics = Diagnostics::new();

    let cleaned = strip_fences(raw);

    let mut pairs = capture_pairs(&FILE_MARKER_PATTERN, &cleaned);
    if pairs.is_empty() {
        pairs = capture_pairs(&BARE_NAME_PATTERN, &cleaned);
    }

    let mut files = BTreeMap::new();
    for (path, content) in pairs {
        let filename = flatten_filename(path.trim());
        let content = content.trim().to_string();
        if !TERRAFORM_KEYWORD_PATTERN.is_match(&content) {
            diagnostics.warn(format!(
                "content for {filename} does not look like valid Terraform"
            ));
        }
        files.insert(filename, content);
    }

    if files.is_empty() {
        diagnostics.warn("could not extract any files from the agent reply");
    }

    Extraction { files, diagnostics }
}

fn strip_fences(text: &str) -> String {
    let without_open = FENCE_OPEN_PATTERN.replace_all(text, "");
    FENCE_PATTERN.replace_all(&without_open, "").into_owned()
}

fn capture_pairs(pattern: &FancyRegex, text: &str) -> Vec<(String, String)> {
    pattern
        .captures_iter(text)
        .filter_map(Result::ok)
        .map(|cap| (cap[1].to_string(), cap[2].to_string()))
        .collect()
}

/// Keeps only the bare filename, defending against path-escaping
/// content in the reply.
fn flatten_filename(path: &str) -> String {
    path.rsplit(['/', '\\'])
        .next()
        .unwrap_or(path)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_with_fenced_blocks() {
        let reply = "Here are the updated files:\n\
FILE: a.tf\n\
```hcl\n\
resource \"aws_vpc\" \"this\" {}\n\
```\n\
FILE: b.tf\n\
```\n\
variable \"cidr\" {}\n\
```\n";

        let extraction = extract(reply);

        assert_eq!(extraction.files.len(), 2);
        assert_eq!(
            extraction.files["a.tf"],
            "resource \"aws_vpc\" \"this\" {}"
        );
        assert_eq!(extraction.files["b.tf"], "variable \"cidr\" {}");
        assert!(!extraction.is_failure());
    }

    #[test]
    fn test_primary_grammar_without_fences() {
        let reply = "FILE: main.tf\nmodule \"vpc\" {\n  source = \"./m\"\n}\n";
        let extraction = extract(reply);

        assert_eq!(
            extraction.files["main.tf"],
            "module \"vpc\" {\n  source = \"./m\"\n}"
        );
    }

    #[test]
    fn test_fallback_grammar() {
        let reply = "main.tf:\nresource \"aws_vpc\" \"this\" {}\n\noutputs.tf:\noutput \"id\" {}\n";
        let extraction = extract(reply);

        assert_eq!(extraction.files.len(), 2);
        assert_eq!(extraction.files["main.tf"], "resource \"aws_vpc\" \"this\" {}");
        assert_eq!(extraction.files["outputs.tf"], "output \"id\" {}");
    }

    #[test]
    fn test_path_components_are_flattened() {
        let reply = "FILE: sub/dir/c.tf\nresource \"aws_vpc\" \"this\" {}\n";
        let extraction = extract(reply);

        assert!(extraction.files.contains_key("c.tf"));
        assert!(!extraction.files.keys().any(|k| k.contains('/')));
    }

    #[test]
    fn test_duplicate_filenames_last_wins() {
        let reply = "FILE: main.tf\nresource \"first\" \"a\" {}\n\
FILE: main.tf\nresource \"second\" \"b\" {}\n";
        let extraction = extract(reply);

        assert_eq!(extraction.files.len(), 1);
        assert_eq!(extraction.files["main.tf"], "resource \"second\" \"b\" {}");
    }

    #[test]
    fn test_unrecognizable_reply_is_failure() {
        let reply = "I'm sorry, I cannot help with that request.";
        let extraction = extract(reply);

        assert!(extraction.is_failure());
        assert!(!extraction.diagnostics.is_empty());
    }

    #[test]
    fn test_suspicious_content_warns_but_is_kept() {
        let reply = "FILE: notes.tf\nthis is not terraform at all\n";
        let extraction = extract(reply);

        assert_eq!(extraction.files["notes.tf"], "this is not terraform at all");
        assert!(
            extraction
                .diagnostics
                .iter()
                .any(|d| d.contains("does not look like valid Terraform"))
        );
    }

    #[test]
    fn test_content_is_trimmed() {
        let reply = "FILE: main.tf\n\n\n  resource \"aws_vpc\" \"this\" {}  \n\n";
        let extraction = extract(reply);

        assert_eq!(extraction.files["main.tf"], "resource \"aws_vpc\" \"this\" {}");
    }

    #[test]
    fn test_marker_must_have_tf_extension() {
        let reply = "FILE: README.md\nsome docs\n";
        let extraction = extract(reply);
        assert!(extraction.is_failure());
    }
}
