//! Builds the file dependency graph from a Terraform tree.
//!
//! Every `.tf` file becomes a node even when it declares nothing, so
//! it can be queried later. Module declarations are parsed with the
//! HCL parser; a parse failure on one file is recorded and the scan
//! moves on, the file simply contributing zero edges.

use crate::diagnostics::Diagnostics;
use crate::graph::DependencyGraph;
use crate::resolver;
use anyhow::Result;
use hcl::Value;
use ignore::WalkBuilder;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeSet;
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Transient parse artifact: one module declaration's name and source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleReference {
    pub name: String,
    pub source: String,
}

static MODULE_TEXT_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"module\s+"[^"]+"\s+\{[^}]*source\s+=\s+"[^"]+""#)
        .expect("invalid module text pattern")
});

/// Enumerates `.tf` files under `root`, excluding `.terraform` cache
/// directories and hidden path components. The result is sorted so
/// downstream ordering never depends on directory-scan order.
pub fn scan_tf_files(root: &Path) -> Vec<PathBuf> {
    let mut files = BTreeSet::new();
    let walker = WalkBuilder::new(root)
        .filter_entry(|entry| entry.file_name() != OsStr::new(".terraform"))
        .build();

    for entry in walker.flatten() {
        let path = entry.path();
        if entry.file_type().is_some_and(|t| t.is_file()) && resolver::has_tf_extension(path) {
            files.insert(resolver::normalize(path));
        }
    }
    files.into_iter().collect()
}

/// Builds the dependency graph for the whole tree under `root`.
pub fn build(root: &Path) -> (DependencyGraph, Diagnostics) {
    let mut graph = DependencyGraph::new();
    let mut diagnostics = Diagnostics::new();

    let files = scan_tf_files(root);
    info!(count = files.len(), root = %root.display(), "scanning Terraform files");

    for file in &files {
        graph.add_node(file.clone());

        let content = match fs::read_to_string(file) {
            Ok(content) => content,
            Err(e) => {
                diagnostics.warn(format!("could not read {}: {e}", file.display()));
                continue;
            }
        };

        let references = match module_references(&content) {
            Ok(references) => references,
            Err(e) => {
                diagnostics.warn(format!("HCL parse error in {}: {e}", file.display()));
                continue;
            }
        };

        for reference in references {
            for target in resolver::resolve(file, &reference.source) {
                debug!(
                    from = %file.display(),
                    to = %target.display(),
                    module = %reference.name,
                    "module edge"
                );
                graph.add_edge(file, &target);
            }
        }
    }

    info!(
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        "built dependency graph"
    );

    if graph.edge_count() == 0 {
        scan_for_missed_modules(&files, &mut diagnostics);
    }

    (graph, diagnostics)
}

/// Parses one file's content and returns its module declarations.
pub fn module_references(content: &str) -> Result<Vec<ModuleReference>> {
    let value: Value = hcl::from_str(content)?;
    let Value::Object(body) = value else {
        return Ok(Vec::new());
    };
    Ok(body
        .get("module")
        .map(normalize_modules)
        .unwrap_or_default())
}

/// The parser surfaces a module collection either as one mapping of
/// name -> config or as a sequence of single-entry mappings. Both
/// shapes collapse here, before the `source` attribute is read, so
/// the rest of the builder sees a single form.
fn normalize_modules(value: &Value) -> Vec<ModuleReference> {
    let mut references = Vec::new();
    match value {
        Value::Object(map) => {
            for (name, config) in map {
                references.push(to_reference(name, config));
            }
        }
        Value::Array(items) => {
            for item in items {
                if let Value::Object(map) = item {
                    for (name, config) in map {
                        references.push(to_reference(name, config));
                    }
                }
            }
        }
        _ => {}
    }
    references
}

fn to_reference(name: &str, config: &Value) -> ModuleReference {
    // A repeated module label surfaces its configs as a list; the
    // first one carries the source.
    let config = match config {
        Value::Array(items) => items.first(),
        other => Some(other),
    };
    let source = match config {
        Some(Value::Object(map)) => match map.get("source") {
            Some(Value::String(source)) => source.clone(),
            _ => String::new(),
        },
        _ => String::new(),
    };
    ModuleReference {
        name: name.to_string(),
        source,
    }
}

/// Best-effort textual scan run when the completed graph has no edges
/// at all. Produces diagnostics only; the graph is not altered.
fn scan_for_missed_modules(files: &[PathBuf], diagnostics: &mut Diagnostics) {
    diagnostics.warn("no module dependencies found in the graph; scanning for undetected declarations");
    for file in files {
        let Ok(content) = fs::read_to_string(file) else {
            continue;
        };
        for m in MODULE_TEXT_PATTERN.find_iter(&content) {
            diagnostics.warn(format!(
                "undetected module declaration in {}: {}",
                file.display(),
                m.as_str().trim()
            ));
        }
    }
}
