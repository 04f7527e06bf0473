//! Resolves Terraform module source strings to local files.
//!
//! Only sources that point inside the analyzed tree become graph edges.
//! Remote sources (git, registry, scheme-qualified) are outside the
//! locally analyzable file set and resolve to nothing.

use std::collections::BTreeSet;
use std::path::{Component, Path, PathBuf};
use tracing::debug;

/// Explicit remote-fetch prefixes Terraform understands.
const REMOTE_PREFIXES: &[&str] = &["git::", "hg::", "s3::", "gcs::"];

/// A source is local when it is path-relative, or carries neither a
/// remote-fetch prefix nor a scheme indicator. Registry identifiers
/// like `terraform-aws-modules/vpc/aws` pass this test but fail the
/// existence check below, so they still produce no edges. The empty
/// string (a module block with no source attribute) is local too: it
/// resolves to the declaring file's own directory.
pub fn is_local_source(source: &str) -> bool {
    if source.starts_with('.') {
        return true;
    }
    !(REMOTE_PREFIXES.iter().any(|p| source.starts_with(p)) || source.contains(':'))
}

/// Collapses `.` and `..` segments lexically, without touching the
/// file system. Two relative spellings of the same file normalize to
/// the same path, which is what keeps graph nodes unique.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

pub fn has_tf_extension(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "tf")
}

/// Resolves a module source relative to the file that declares it.
///
/// A directory target depends on every `.tf` file the directory
/// defines directly, since Terraform merges declarations at directory
/// granularity. Failures (nonexistent path, unreadable directory) are
/// per-reference and recoverable: the result is simply empty.
pub fn resolve(referencing_file: &Path, source: &str) -> Vec<PathBuf> {
    if !is_local_source(source) {
        debug!(source, "skipping non-local module source");
        return Vec::new();
    }

    let Some(base_dir) = referencing_file.parent() else {
        return Vec::new();
    };
    let target = normalize(&base_dir.join(source));

    if target.is_dir() {
        direct_tf_files(&target)
    } else if target.is_file() && has_tf_extension(&target) {
        vec![target]
    } else {
        debug!(source, target = %target.display(), "module source did not resolve to a local path");
        Vec::new()
    }
}

/// Direct (non-recursive) `.tf` files of a directory, sorted.
pub fn direct_tf_files(dir: &Path) -> Vec<PathBuf> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut files = BTreeSet::new();
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_file() && has_tf_extension(&path) {
            files.insert(path);
        }
    }
    files.into_iter().collect()
}
