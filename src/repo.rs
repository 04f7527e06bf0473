//! Workspace preparation: required tools, repository clone, and the
//! configuration tool's own initialization step. Thin wrappers around
//! external commands; the analysis core never shells out itself.

use anyhow::{Context, Result, bail};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::{debug, info};

const REQUIRED_TOOLS: &[&str] = &["git", "terraform"];

/// Verifies required external tools are installed. A missing tool is
/// fatal, checked before any analysis work begins.
pub fn check_dependencies() -> Result<()> {
    for tool in REQUIRED_TOOLS {
        let status = Command::new(tool)
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();
        match status {
            Ok(status) if status.success() => debug!(tool, "dependency check passed"),
            _ => bail!("required dependency '{tool}' not found; please install it"),
        }
    }
    Ok(())
}

/// Shallow-clones the repository unless the target already exists.
pub fn clone_repository(repo_url: &str, target_dir: &Path) -> Result<()> {
    if target_dir.exists() {
        info!(
            target = %target_dir.display(),
            "repository directory already exists, skipping clone"
        );
        return Ok(());
    }

    info!(repo_url, target = %target_dir.display(), "cloning repository");
    let output = Command::new("git")
        .args(["clone", "--depth=1", repo_url])
        .arg(target_dir)
        .output()
        .context("failed to run git")?;

    if !output.status.success() {
        bail!(
            "failed to clone repository: {}",
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }
    Ok(())
}

/// Locates the example directory within the cloned repository.
pub fn locate_example_dir(target_dir: &Path, example_path: &str) -> Result<PathBuf> {
    let example_dir = target_dir.join(example_path);
    if !example_dir.is_dir() {
        bail!(
            "example path '{}' not found in repository",
            example_dir.display()
        );
    }
    Ok(example_dir)
}

/// Runs `terraform init` in the example directory so providers and
/// modules are present before analysis.
pub fn init_terraform(example_dir: &Path) -> Result<()> {
    info!(dir = %example_dir.display(), "initializing Terraform");
    let output = Command::new("terraform")
        .arg("init")
        .current_dir(example_dir)
        .output()
        .context("failed to run terraform")?;

    if !output.status.success() {
        bail!(
            "terraform init failed: {}",
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }
    Ok(())
}
