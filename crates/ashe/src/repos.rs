//! Repository batch: clone a roster of repositories and refine each.
//!
//! The roster is a CSV file with header `Repository,Branch`. Each row is
//! cloned (or fetched when already present), its Java source roots are
//! discovered by the `src/main/java` suffix (test trees excluded), and
//! the batch driver runs once per root. A repository that cannot be
//! cloned is logged and skipped; the roster run continues.

use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{bail, Context, Result};
use ashe_llm::Model;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::batch;
use crate::config::Config;

const JAVA_SOURCE_ROOT_SUFFIX: &str = "src/main/java";

#[derive(Debug, Deserialize)]
struct RosterRow {
    #[serde(rename = "Repository")]
    repository: String,
    #[serde(rename = "Branch")]
    branch: String,
}

/// Process every repository in the roster.
pub fn process_repositories(
    config: &Config,
    roster: &Path,
    clone_dir: &Path,
    model: Model,
) -> Result<()> {
    std::fs::create_dir_all(clone_dir)
        .with_context(|| format!("cannot create clone directory {}", clone_dir.display()))?;
    let mut reader = csv::Reader::from_path(roster)
        .with_context(|| format!("cannot read roster {}", roster.display()))?;

    for row in reader.deserialize::<RosterRow>() {
        let row = row.context("malformed roster row")?;
        let dest = match clone_or_fetch(&row, clone_dir) {
            Ok(dest) => dest,
            Err(e) => {
                warn!(repository = %row.repository, error = %e, "skipping repository");
                continue;
            }
        };

        for root in find_java_source_roots(&dest)? {
            info!(root = %root.display(), "processing source root");
            batch::process_directory(config, &root, &root, model)
                .with_context(|| format!("batch failed under {}", root.display()))?;
        }
    }
    Ok(())
}

// ============================================================================
// Git
// ============================================================================

/// Directory name for a repository URL (`.../guava.git` → `guava`).
fn repo_directory_name(url: &str) -> &str {
    url.trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or(url)
        .trim_end_matches(".git")
}

fn clone_or_fetch(row: &RosterRow, clone_dir: &Path) -> Result<PathBuf> {
    let dest = clone_dir.join(repo_directory_name(&row.repository));
    if dest.join(".git").exists() {
        run_git(Command::new("git").arg("-C").arg(&dest).arg("fetch").arg("--all"))?;
        if !row.branch.is_empty() {
            run_git(Command::new("git").arg("-C").arg(&dest).arg("checkout").arg(&row.branch))?;
        }
    } else {
        let mut cmd = Command::new("git");
        cmd.arg("clone");
        if !row.branch.is_empty() {
            cmd.arg("--branch").arg(&row.branch);
        }
        cmd.arg(&row.repository).arg(&dest);
        run_git(&mut cmd)?;
    }
    Ok(dest)
}

fn run_git(cmd: &mut Command) -> Result<()> {
    debug!(?cmd, "invoking git");
    let status = cmd.status().context("failed to launch git")?;
    if !status.success() {
        bail!("git exited with {status}");
    }
    Ok(())
}

// ============================================================================
// Source-root Discovery
// ============================================================================

/// Directories under `repo` whose path ends with `src/main/java`,
/// excluding any path containing `/test/` or `/tests/`.
fn find_java_source_roots(repo: &Path) -> std::io::Result<Vec<PathBuf>> {
    fn visit(dir: &Path, roots: &mut Vec<PathBuf>) -> std::io::Result<()> {
        let mut entries: Vec<_> = std::fs::read_dir(dir)?
            .collect::<std::io::Result<Vec<_>>>()?;
        entries.sort_by_key(|e| e.path());
        for entry in entries {
            let path = entry.path();
            if !path.is_dir() {
                continue;
            }
            let slashed = format!("{}/", path.display());
            if slashed.contains("/test/") || slashed.contains("/tests/") {
                continue;
            }
            if slashed.ends_with(&format!("/{JAVA_SOURCE_ROOT_SUFFIX}/")) {
                roots.push(path);
                continue;
            }
            visit(&path, roots)?;
        }
        Ok(())
    }

    let mut roots = Vec::new();
    if repo.is_dir() {
        visit(repo, &mut roots)?;
    }
    Ok(roots)
}

// ============================================================================
// Tests
// ============================================================================
