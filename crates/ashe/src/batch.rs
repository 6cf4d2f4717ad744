//! Batch driver: walk a directory tree and refine every public method.
//!
//! Files are visited in depth-first walk order (directory entries sorted
//! for determinism). A file that fails to parse is logged and skipped;
//! any other work-item failure aborts the run unless
//! `batch.abort-on-failure=false` downgrades it to a logged count.

use std::path::{Path, PathBuf};

use ashe_core::SourceTree;
use ashe_llm::Model;
use thiserror::Error;
use tracing::{info, warn};

use crate::config::{keys, Config};
use crate::driver::{RefinementDriver, RefinementError};

/// Extension of files the batch driver selects
const SOURCE_EXTENSION: &str = "java";

/// Conventional source-directory prefix stripped from target paths
const CONVENTIONAL_SOURCE_PREFIX: &str = "src/main/java";

// ============================================================================
// Errors and Summary
// ============================================================================

/// Error type for the batch driver
#[derive(Debug, Error)]
pub enum BatchError {
    /// The project root is not a prefix of a processed file's path
    #[error("project root {root} is not a prefix of {file}")]
    InvalidLayout { root: PathBuf, file: PathBuf },

    #[error("I/O failure: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Refinement(#[from] RefinementError),

    #[error(transparent)]
    Core(#[from] ashe_core::CoreError),

    #[error("configuration error: {0}")]
    Config(String),
}

/// Outcome counts for one batch run
#[derive(Debug, Default)]
pub struct BatchSummary {
    /// Work items that terminated clean
    pub refined: usize,
    /// Work items that hit a terminal failure
    pub failed: usize,
    /// Files skipped because they did not parse
    pub skipped_files: usize,
}

// ============================================================================
// Directory Processing
// ============================================================================

/// Walk `directory` and refine every public method of every public type.
pub fn process_directory(
    config: &Config,
    directory: &Path,
    project_root: &Path,
    model: Model,
) -> Result<BatchSummary, BatchError> {
    let driver = RefinementDriver::new(config, model)?;
    let abort_on_failure = config
        .get_bool(keys::BATCH_ABORT_ON_FAILURE)
        .map_err(|e| BatchError::Config(e.to_string()))?
        .unwrap_or(true);

    let mut summary = BatchSummary::default();
    for file in collect_source_files(directory)? {
        process_file(&driver, &file, project_root, abort_on_failure, &mut summary)?;
    }
    info!(
        refined = summary.refined,
        failed = summary.failed,
        skipped_files = summary.skipped_files,
        "batch complete"
    );
    Ok(summary)
}

/// Refine every public method of every public type in one file.
///
/// A parse failure is non-fatal: the file is logged and skipped. A
/// refinement failure either aborts (default) or is counted, depending
/// on `abort_on_failure`.
pub fn process_file(
    driver: &RefinementDriver<'_>,
    path: &Path,
    project_root: &Path,
    abort_on_failure: bool,
    summary: &mut BatchSummary,
) -> Result<(), BatchError> {
    let abs = path.canonicalize()?;
    let root = project_root.canonicalize()?;
    let rel = abs
        .strip_prefix(&root)
        .map_err(|_| BatchError::InvalidLayout {
            root: root.clone(),
            file: abs.clone(),
        })?
        .to_path_buf();

    let source = std::fs::read_to_string(&abs)?;
    let tree = match SourceTree::parse(source) {
        Ok(tree) => tree,
        Err(e) => {
            warn!(file = %abs.display(), error = %e, "skipping file that does not parse");
            summary.skipped_files += 1;
            return Ok(());
        }
    };

    // Strip the conventional source prefix, keeping the driver's root and
    // the relative target path pointing at the same file.
    let (driver_root, target_rel) = match rel.strip_prefix(CONVENTIONAL_SOURCE_PREFIX) {
        Ok(stripped) => (root.join(CONVENTIONAL_SOURCE_PREFIX), stripped.to_path_buf()),
        Err(_) => (root.clone(), rel),
    };
    let target_file = slash_join(&target_rel);

    let package = tree.package_name();
    for ty in tree.types().iter().filter(|t| t.is_public) {
        let qualifier = if package.is_empty() {
            ty.name.clone()
        } else {
            format!("{package}.{}", ty.name)
        };
        for method in tree
            .methods_of(ty)?
            .iter()
            .filter(|m| m.is_public && m.body_range.is_some())
        {
            let param_types: Vec<_> = method
                .signature
                .params
                .iter()
                .map(|p| p.ty.clone())
                .collect();
            let reference = format!(
                "{qualifier}#{}({})",
                method.signature.name,
                param_types.join(", ")
            );

            match driver.refine(&driver_root, &target_file, &reference) {
                Ok(()) => {
                    summary.refined += 1;
                    info!(%reference, outcome = "clean", "work item finished");
                }
                Err(e) => {
                    summary.failed += 1;
                    warn!(%reference, outcome = %e, "work item failed");
                    if abort_on_failure {
                        return Err(BatchError::Refinement(e));
                    }
                }
            }
        }
    }
    Ok(())
}

// ============================================================================
// File Collection
// ============================================================================

/// Collect source files under `dir` in depth-first walk order.
fn collect_source_files(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    fn visit_dir(dir: &Path, files: &mut Vec<PathBuf>) -> std::io::Result<()> {
        if !dir.is_dir() {
            return Ok(());
        }
        let mut entries: Vec<_> = std::fs::read_dir(dir)?
            .collect::<std::io::Result<Vec<_>>>()?;
        entries.sort_by_key(|e| e.path());
        for entry in entries {
            let path = entry.path();
            if path.is_dir() {
                visit_dir(&path, files)?;
            } else if path.extension().and_then(|e| e.to_str()) == Some(SOURCE_EXTENSION) {
                files.push(path);
            }
        }
        Ok(())
    }

    let mut files = Vec::new();
    visit_dir(dir, &mut files)?;
    Ok(files)
}

/// Join path components with `/` regardless of platform separator.
fn slash_join(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_collect_source_files_depth_first_sorted() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("a/deep")).unwrap();
        fs::create_dir_all(temp.path().join("b")).unwrap();
        fs::write(temp.path().join("a/deep/Z.java"), "").unwrap();
        fs::write(temp.path().join("a/A.java"), "").unwrap();
        fs::write(temp.path().join("b/B.java"), "").unwrap();
        fs::write(temp.path().join("b/notes.txt"), "").unwrap();

        let files = collect_source_files(temp.path()).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| slash_join(p.strip_prefix(temp.path()).unwrap()))
            .collect();
        assert_eq!(names, vec!["a/A.java", "a/deep/Z.java", "b/B.java"]);
    }

    #[test]
    fn test_invalid_layout_when_root_not_prefix() {
        let project = TempDir::new().unwrap();
        let elsewhere = TempDir::new().unwrap();
        fs::write(project.path().join("Foo.java"), "class Foo {}").unwrap();

        let config = Config::default();
        let driver = RefinementDriver::new(&config, Model::DryRun).unwrap();
        let mut summary = BatchSummary::default();
        let err = process_file(
            &driver,
            &project.path().join("Foo.java"),
            elsewhere.path(),
            true,
            &mut summary,
        )
        .unwrap_err();
        assert!(matches!(err, BatchError::InvalidLayout { .. }));
    }

    #[test]
    fn test_parse_failure_is_skipped_not_fatal() {
        let project = TempDir::new().unwrap();
        fs::write(project.path().join("Broken.java"), "class {{{ nope").unwrap();

        let config = Config::default();
        let driver = RefinementDriver::new(&config, Model::DryRun).unwrap();
        let mut summary = BatchSummary::default();
        process_file(
            &driver,
            &project.path().join("Broken.java"),
            project.path(),
            true,
            &mut summary,
        )
        .unwrap();
        assert_eq!(summary.skipped_files, 1);
        assert_eq!(summary.failed, 0);
    }

    #[test]
    fn test_conventional_prefix_is_stripped() {
        let rel = Path::new("src/main/java/com/example/Foo.java");
        let stripped = rel.strip_prefix(CONVENTIONAL_SOURCE_PREFIX).unwrap();
        assert_eq!(slash_join(stripped), "com/example/Foo.java");
    }
}
