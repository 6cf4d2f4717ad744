//! Slicer adapter.
//!
//! Invokes the external program slicer as a subprocess:
//!
//! ```text
//! <slicer.path> <project-root> <target-file> <method-reference> <output-dir>
//! ```
//!
//! On success the slicer has written a compilable minimal version of the
//! target file (same file name) into a fresh temporary directory. The
//! directory is owned by the caller and deleted when dropped, so every
//! driver exit path cleans it up.

use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use std::process::{Command, Stdio};

use tempfile::TempDir;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::{keys, Config};

/// Error type for the slicer adapter
#[derive(Debug, Error)]
pub enum SliceError {
    #[error("missing required configuration key `{0}`")]
    Missing(&'static str),

    #[error("failed to launch slicer `{tool}`: {source}")]
    Spawn {
        tool: String,
        source: std::io::Error,
    },

    #[error("I/O failure while running slicer: {0}")]
    Io(#[from] std::io::Error),

    #[error("slicer exited with {0}")]
    Exit(std::process::ExitStatus),

    #[error("slicer output contained an exception marker")]
    ExceptionMarker,

    #[error("slicer produced no output file `{0}`")]
    MissingOutput(String),
}

/// Result of a successful slice: the owned output directory and the
/// combined subprocess output (kept for dry-run diagnostics).
#[derive(Debug)]
pub struct SliceOutput {
    pub dir: TempDir,
    pub log: String,
}

/// Run the slicer for one method.
///
/// Non-dry-run failure conditions: the subprocess cannot start, exits
/// nonzero, or its combined stdout/stderr contains `exception`. In
/// dry-run mode the output is preserved and only spawn failures count.
pub fn run_slicer(
    config: &Config,
    project_root: &Path,
    target_file: &str,
    reference: &str,
    dry_run: bool,
) -> Result<SliceOutput, SliceError> {
    let tool = config
        .get(keys::SLICER_PATH)
        .ok_or(SliceError::Missing(keys::SLICER_PATH))?;
    let dir = TempDir::new()?;

    let mut cmd = Command::new(tool);
    cmd.arg(project_root)
        .arg(target_file)
        .arg(reference)
        .arg(dir.path())
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    debug!(?cmd, "invoking slicer");

    let mut child = cmd.spawn().map_err(|source| SliceError::Spawn {
        tool: tool.to_string(),
        source,
    })?;

    // Drain stderr on a helper thread so neither pipe can fill up while
    // stdout is being streamed.
    let stderr_reader = child.stderr.take().map(|stderr| {
        std::thread::spawn(move || {
            let mut text = String::new();
            let _ = BufReader::new(stderr).read_to_string(&mut text);
            text
        })
    });

    let mut combined = String::new();
    if let Some(stdout) = child.stdout.take() {
        for line in BufReader::new(stdout).lines() {
            let line = line?;
            debug!(target: "slicer", "{line}");
            combined.push_str(&line);
            combined.push('\n');
        }
    }
    if let Some(handle) = stderr_reader {
        if let Ok(text) = handle.join() {
            combined.push_str(&text);
        }
    }

    let status = child.wait()?;

    if !dry_run {
        if combined.to_lowercase().contains("exception") {
            warn!(%status, "slicer reported an exception; treating run as failed");
            return Err(SliceError::ExceptionMarker);
        }
        if !status.success() {
            return Err(SliceError::Exit(status));
        }
    }

    Ok(SliceOutput { dir, log: combined })
}

/// Path of the sliced file inside a slice directory: the slicer mirrors
/// the target file's name.
pub fn sliced_file_path(output: &SliceOutput, target_file: &str) -> Result<std::path::PathBuf, SliceError> {
    let name = Path::new(target_file)
        .file_name()
        .ok_or_else(|| SliceError::MissingOutput(target_file.to_string()))?;
    let path = output.dir.path().join(name);
    if !path.is_file() {
        return Err(SliceError::MissingOutput(path.display().to_string()));
    }
    Ok(path)
}

// ============================================================================
// Tests
// ============================================================================
