//! Checker adapter.
//!
//! Invokes the external pluggable type checker on a single file:
//!
//! ```text
//! <checker.command> -jar <checker.jar> -cp <checker.classpath>:<root> \
//!     -processor <checker.processor> <file>
//! ```
//!
//! Diagnostics arrive on stderr. The adapter's result is the first error
//! region — the substring from the first `error:` token to the end of the
//! stream, trimmed — or the empty string for a clean file. A nonzero exit
//! alone is not failure: checkers exit nonzero whenever they report
//! diagnostics, so the `error:` token is the only classification signal.

use std::path::Path;
use std::process::{Command, Stdio};

use thiserror::Error;
use tracing::{debug, warn};

use crate::config::{keys, Config};

/// Default checker launcher when `checker.command` is absent
const DEFAULT_COMMAND: &str = "java";

/// Token that starts an error region in the diagnostic stream
const ERROR_TOKEN: &str = "error:";

/// Error type for the checker adapter.
///
/// A nonempty error region is adapter *success*; this type only covers
/// the checker being impossible to execute.
#[derive(Debug, Error)]
pub enum CheckerError {
    #[error("missing required configuration key `{0}`")]
    Missing(&'static str),

    #[error("failed to launch checker `{tool}`: {source}")]
    Spawn {
        tool: String,
        source: std::io::Error,
    },

    #[error("I/O failure while running checker: {0}")]
    Io(#[from] std::io::Error),
}

/// Run the checker on one file and return its first error region.
pub fn run_checker(config: &Config, root: &Path, file: &Path) -> Result<String, CheckerError> {
    let tool = config.get_or(keys::CHECKER_COMMAND, DEFAULT_COMMAND);
    let jar = config
        .get(keys::CHECKER_JAR)
        .ok_or(CheckerError::Missing(keys::CHECKER_JAR))?;
    let classpath = config
        .get(keys::CHECKER_CLASSPATH)
        .ok_or(CheckerError::Missing(keys::CHECKER_CLASSPATH))?;
    let processor = config
        .get(keys::CHECKER_PROCESSOR)
        .ok_or(CheckerError::Missing(keys::CHECKER_PROCESSOR))?;

    let mut cmd = Command::new(tool);
    cmd.arg("-jar")
        .arg(jar)
        .arg("-cp")
        .arg(format!("{}:{}", classpath, root.display()))
        .arg("-processor")
        .arg(processor)
        .arg(file)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped());
    debug!(?cmd, "invoking checker");

    // Capture the error stream to completion, then reap the process.
    let output = cmd.output().map_err(|source| CheckerError::Spawn {
        tool: tool.to_string(),
        source,
    })?;
    let diagnostics = String::from_utf8_lossy(&output.stderr);

    if !output.status.success() {
        warn!(status = %output.status, "checker exited nonzero");
    }

    Ok(first_error_region(&diagnostics).to_string())
}

/// First error region of a diagnostic stream: from the first `error:`
/// token through end of stream, trimmed; empty when no token is present.
pub fn first_error_region(diagnostics: &str) -> &str {
    match diagnostics.find(ERROR_TOKEN) {
        Some(at) => diagnostics[at..].trim(),
        None => "",
    }
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
    fn test_first_error_region_extracts_to_end() {
        let stream = "Foo.java:12: warning: unused\nFoo.java:14: error: incompatible types\n  required: int\n";
        assert_eq!(
            first_error_region(stream),
            "error: incompatible types\n  required: int"
        );
    }

    #[test]
    fn test_first_error_region_clean_stream() {
        assert_eq!(first_error_region("2 warnings\n"), "");
        assert_eq!(first_error_region(""), "");
    }

    #[cfg(unix)]
    #[test]
    fn test_checker_nonzero_exit_is_not_failure() {
        use std::os::unix::fs::PermissionsExt;
        let temp = TempDir::new().unwrap();
        let tool = temp.path().join("checker.sh");
        fs::write(
            &tool,
            "#!/bin/sh\necho 'Foo.java:3: error: dereference of nullable' 1>&2\nexit 1\n",
        )
        .unwrap();
        fs::set_permissions(&tool, fs::Permissions::from_mode(0o755)).unwrap();

        let config_file = temp.path().join("config.properties");
        fs::write(
            &config_file,
            format!(
                "{}={}\n{}=checker.jar\n{}=deps\n{}=nullness\n",
                keys::CHECKER_COMMAND,
                tool.display(),
                keys::CHECKER_JAR,
                keys::CHECKER_CLASSPATH,
                keys::CHECKER_PROCESSOR,
            ),
        )
        .unwrap();
        let config = Config::load(&config_file).unwrap();

        let region = run_checker(&config, temp.path(), Path::new("Foo.java")).unwrap();
        assert_eq!(region, "error: dereference of nullable");
    }

    #[test]
    fn test_checker_missing_configuration() {
        let config = Config::default();
        let err = run_checker(&config, Path::new("/p"), Path::new("Foo.java")).unwrap_err();
        assert!(matches!(err, CheckerError::Missing(_)));
    }
}
