//! Refinement driver: the slice → check → repair → splice convergence loop.
//!
//! One driver run refines one work item (a source file plus a canonical
//! method reference). The loop invokes the checker on the sliced file,
//! asks the LLM for a repaired method while errors remain, applies each
//! patch with the replacement engine, and finally splices the cleaned
//! method back into the original file. The slice directory is owned here
//! and deleted on every exit path, clean or not.

use std::path::Path;
use std::time::Duration;

use ashe_core::{
    carry_method, extract_code_block, is_valid_reference, is_valid_source_path, normalize,
    parse_method_name, replace_method_in_source, SourceTree,
};
use ashe_llm::{FixtureClient, HttpCompletionClient, LlmClient, Model};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::checker::{run_checker, CheckerError};
use crate::config::{keys, Config};
use crate::slicer::{run_slicer, sliced_file_path, SliceError};

/// Repair attempts per work item unless `driver.max-iterations` overrides
const DEFAULT_MAX_ITERATIONS: u64 = 10;

const DEFAULT_SYSTEM_MESSAGE: &str =
    "You are a Java expert. You repair methods so they pass a pluggable type checker \
     without changing their intent.";
const DEFAULT_PROMPT_START: &str =
    "The following Java class fails its type check. The reported errors are below.";
const DEFAULT_PROMPT_END: &str =
    "Reply with the corrected method only, inside a ```java fenced code block.";

// ============================================================================
// Terminal States
// ============================================================================

/// Terminal failure states of one refinement run
#[derive(Debug, Error)]
pub enum RefinementError {
    /// CLI or canonical-form validation failed before any subprocess ran
    #[error("invalid work-item format: {0}")]
    Format(String),

    /// The slicer could not produce a minimal file
    #[error("minimization failed: {0}")]
    MinimizationFailed(#[from] SliceError),

    /// The checker could not be executed at all
    #[error("checker failed: {0}")]
    Checker(#[from] CheckerError),

    /// No usable patch: empty code block, or the completion itself failed
    #[error("no usable patch obtained")]
    NoPatch,

    /// A patch was obtained but could not be applied to the sliced file
    #[error("patch could not be applied")]
    PatchApplyFailed,

    /// The cleaned method could not be spliced back into the original
    #[error("cleaned method could not be spliced back")]
    SpliceFailed,

    /// The configurable repair cap was reached before convergence
    #[error("no convergence after {0} repair attempts")]
    IterationLimit(u64),

    /// Parse or resolution failure from the source-analysis layer
    #[error(transparent)]
    Core(#[from] ashe_core::CoreError),

    /// Filesystem I/O failed
    #[error("I/O failure: {0}")]
    Io(#[from] std::io::Error),

    /// A required configuration value was missing or malformed
    #[error("configuration error: {0}")]
    Config(String),
}

// ============================================================================
// Driver
// ============================================================================

/// Driver for refining methods under one configuration and model.
#[derive(Debug)]
pub struct RefinementDriver<'a> {
    config: &'a Config,
    model: Model,
    client: LlmClient,
    max_iterations: u64,
}

impl<'a> RefinementDriver<'a> {
    /// Build a driver; the LLM client variant is chosen by the model.
    pub fn new(config: &'a Config, model: Model) -> Result<Self, RefinementError> {
        let client = build_client(config, model)?;
        let max_iterations = config
            .get_u64(keys::DRIVER_MAX_ITERATIONS)
            .map_err(|e| RefinementError::Config(e.to_string()))?
            .unwrap_or(DEFAULT_MAX_ITERATIONS);
        Ok(Self {
            config,
            model,
            client,
            max_iterations,
        })
    }

    /// Refine one method and splice the clean result into the original
    /// file. `target_file` is relative to `project_root`.
    pub fn refine(
        &self,
        project_root: &Path,
        target_file: &str,
        reference: &str,
    ) -> Result<(), RefinementError> {
        // Validation happens before any subprocess is touched.
        let reference = normalize(reference);
        if !is_valid_source_path(target_file) {
            return Err(RefinementError::Format(format!(
                "target file `{target_file}`"
            )));
        }
        if !is_valid_reference(&reference) {
            return Err(RefinementError::Format(format!(
                "method reference `{reference}`"
            )));
        }
        let method_name = parse_method_name(&reference)
            .map_err(|_| RefinementError::Format(format!("method reference `{reference}`")))?
            .to_string();

        info!(%reference, model = %self.model, "starting refinement");

        let slice = run_slicer(
            self.config,
            project_root,
            target_file,
            &reference,
            self.model.is_dry_run(),
        )?;
        let sliced_path = sliced_file_path(&slice, target_file)?;

        let mut repairs = 0u64;
        loop {
            let errors = run_checker(self.config, project_root, &sliced_path)?;
            if errors.is_empty() {
                debug!(%reference, repairs, "checker reports clean");
                break;
            }
            debug!(%reference, error = %errors.lines().next().unwrap_or(""), "checker reports errors");

            if self.model.is_dry_run() {
                info!(%reference, "dry-run: repair step skipped");
                return Err(RefinementError::NoPatch);
            }
            repairs += 1;
            if repairs > self.max_iterations {
                return Err(RefinementError::IterationLimit(self.max_iterations));
            }

            let sliced_source = std::fs::read_to_string(&sliced_path)?;
            let tree = SourceTree::parse(sliced_source)?;
            let class = tree.type_with_method(&method_name)?;
            let prompt = self.build_prompt(tree.text_of(&class.range), &errors);

            let reply = match self.client.fetch(&prompt, self.model) {
                Ok(reply) => reply,
                Err(e) => {
                    warn!(%reference, error = %e, "completion failed; no usable patch");
                    return Err(RefinementError::NoPatch);
                }
            };
            let patch = extract_code_block(&reply);
            if patch.is_empty() {
                return Err(RefinementError::NoPatch);
            }

            match replace_method_in_source(tree.render(), &class.name, &patch) {
                Ok(Some(updated)) => write_atomic(&sliced_path, &updated)?,
                Ok(None) => return Err(RefinementError::PatchApplyFailed),
                Err(e) => {
                    warn!(%reference, error = %e, "patch rejected by replacement engine");
                    return Err(RefinementError::PatchApplyFailed);
                }
            }
        }

        // Splice the cleaned method back into the original file.
        let target_path = project_root.join(target_file);
        let checked_source = std::fs::read_to_string(&sliced_path)?;
        let target_source = std::fs::read_to_string(&target_path)?;
        match carry_method(&checked_source, &target_source, &method_name) {
            Ok(Some(spliced)) => write_atomic(&target_path, &spliced)?,
            Ok(None) => return Err(RefinementError::SpliceFailed),
            Err(e) => {
                warn!(%reference, error = %e, "splice failed");
                return Err(RefinementError::SpliceFailed);
            }
        }

        info!(%reference, repairs, "refinement clean");
        // `slice` drops here; the temporary directory is deleted on this
        // path and on every early return above.
        Ok(())
    }

    fn build_prompt(&self, class_text: &str, errors: &str) -> String {
        let start = self.config.get_or(keys::PROMPT_START, DEFAULT_PROMPT_START);
        let end = self.config.get_or(keys::PROMPT_END, DEFAULT_PROMPT_END);
        [class_text, start, errors, end].join("\n")
    }
}

// ============================================================================
// Client Construction
// ============================================================================

fn build_client(config: &Config, model: Model) -> Result<LlmClient, RefinementError> {
    match model {
        Model::Gpt4 => {
            let endpoint = config
                .require(keys::LLM_ENDPOINT)
                .map_err(|e| RefinementError::Config(e.to_string()))?;
            let api_key = config
                .require(keys::LLM_API_KEY)
                .map_err(|e| RefinementError::Config(e.to_string()))?;
            let mut client = HttpCompletionClient::new(
                endpoint,
                api_key,
                config.get_or(keys::LLM_SYSTEM_ROLE, "system"),
                config.get_or(keys::LLM_USER_ROLE, "user"),
                config.get_or(keys::LLM_SYSTEM_MESSAGE, DEFAULT_SYSTEM_MESSAGE),
            )
            .map_err(|e| RefinementError::Config(e.to_string()))?;
            if let Some(secs) = config
                .get_u64(keys::LLM_TIMEOUT_SECS)
                .map_err(|e| RefinementError::Config(e.to_string()))?
            {
                client = client.with_deadline(Duration::from_secs(secs));
            }
            if let Some(secs) = config
                .get_u64(keys::LLM_PROGRESS_SECS)
                .map_err(|e| RefinementError::Config(e.to_string()))?
            {
                client = client.with_progress_interval(Duration::from_secs(secs));
            }
            Ok(LlmClient::Http(client))
        }
        Model::Mock => {
            let path = config
                .require(keys::FIXTURE_RESPONSE_FILE)
                .map_err(|e| RefinementError::Config(e.to_string()))?;
            Ok(LlmClient::Fixture(FixtureClient::new(path)))
        }
        Model::DryRun => Ok(LlmClient::DryRun),
    }
}

// ============================================================================
// Atomic Write-back
// ============================================================================

/// Truncate-write via a sibling temp file and rename, so a reader never
/// observes a partial file.
pub fn write_atomic(path: &Path, contents: &str) -> std::io::Result<()> {
    use std::io::Write;

    let parent = path.parent().filter(|p| !p.as_os_str().is_empty());
    let mut tmp = tempfile::NamedTempFile::new_in(parent.unwrap_or_else(|| Path::new(".")))?;
    tmp.write_all(contents.as_bytes())?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
