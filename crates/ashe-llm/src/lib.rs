//! ASHE LLM - completion clients for the method-refinement pipeline
//!
//! # Overview
//!
//! The pipeline asks one question of a language model: "given this class
//! and this type error, produce a repaired method". This crate answers it
//! through a closed set of client variants behind a single `fetch`
//! operation:
//!
//! - [`HttpCompletionClient`] — real chat-completion endpoint with a
//!   total deadline and periodic progress logging
//! - [`FixtureClient`] — replays a configured file, for tests and
//!   offline runs
//! - dry-run — short-circuits without calling out
//!
//! Which variant runs is decided by the [`Model`] identifier, so callers
//! hold one [`LlmClient`] value and never branch on transport.

pub use error::{LlmError, Result};
pub use fixture::FixtureClient;
pub use http::HttpCompletionClient;
pub use wire::{Choice, CompletionRequest, CompletionResponse, Message, Usage};

mod error;
mod fixture;
mod http;
mod wire;

use std::fmt;

// ============================================================================
// Models
// ============================================================================

/// The closed set of accepted model identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Model {
    /// Real completion endpoint (`gpt-4`); the default
    Gpt4,
    /// Fixture client (`mock`)
    Mock,
    /// Skip the LLM step entirely (`dryrun`)
    DryRun,
}

impl Default for Model {
    fn default() -> Self {
        Self::Gpt4
    }
}

impl Model {
    /// Parse a model identifier.
    ///
    /// # Errors
    /// Returns `LlmError::InvalidModel` for anything outside the set.
    pub fn parse(identifier: &str) -> Result<Self> {
        match identifier {
            "gpt-4" => Ok(Self::Gpt4),
            "mock" => Ok(Self::Mock),
            "dryrun" => Ok(Self::DryRun),
            other => Err(LlmError::InvalidModel(other.to_string())),
        }
    }

    /// Identifier sent on the wire and printed in logs.
    pub fn identifier(self) -> &'static str {
        match self {
            Self::Gpt4 => "gpt-4",
            Self::Mock => "mock",
            Self::DryRun => "dryrun",
        }
    }

    /// Whether the refinement driver should skip the LLM step.
    pub fn is_dry_run(self) -> bool {
        self == Self::DryRun
    }
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.identifier())
    }
}

// ============================================================================
// Client Dispatch
// ============================================================================

/// Tagged client: one variant per accepted model.
#[derive(Debug)]
pub enum LlmClient {
    Http(HttpCompletionClient),
    Fixture(FixtureClient),
    DryRun,
}

impl LlmClient {
    /// Fetch one completion.
    ///
    /// The dry-run variant returns an empty reply, which downstream
    /// extraction treats as "no usable patch"; callers normally consult
    /// [`Model::is_dry_run`] before ever calling this.
    ///
    /// # Errors
    /// Propagates the underlying variant's [`LlmError`].
    pub fn fetch(&self, prompt: &str, model: Model) -> Result<String> {
        match self {
            Self::Http(client) => client.fetch(prompt, model.identifier()),
            Self::Fixture(client) => client.fetch(),
            Self::DryRun => Ok(String::new()),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
