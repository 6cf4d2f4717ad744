//! Fixture client for tests and offline runs.

use std::path::PathBuf;

use crate::error::Result;

/// A completion client that ignores its inputs and replays the contents
/// of a configured file.
#[derive(Debug)]
pub struct FixtureClient {
    path: PathBuf,
}

impl FixtureClient {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Return the fixture file's contents.
    ///
    /// # Errors
    /// Returns `LlmError::Io` when the file cannot be read.
    pub fn fetch(&self) -> Result<String> {
        Ok(std::fs::read_to_string(&self.path)?)
    }
}
