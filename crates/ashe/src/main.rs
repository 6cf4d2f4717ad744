//! ashe CLI - refine Java methods until a pluggable type checker is satisfied.
//!
//! Three entry points share one pipeline:
//! - `method`: refine a single method and splice the clean result back
//! - `batch`: walk a directory and refine every public method
//! - `repos`: clone a CSV roster of repositories and batch each one
//!
//! This binary is the I/O layer: argument parsing, configuration loading,
//! logging setup, and process exit codes. The analysis lives in
//! `ashe-core`, the completion clients in `ashe-llm`.

mod batch;
mod checker;
mod config;
mod driver;
mod repos;
mod slicer;

use std::path::PathBuf;

use anyhow::bail;
use ashe_llm::Model;
use clap::{Parser, Subcommand};
use tracing::error;
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::driver::RefinementDriver;

/// ashe - automated software hardening for Java methods
#[derive(Parser, Debug)]
#[command(name = "ashe")]
#[command(author, version, about, long_about = None)]
#[command(after_help = "EXAMPLES:\n  \
    ashe method /p c/Foo.java 'c.Foo#bar(int, String)'       Refine one method\n  \
    ashe method /p c/Foo.java 'c.Foo#bar()' dryrun           Exercise the pipeline offline\n  \
    ashe batch /p/src /p gpt-4 ashe.properties               Refine a whole source tree\n  \
    ashe repos rosters/corpus.csv /tmp/clones gpt-4          Refine a roster of repositories")]
struct Args {
    #[command(subcommand)]
    command: CommandKind,
}

#[derive(Subcommand, Debug)]
enum CommandKind {
    /// Refine a single method and splice the clean result back
    Method {
        /// Absolute path of the project root
        project_root: PathBuf,
        /// Target file, relative to the project root (dirs/Name.java)
        target_file: String,
        /// Canonical method reference: pkg.Class#name(Type, Type)
        target_method: String,
        /// Model identifier: gpt-4 (default), mock, or dryrun
        model: Option<String>,
        /// Configuration properties file
        config_file: Option<PathBuf>,
    },
    /// Walk a directory and refine every public method of public types
    Batch {
        /// Directory to walk
        directory: PathBuf,
        /// Project root; must be a prefix of every processed file
        project_root: PathBuf,
        /// Model identifier: gpt-4 (default), mock, or dryrun
        model: Option<String>,
        /// Configuration properties file
        config_file: Option<PathBuf>,
    },
    /// Clone a Repository,Branch roster and refine each repository
    Repos {
        /// CSV file with header row Repository,Branch
        roster: PathBuf,
        /// Directory to clone into
        clone_dir: PathBuf,
        /// Model identifier: gpt-4 (default), mock, or dryrun
        model: Option<String>,
        /// Configuration properties file
        config_file: Option<PathBuf>,
    },
}

fn parse_model(raw: Option<&str>) -> anyhow::Result<Model> {
    match raw {
        Some(raw) => Ok(Model::parse(raw)?),
        None => Ok(Model::default()),
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    match Args::parse().command {
        CommandKind::Method {
            project_root,
            target_file,
            target_method,
            model,
            config_file,
        } => {
            let model = parse_model(model.as_deref())?;
            let config = Config::load_or_default(config_file.as_deref())?;
            let driver = RefinementDriver::new(&config, model)?;
            if let Err(e) = driver.refine(&project_root, &target_file, &target_method) {
                error!(reference = %target_method, outcome = %e, "work item failed");
                return Err(e.into());
            }
            Ok(())
        }
        CommandKind::Batch {
            directory,
            project_root,
            model,
            config_file,
        } => {
            let model = parse_model(model.as_deref())?;
            let config = Config::load_or_default(config_file.as_deref())?;
            let summary = batch::process_directory(&config, &directory, &project_root, model)?;
            if summary.failed > 0 {
                bail!("{} work item(s) failed", summary.failed);
            }
            Ok(())
        }
        CommandKind::Repos {
            roster,
            clone_dir,
            model,
            config_file,
        } => {
            let model = parse_model(model.as_deref())?;
            let config = Config::load_or_default(config_file.as_deref())?;
            repos::process_repositories(&config, &roster, &clone_dir, model)
        }
    }
}
