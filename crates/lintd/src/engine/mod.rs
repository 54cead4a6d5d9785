//! The analysis engine boundary.
//!
//! The daemon treats the engine as an external collaborator reached through
//! [`AnalysisEngine`]. An analysis call is synchronous: it runs on the
//! calling thread, invokes the issue listener and the log output zero or
//! more times, and returns once every file has been processed.

mod basic;
mod rules;

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::input::ClientInputFile;
use crate::issue::{IssueError, IssueListener};
use crate::log::LogOutput;

pub use basic::BasicEngine;

/// Errors returned by an engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The issue listener failed; the analysis was aborted
    #[error("analysis aborted: {0}")]
    Listener(#[from] IssueError),
    /// The engine or analysis configuration is invalid
    #[error("invalid configuration: {0}")]
    Config(String),
    /// The engine faulted
    #[error("engine failure: {0}")]
    Failure(String),
}

/// Process-level engine configuration.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Rule keys that must not run
    #[serde(default)]
    pub excluded_rules: BTreeSet<String>,
    /// Engine properties
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
}

/// Everything one analysis call needs.
#[derive(Clone, Debug)]
pub struct AnalysisConfiguration<T> {
    base_dir: PathBuf,
    work_dir: Option<PathBuf>,
    files: Vec<ClientInputFile<T>>,
    properties: BTreeMap<String, String>,
}

impl<T> AnalysisConfiguration<T> {
    /// Start building a configuration rooted at `base_dir`.
    pub fn builder(base_dir: impl Into<PathBuf>) -> AnalysisConfigurationBuilder<T> {
        AnalysisConfigurationBuilder {
            base_dir: base_dir.into(),
            work_dir: None,
            files: Vec::new(),
            properties: BTreeMap::new(),
        }
    }

    /// Base directory relative file paths were resolved against.
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Scratch directory the engine may use, if any.
    pub fn work_dir(&self) -> Option<&Path> {
        self.work_dir.as_deref()
    }

    /// Files to analyze.
    pub fn files(&self) -> &[ClientInputFile<T>] {
        &self.files
    }

    /// Per-analysis properties.
    pub fn properties(&self) -> &BTreeMap<String, String> {
        &self.properties
    }
}

/// Builder for [`AnalysisConfiguration`].
#[derive(Debug)]
pub struct AnalysisConfigurationBuilder<T> {
    base_dir: PathBuf,
    work_dir: Option<PathBuf>,
    files: Vec<ClientInputFile<T>>,
    properties: BTreeMap<String, String>,
}

impl<T> AnalysisConfigurationBuilder<T> {
    /// Set the work directory.
    pub fn work_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.work_dir = Some(dir.into());
        self
    }

    /// Add a file.
    pub fn file(mut self, file: ClientInputFile<T>) -> Self {
        self.files.push(file);
        self
    }

    /// Add a property, replacing any earlier value for `key`.
    pub fn property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Finish the configuration.
    pub fn build(self) -> AnalysisConfiguration<T> {
        AnalysisConfiguration {
            base_dir: self.base_dir,
            work_dir: self.work_dir,
            files: self.files,
            properties: self.properties,
        }
    }
}

/// Summary of a finished analysis.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResults {
    /// Number of files the engine was given
    pub file_count: usize,
    /// Paths of files that could not be read or decoded
    pub failed_files: Vec<String>,
}

/// Description of one rule.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleDetails {
    /// Rule key
    pub key: String,
    /// Display name
    pub name: String,
    /// Description as HTML
    pub html_description: String,
    /// Language the rule applies to
    pub language: String,
    /// Default severity label
    pub severity: String,
}

/// The contract the daemon drives.
///
/// Implementations are not assumed to support concurrent `analyze` calls;
/// callers serialize access to one instance.
pub trait AnalysisEngine: Send + Sync + 'static {
    /// Create and start an engine.
    fn start(config: &EngineConfig) -> Result<Self, EngineError>
    where
        Self: Sized;

    /// Analyze every file in `config`, reporting issues to `listener` and log
    /// lines to `log`.
    ///
    /// If `listener` returns an error the engine stops and returns
    /// [`EngineError::Listener`].
    fn analyze<T>(
        &self,
        config: &AnalysisConfiguration<T>,
        listener: &mut dyn IssueListener<T>,
        log: &dyn LogOutput,
    ) -> Result<AnalysisResults, EngineError>;

    /// Look up a rule by key.
    fn rule_details(&self, rule_key: &str) -> Option<RuleDetails>;

    /// Keys of all active rules.
    fn rules(&self) -> Vec<String>;
}
