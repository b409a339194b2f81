//! Error types for valutadash.
//!
//! This module defines all error types used throughout the valutadash crate,
//! providing detailed context for debugging and operator-facing diagnostics.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for valutadash operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === Flag Persistence Errors ===
    /// Failed to read the persisted flag set.
    #[error("failed to read persisted flags at {path}: {source}")]
    PersistenceRead {
        /// Path to the persisted flag file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to write the persisted flag set.
    #[error("failed to persist flags at {path}: {source}")]
    PersistenceWrite {
        /// Path to the persisted flag file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to create a required directory.
    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        /// Path that couldn't be created.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === Flag Table Artifact Errors ===
    /// Failed to read the production flag-table artifact.
    #[error("failed to read flag table at {path}: {source}")]
    ArtifactRead {
        /// Path to the artifact file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The artifact exists but is not valid JSON.
    #[error("flag table at {path} is not valid JSON: {source}")]
    ArtifactParse {
        /// Path to the artifact file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: serde_json::Error,
    },

    /// The artifact parses but does not carry the expected structure.
    #[error("flag table at {path} is malformed: {message}")]
    ArtifactMalformed {
        /// Path to the artifact file.
        path: PathBuf,
        /// What was missing or wrong.
        message: String,
    },

    /// Failed to write the rewritten artifact back.
    #[error("failed to write flag table at {path}: {source}")]
    ArtifactWrite {
        /// Path to the artifact file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === Deployment Errors ===
    /// The requested stage number is outside the canonical range.
    #[error("invalid stage {requested}. Use a number between 1 and {max}")]
    StageOutOfRange {
        /// The stage number that was requested.
        requested: usize,
        /// Highest valid stage number.
        max: usize,
    },

    /// No stage was specified on the command line.
    #[error("no stage specified. Use --stage <number> or --list")]
    StageMissing,

    /// `--deploy` was requested but no publish command is configured.
    #[error("no publish command configured; set [deploy] publish_command")]
    PublishUnconfigured,

    /// A build or publish step could not be started.
    #[error("failed to start {step} command: {source}")]
    CommandSpawn {
        /// Which step was being started.
        step: &'static str,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// A build or publish step exited with a non-zero status.
    #[error("{step} step failed{}", fmt_exit_code(.code))]
    CommandFailed {
        /// Which step failed.
        step: &'static str,
        /// Exit code, if the process exited normally.
        code: Option<i32>,
    },

    // === Panel Errors ===
    /// A gated panel failed to construct.
    #[error("panel '{panel}' failed to load: {message}")]
    PanelLoad {
        /// Panel title or capability name.
        panel: String,
        /// Description of what went wrong.
        message: String,
    },

    // === I/O and Serialization Errors ===
    /// File system operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A specialized Result type for valutadash operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

fn fmt_exit_code(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!(" with exit code {code}"),
        None => " (terminated by signal)".to_string(),
    }
}

impl Error {
    /// Create a configuration validation error.
    #[must_use]
    pub fn config_validation(message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            message: message.into(),
        }
    }

    /// Create a malformed-artifact error.
    #[must_use]
    pub fn artifact_malformed(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::ArtifactMalformed {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a panel load error.
    #[must_use]
    pub fn panel_load(panel: impl Into<String>, message: impl Into<String>) -> Self {
        Self::PanelLoad {
            panel: panel.into(),
            message: message.into(),
        }
    }

    /// Check if this error is a stage-selection usage error.
    #[must_use]
    pub fn is_usage_error(&self) -> bool {
        matches!(self, Self::StageOutOfRange { .. } | Self::StageMissing)
    }
}
