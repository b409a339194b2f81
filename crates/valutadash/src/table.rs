//! The flag table: environment default variants.
//!
//! The development variant is compiled in. The production variant is a
//! versioned JSON artifact written by the stage deployer and read here at
//! boot, so promoting a stage never requires editing source. A missing or
//! malformed artifact falls back to the compiled production baseline.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::flags::FlagSet;

/// The production flag-table artifact, as stored on disk.
///
/// The `flags` object carries only the capabilities a stage turned on;
/// everything else is left to the all-off baseline at load time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductionArtifact {
    /// Version identifier of the promotion, e.g. `1.0.0-stage2`.
    pub version: String,

    /// Name of the promoted stage, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage: Option<String>,

    /// When the promotion happened.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub promoted_at: Option<DateTime<Utc>>,

    /// Enabled capabilities by wire name.
    pub flags: BTreeMap<String, bool>,
}

/// Where the production variant came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableSource {
    /// Compiled-in baseline; no artifact was found or it was unreadable.
    Builtin,
    /// Loaded from the artifact at this path.
    Artifact(PathBuf),
}

impl std::fmt::Display for TableSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Builtin => write!(f, "builtin"),
            Self::Artifact(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Default flag sets per environment.
#[derive(Debug, Clone, PartialEq)]
pub struct FlagTable {
    /// Everything-on variant for local work.
    pub development: FlagSet,
    /// The live production baseline.
    pub production: FlagSet,
    /// Where the production variant came from.
    pub source: TableSource,
}

impl FlagTable {
    /// The compiled-in table, ignoring any artifact.
    #[must_use]
    pub fn builtin() -> Self {
        Self {
            development: FlagSet::development(),
            production: FlagSet::production_baseline(),
            source: TableSource::Builtin,
        }
    }

    /// Load the table, overlaying the production artifact if one exists.
    ///
    /// Never fails: a missing artifact is the normal installed-binary case,
    /// and a corrupt one is logged and ignored.
    #[must_use]
    pub fn load(artifact_path: &Path) -> Self {
        let raw = match fs::read_to_string(artifact_path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!(
                    path = %artifact_path.display(),
                    "no production flag artifact; using builtin baseline"
                );
                return Self::builtin();
            }
            Err(err) => {
                warn!(
                    %err,
                    path = %artifact_path.display(),
                    "could not read production flag artifact; using builtin baseline"
                );
                return Self::builtin();
            }
        };

        match serde_json::from_str::<ProductionArtifact>(&raw) {
            Ok(artifact) => {
                info!(
                    version = %artifact.version,
                    stage = artifact.stage.as_deref().unwrap_or("unknown"),
                    "loaded production flag artifact"
                );
                Self {
                    development: FlagSet::development(),
                    production: FlagSet::merged_over(&FlagSet::baseline(), &artifact.flags),
                    source: TableSource::Artifact(artifact_path.to_path_buf()),
                }
            }
            Err(err) => {
                warn!(
                    %err,
                    path = %artifact_path.display(),
                    "production flag artifact is malformed; using builtin baseline"
                );
                Self::builtin()
            }
        }
    }
}
