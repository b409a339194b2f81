//! The stage deployer.
//!
//! Offline tool behind the `valudash-stage` binary: rewrites the production
//! flag-table artifact to match a deployment stage, optionally backing the
//! previous table up first, and optionally running the build and publish
//! steps afterwards. Every failure is fatal to the invocation; the only
//! rollback mechanism is the optional backup copy.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use chrono::Utc;
use serde_json::{json, Map, Value};
use tracing::{debug, info};

use crate::config::DeployConfig;
use crate::error::{Error, Result};
use crate::stage::DeploymentStage;

/// Environment variable the deploy steps receive the version stamp in.
const VERSION_ENV: &str = "VALUTADASH_APP_VERSION";

/// Rewrites the production flag-table artifact and drives deployments.
#[derive(Debug, Clone)]
pub struct StageDeployer {
    artifact_path: PathBuf,
    deploy: DeployConfig,
}

impl StageDeployer {
    /// Create a deployer over the given artifact path.
    #[must_use]
    pub fn new(artifact_path: impl Into<PathBuf>, deploy: DeployConfig) -> Self {
        Self {
            artifact_path: artifact_path.into(),
            deploy,
        }
    }

    /// Path of the artifact this deployer rewrites.
    #[must_use]
    pub fn artifact_path(&self) -> &Path {
        &self.artifact_path
    }

    /// Copy the artifact to `<path>.backup` before mutating it.
    ///
    /// # Errors
    ///
    /// Returns an error if the artifact cannot be read or the copy fails.
    pub fn backup(&self) -> Result<PathBuf> {
        let mut backup_path = self.artifact_path.as_os_str().to_owned();
        backup_path.push(".backup");
        let backup_path = PathBuf::from(backup_path);

        fs::copy(&self.artifact_path, &backup_path).map_err(|source| Error::ArtifactRead {
            path: self.artifact_path.clone(),
            source,
        })?;
        info!(backup = %backup_path.display(), "backed up flag table");
        Ok(backup_path)
    }

    /// Rewrite the artifact's production table to match the stage.
    ///
    /// The `flags` member becomes exactly the stage's capabilities as
    /// `true` entries; capabilities the stage does not name are left to the
    /// baseline at load time, never forced to `false`. The artifact file is
    /// a contract: it must already exist and carry a `flags` object.
    ///
    /// # Errors
    ///
    /// Returns an error if the artifact is missing, unparseable, lacks the
    /// `flags` object, or cannot be written back.
    pub fn apply(&self, stage: &DeploymentStage) -> Result<()> {
        let raw =
            fs::read_to_string(&self.artifact_path).map_err(|source| Error::ArtifactRead {
                path: self.artifact_path.clone(),
                source,
            })?;
        let mut document: Value =
            serde_json::from_str(&raw).map_err(|source| Error::ArtifactParse {
                path: self.artifact_path.clone(),
                source,
            })?;

        let Some(root) = document.as_object_mut() else {
            return Err(Error::artifact_malformed(
                &self.artifact_path,
                "top level is not an object",
            ));
        };
        if !root.get("flags").is_some_and(Value::is_object) {
            return Err(Error::artifact_malformed(
                &self.artifact_path,
                "missing 'flags' table",
            ));
        }

        let mut flags = Map::new();
        for capability in stage.enabled {
            flags.insert(capability.name().to_string(), Value::Bool(true));
        }
        root.insert("flags".to_string(), Value::Object(flags));
        root.insert("version".to_string(), json!(stage.version()));
        root.insert("stage".to_string(), json!(stage.name));
        root.insert("promotedAt".to_string(), json!(Utc::now().to_rfc3339()));

        let mut rendered = serde_json::to_string_pretty(&document)?;
        rendered.push('\n');
        fs::write(&self.artifact_path, rendered).map_err(|source| Error::ArtifactWrite {
            path: self.artifact_path.clone(),
            source,
        })?;

        info!(
            stage = stage.name,
            version = %stage.version(),
            path = %self.artifact_path.display(),
            "flag table rewritten"
        );
        Ok(())
    }

    /// Run the build step, then the publish step.
    ///
    /// Both steps receive the stage's version stamp in the environment. A
    /// non-zero exit from either aborts with no further steps. The publish
    /// command has no default and is checked up front, before the build
    /// spends any time.
    ///
    /// # Errors
    ///
    /// Returns an error if the publish command is unconfigured or either
    /// step fails to spawn or exits non-zero.
    pub fn deploy(&self, stage: &DeploymentStage) -> Result<()> {
        if self.deploy.publish_command.is_empty() {
            return Err(Error::PublishUnconfigured);
        }
        let version = stage.version();
        run_step("build", &self.deploy.build_command, &version)?;
        run_step("publish", &self.deploy.publish_command, &version)?;
        info!(%version, "deployment finished");
        Ok(())
    }
}

/// Render the canonical stage list for `--list`.
#[must_use]
pub fn format_stage_list() -> String {
    let mut out = String::from("Available deployment stages:\n");
    for stage in DeploymentStage::all() {
        out.push_str(&format!(
            "{}. {}: {}\n",
            stage.number, stage.name, stage.description
        ));
        out.push_str("   Enabled capabilities:\n");
        for capability in stage.enabled {
            out.push_str(&format!("   - {capability}\n"));
        }
        out.push('\n');
    }
    out
}

fn run_step(step: &'static str, command: &[String], version: &str) -> Result<()> {
    let Some((program, args)) = command.split_first() else {
        return Err(Error::config_validation(format!(
            "{step}_command must not be empty"
        )));
    };
    debug!(step, ?command, "running deployment step");
    let status = Command::new(program)
        .args(args)
        .env(VERSION_ENV, version)
        .status()
        .map_err(|source| Error::CommandSpawn { step, source })?;
    if !status.success() {
        return Err(Error::CommandFailed {
            step,
            code: status.code(),
        });
    }
    Ok(())
}
