//! `valudash-stage` - progressive deployment tool
//!
//! Rewrites the production flag-table artifact to match a named deployment
//! stage, optionally backing the previous table up first and optionally
//! running the build and publish steps afterwards.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use valutadash::deployer::{format_stage_list, StageDeployer};
use valutadash::logging::Verbosity;
use valutadash::{init_logging, Config, DeploymentStage, Error};

/// valudash-stage - Progressive rollout of the production flag table
///
/// Promotes a deployment stage by rewriting the versioned flag-table
/// artifact the dashboard reads at boot. Stages only ever add capabilities
/// on top of the baseline.
#[derive(Debug, Parser)]
#[command(name = "valudash-stage")]
#[command(author, version, about, long_about = None)]
struct StageCli {
    /// Deployment stage to apply (1-4)
    #[arg(long, value_name = "N")]
    stage: Option<usize>,

    /// List all stages with their capabilities and exit
    #[arg(long)]
    list: bool,

    /// Back up the flag table before rewriting it
    #[arg(long)]
    backup: bool,

    /// Build and publish after rewriting
    #[arg(long)]
    deploy: bool,

    /// Path to the flag-table artifact (defaults to the configured one)
    #[arg(short, long, value_name = "FILE")]
    file: Option<PathBuf>,

    /// Path to custom configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long)]
    quiet: bool,
}

impl StageCli {
    fn verbosity(&self) -> Verbosity {
        if self.quiet {
            Verbosity::Quiet
        } else {
            match self.verbose {
                0 => Verbosity::Normal,
                1 => Verbosity::Verbose,
                _ => Verbosity::Trace,
            }
        }
    }
}

fn main() -> Result<()> {
    let cli = StageCli::parse();
    init_logging(cli.verbosity());

    // --list never touches the flag table, whatever else was passed
    if cli.list {
        print!("{}", format_stage_list());
        return Ok(());
    }

    // Validate the stage before any file is read or written
    let number = cli.stage.ok_or(Error::StageMissing)?;
    let stage = DeploymentStage::get(number)?;

    let config = Config::load_from(cli.config)?;
    let artifact = cli.file.unwrap_or_else(|| config.production_table_path());
    let deployer = StageDeployer::new(artifact, config.deploy.clone());

    println!("Applying stage {}: {}", stage.number, stage.name);
    println!("{}", stage.description);

    if cli.backup {
        let backup = deployer.backup()?;
        println!("Backup created: {}", backup.display());
    }

    deployer.apply(stage)?;
    println!(
        "Flag table updated: {} ({})",
        deployer.artifact_path().display(),
        stage.version()
    );

    if cli.deploy {
        println!("Running build and publish...");
        deployer.deploy(stage)?;
        println!("Deployment finished.");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_verify() {
        StageCli::command().debug_assert();
    }

    #[test]
    fn test_parse_stage() {
        let cli = StageCli::try_parse_from(["valudash-stage", "--stage", "2"]).unwrap();
        assert_eq!(cli.stage, Some(2));
        assert!(!cli.list);
        assert!(!cli.backup);
        assert!(!cli.deploy);
    }

    #[test]
    fn test_parse_list_with_other_flags() {
        let cli =
            StageCli::try_parse_from(["valudash-stage", "--list", "--stage", "9", "--deploy"])
                .unwrap();
        assert!(cli.list);
    }

    #[test]
    fn test_parse_full_invocation() {
        let cli = StageCli::try_parse_from([
            "valudash-stage",
            "--stage",
            "3",
            "--backup",
            "--deploy",
            "--file",
            "/tmp/flags.json",
        ])
        .unwrap();
        assert_eq!(cli.stage, Some(3));
        assert!(cli.backup);
        assert!(cli.deploy);
        assert_eq!(cli.file, Some(PathBuf::from("/tmp/flags.json")));
    }

    #[test]
    fn test_parse_non_numeric_stage_fails() {
        assert!(StageCli::try_parse_from(["valudash-stage", "--stage", "two"]).is_err());
    }
}
