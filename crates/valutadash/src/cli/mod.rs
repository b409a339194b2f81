//! Command-line interface for valutadash.
//!
//! This module provides the CLI structure and command definitions for the
//! `valudash` binary. The stage deployer has its own binary and argument
//! surface; see `valudash-stage`.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{ConfigCommand, FlagState, FlagsCommand, StatusCommand};

/// valudash - Feature-flag gated dashboard for the currency exchange registry
///
/// Renders the registry dashboard in the terminal and manages the runtime
/// feature flags that gate its panels.
#[derive(Debug, Parser)]
#[command(name = "valudash")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Inspect and mutate the session feature flags
    #[command(subcommand)]
    Flags(FlagsCommand),

    /// Render the dashboard once
    Dashboard,

    /// Show environment, flag table source, and persistence status
    Status(StatusCommand),

    /// View or validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> crate::logging::Verbosity {
        if self.quiet {
            crate::logging::Verbosity::Quiet
        } else {
            match self.verbose {
                0 => crate::logging::Verbosity::Normal,
                1 => crate::logging::Verbosity::Verbose,
                _ => crate::logging::Verbosity::Trace,
            }
        }
    }
}
