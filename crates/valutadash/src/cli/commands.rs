//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::path::PathBuf;

use clap::{Args, Subcommand, ValueEnum};

use crate::flags::Capability;

/// Flag management commands.
#[derive(Debug, Subcommand)]
pub enum FlagsCommand {
    /// Show all capabilities and their current values
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Set one capability on or off
    Set {
        /// Capability name, e.g. `county-map` or `enableCountyMap`
        capability: Capability,

        /// New value
        #[arg(value_enum)]
        state: FlagState,
    },

    /// Enable every capability
    EnableAll,

    /// Disable every capability
    DisableAll,

    /// Restore the environment default and drop the persisted copy
    Reset,
}

/// On/off argument for `flags set`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FlagState {
    /// Enable the capability.
    On,
    /// Disable the capability.
    Off,
}

impl FlagState {
    /// The boolean this state stands for.
    #[must_use]
    pub fn as_bool(self) -> bool {
        matches!(self, Self::On)
    }
}

/// Status command arguments.
#[derive(Debug, Args)]
pub struct StatusCommand {
    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Print the configuration file path
    Path,

    /// Validate a configuration file
    Validate {
        /// Path to the file to validate (defaults to the standard location)
        file: Option<PathBuf>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_state_as_bool() {
        assert!(FlagState::On.as_bool());
        assert!(!FlagState::Off.as_bool());
    }
}
