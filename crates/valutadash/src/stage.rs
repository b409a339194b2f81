//! Canonical deployment stages.
//!
//! A stage is an ordered, named bundle of capabilities promoted together
//! during progressive rollout. Each stage is a strict superset of the one
//! before it; applying a stage only ever adds capabilities on top of the
//! all-off baseline, it never revokes one.

use crate::error::{Error, Result};
use crate::flags::{Capability, FlagSet};

/// One step of the progressive rollout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeploymentStage {
    /// 1-based stage number.
    pub number: usize,
    /// Short stage name.
    pub name: &'static str,
    /// What the stage ships.
    pub description: &'static str,
    /// Capabilities this stage turns on.
    pub enabled: &'static [Capability],
}

/// The four canonical stages, in rollout order.
pub const STAGES: [DeploymentStage; 4] = [
    DeploymentStage {
        number: 1,
        name: "Minimal",
        description: "Base structure and authentication only",
        enabled: &[
            Capability::FirebaseAuth,
            Capability::StatusChart,
            Capability::Filters,
        ],
    },
    DeploymentStage {
        number: 2,
        name: "Basic Visualizations",
        description: "Adds the basic charts, no complex maps yet",
        enabled: &[
            Capability::FirebaseAuth,
            Capability::StatusChart,
            Capability::Filters,
            Capability::TopExchanges,
            Capability::TimelineChart,
        ],
    },
    DeploymentStage {
        number: 3,
        name: "Complete Visualizations",
        description: "Adds every visualization including the maps",
        enabled: &[
            Capability::FirebaseAuth,
            Capability::StatusChart,
            Capability::Filters,
            Capability::TopExchanges,
            Capability::TimelineChart,
            Capability::CountyMap,
            Capability::BucharestMap,
            Capability::FinancialAnalysis,
        ],
    },
    DeploymentStage {
        number: 4,
        name: "Full App",
        description: "Turns on every capability of the application",
        enabled: &[
            Capability::FirebaseAuth,
            Capability::StatusChart,
            Capability::Filters,
            Capability::TopExchanges,
            Capability::TimelineChart,
            Capability::CountyMap,
            Capability::BucharestMap,
            Capability::FinancialAnalysis,
            Capability::LlmAnalysis,
            Capability::GoogleSheets,
            Capability::Export,
            Capability::RealTimeSync,
        ],
    },
];

impl DeploymentStage {
    /// All canonical stages in rollout order.
    #[must_use]
    pub fn all() -> &'static [Self] {
        &STAGES
    }

    /// Look up a stage by its 1-based number.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StageOutOfRange`] for anything outside `[1, 4]`.
    pub fn get(number: usize) -> Result<&'static Self> {
        if number == 0 || number > STAGES.len() {
            return Err(Error::StageOutOfRange {
                requested: number,
                max: STAGES.len(),
            });
        }
        Ok(&STAGES[number - 1])
    }

    /// The stage's capabilities applied over the all-off baseline.
    #[must_use]
    pub fn flag_set(&self) -> FlagSet {
        let mut flags = FlagSet::baseline();
        for &capability in self.enabled {
            flags.set(capability, true);
        }
        flags
    }

    /// Version identifier stamped into the build environment on deploy.
    #[must_use]
    pub fn version(&self) -> String {
        format!("1.0.0-stage{}", self.number)
    }
}
