//! `valutadash` - Feature-flag gated dashboard for the currency exchange registry
//!
//! This library provides the runtime feature-flag system gating the
//! registry dashboard: the closed capability set and its flag-set variants,
//! boot-time resolution against a persisted copy, the session flag store,
//! the gates that lazily mount flag-controlled panels, and the stage
//! deployer that promotes flag sets into production.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod cli;
pub mod config;
pub mod dashboard;
pub mod deployer;
pub mod error;
pub mod flags;
pub mod gate;
pub mod logging;
pub mod resolver;
pub mod stage;
pub mod storage;
pub mod store;
pub mod table;

pub use config::{Config, Environment};
pub use error::{Error, Result};
pub use flags::{Capability, CapabilityCategory, FlagSet};
pub use gate::{FlagGate, GateView, LoadState, Panel, PanelRegistry};
pub use logging::init_logging;
pub use stage::{DeploymentStage, STAGES};
pub use storage::{FileFlagPersistence, FlagPersistence, MemoryFlagPersistence, NullPersistence};
pub use store::FlagStore;
pub use table::{FlagTable, ProductionArtifact, TableSource};
