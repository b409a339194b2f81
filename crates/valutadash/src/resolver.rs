//! Boot-time flag resolution.
//!
//! Decides which flag set a fresh session starts from: the persisted copy
//! when one exists and parses, otherwise the environment's default variant.
//! Resolution is infallible; corrupt persisted data is treated as absent.

use std::collections::BTreeMap;

use tracing::{debug, warn};

use crate::config::Environment;
use crate::flags::FlagSet;
use crate::storage::FlagPersistence;
use crate::table::FlagTable;

/// The environment's default variant from the table.
#[must_use]
pub fn environment_default(environment: Environment, table: &FlagTable) -> FlagSet {
    if environment.is_production() {
        table.production.clone()
    } else {
        table.development.clone()
    }
}

/// Compute the initial flag set for a session.
///
/// A persisted copy wins over the environment default, merged over it so a
/// capability introduced after the copy was written still gets its default
/// value. Unknown persisted keys are ignored. Malformed persisted data is
/// logged and treated as absent.
#[must_use]
pub fn resolve(
    environment: Environment,
    table: &FlagTable,
    persistence: &dyn FlagPersistence,
) -> FlagSet {
    let default = environment_default(environment, table);

    if !persistence.is_available() {
        return default;
    }

    match persistence.load() {
        Ok(Some(raw)) => match serde_json::from_str::<BTreeMap<String, bool>>(&raw) {
            Ok(saved) => {
                debug!(keys = saved.len(), "restored persisted flag set");
                FlagSet::merged_over(&default, &saved)
            }
            Err(err) => {
                warn!(%err, %environment, "persisted flags are corrupt; using environment default");
                default
            }
        },
        Ok(None) => default,
        Err(err) => {
            warn!(%err, %environment, "could not read persisted flags; using environment default");
            default
        }
    }
}
