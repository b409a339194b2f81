//! The session flag store.
//!
//! One [`FlagStore`] exists per session. It is constructed explicitly and
//! passed down to whatever needs it; there is no ambient global. Every
//! mutation re-serializes the full flag set to the persistence medium, in
//! call order, so the persisted copy always reflects the latest state.

use tracing::{debug, warn};

use crate::config::Environment;
use crate::flags::{Capability, FlagSet};
use crate::resolver;
use crate::storage::FlagPersistence;
use crate::table::FlagTable;

/// Session-scoped resolved flag state.
pub struct FlagStore {
    flags: FlagSet,
    persistence: Box<dyn FlagPersistence>,
}

impl std::fmt::Debug for FlagStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FlagStore")
            .field("flags", &self.flags)
            .field("persistence", &self.persistence.describe())
            .finish()
    }
}

impl FlagStore {
    /// Create a store seeded with an explicit flag set.
    ///
    /// This is the injection point tests use; production code usually goes
    /// through [`FlagStore::resolve`].
    #[must_use]
    pub fn new(initial: FlagSet, persistence: Box<dyn FlagPersistence>) -> Self {
        Self {
            flags: initial,
            persistence,
        }
    }

    /// Create a store seeded by boot-time resolution.
    #[must_use]
    pub fn resolve(
        environment: Environment,
        table: &FlagTable,
        persistence: Box<dyn FlagPersistence>,
    ) -> Self {
        let flags = resolver::resolve(environment, table, persistence.as_ref());
        Self::new(flags, persistence)
    }

    /// The current flag set.
    #[must_use]
    pub fn flags(&self) -> &FlagSet {
        &self.flags
    }

    /// Current value of one capability.
    #[must_use]
    pub fn is_enabled(&self, capability: Capability) -> bool {
        self.flags.is_enabled(capability)
    }

    /// Set one capability's value and persist the result.
    pub fn update_flag(&mut self, capability: Capability, value: bool) {
        debug!(%capability, value, "updating flag");
        self.flags.set(capability, value);
        self.persist();
    }

    /// Enable every capability and persist the result.
    pub fn enable_all(&mut self) {
        self.flags.enable_all();
        self.persist();
    }

    /// Disable every capability and persist the result.
    pub fn disable_all(&mut self) {
        self.flags.disable_all();
        self.persist();
    }

    /// Replace the flag set with a template and drop the persisted copy.
    pub fn reset(&mut self, template: FlagSet) {
        self.flags = template;
        if let Err(err) = self.persistence.clear() {
            warn!(%err, "failed to clear persisted flags");
        }
    }

    /// Where the persisted copy lives, for status output.
    #[must_use]
    pub fn persistence_location(&self) -> String {
        self.persistence.describe()
    }

    fn persist(&self) {
        if !self.persistence.is_available() {
            return;
        }
        if let Err(err) = self.persistence.store(&self.flags) {
            // Persistence is best-effort; the in-memory state stays correct.
            warn!(%err, "failed to persist flags");
        }
    }
}
