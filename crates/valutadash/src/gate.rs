//! Flag gates and the panel registry.
//!
//! A gate decides whether a flag-controlled panel is mounted. Panels are
//! registered as lazy builders keyed by capability; a builder runs at most
//! once, on the first evaluation that finds its flag enabled, as its own
//! tokio task. The load lifecycle is explicit: not-loaded, loading, loaded,
//! failed. A builder failure is contained in the failed state; it never
//! crashes the host and never touches the flag itself.

use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::pin::Pin;

use tokio::task::JoinHandle;

use crate::error::Result;
use crate::flags::Capability;
use crate::store::FlagStore;

/// A mountable dashboard panel.
pub trait Panel: Send {
    /// Panel heading.
    fn title(&self) -> &str;

    /// Produce the panel's rendered body.
    fn render(&self) -> String;
}

type BoxedPanelFuture = Pin<Box<dyn Future<Output = Result<Box<dyn Panel>>> + Send>>;
type PanelBuilder = Box<dyn Fn() -> BoxedPanelFuture + Send + Sync>;

/// Where a registered panel is in its load lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    /// The builder has never been invoked.
    NotLoaded,
    /// The builder task is in flight.
    Loading,
    /// The panel is constructed and mountable.
    Loaded,
    /// The builder failed; see the gate view for the message.
    Failed,
}

enum EntryState {
    NotLoaded,
    Loading(JoinHandle<Result<Box<dyn Panel>>>),
    Loaded(Box<dyn Panel>),
    Failed(String),
}

struct Entry {
    builder: PanelBuilder,
    state: EntryState,
}

/// What a gate evaluation produced.
pub enum GateView<'a> {
    /// The flag is off (or nothing is registered for it); show the
    /// disabled-feature placeholder.
    Disabled,
    /// The flag is on and the panel is still loading; show the inert
    /// loading placeholder.
    Loading,
    /// The flag is on and the panel is mounted.
    Mounted(&'a dyn Panel),
    /// The flag is on but the panel failed to load; show the error
    /// boundary notice. The flag stays enabled.
    Failed {
        /// Description of the load failure.
        message: &'a str,
    },
}

impl fmt::Debug for GateView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disabled => write!(f, "Disabled"),
            Self::Loading => write!(f, "Loading"),
            Self::Mounted(panel) => f.debug_tuple("Mounted").field(&panel.title()).finish(),
            Self::Failed { message } => {
                f.debug_struct("Failed").field("message", message).finish()
            }
        }
    }
}

/// Registry of lazily-built panels, keyed by the capability gating them.
#[derive(Default)]
pub struct PanelRegistry {
    entries: BTreeMap<Capability, Entry>,
}

impl fmt::Debug for PanelRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PanelRegistry")
            .field("capabilities", &self.capabilities().collect::<Vec<_>>())
            .finish()
    }
}

impl PanelRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a lazy panel builder for a capability.
    ///
    /// The builder is not invoked here; it runs when a gate first finds the
    /// capability enabled.
    pub fn register<F, Fut>(&mut self, capability: Capability, builder: F)
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Box<dyn Panel>>> + Send + 'static,
    {
        let builder: PanelBuilder = Box::new(move || Box::pin(builder()));
        self.entries.insert(
            capability,
            Entry {
                builder,
                state: EntryState::NotLoaded,
            },
        );
    }

    /// Capabilities with a registered panel, in canonical order.
    pub fn capabilities(&self) -> impl Iterator<Item = Capability> + '_ {
        self.entries.keys().copied()
    }

    /// Load lifecycle state of a registered panel.
    #[must_use]
    pub fn load_state(&self, capability: Capability) -> Option<LoadState> {
        self.entries.get(&capability).map(|entry| match entry.state {
            EntryState::NotLoaded => LoadState::NotLoaded,
            EntryState::Loading(_) => LoadState::Loading,
            EntryState::Loaded(_) => LoadState::Loaded,
            EntryState::Failed(_) => LoadState::Failed,
        })
    }

    /// Return a loaded or failed panel to the not-loaded state.
    ///
    /// This backs the error boundary's reload action: the next enabled
    /// evaluation invokes the builder again.
    pub fn reset(&mut self, capability: Capability) {
        if let Some(entry) = self.entries.get_mut(&capability) {
            if let EntryState::Loading(handle) = &entry.state {
                handle.abort();
            }
            entry.state = EntryState::NotLoaded;
        }
    }

    /// Evaluate the gate for one capability.
    ///
    /// The flag value is consulted on every call; a decision is never
    /// cached across the mutation that changed it. Loads of different
    /// panels run as independent tasks and do not block each other.
    pub async fn gate(&mut self, capability: Capability, enabled: bool) -> GateView<'_> {
        let Some(entry) = self.entries.get_mut(&capability) else {
            return GateView::Disabled;
        };
        if !enabled {
            return GateView::Disabled;
        }

        let state = std::mem::replace(&mut entry.state, EntryState::NotLoaded);
        entry.state = match state {
            EntryState::NotLoaded => {
                let future = (entry.builder)();
                EntryState::Loading(tokio::spawn(future))
            }
            EntryState::Loading(handle) => {
                if handle.is_finished() {
                    match handle.await {
                        Ok(Ok(panel)) => EntryState::Loaded(panel),
                        Ok(Err(err)) => EntryState::Failed(err.to_string()),
                        Err(join_err) => {
                            EntryState::Failed(format!("panel task panicked: {join_err}"))
                        }
                    }
                } else {
                    EntryState::Loading(handle)
                }
            }
            settled => settled,
        };

        match &entry.state {
            EntryState::NotLoaded | EntryState::Loading(_) => GateView::Loading,
            EntryState::Loaded(panel) => GateView::Mounted(panel.as_ref()),
            EntryState::Failed(message) => GateView::Failed {
                message: message.as_str(),
            },
        }
    }
}

/// The guard primitive pairing one capability with the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlagGate {
    capability: Capability,
}

impl FlagGate {
    /// Create a gate for one capability.
    #[must_use]
    pub fn new(capability: Capability) -> Self {
        Self { capability }
    }

    /// The capability this gate consults.
    #[must_use]
    pub fn capability(&self) -> Capability {
        self.capability
    }

    /// Evaluate against the store's current flag value.
    pub async fn evaluate<'r>(
        &self,
        store: &FlagStore,
        registry: &'r mut PanelRegistry,
    ) -> GateView<'r> {
        registry
            .gate(self.capability, store.is_enabled(self.capability))
            .await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use crate::error::Error;
    use crate::flags::FlagSet;
    use crate::storage::NullPersistence;

    use super::*;

    struct TextPanel {
        title: String,
        body: String,
    }

    impl Panel for TextPanel {
        fn title(&self) -> &str {
            &self.title
        }

        fn render(&self) -> String {
            self.body.clone()
        }
    }

    fn text_panel(title: &str, body: &str) -> Box<dyn Panel> {
        Box::new(TextPanel {
            title: title.to_string(),
            body: body.to_string(),
        })
    }

    /// Registry with a counting builder; returns the invocation counter.
    fn counting_registry(capability: Capability) -> (PanelRegistry, Arc<AtomicUsize>) {
        let loads = Arc::new(AtomicUsize::new(0));
        let counter = loads.clone();
        let mut registry = PanelRegistry::new();
        registry.register(capability, move || {
            counter.fetch_add(1, Ordering::SeqCst);
            async { Ok(text_panel("Status", "2 active / 1 closed")) }
        });
        (registry, loads)
    }

    async fn settle(registry: &mut PanelRegistry, capability: Capability) {
        for _ in 0..100 {
            match registry.gate(capability, true).await {
                GateView::Loading => tokio::time::sleep(Duration::from_millis(2)).await,
                _ => return,
            }
        }
        panic!("panel never settled");
    }

    #[tokio::test]
    async fn test_disabled_gate_never_invokes_builder() {
        let (mut registry, loads) = counting_registry(Capability::StatusChart);

        for _ in 0..5 {
            let view = registry.gate(Capability::StatusChart, false).await;
            assert!(matches!(view, GateView::Disabled));
        }

        assert_eq!(loads.load(Ordering::SeqCst), 0);
        assert_eq!(
            registry.load_state(Capability::StatusChart),
            Some(LoadState::NotLoaded)
        );
    }

    #[tokio::test]
    async fn test_enabled_gate_eventually_mounts() {
        let (mut registry, loads) = counting_registry(Capability::StatusChart);

        settle(&mut registry, Capability::StatusChart).await;

        match registry.gate(Capability::StatusChart, true).await {
            GateView::Mounted(panel) => {
                assert_eq!(panel.title(), "Status");
                assert_eq!(panel.render(), "2 active / 1 closed");
            }
            other => panic!("expected mounted panel, got {other:?}"),
        }
        assert_eq!(loads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_mounted_panel_is_not_rebuilt() {
        let (mut registry, loads) = counting_registry(Capability::StatusChart);

        settle(&mut registry, Capability::StatusChart).await;
        for _ in 0..3 {
            let view = registry.gate(Capability::StatusChart, true).await;
            assert!(matches!(view, GateView::Mounted(_)));
        }

        assert_eq!(loads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_disabling_hides_a_mounted_panel() {
        let (mut registry, loads) = counting_registry(Capability::StatusChart);

        settle(&mut registry, Capability::StatusChart).await;

        // Disabling is observed on the very next evaluation
        let view = registry.gate(Capability::StatusChart, false).await;
        assert!(matches!(view, GateView::Disabled));

        // Re-enabling mounts the resident panel without another load
        let view = registry.gate(Capability::StatusChart, true).await;
        assert!(matches!(view, GateView::Mounted(_)));
        assert_eq!(loads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_builder_failure_is_contained() {
        let mut registry = PanelRegistry::new();
        registry.register(Capability::CountyMap, || async {
            Err(Error::panel_load("CountyMap", "geo data unavailable"))
        });

        settle(&mut registry, Capability::CountyMap).await;

        match registry.gate(Capability::CountyMap, true).await {
            GateView::Failed { message } => assert!(message.contains("geo data unavailable")),
            other => panic!("expected failure, got {other:?}"),
        }
        assert_eq!(
            registry.load_state(Capability::CountyMap),
            Some(LoadState::Failed)
        );
    }

    #[tokio::test]
    async fn test_builder_panic_is_contained() {
        let mut registry = PanelRegistry::new();
        registry.register(Capability::BucharestMap, || async {
            panic!("sector table corrupt")
        });

        settle(&mut registry, Capability::BucharestMap).await;

        match registry.gate(Capability::BucharestMap, true).await {
            GateView::Failed { message } => assert!(message.contains("panicked")),
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_reset_allows_retry_after_failure() {
        let healthy = Arc::new(AtomicBool::new(false));
        let flip = healthy.clone();
        let mut registry = PanelRegistry::new();
        registry.register(Capability::TimelineChart, move || {
            let healthy = flip.clone();
            async move {
                if healthy.load(Ordering::SeqCst) {
                    Ok(text_panel("Timeline", "3 years"))
                } else {
                    Err(Error::panel_load("TimelineChart", "first load fails"))
                }
            }
        });

        settle(&mut registry, Capability::TimelineChart).await;
        assert_eq!(
            registry.load_state(Capability::TimelineChart),
            Some(LoadState::Failed)
        );

        healthy.store(true, Ordering::SeqCst);
        registry.reset(Capability::TimelineChart);
        assert_eq!(
            registry.load_state(Capability::TimelineChart),
            Some(LoadState::NotLoaded)
        );

        settle(&mut registry, Capability::TimelineChart).await;
        let view = registry.gate(Capability::TimelineChart, true).await;
        assert!(matches!(view, GateView::Mounted(_)));
    }

    #[tokio::test]
    async fn test_unregistered_capability_reads_as_disabled() {
        let mut registry = PanelRegistry::new();
        let view = registry.gate(Capability::Export, true).await;
        assert!(matches!(view, GateView::Disabled));
        assert_eq!(registry.load_state(Capability::Export), None);
    }

    #[tokio::test]
    async fn test_flag_gate_consults_store() {
        let (mut registry, loads) = counting_registry(Capability::StatusChart);
        let mut flags = FlagSet::baseline();
        flags.set(Capability::StatusChart, true);
        let store = FlagStore::new(flags, Box::new(NullPersistence));

        let gate = FlagGate::new(Capability::StatusChart);
        assert_eq!(gate.capability(), Capability::StatusChart);

        let view = gate.evaluate(&store, &mut registry).await;
        assert!(matches!(view, GateView::Loading));
        assert_eq!(loads.load(Ordering::SeqCst), 1);

        let off_store = FlagStore::new(FlagSet::baseline(), Box::new(NullPersistence));
        let view = gate.evaluate(&off_store, &mut registry).await;
        assert!(matches!(view, GateView::Disabled));
    }

    #[tokio::test]
    async fn test_independent_loads_do_not_block_each_other() {
        let mut registry = PanelRegistry::new();
        registry.register(Capability::StatusChart, || async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(text_panel("Status", "slow"))
        });
        registry.register(Capability::Filters, || async {
            Ok(text_panel("Filters", "fast"))
        });

        // Start the slow load, then settle the fast one under it
        let view = registry.gate(Capability::StatusChart, true).await;
        assert!(matches!(view, GateView::Loading));

        settle(&mut registry, Capability::Filters).await;
        let view = registry.gate(Capability::Filters, true).await;
        assert!(matches!(view, GateView::Mounted(_)));

        // The slow panel is still loading, untouched
        assert_eq!(
            registry.load_state(Capability::StatusChart),
            Some(LoadState::Loading)
        );
    }
}
