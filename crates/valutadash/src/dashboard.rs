//! The dashboard shell.
//!
//! Renders the textual dashboard: a header, the always-on summary cards,
//! then one section per registered panel, each mounted through its flag
//! gate. Panels are one-line summaries over the data service; the real
//! visualization widgets live outside this crate and are consumed only as
//! "a component gated by a named flag".

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use valutadash_data::{AuthService, DataService, TelemetrySink};

use crate::config::Config;
use crate::error::Result;
use crate::flags::Capability;
use crate::gate::{FlagGate, GateView, LoadState, Panel, PanelRegistry};
use crate::store::FlagStore;

/// Display order of the gated panels.
pub const PANEL_ORDER: [Capability; 9] = [
    Capability::StatusChart,
    Capability::TopExchanges,
    Capability::TimelineChart,
    Capability::CountyMap,
    Capability::BucharestMap,
    Capability::FinancialAnalysis,
    Capability::LlmAnalysis,
    Capability::Filters,
    Capability::Export,
];

/// A panel rendered from a precomputed summary.
struct SummaryPanel {
    title: String,
    body: String,
}

impl Panel for SummaryPanel {
    fn title(&self) -> &str {
        &self.title
    }

    fn render(&self) -> String {
        self.body.clone()
    }
}

fn summary(title: &str, body: String) -> Box<dyn Panel> {
    Box::new(SummaryPanel {
        title: title.to_string(),
        body,
    })
}

/// Register the default panel set over the given data service.
#[must_use]
pub fn default_registry(data: &Arc<dyn DataService>) -> PanelRegistry {
    let mut registry = PanelRegistry::new();

    let service = data.clone();
    registry.register(Capability::StatusChart, move || {
        let data = service.clone();
        async move {
            let case = data.case_schimb().await;
            let active = case.iter().filter(|c| c.is_active()).count();
            Ok(summary(
                "Status Chart",
                format!("Active houses: {active} · Closed: {}", case.len() - active),
            ))
        }
    });

    let service = data.clone();
    registry.register(Capability::TopExchanges, move || {
        let data = service.clone();
        async move {
            let puncte = data.puncte_schimb().await;
            let mut by_house: BTreeMap<String, usize> = BTreeMap::new();
            for punct in puncte.iter().filter(|p| p.activ) {
                *by_house.entry(punct.denumire_casa.clone()).or_default() += 1;
            }
            let mut ranked: Vec<_> = by_house.into_iter().collect();
            ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
            let top = ranked
                .iter()
                .take(3)
                .enumerate()
                .map(|(i, (name, count))| format!("{}. {name} ({count} points)", i + 1))
                .collect::<Vec<_>>()
                .join(" · ");
            Ok(summary("Top Exchange Houses", top))
        }
    });

    let service = data.clone();
    registry.register(Capability::TimelineChart, move || {
        let data = service.clone();
        async move {
            let case = data.case_schimb().await;
            let mut by_year: BTreeMap<i32, usize> = BTreeMap::new();
            for casa in &case {
                use chrono::Datelike;
                *by_year.entry(casa.data_autorizare.year()).or_default() += 1;
            }
            let line = by_year
                .iter()
                .map(|(year, count)| format!("{year}: {count}"))
                .collect::<Vec<_>>()
                .join(" · ");
            Ok(summary("Authorization Timeline", line))
        }
    });

    let service = data.clone();
    registry.register(Capability::CountyMap, move || {
        let data = service.clone();
        async move {
            let case = data.case_schimb().await;
            let mut by_county: BTreeMap<String, usize> = BTreeMap::new();
            for casa in &case {
                *by_county.entry(casa.judet.clone()).or_default() += 1;
            }
            let line = by_county
                .iter()
                .map(|(county, count)| format!("{county}: {count}"))
                .collect::<Vec<_>>()
                .join(" · ");
            Ok(summary("County Distribution", line))
        }
    });

    let service = data.clone();
    registry.register(Capability::BucharestMap, move || {
        let data = service.clone();
        async move {
            let puncte = data.puncte_schimb().await;
            let mut by_sector: BTreeMap<String, usize> = BTreeMap::new();
            for punct in puncte.iter().filter(|p| p.judet.starts_with("București")) {
                *by_sector.entry(punct.judet.clone()).or_default() += 1;
            }
            let line = if by_sector.is_empty() {
                "no working points in Bucharest".to_string()
            } else {
                by_sector
                    .iter()
                    .map(|(sector, count)| format!("{sector}: {count}"))
                    .collect::<Vec<_>>()
                    .join(" · ")
            };
            Ok(summary("Bucharest Sectors", line))
        }
    });

    let service = data.clone();
    registry.register(Capability::FinancialAnalysis, move || {
        let data = service.clone();
        async move {
            let filings = data.date_financiare().await;
            let total: i64 = filings.iter().map(|f| f.profit_pierdere).sum();
            let losses = filings.iter().filter(|f| f.is_loss()).count();
            Ok(summary(
                "Financial Analysis",
                format!(
                    "Net result: {total} RON · {losses} of {} filings in loss",
                    filings.len()
                ),
            ))
        }
    });

    let service = data.clone();
    registry.register(Capability::LlmAnalysis, move || {
        let data = service.clone();
        async move {
            let case = data.case_schimb().await;
            let active = case.iter().filter(|c| c.is_active()).count();
            let counties: BTreeSet<_> = case.iter().map(|c| c.judet.as_str()).collect();
            Ok(summary(
                "AI Analysis",
                format!(
                    "The registry currently lists {active} active exchange houses \
                     across {} counties; coverage is concentrated in urban centers.",
                    counties.len()
                ),
            ))
        }
    });

    let service = data.clone();
    registry.register(Capability::Filters, move || {
        let data = service.clone();
        async move {
            let case = data.case_schimb().await;
            let counties: BTreeSet<_> = case.iter().map(|c| c.judet.clone()).collect();
            Ok(summary(
                "Filters",
                format!(
                    "Filter by county ({}) or status (active/closed)",
                    counties.into_iter().collect::<Vec<_>>().join(", ")
                ),
            ))
        }
    });

    let service = data.clone();
    registry.register(Capability::Export, move || {
        let data = service.clone();
        async move {
            let records = data.case_schimb().await.len() + data.puncte_schimb().await.len();
            Ok(summary(
                "Export",
                format!("{records} records ready for CSV export"),
            ))
        }
    });

    registry
}

/// The client dashboard, one instance per session.
pub struct DashboardShell {
    registry: PanelRegistry,
    data: Arc<dyn DataService>,
    auth: Arc<dyn AuthService>,
    telemetry: Arc<dyn TelemetrySink>,
}

impl std::fmt::Debug for DashboardShell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DashboardShell")
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

impl DashboardShell {
    /// Create a shell with the default panel registry.
    #[must_use]
    pub fn new(
        data: Arc<dyn DataService>,
        auth: Arc<dyn AuthService>,
        telemetry: Arc<dyn TelemetrySink>,
    ) -> Self {
        let registry = default_registry(&data);
        Self {
            registry,
            data,
            auth,
            telemetry,
        }
    }

    /// Create a shell over an explicit registry. Used by tests.
    #[must_use]
    pub fn with_registry(
        registry: PanelRegistry,
        data: Arc<dyn DataService>,
        auth: Arc<dyn AuthService>,
        telemetry: Arc<dyn TelemetrySink>,
    ) -> Self {
        Self {
            registry,
            data,
            auth,
            telemetry,
        }
    }

    /// Render one pass of the dashboard.
    ///
    /// Panels that are still loading render their loading placeholder; call
    /// [`DashboardShell::render_settled`] to wait for them.
    pub async fn render(&mut self, store: &FlagStore) -> Result<String> {
        let mut out = String::new();

        out.push_str("Dashboard Case de Schimb Valutar\n");
        out.push_str(&format!("Version: {}\n", Config::app_version()));

        if store.is_enabled(Capability::FirebaseAuth) {
            match self.auth.current_user() {
                Some(user) => {
                    let name = user
                        .display_name
                        .or(user.email)
                        .unwrap_or_else(|| user.uid.clone());
                    out.push_str(&format!("Signed in as: {name}\n"));
                }
                None => {
                    out.push_str("\nChecking authentication...\n");
                    return Ok(out);
                }
            }
        }
        out.push('\n');

        let case = self.data.case_schimb().await;
        let puncte = self.data.puncte_schimb().await;
        let counties: BTreeSet<_> = case.iter().map(|c| c.judet.as_str()).collect();
        out.push_str(&format!(
            "Exchange houses: {} · Active points: {} · Counties: {}\n\n",
            case.len(),
            puncte.iter().filter(|p| p.activ).count(),
            counties.len()
        ));

        for capability in PANEL_ORDER {
            let gate = FlagGate::new(capability);
            match gate.evaluate(store, &mut self.registry).await {
                GateView::Disabled => {
                    out.push_str(&format!("[{}] disabled\n", capability.name()));
                }
                GateView::Loading => {
                    out.push_str(&format!("[{}] loading...\n", capability.name()));
                }
                GateView::Mounted(panel) => {
                    out.push_str(&format!("== {} ==\n{}\n", panel.title(), panel.render()));
                }
                GateView::Failed { message } => {
                    let mut context = BTreeMap::new();
                    context.insert("panel".to_string(), capability.name().to_string());
                    self.telemetry
                        .capture_error(&message.to_string(), &context);
                    out.push_str(&format!(
                        "[{}] something went wrong loading this section. \
                         Reload the dashboard to try again.\n",
                        capability.name()
                    ));
                }
            }
        }

        Ok(out)
    }

    /// Render the dashboard, waiting for in-flight panel loads to settle.
    pub async fn render_settled(&mut self, store: &FlagStore) -> Result<String> {
        let mut rendered = self.render(store).await?;
        for _ in 0..200 {
            let loading = PANEL_ORDER.iter().any(|&cap| {
                store.is_enabled(cap) && self.registry.load_state(cap) == Some(LoadState::Loading)
            });
            if !loading {
                break;
            }
            debug!("waiting for panel loads to settle");
            tokio::time::sleep(Duration::from_millis(10)).await;
            rendered = self.render(store).await?;
        }
        Ok(rendered)
    }

    /// Return a failed or loaded panel to the not-loaded state.
    pub fn reload_panel(&mut self, capability: Capability) {
        self.registry.reset(capability);
    }
}
