//! Feature capabilities and flag sets.
//!
//! The dashboard's togglable features form a closed set: every capability is
//! a variant of [`Capability`], so an invalid flag name cannot be
//! constructed, let alone looked up. A [`FlagSet`] always carries a value
//! for every capability.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::Serialize;

/// Functional grouping of capabilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CapabilityCategory {
    /// Charts and maps.
    Visualization,
    /// External service integrations.
    Integration,
    /// Advanced end-user functionality.
    Advanced,
}

impl fmt::Display for CapabilityCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Visualization => write!(f, "visualization"),
            Self::Integration => write!(f, "integration"),
            Self::Advanced => write!(f, "advanced"),
        }
    }
}

/// A named boolean capability controlling one dashboard feature.
///
/// Wire names (used in persisted JSON and the flag-table artifact) are the
/// original camelCase identifiers; `FromStr` additionally accepts the
/// kebab-case form used on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Capability {
    /// County distribution map.
    #[serde(rename = "enableCountyMap")]
    CountyMap,

    /// Bucharest sectors map.
    #[serde(rename = "enableBucharestMap")]
    BucharestMap,

    /// Financial analysis panel.
    #[serde(rename = "enableFinancialAnalysis")]
    FinancialAnalysis,

    /// Authorization timeline chart.
    #[serde(rename = "enableTimelineChart")]
    TimelineChart,

    /// Active/closed status chart.
    #[serde(rename = "enableStatusChart")]
    StatusChart,

    /// Top exchange houses ranking.
    #[serde(rename = "enableTopExchanges")]
    TopExchanges,

    /// Firebase-backed authentication gate.
    #[serde(rename = "enableFirebaseAuth")]
    FirebaseAuth,

    /// LLM-generated analysis panel.
    #[serde(rename = "enableLLMAnalysis")]
    LlmAnalysis,

    /// Live Google Sheets data source.
    #[serde(rename = "enableGoogleSheets")]
    GoogleSheets,

    /// Data export.
    #[serde(rename = "enableExport")]
    Export,

    /// Filter panel.
    #[serde(rename = "enableFilters")]
    Filters,

    /// Background data refresh.
    #[serde(rename = "enableRealTimeSync")]
    RealTimeSync,
}

impl Capability {
    /// Every capability, in canonical order.
    pub const ALL: [Self; 12] = [
        Self::CountyMap,
        Self::BucharestMap,
        Self::FinancialAnalysis,
        Self::TimelineChart,
        Self::StatusChart,
        Self::TopExchanges,
        Self::FirebaseAuth,
        Self::LlmAnalysis,
        Self::GoogleSheets,
        Self::Export,
        Self::Filters,
        Self::RealTimeSync,
    ];

    /// Wire name, as used in persisted JSON and the flag-table artifact.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::CountyMap => "enableCountyMap",
            Self::BucharestMap => "enableBucharestMap",
            Self::FinancialAnalysis => "enableFinancialAnalysis",
            Self::TimelineChart => "enableTimelineChart",
            Self::StatusChart => "enableStatusChart",
            Self::TopExchanges => "enableTopExchanges",
            Self::FirebaseAuth => "enableFirebaseAuth",
            Self::LlmAnalysis => "enableLLMAnalysis",
            Self::GoogleSheets => "enableGoogleSheets",
            Self::Export => "enableExport",
            Self::Filters => "enableFilters",
            Self::RealTimeSync => "enableRealTimeSync",
        }
    }

    /// Kebab-case name used for command-line arguments.
    #[must_use]
    pub fn cli_name(self) -> &'static str {
        match self {
            Self::CountyMap => "county-map",
            Self::BucharestMap => "bucharest-map",
            Self::FinancialAnalysis => "financial-analysis",
            Self::TimelineChart => "timeline-chart",
            Self::StatusChart => "status-chart",
            Self::TopExchanges => "top-exchanges",
            Self::FirebaseAuth => "firebase-auth",
            Self::LlmAnalysis => "llm-analysis",
            Self::GoogleSheets => "google-sheets",
            Self::Export => "export",
            Self::Filters => "filters",
            Self::RealTimeSync => "real-time-sync",
        }
    }

    /// Functional category this capability belongs to.
    #[must_use]
    pub fn category(self) -> CapabilityCategory {
        match self {
            Self::CountyMap
            | Self::BucharestMap
            | Self::FinancialAnalysis
            | Self::TimelineChart
            | Self::StatusChart
            | Self::TopExchanges => CapabilityCategory::Visualization,
            Self::FirebaseAuth | Self::LlmAnalysis | Self::GoogleSheets => {
                CapabilityCategory::Integration
            }
            Self::Export | Self::Filters | Self::RealTimeSync => CapabilityCategory::Advanced,
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Error returned when a string is not a known capability name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownCapability(String);

impl fmt::Display for UnknownCapability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown capability '{}'", self.0)
    }
}

impl std::error::Error for UnknownCapability {}

impl FromStr for Capability {
    type Err = UnknownCapability;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|cap| cap.name() == s || cap.cli_name() == s)
            .ok_or_else(|| UnknownCapability(s.to_string()))
    }
}

/// The complete mapping of all capabilities to their current values.
///
/// Always holds exactly one entry per capability; mutation cannot add or
/// remove keys. Serializes to a flat JSON object of wire names to booleans.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FlagSet {
    values: BTreeMap<Capability, bool>,
}

impl FlagSet {
    fn from_fn(value: impl Fn(Capability) -> bool) -> Self {
        Self {
            values: Capability::ALL.into_iter().map(|c| (c, value(c))).collect(),
        }
    }

    /// The all-off baseline every other variant builds on.
    #[must_use]
    pub fn baseline() -> Self {
        Self::from_fn(|_| false)
    }

    /// The development variant: everything on for local work.
    #[must_use]
    pub fn development() -> Self {
        Self::from_fn(|_| true)
    }

    /// The compiled-in production baseline: authentication, the status
    /// chart, and filters only. Stage promotion overlays this.
    #[must_use]
    pub fn production_baseline() -> Self {
        Self::from_fn(|cap| {
            matches!(
                cap,
                Capability::FirebaseAuth | Capability::StatusChart | Capability::Filters
            )
        })
    }

    /// Every capability enabled.
    #[must_use]
    pub fn all_enabled() -> Self {
        Self::from_fn(|_| true)
    }

    /// Every capability disabled.
    #[must_use]
    pub fn all_disabled() -> Self {
        Self::from_fn(|_| false)
    }

    /// Overlay a partial name-to-value mapping onto a template.
    ///
    /// Keys that parse as capabilities override the template; unknown keys
    /// are ignored; capabilities absent from the mapping keep the template
    /// value.
    #[must_use]
    pub fn merged_over(template: &Self, partial: &BTreeMap<String, bool>) -> Self {
        let mut merged = template.clone();
        for (name, value) in partial {
            if let Ok(cap) = name.parse::<Capability>() {
                merged.set(cap, *value);
            }
        }
        merged
    }

    /// Current value of one capability.
    #[must_use]
    pub fn is_enabled(&self, capability: Capability) -> bool {
        self.values.get(&capability).copied().unwrap_or(false)
    }

    /// Set one capability's value.
    pub fn set(&mut self, capability: Capability, value: bool) {
        self.values.insert(capability, value);
    }

    /// Set every capability to `true`. The key set is unchanged.
    pub fn enable_all(&mut self) {
        for value in self.values.values_mut() {
            *value = true;
        }
    }

    /// Set every capability to `false`. The key set is unchanged.
    pub fn disable_all(&mut self) {
        for value in self.values.values_mut() {
            *value = false;
        }
    }

    /// Number of capabilities carried. Always 12.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Always false; a flag set is never empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate over `(capability, value)` pairs in canonical key order.
    pub fn iter(&self) -> impl Iterator<Item = (Capability, bool)> + '_ {
        self.values.iter().map(|(cap, value)| (*cap, *value))
    }

    /// Iterate over the enabled capabilities only.
    pub fn enabled(&self) -> impl Iterator<Item = Capability> + '_ {
        self.iter().filter_map(|(cap, value)| value.then_some(cap))
    }

    /// Number of enabled capabilities.
    #[must_use]
    pub fn enabled_count(&self) -> usize {
        self.enabled().count()
    }
}

impl Default for FlagSet {
    fn default() -> Self {
        Self::baseline()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closed_set_has_twelve_capabilities() {
        assert_eq!(Capability::ALL.len(), 12);
        assert_eq!(FlagSet::baseline().len(), 12);
    }

    #[test]
    fn test_category_split() {
        let count = |category: CapabilityCategory| {
            Capability::ALL
                .into_iter()
                .filter(|c| c.category() == category)
                .count()
        };
        assert_eq!(count(CapabilityCategory::Visualization), 6);
        assert_eq!(count(CapabilityCategory::Integration), 3);
        assert_eq!(count(CapabilityCategory::Advanced), 3);
    }

    #[test]
    fn test_wire_names_round_trip() {
        for cap in Capability::ALL {
            assert_eq!(cap.name().parse::<Capability>(), Ok(cap));
            assert_eq!(cap.cli_name().parse::<Capability>(), Ok(cap));
        }
    }

    #[test]
    fn test_unknown_name_is_rejected() {
        let err = "enableTimeTravel".parse::<Capability>().unwrap_err();
        assert!(err.to_string().contains("enableTimeTravel"));
    }

    #[test]
    fn test_llm_wire_name_casing() {
        assert_eq!(Capability::LlmAnalysis.name(), "enableLLMAnalysis");
    }

    #[test]
    fn test_baseline_is_all_off() {
        let baseline = FlagSet::baseline();
        for cap in Capability::ALL {
            assert!(!baseline.is_enabled(cap));
        }
    }

    #[test]
    fn test_development_is_all_on() {
        let dev = FlagSet::development();
        for cap in Capability::ALL {
            assert!(dev.is_enabled(cap));
        }
    }

    #[test]
    fn test_production_baseline_enables_exactly_three() {
        let prod = FlagSet::production_baseline();
        let enabled: Vec<_> = prod.enabled().collect();
        assert_eq!(
            enabled,
            vec![
                Capability::StatusChart,
                Capability::FirebaseAuth,
                Capability::Filters
            ]
        );
    }

    #[test]
    fn test_enable_all_then_disable_all_preserves_cardinality() {
        let mut flags = FlagSet::production_baseline();
        flags.enable_all();
        assert_eq!(flags.len(), 12);
        assert!(Capability::ALL.into_iter().all(|c| flags.is_enabled(c)));

        flags.disable_all();
        assert_eq!(flags.len(), 12);
        assert!(Capability::ALL.into_iter().all(|c| !flags.is_enabled(c)));
    }

    #[test]
    fn test_set_round_trip_leaves_others_untouched() {
        let mut flags = FlagSet::production_baseline();
        let before = flags.clone();

        flags.set(Capability::CountyMap, true);
        flags.set(Capability::CountyMap, false);

        assert_eq!(flags, before);
    }

    #[test]
    fn test_serializes_to_flat_wire_name_object() {
        let json = serde_json::to_value(FlagSet::production_baseline()).unwrap();
        let object = json.as_object().unwrap();
        assert_eq!(object.len(), 12);
        assert_eq!(object["enableFirebaseAuth"], true);
        assert_eq!(object["enableCountyMap"], false);
        assert_eq!(object["enableLLMAnalysis"], false);
    }

    #[test]
    fn test_merged_over_overrides_and_ignores_unknown() {
        let mut partial = BTreeMap::new();
        partial.insert("enableCountyMap".to_string(), true);
        partial.insert("enableFirebaseAuth".to_string(), false);
        partial.insert("enableWarpDrive".to_string(), true);

        let merged = FlagSet::merged_over(&FlagSet::production_baseline(), &partial);

        assert!(merged.is_enabled(Capability::CountyMap));
        assert!(!merged.is_enabled(Capability::FirebaseAuth));
        // Untouched capability keeps the template value
        assert!(merged.is_enabled(Capability::StatusChart));
        assert_eq!(merged.len(), 12);
    }

    #[test]
    fn test_merged_over_empty_partial_is_identity() {
        let template = FlagSet::development();
        let merged = FlagSet::merged_over(&template, &BTreeMap::new());
        assert_eq!(merged, template);
    }

    #[test]
    fn test_enabled_count() {
        assert_eq!(FlagSet::baseline().enabled_count(), 0);
        assert_eq!(FlagSet::production_baseline().enabled_count(), 3);
        assert_eq!(FlagSet::all_enabled().enabled_count(), 12);
    }

    #[test]
    fn test_default_is_baseline() {
        assert_eq!(FlagSet::default(), FlagSet::baseline());
    }
}
