//! `valutadash-data` - Registry data collaborators for valutadash
//!
//! Typed records for the currency-exchange registry plus the collaborator
//! services the dashboard consumes behind traits: the data service (static
//! sample dataset or live source with fallback), the telemetry sink, and
//! the authentication service.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod auth;
pub mod records;
pub mod sample;
pub mod service;
pub mod telemetry;

pub use auth::{AuthError, AuthService, AuthUser, MockAuthService};
pub use records::{CasaSchimb, DateAngajati, DateFinanciare, PunctSchimb};
pub use service::{
    setup_polling, Collection, DataError, DataService, FileRecordFetcher, PollHandle,
    RecordFetcher, SheetsDataService, StaticDataService,
};
pub use telemetry::{RecordingTelemetry, Severity, TelemetryEvent, TelemetrySink, TracingTelemetry};
