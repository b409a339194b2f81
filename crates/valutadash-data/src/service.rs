//! Data service collaborator.
//!
//! The dashboard consumes typed record collections through [`DataService`]
//! without caring whether they come from the embedded sample dataset or a
//! live source. The live implementation caches parsed collections and falls
//! back to the sample data on any failure, reporting the error to the
//! telemetry sink; a fetch failure is never surfaced to the caller.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::records::{CasaSchimb, DateAngajati, DateFinanciare, PunctSchimb};
use crate::sample;
use crate::telemetry::TelemetrySink;

/// Errors from the live record source.
#[derive(Debug, Error)]
pub enum DataError {
    /// The remote fetch itself failed.
    #[error("fetch for {method} failed: {message}")]
    Fetch {
        /// Service method the fetch was made for.
        method: String,
        /// Description of what went wrong.
        message: String,
    },

    /// The fetched payload did not parse as the expected collection.
    #[error("response for {method} did not parse: {source}")]
    Decode {
        /// Service method the payload belongs to.
        method: String,
        /// The underlying parse error.
        #[source]
        source: serde_json::Error,
    },
}

impl DataError {
    /// Create a fetch error for the given collection.
    #[must_use]
    pub fn fetch(collection: Collection, message: impl Into<String>) -> Self {
        Self::Fetch {
            method: collection.method_name().to_string(),
            message: message.into(),
        }
    }
}

/// The record collections the registry exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    /// Exchange houses.
    CaseSchimb,
    /// Working points.
    PuncteSchimb,
    /// Financial filings.
    DateFinanciare,
    /// Headcount records.
    DateAngajati,
}

impl Collection {
    /// Service method name, as used in telemetry context.
    #[must_use]
    pub fn method_name(self) -> &'static str {
        match self {
            Self::CaseSchimb => "getCaseSchimb",
            Self::PuncteSchimb => "getPuncteSchimb",
            Self::DateFinanciare => "getDateFinanciare",
            Self::DateAngajati => "getDateAngajati",
        }
    }

    /// Endpoint path segment for the live source.
    #[must_use]
    pub fn endpoint(self) -> &'static str {
        match self {
            Self::CaseSchimb => "caseSchimb",
            Self::PuncteSchimb => "puncteSchimb",
            Self::DateFinanciare => "dateFinanciare",
            Self::DateAngajati => "dateAngajati",
        }
    }
}

/// Raw access to the live record source.
///
/// Implementors fetch one collection and return its JSON payload; parsing
/// and fallback are the service's concern.
#[async_trait]
pub trait RecordFetcher: Send + Sync {
    /// Fetch the raw JSON array for one collection.
    ///
    /// # Errors
    ///
    /// Returns a [`DataError`] when the source is unreachable or answers
    /// with a non-success status.
    async fn fetch_collection(&self, collection: Collection) -> Result<String, DataError>;
}

/// Provider of typed record collections.
#[async_trait]
pub trait DataService: Send + Sync {
    /// Exchange houses.
    async fn case_schimb(&self) -> Vec<CasaSchimb>;

    /// Working points.
    async fn puncte_schimb(&self) -> Vec<PunctSchimb>;

    /// Financial filings.
    async fn date_financiare(&self) -> Vec<DateFinanciare>;

    /// Headcount records.
    async fn date_angajati(&self) -> Vec<DateAngajati>;

    /// Drop any cached collections so the next read hits the source again.
    fn invalidate_cache(&self);
}

/// Data service backed by the embedded sample dataset.
#[derive(Debug, Default, Clone, Copy)]
pub struct StaticDataService;

impl StaticDataService {
    /// Create a new static service.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl DataService for StaticDataService {
    async fn case_schimb(&self) -> Vec<CasaSchimb> {
        sample::case_schimb()
    }

    async fn puncte_schimb(&self) -> Vec<PunctSchimb> {
        sample::puncte_schimb()
    }

    async fn date_financiare(&self) -> Vec<DateFinanciare> {
        sample::date_financiare()
    }

    async fn date_angajati(&self) -> Vec<DateAngajati> {
        sample::date_angajati()
    }

    fn invalidate_cache(&self) {
        debug!("cache invalidation is a no-op for the static dataset");
    }
}

#[derive(Debug, Default)]
struct Cache {
    case_schimb: Option<Vec<CasaSchimb>>,
    puncte_schimb: Option<Vec<PunctSchimb>>,
    date_financiare: Option<Vec<DateFinanciare>>,
    date_angajati: Option<Vec<DateAngajati>>,
}

/// Live data service with per-collection caching and static fallback.
pub struct SheetsDataService {
    fetcher: Box<dyn RecordFetcher>,
    telemetry: Arc<dyn TelemetrySink>,
    cache: Mutex<Cache>,
}

impl std::fmt::Debug for SheetsDataService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SheetsDataService").finish_non_exhaustive()
    }
}

impl SheetsDataService {
    /// Create a live service over the given fetcher and telemetry sink.
    #[must_use]
    pub fn new(fetcher: Box<dyn RecordFetcher>, telemetry: Arc<dyn TelemetrySink>) -> Self {
        Self {
            fetcher,
            telemetry,
            cache: Mutex::new(Cache::default()),
        }
    }

    async fn fetch<T: DeserializeOwned>(&self, collection: Collection) -> Result<Vec<T>, DataError> {
        let raw = self.fetcher.fetch_collection(collection).await?;
        serde_json::from_str(&raw).map_err(|source| DataError::Decode {
            method: collection.method_name().to_string(),
            source,
        })
    }

    fn report(&self, err: &DataError, collection: Collection) {
        warn!(%err, method = collection.method_name(), "falling back to sample data");
        let mut context = BTreeMap::new();
        context.insert("service".to_string(), "googleSheets".to_string());
        context.insert("method".to_string(), collection.method_name().to_string());
        self.telemetry.capture_error(err, &context);
    }

    fn cached<T: Clone>(&self, get: impl FnOnce(&Cache) -> Option<T>) -> Option<T> {
        self.cache.lock().ok().and_then(|cache| get(&cache))
    }

    fn remember(&self, set: impl FnOnce(&mut Cache)) {
        if let Ok(mut cache) = self.cache.lock() {
            set(&mut cache);
        }
    }
}

#[async_trait]
impl DataService for SheetsDataService {
    async fn case_schimb(&self) -> Vec<CasaSchimb> {
        if let Some(rows) = self.cached(|c| c.case_schimb.clone()) {
            return rows;
        }
        match self.fetch::<CasaSchimb>(Collection::CaseSchimb).await {
            Ok(rows) => {
                self.remember(|c| c.case_schimb = Some(rows.clone()));
                rows
            }
            Err(err) => {
                self.report(&err, Collection::CaseSchimb);
                sample::case_schimb()
            }
        }
    }

    async fn puncte_schimb(&self) -> Vec<PunctSchimb> {
        if let Some(rows) = self.cached(|c| c.puncte_schimb.clone()) {
            return rows;
        }
        match self.fetch::<PunctSchimb>(Collection::PuncteSchimb).await {
            Ok(rows) => {
                self.remember(|c| c.puncte_schimb = Some(rows.clone()));
                rows
            }
            Err(err) => {
                self.report(&err, Collection::PuncteSchimb);
                sample::puncte_schimb()
            }
        }
    }

    async fn date_financiare(&self) -> Vec<DateFinanciare> {
        if let Some(rows) = self.cached(|c| c.date_financiare.clone()) {
            return rows;
        }
        match self.fetch::<DateFinanciare>(Collection::DateFinanciare).await {
            Ok(rows) => {
                self.remember(|c| c.date_financiare = Some(rows.clone()));
                rows
            }
            Err(err) => {
                self.report(&err, Collection::DateFinanciare);
                sample::date_financiare()
            }
        }
    }

    async fn date_angajati(&self) -> Vec<DateAngajati> {
        if let Some(rows) = self.cached(|c| c.date_angajati.clone()) {
            return rows;
        }
        match self.fetch::<DateAngajati>(Collection::DateAngajati).await {
            Ok(rows) => {
                self.remember(|c| c.date_angajati = Some(rows.clone()));
                rows
            }
            Err(err) => {
                self.report(&err, Collection::DateAngajati);
                sample::date_angajati()
            }
        }
    }

    fn invalidate_cache(&self) {
        debug!("invalidating cached collections");
        if let Ok(mut cache) = self.cache.lock() {
            *cache = Cache::default();
        }
    }
}

/// Fetcher that reads collection exports from a directory.
///
/// The live source drops one `<collection>.json` file per collection under
/// a base directory; this is the integration point until a networked
/// fetcher ships.
#[derive(Debug, Clone)]
pub struct FileRecordFetcher {
    base: std::path::PathBuf,
}

impl FileRecordFetcher {
    /// Create a fetcher over the given export directory.
    #[must_use]
    pub fn new(base: impl Into<std::path::PathBuf>) -> Self {
        Self { base: base.into() }
    }
}

#[async_trait]
impl RecordFetcher for FileRecordFetcher {
    async fn fetch_collection(&self, collection: Collection) -> Result<String, DataError> {
        let path = self.base.join(format!("{}.json", collection.endpoint()));
        tokio::fs::read_to_string(&path)
            .await
            .map_err(|err| DataError::fetch(collection, format!("{}: {err}", path.display())))
    }
}

/// Handle for a running background poll; acts as the cancel function.
#[derive(Debug)]
pub struct PollHandle {
    task: tokio::task::JoinHandle<()>,
}

impl PollHandle {
    /// Stop the poll. Safe to call more than once.
    pub fn cancel(&self) {
        self.task.abort();
    }

    /// Whether the poll task is still running.
    #[must_use]
    pub fn is_active(&self) -> bool {
        !self.task.is_finished()
    }
}

/// Periodically invalidate the service cache and notify the caller.
///
/// Returns a [`PollHandle`] whose `cancel` stops the loop.
pub fn setup_polling<F>(
    service: Arc<dyn DataService>,
    interval_minutes: u64,
    on_update: F,
) -> PollHandle
where
    F: Fn() + Send + 'static,
{
    info!(interval_minutes, "starting background data polling");
    setup_polling_with_period(
        service,
        Duration::from_secs(interval_minutes * 60),
        on_update,
    )
}

/// [`setup_polling`] with an explicit period, used directly by tests.
pub fn setup_polling_with_period<F>(
    service: Arc<dyn DataService>,
    period: Duration,
    on_update: F,
) -> PollHandle
where
    F: Fn() + Send + 'static,
{
    let task = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        // The first tick of a tokio interval fires immediately.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            service.invalidate_cache();
            on_update();
        }
    });
    PollHandle { task }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::telemetry::RecordingTelemetry;

    use super::*;

    /// Fetcher stub that counts calls and answers from a fixed script.
    struct StubFetcher {
        calls: Arc<AtomicUsize>,
        response: Result<String, String>,
    }

    impl StubFetcher {
        fn ok(json: &str) -> Self {
            Self {
                calls: Arc::new(AtomicUsize::new(0)),
                response: Ok(json.to_string()),
            }
        }

        fn failing(message: &str) -> Self {
            Self {
                calls: Arc::new(AtomicUsize::new(0)),
                response: Err(message.to_string()),
            }
        }

        fn call_count(&self) -> Arc<AtomicUsize> {
            self.calls.clone()
        }
    }

    #[async_trait]
    impl RecordFetcher for StubFetcher {
        async fn fetch_collection(&self, collection: Collection) -> Result<String, DataError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.response {
                Ok(json) => Ok(json.clone()),
                Err(message) => Err(DataError::fetch(collection, message.clone())),
            }
        }
    }

    fn service_with(fetcher: StubFetcher) -> (Arc<SheetsDataService>, Arc<RecordingTelemetry>) {
        let telemetry = Arc::new(RecordingTelemetry::new());
        let service = Arc::new(SheetsDataService::new(
            Box::new(fetcher),
            telemetry.clone(),
        ));
        (service, telemetry)
    }

    #[tokio::test]
    async fn test_static_service_returns_sample_data() {
        let service = StaticDataService::new();
        assert_eq!(service.case_schimb().await.len(), 3);
        assert_eq!(service.puncte_schimb().await.len(), 5);
        assert!(service.date_angajati().await.is_empty());
        service.invalidate_cache();
    }

    #[tokio::test]
    async fn test_fetch_failure_falls_back_with_telemetry() {
        let (service, telemetry) = service_with(StubFetcher::failing("connection refused"));

        let rows = service.case_schimb().await;

        assert_eq!(rows, sample::case_schimb());
        let events = telemetry.events();
        assert_eq!(events.len(), 1);
        assert!(events[0].message.contains("connection refused"));
        assert_eq!(
            events[0].context.get("method"),
            Some(&"getCaseSchimb".to_string())
        );
        assert_eq!(
            events[0].context.get("service"),
            Some(&"googleSheets".to_string())
        );
    }

    #[tokio::test]
    async fn test_decode_failure_falls_back_with_telemetry() {
        let (service, telemetry) = service_with(StubFetcher::ok("{not json"));

        let rows = service.date_financiare().await;

        assert_eq!(rows, sample::date_financiare());
        assert_eq!(telemetry.len(), 1);
        assert_eq!(
            telemetry.events()[0].context.get("method"),
            Some(&"getDateFinanciare".to_string())
        );
    }

    #[tokio::test]
    async fn test_successful_fetch_is_parsed_and_cached() {
        let json = serde_json::to_string(&sample::puncte_schimb()).unwrap();
        let fetcher = StubFetcher::ok(&json);
        let (service, telemetry) = service_with(fetcher);

        let first = service.puncte_schimb().await;
        let second = service.puncte_schimb().await;

        assert_eq!(first, second);
        assert_eq!(first.len(), 5);
        assert!(telemetry.is_empty());
    }

    #[tokio::test]
    async fn test_cache_hit_skips_fetcher() {
        let json = serde_json::to_string(&sample::case_schimb()).unwrap();
        let fetcher = StubFetcher::ok(&json);
        let calls = fetcher.call_count();
        let (service, _telemetry) = service_with(fetcher);

        service.case_schimb().await;
        service.case_schimb().await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_invalidate_cache_forces_refetch() {
        let json = serde_json::to_string(&sample::case_schimb()).unwrap();
        let fetcher = StubFetcher::ok(&json);
        let calls = fetcher.call_count();
        let (service, _telemetry) = service_with(fetcher);

        service.case_schimb().await;
        service.invalidate_cache();
        service.case_schimb().await;

        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_collection_names() {
        assert_eq!(Collection::CaseSchimb.method_name(), "getCaseSchimb");
        assert_eq!(Collection::DateAngajati.endpoint(), "dateAngajati");
    }

    #[tokio::test]
    async fn test_file_fetcher_reads_collection_exports() {
        let base = std::env::temp_dir().join(format!(
            "valutadash-data-exports-{}",
            std::process::id()
        ));
        std::fs::create_dir_all(&base).unwrap();
        let json = serde_json::to_string(&sample::case_schimb()).unwrap();
        std::fs::write(base.join("caseSchimb.json"), &json).unwrap();

        let fetcher = FileRecordFetcher::new(&base);
        let raw = fetcher.fetch_collection(Collection::CaseSchimb).await.unwrap();
        assert_eq!(raw, json);

        // A collection without an export errors, which the service turns
        // into a fallback
        assert!(fetcher
            .fetch_collection(Collection::DateAngajati)
            .await
            .is_err());

        std::fs::remove_dir_all(&base).ok();
    }

    #[tokio::test]
    async fn test_polling_invalidates_and_notifies() {
        let service: Arc<dyn DataService> = Arc::new(StaticDataService::new());
        let updates = Arc::new(AtomicUsize::new(0));
        let seen = updates.clone();

        let handle = setup_polling_with_period(service, Duration::from_millis(10), move || {
            seen.fetch_add(1, Ordering::SeqCst);
        });

        tokio::time::sleep(Duration::from_millis(60)).await;
        assert!(handle.is_active());
        assert!(updates.load(Ordering::SeqCst) >= 2);

        handle.cancel();
        tokio::time::sleep(Duration::from_millis(20)).await;
        let after_cancel = updates.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(updates.load(Ordering::SeqCst), after_cancel);
        assert!(!handle.is_active());
    }
}
