//! Pass lifecycle for a long-lived overview view.
//!
//! A new [`OverviewRefresher::refresh`] supersedes any in-flight pass: the
//! old task is aborted and, should it still finish, its generation no longer
//! matches so nothing is published. After [`OverviewRefresher::shutdown`]
//! no result is ever published again.

use chrono::{Local, NaiveDateTime};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{Instrument, debug, error};

use crate::error::OverviewError;
use crate::infra::credentials::CredentialStore;
use crate::overview::compute_overview;
use crate::overview::metrics::OverviewMetrics;
use crate::sources::DashboardApi;

pub type PassResult = Result<Arc<OverviewMetrics>, Arc<OverviewError>>;

/// A completed pass as seen by subscribers.
#[derive(Debug, Clone)]
pub struct Published {
    pub generation: u64,
    pub result: PassResult,
}

type Clock = Arc<dyn Fn() -> NaiveDateTime + Send + Sync>;

#[derive(Default)]
struct RefreshState {
    generation: u64,
    in_flight: Option<JoinHandle<()>>,
    closed: bool,
}

pub struct OverviewRefresher<A: ?Sized> {
    api: Arc<A>,
    credentials: Arc<dyn CredentialStore>,
    clock: Clock,
    state: Arc<Mutex<RefreshState>>,
    tx: Arc<watch::Sender<Option<Published>>>,
}

fn lock(state: &Mutex<RefreshState>) -> MutexGuard<'_, RefreshState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<A> OverviewRefresher<A>
where
    A: DashboardApi + ?Sized + 'static,
{
    pub fn new(api: Arc<A>, credentials: Arc<dyn CredentialStore>) -> Self {
        let (tx, _rx) = watch::channel(None);
        Self {
            api,
            credentials,
            clock: Arc::new(|| Local::now().naive_local()),
            state: Arc::new(Mutex::new(RefreshState::default())),
            tx: Arc::new(tx),
        }
    }

    /// Overrides the reference-instant source used for each pass.
    pub fn with_clock(mut self, clock: impl Fn() -> NaiveDateTime + Send + Sync + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<Published>> {
        self.tx.subscribe()
    }

    /// Starts a new pass, aborting the previous one. Returns the new pass's
    /// generation, or the last generation if the refresher is shut down.
    pub fn refresh(&self) -> u64 {
        let mut state = lock(&self.state);
        if state.closed {
            return state.generation;
        }

        state.generation += 1;
        let generation = state.generation;
        if let Some(previous) = state.in_flight.take() {
            previous.abort();
            debug!(generation, "Superseded in-flight pass");
        }

        let api = Arc::clone(&self.api);
        let credentials = Arc::clone(&self.credentials);
        let now = (self.clock)();
        let shared = Arc::clone(&self.state);
        let tx = Arc::clone(&self.tx);

        let span = tracing::info_span!("overview_pass", generation);
        let task = tokio::spawn(
            async move {
                let result = run_pass(api.as_ref(), credentials.as_ref(), now).await;

                let state = lock(&shared);
                if state.closed || state.generation != generation {
                    debug!("Discarding result of superseded pass");
                    return;
                }
                tx.send_replace(Some(Published { generation, result }));
            }
            .instrument(span),
        );

        state.in_flight = Some(task);
        generation
    }

    /// Abandons any in-flight pass and stops all future publishing.
    pub fn shutdown(&self) {
        let mut state = lock(&self.state);
        state.closed = true;
        if let Some(task) = state.in_flight.take() {
            task.abort();
            debug!(generation = state.generation, "Aborted in-flight pass on shutdown");
        }
    }
}

impl<A: ?Sized> Drop for OverviewRefresher<A> {
    fn drop(&mut self) {
        let mut state = lock(&self.state);
        state.closed = true;
        if let Some(task) = state.in_flight.take() {
            task.abort();
        }
    }
}

async fn run_pass<A>(api: &A, credentials: &dyn CredentialStore, now: NaiveDateTime) -> PassResult
where
    A: DashboardApi + ?Sized,
{
    let credential = credentials
        .credential()
        .await
        .map_err(|e| Arc::new(OverviewError::CredentialStore(e)))?;

    compute_overview(api, credential.as_ref(), now)
        .await
        .map(Arc::new)
        .map_err(|e| {
            error!(error = %e, "Overview pass failed");
            Arc::new(e)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::period::Window;
    use crate::sources::Credential;
    use crate::sources::records::{
        BookingRecord, CourtRecord, CourtUsageRecord, RevenueSnapshot, UserRecord,
    };
    use anyhow::Result;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Every pass after the first is fast; the first one stalls on `users`.
    #[derive(Default)]
    struct SlowFirstApi {
        user_calls: AtomicUsize,
    }

    #[async_trait]
    impl DashboardApi for SlowFirstApi {
        async fn users(&self, _: &Credential) -> Result<Vec<UserRecord>> {
            if self.user_calls.fetch_add(1, Ordering::SeqCst) == 0 {
                tokio::time::sleep(Duration::from_millis(300)).await;
            }
            Ok(vec![])
        }
        async fn bookings(&self, _: &Credential) -> Result<Vec<BookingRecord>> {
            Ok(vec![])
        }
        async fn courts(&self, _: &Credential) -> Result<Vec<CourtRecord>> {
            Ok(vec![])
        }
        async fn court_usage(&self, _: &Credential, _: &str) -> Result<Vec<CourtUsageRecord>> {
            Ok(vec![])
        }
        async fn dashboard_revenue(
            &self,
            _: &Credential,
            window: Window,
        ) -> Result<RevenueSnapshot> {
            Ok(RevenueSnapshot { window, total: 0.0 })
        }
        async fn equipment_issues(&self, _: &Credential, _: &str) -> Result<usize> {
            Ok(0)
        }
        async fn venue_maintenance(&self, _: &Credential, _: &str) -> Result<usize> {
            Ok(0)
        }
    }

    fn fixed_now() -> NaiveDateTime {
        chrono::NaiveDate::from_ymd_opt(2024, 2, 10)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap()
    }

    fn refresher(credential: Option<Credential>) -> OverviewRefresher<SlowFirstApi> {
        refresher_with(Arc::new(SlowFirstApi::default()), credential)
    }

    fn refresher_with(
        api: Arc<SlowFirstApi>,
        credential: Option<Credential>,
    ) -> OverviewRefresher<SlowFirstApi> {
        OverviewRefresher::new(api, Arc::new(credential)).with_clock(fixed_now)
    }

    #[tokio::test]
    async fn test_newer_pass_supersedes_in_flight() {
        let api = Arc::new(SlowFirstApi::default());
        let refresher = refresher_with(api.clone(), Credential::new("tok"));
        let mut rx = refresher.subscribe();

        assert_eq!(refresher.refresh(), 1);
        // Let the first pass reach its stalled `users` read.
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(api.user_calls.load(Ordering::SeqCst), 1);
        assert_eq!(refresher.refresh(), 2);

        rx.changed().await.unwrap();
        let published = rx.borrow_and_update().clone().unwrap();
        assert_eq!(published.generation, 2);
        assert!(published.result.is_ok());
        assert_eq!(api.user_calls.load(Ordering::SeqCst), 2);

        // The stalled first pass must never overwrite the newer result.
        tokio::time::sleep(Duration::from_millis(400)).await;
        assert!(!rx.has_changed().unwrap());
    }

    #[tokio::test]
    async fn test_shutdown_discards_in_flight_pass() {
        let refresher = refresher(Credential::new("tok"));
        let rx = refresher.subscribe();

        refresher.refresh();
        refresher.shutdown();
        tokio::time::sleep(Duration::from_millis(400)).await;

        assert!(rx.borrow().is_none());
        assert_eq!(refresher.refresh(), 1);
    }

    #[tokio::test]
    async fn test_missing_credential_is_published_as_error() {
        let refresher = refresher(None);
        let mut rx = refresher.subscribe();

        refresher.refresh();
        rx.changed().await.unwrap();
        let published = rx.borrow().clone().unwrap();
        assert!(matches!(
            published.result.as_ref().err().map(|e| &**e),
            Some(OverviewError::MissingCredential)
        ));
    }
}
