//! Refresh coordinator — `Coordinator`.
//!
//! Owns the single cached snapshot and everything about refreshing it:
//! - Background tokio task firing at the configured interval
//! - At most one fetch in flight; concurrent triggers share its outcome
//! - Snapshot, freshness flag and refresh state published together through
//!   a `watch` channel, once per completed refresh
//! - Every fetch error collapsed into a `RefreshFailure` at this boundary

use std::sync::{Arc, Weak};
use std::time::Duration;

use async_lock::Mutex;
use chrono::{DateTime, Utc};
use futures_util::future::{BoxFuture, FutureExt, Shared};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::config::{Credentials, UpdateInterval};
use crate::domain::portfolio::Snapshot;
use crate::error::{FailureKind, RefreshFailure, SetupError};
use crate::http::PortfolioSource;

/// Result every waiter of one refresh receives.
pub type RefreshOutcome = Result<(), RefreshFailure>;

type SharedRefresh = Shared<BoxFuture<'static, RefreshOutcome>>;

// ─── Published state ─────────────────────────────────────────────────────────

/// Where the refresh cycle is.
///
/// `Succeeded`/`Failed` persist until the next refresh starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RefreshState {
    #[default]
    Idle,
    InFlight,
    Succeeded,
    Failed,
}

/// One consistent view of the coordinator, replaced as a whole on publish.
#[derive(Debug, Clone, Default)]
pub struct CoordinatorState {
    pub snapshot: Option<Arc<Snapshot>>,
    /// True only when the last completed refresh succeeded.
    pub last_update_success: bool,
    pub refresh_state: RefreshState,
    pub last_refresh_at: Option<DateTime<Utc>>,
    /// Number of completed refreshes published so far.
    pub generation: u64,
}

impl CoordinatorState {
    pub fn snapshot(&self) -> Option<&Snapshot> {
        self.snapshot.as_deref()
    }
}

// ─── Shared inner state ──────────────────────────────────────────────────────

struct Inner<S> {
    source: S,
    credentials: Credentials,
    state_tx: watch::Sender<CoordinatorState>,
    in_flight: Mutex<Option<SharedRefresh>>,
}

impl<S: PortfolioSource> Inner<S> {
    /// Start a refresh, or attach to the one already running.
    async fn refresh(self: &Arc<Self>) -> RefreshOutcome {
        let shared = {
            let mut slot = self.in_flight.lock().await;
            match slot.as_ref() {
                Some(running) => {
                    tracing::debug!(
                        wallet = %self.credentials.wallet_name,
                        "Refresh already in flight, attaching"
                    );
                    running.clone()
                }
                None => {
                    let inner = Arc::clone(self);
                    // Runs on its own task so a dropped waiter never cancels the fetch.
                    let handle = tokio::spawn(async move { inner.run_refresh().await });
                    let shared = async move {
                        handle.await.unwrap_or_else(|e| {
                            Err(RefreshFailure {
                                kind: FailureKind::Aborted,
                                message: e.to_string(),
                            })
                        })
                    }
                    .boxed()
                    .shared();

                    self.state_tx.send_if_modified(|state| {
                        state.refresh_state = RefreshState::InFlight;
                        false
                    });
                    *slot = Some(shared.clone());
                    shared
                }
            }
        };

        shared.await
    }

    async fn run_refresh(self: Arc<Self>) -> RefreshOutcome {
        let started = Instant::now();
        tracing::debug!(wallet = %self.credentials.wallet_name, "Starting data update");

        // The source runs on its own task: a panic there still ends in a
        // published failure and a cleared slot below.
        let fetcher = Arc::clone(&self);
        let result = match tokio::spawn(async move { fetcher.fetch_snapshot().await }).await {
            Ok(result) => result,
            Err(e) => Err(RefreshFailure {
                kind: FailureKind::Aborted,
                message: e.to_string(),
            }),
        };

        // Publish and clear the slot together: a trigger that takes the lock
        // after this point starts a fresh fetch.
        let mut slot = self.in_flight.lock().await;
        let was_successful = self.state_tx.borrow().last_update_success;
        let now = Utc::now();

        let outcome = match result {
            Ok(snapshot) => {
                self.state_tx.send_modify(|state| {
                    state.snapshot = Some(Arc::new(snapshot));
                    state.last_update_success = true;
                    state.refresh_state = RefreshState::Succeeded;
                    state.last_refresh_at = Some(now);
                    state.generation += 1;
                });
                if !was_successful && self.state_tx.borrow().generation > 1 {
                    tracing::info!(wallet = %self.credentials.wallet_name, "Fetching data recovered");
                }
                tracing::debug!(
                    wallet = %self.credentials.wallet_name,
                    elapsed = ?started.elapsed(),
                    "Finished data update"
                );
                Ok(())
            }
            Err(failure) => {
                self.publish_failed();
                tracing::error!(
                    wallet = %self.credentials.wallet_name,
                    kind = %failure.kind,
                    "Error fetching portfolio data: {}",
                    failure.message
                );
                Err(failure)
            }
        };

        *slot = None;
        outcome
    }

    async fn fetch_snapshot(&self) -> Result<Snapshot, RefreshFailure> {
        let body = self.source.fetch_portfolio(&self.credentials).await?;
        Ok(Snapshot::try_new(body, Utc::now())?)
    }

    /// Publish a failed outcome without fetching.
    fn publish_failed(&self) {
        self.state_tx.send_modify(|state| {
            state.last_update_success = false;
            state.refresh_state = RefreshState::Failed;
            state.last_refresh_at = Some(Utc::now());
            state.generation += 1;
        });
    }

    /// The running refresh, if any.
    async fn in_flight(&self) -> Option<SharedRefresh> {
        self.in_flight.lock().await.clone()
    }
}

// ─── Refresh trigger (type-erased back-reference) ────────────────────────────

trait RefreshTrigger: Send + Sync {
    fn trigger(self: Arc<Self>) -> BoxFuture<'static, RefreshOutcome>;
}

impl<S: PortfolioSource> RefreshTrigger for Inner<S> {
    fn trigger(self: Arc<Self>) -> BoxFuture<'static, RefreshOutcome> {
        async move { self.refresh().await }.boxed()
    }
}

/// Cheap, cloneable handle observers use to read state and request refreshes.
///
/// Holds only a weak reference: it never keeps a torn-down coordinator alive.
#[derive(Clone)]
pub struct RefreshHandle {
    trigger: Weak<dyn RefreshTrigger>,
    state_rx: watch::Receiver<CoordinatorState>,
}

impl RefreshHandle {
    /// Ask for a refresh now. Attaches to a running one if present.
    pub async fn refresh(&self) -> RefreshOutcome {
        match self.trigger.upgrade() {
            Some(trigger) => trigger.trigger().await,
            None => Err(RefreshFailure {
                kind: FailureKind::Aborted,
                message: "coordinator has been shut down".to_string(),
            }),
        }
    }

    pub fn state(&self) -> CoordinatorState {
        self.state_rx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<CoordinatorState> {
        self.state_rx.clone()
    }
}

impl std::fmt::Debug for RefreshHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshHandle")
            .field("alive", &(self.trigger.strong_count() > 0))
            .finish()
    }
}

// ─── Public Coordinator ──────────────────────────────────────────────────────

/// Polls one wallet at a fixed cadence and owns its snapshot.
///
/// The interval is fixed for the coordinator's lifetime. To change it, shut
/// this one down and build a new one.
pub struct Coordinator<S: PortfolioSource> {
    inner: Arc<Inner<S>>,
    interval: UpdateInterval,
    timer: Option<JoinHandle<()>>,
}

impl<S: PortfolioSource> Coordinator<S> {
    /// Create a coordinator. Nothing is fetched and no timer runs yet.
    pub fn new(source: S, credentials: Credentials, interval: UpdateInterval) -> Self {
        let (state_tx, _) = watch::channel(CoordinatorState::default());
        tracing::debug!(
            wallet = %credentials.wallet_name,
            interval = %interval,
            "Initializing coordinator"
        );
        Self {
            inner: Arc::new(Inner {
                source,
                credentials,
                state_tx,
                in_flight: Mutex::new(None),
            }),
            interval,
            timer: None,
        }
    }

    /// Refresh once during activation.
    ///
    /// A failure here means the entry must not be activated.
    pub async fn first_refresh(&self) -> Result<(), SetupError> {
        self.inner.refresh().await.map_err(SetupError::NotReady)
    }

    /// Refresh now (manual trigger). Attaches to a running refresh if present.
    pub async fn refresh(&self) -> RefreshOutcome {
        self.inner.refresh().await
    }

    /// Start the recurring timer. The first tick fires one interval from now.
    pub fn start(&mut self) {
        if self.timer.is_some() {
            return;
        }
        let period = self.interval.as_duration();
        tracing::info!(
            wallet = %self.inner.credentials.wallet_name,
            interval = %self.interval,
            "Starting scheduled refresh"
        );
        self.timer = Some(tokio::spawn(run_schedule(Arc::downgrade(&self.inner), period)));
    }

    /// Stop the timer and wait for any running refresh to finish.
    ///
    /// After this returns nothing from this coordinator touches the network.
    pub async fn shutdown(&mut self) {
        if let Some(handle) = self.timer.take() {
            handle.abort();
            let _ = handle.await;
            tracing::info!(
                wallet = %self.inner.credentials.wallet_name,
                "Stopped scheduled refresh"
            );
        }
        if let Some(running) = self.inner.in_flight().await {
            let _ = running.await;
        }
    }

    /// Mark the cached snapshot stale, e.g. when a replacement coordinator
    /// failed to come up. Observers are woken like after a failed refresh.
    pub fn mark_failed(&self) {
        tracing::warn!(wallet = %self.inner.credentials.wallet_name, "Marking data as failed");
        self.inner.publish_failed();
    }

    pub fn is_running(&self) -> bool {
        self.timer.as_ref().is_some_and(|h| !h.is_finished())
    }

    pub fn update_interval(&self) -> UpdateInterval {
        self.interval
    }

    pub fn credentials(&self) -> &Credentials {
        &self.inner.credentials
    }

    /// Current published state (copy).
    pub fn state(&self) -> CoordinatorState {
        self.inner.state_tx.borrow().clone()
    }

    pub fn snapshot(&self) -> Option<Arc<Snapshot>> {
        self.inner.state_tx.borrow().snapshot.clone()
    }

    pub fn last_update_success(&self) -> bool {
        self.inner.state_tx.borrow().last_update_success
    }

    /// Register an observer. It is woken once per completed refresh.
    pub fn subscribe(&self) -> watch::Receiver<CoordinatorState> {
        self.inner.state_tx.subscribe()
    }

    pub fn handle(&self) -> RefreshHandle {
        let trigger: Arc<dyn RefreshTrigger> = self.inner.clone();
        RefreshHandle {
            trigger: Arc::downgrade(&trigger),
            state_rx: self.subscribe(),
        }
    }
}

impl<S: PortfolioSource> Drop for Coordinator<S> {
    fn drop(&mut self) {
        if let Some(handle) = self.timer.take() {
            handle.abort();
        }
    }
}

// ─── Background timer ────────────────────────────────────────────────────────

async fn run_schedule<S: PortfolioSource>(inner: Weak<Inner<S>>, period: Duration) {
    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        let Some(inner) = inner.upgrade() else {
            return;
        };
        tracing::debug!(wallet = %inner.credentials.wallet_name, "Scheduled refresh");
        // Failures are logged and published by the refresh itself.
        let _ = inner.refresh().await;
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
