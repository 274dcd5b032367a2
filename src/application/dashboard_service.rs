// Dashboard service - Mounted data hooks with polling and single-flight batches
use crate::application::poller::PollTask;
use crate::application::request_executor::NetworkError;
use crate::domain::dashboard::{Bundle, Dashboard};
use crate::domain::facility::DashboardFilters;
use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

/// One dashboard's batch of data: every call succeeds or the batch fails.
#[async_trait]
pub trait DashboardSource: Send + Sync + 'static {
    type Data: Clone + Send + Sync + 'static;

    fn dashboard(&self) -> Dashboard;

    async fn fetch(&self, filters: &DashboardFilters) -> Result<Self::Data, NetworkError>;
}

struct HookState<S: DashboardSource> {
    source: S,
    filters: Mutex<DashboardFilters>,
    bundle: watch::Sender<Bundle<S::Data>>,
    generation: AtomicU64,
    cancel: CancellationToken,
}

impl<S: DashboardSource> HookState<S> {
    fn refresh(self: &Arc<Self>) {
        if self.cancel.is_cancelled() {
            return;
        }

        // Bumped under the bundle lock so a newer batch can never settle between the two.
        let mut generation = 0;
        self.bundle.send_modify(|bundle| {
            generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
            bundle.begin();
        });

        let state = Arc::clone(self);
        tokio::spawn(async move { state.run_batch(generation).await });
    }

    async fn run_batch(&self, generation: u64) {
        let dashboard = self.source.dashboard();
        let filters = self.current_filters();
        tracing::debug!(dashboard = dashboard.name(), generation, "Fetching dashboard batch");

        let result = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return,
            result = self.source.fetch(&filters) => result,
        };

        let applied = self.bundle.send_if_modified(|bundle| {
            if self.cancel.is_cancelled() || self.generation.load(Ordering::SeqCst) != generation {
                return false;
            }
            match &result {
                Ok(data) => bundle.succeed(data.clone()),
                Err(_) => bundle.fail(dashboard.error_message()),
            }
            true
        });

        match (applied, result) {
            (false, _) => {
                tracing::debug!(dashboard = dashboard.name(), generation, "Discarding superseded batch");
            }
            (true, Err(e)) => {
                tracing::warn!(dashboard = dashboard.name(), "Dashboard batch failed: {}", e);
            }
            (true, Ok(_)) => {}
        }
    }

    fn current_filters(&self) -> DashboardFilters {
        match self.filters.lock() {
            Ok(filters) => filters.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

/// A mounted dashboard hook.
///
/// Mounting fetches immediately and then every poll interval. Dropping the
/// handle (or calling [`DashboardHandle::unmount`]) stops the timer and
/// abandons any batch still in flight, so nothing touches the bundle after.
pub struct DashboardHandle<S: DashboardSource> {
    state: Arc<HookState<S>>,
    poll: PollTask,
}

impl<S: DashboardSource> DashboardHandle<S> {
    /// Mount with the dashboard's own poll interval.
    pub fn mount(source: S, filters: DashboardFilters) -> Self {
        let interval = source.dashboard().poll_interval();
        Self::mount_with_interval(source, filters, interval)
    }

    pub fn mount_with_interval(source: S, filters: DashboardFilters, interval: Duration) -> Self {
        let cancel = CancellationToken::new();
        let (bundle, _) = watch::channel(Bundle::default());
        let state = Arc::new(HookState {
            source,
            filters: Mutex::new(filters),
            bundle,
            generation: AtomicU64::new(0),
            cancel: cancel.clone(),
        });

        tracing::info!(
            dashboard = state.source.dashboard().name(),
            interval_secs = interval.as_secs_f64(),
            "Mounting dashboard"
        );

        state.refresh();

        let ticker = Arc::clone(&state);
        let poll = PollTask::spawn(cancel, interval, move || {
            ticker.refresh();
            std::future::ready(())
        });

        Self { state, poll }
    }

    pub fn dashboard(&self) -> Dashboard {
        self.state.source.dashboard()
    }

    pub fn snapshot(&self) -> Bundle<S::Data> {
        self.state.bundle.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Bundle<S::Data>> {
        self.state.bundle.subscribe()
    }

    /// Wait until no batch is loading and return the bundle.
    pub async fn settled(&self) -> Bundle<S::Data> {
        let mut rx = self.subscribe();
        let settled = rx.wait_for(|bundle| bundle.is_settled()).await.map(|b| b.clone());
        settled.unwrap_or_else(|_| self.snapshot())
    }

    pub fn refresh(&self) {
        self.state.refresh();
    }

    pub fn filters(&self) -> DashboardFilters {
        self.state.current_filters()
    }

    /// Replace the filters and refetch right away.
    pub fn set_filters(&self, filters: DashboardFilters) {
        match self.state.filters.lock() {
            Ok(mut current) => *current = filters,
            Err(poisoned) => *poisoned.into_inner() = filters,
        }
        self.refresh();
    }

    pub fn unmount(self) {
        tracing::info!(dashboard = self.dashboard().name(), "Unmounting dashboard");
        self.poll.cancel();
    }
}
