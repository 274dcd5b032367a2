// Poll task - cancellable fixed-interval scheduling
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::{CancellationToken, DropGuard};

/// Handle to a task that runs `tick` every `period`.
///
/// Clones share one task. It stops when [`PollTask::cancel`] is called or the
/// last clone is dropped; a tick in progress is abandoned, not awaited.
#[derive(Clone)]
pub struct PollTask {
    token: CancellationToken,
    _guard: Arc<DropGuard>,
}

impl PollTask {
    /// Start polling. The first tick fires one `period` from now.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn<F, Fut>(token: CancellationToken, period: Duration, mut tick: F) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let period = period.max(Duration::from_millis(1));
        let cancelled = token.clone();

        tokio::spawn(async move {
            let mut interval = interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    biased;
                    _ = cancelled.cancelled() => break,
                    _ = interval.tick() => {}
                }
                tokio::select! {
                    biased;
                    _ = cancelled.cancelled() => break,
                    _ = tick() => {}
                }
            }
            tracing::debug!("Poll task stopped");
        });

        Self {
            _guard: Arc::new(token.clone().drop_guard()),
            token,
        }
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }
}
