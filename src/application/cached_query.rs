// Cached query - single async call behind the local cache, optionally polled
use crate::application::local_cache::LocalCache;
use crate::application::poller::PollTask;
use crate::application::request_executor::NetworkError;
use crate::domain::dashboard::Bundle;
use futures::future::BoxFuture;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

pub type QueryFn<T> = Arc<dyn Fn() -> BoxFuture<'static, Result<T, NetworkError>> + Send + Sync>;

struct QueryState<T> {
    key: String,
    ttl: Duration,
    cache: LocalCache,
    fetch: QueryFn<T>,
    bundle: watch::Sender<Bundle<T>>,
    generation: AtomicU64,
    cancel: CancellationToken,
}

impl<T> QueryState<T>
where
    T: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
{
    fn is_current(&self, generation: u64) -> bool {
        !self.cancel.is_cancelled() && self.generation.load(Ordering::SeqCst) == generation
    }

    async fn run(&self) {
        if self.cancel.is_cancelled() {
            return;
        }

        // A warm entry answers every invocation, timer ticks included, until it expires.
        if let Some(cached) = self.cache.get_cached_data::<T>(&self.key) {
            tracing::debug!(key = %self.key, "Serving query from cache");
            self.bundle.send_if_modified(|bundle| {
                if self.cancel.is_cancelled() {
                    return false;
                }
                self.generation.fetch_add(1, Ordering::SeqCst);
                bundle.succeed(cached);
                true
            });
            return;
        }

        let mut generation = 0;
        self.bundle.send_modify(|bundle| {
            generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
            bundle.begin();
        });

        let result = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return,
            result = (self.fetch)() => result,
        };

        let applied = self.bundle.send_if_modified(|bundle| {
            if !self.is_current(generation) {
                return false;
            }
            match &result {
                Ok(data) => {
                    self.cache.cache_data_for(&self.key, data, self.ttl);
                    bundle.succeed(data.clone());
                }
                Err(e) => bundle.fail(e.to_string()),
            }
            true
        });

        match (applied, result) {
            (false, _) => tracing::debug!(key = %self.key, generation, "Discarding superseded query result"),
            (true, Err(e)) => tracing::warn!(key = %self.key, "Query failed: {}", e),
            (true, Ok(_)) => {}
        }
    }
}

/// Generic data hook for one async call.
pub struct CachedQuery<T> {
    state: Arc<QueryState<T>>,
    _poll: Option<PollTask>,
}

impl<T> CachedQuery<T>
where
    T: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
{
    /// Run the query now and, when `refresh_interval` is positive, on every
    /// interval after that.
    pub fn mount(
        cache: LocalCache,
        key: impl Into<String>,
        ttl: Duration,
        refresh_interval: Option<Duration>,
        fetch: QueryFn<T>,
    ) -> Self {
        let cancel = CancellationToken::new();
        let (bundle, _) = watch::channel(Bundle::default());
        let state = Arc::new(QueryState {
            key: key.into(),
            ttl,
            cache,
            fetch,
            bundle,
            generation: AtomicU64::new(0),
            cancel: cancel.clone(),
        });

        let first = Arc::clone(&state);
        tokio::spawn(async move { first.run().await });

        let poll = refresh_interval
            .filter(|interval| !interval.is_zero())
            .map(|interval| {
                let ticker = Arc::clone(&state);
                PollTask::spawn(cancel.clone(), interval, move || {
                    let ticker = Arc::clone(&ticker);
                    async move { ticker.run().await }
                })
            });

        Self { state, _poll: poll }
    }

    pub fn snapshot(&self) -> Bundle<T> {
        self.state.bundle.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Bundle<T>> {
        self.state.bundle.subscribe()
    }

    pub fn refresh(&self) {
        let state = Arc::clone(&self.state);
        tokio::spawn(async move { state.run().await });
    }

    pub fn unmount(self) {
        self.state.cancel.cancel();
    }
}

impl<T> Drop for CachedQuery<T> {
    fn drop(&mut self) {
        self.state.cancel.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::local_cache::ManualClock;
    use crate::infrastructure::memory_store::MemoryStore;
    use futures::FutureExt;
    use std::sync::atomic::AtomicUsize;

    fn counting_fetch(calls: Arc<AtomicUsize>) -> QueryFn<Vec<u32>> {
        Arc::new(move || {
            let calls = calls.clone();
            async move {
                let n = calls.fetch_add(1, Ordering::SeqCst) as u32;
                Ok::<_, NetworkError>(vec![n])
            }
            .boxed()
        })
    }

    #[tokio::test(start_paused = true)]
    async fn test_warm_cache_masks_polling_ticks() {
        let clock = Arc::new(ManualClock::at(0));
        let cache = LocalCache::new(Arc::new(MemoryStore::new())).with_clock(clock.clone());
        let calls = Arc::new(AtomicUsize::new(0));

        let query = CachedQuery::mount(
            cache,
            "census",
            Duration::from_secs(60),
            Some(Duration::from_secs(10)),
            counting_fetch(calls.clone()),
        );

        tokio::time::sleep(Duration::from_millis(1)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(query.snapshot().data, Some(vec![0]));

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        clock.advance(Duration::from_secs(61));
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(query.snapshot().data, Some(vec![1]));
    }

    #[tokio::test]
    async fn test_failure_reports_error_and_skips_cache() {
        let store = Arc::new(MemoryStore::new());
        let cache = LocalCache::new(store.clone());
        let fetch: QueryFn<Vec<u32>> = Arc::new(|| {
            async {
                Err::<Vec<u32>, _>(NetworkError::Status {
                    status: 500,
                    status_text: "Internal Server Error".to_string(),
                })
            }
            .boxed()
        });

        let query = CachedQuery::mount(cache, "broken", Duration::from_secs(60), None, fetch);
        let mut rx = query.subscribe();
        let bundle = rx.wait_for(|b| b.error.is_some()).await.unwrap().clone();

        assert_eq!(bundle.error.as_deref(), Some("HTTP 500 Internal Server Error"));
        assert!(store.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_interval_means_single_call() {
        let cache = LocalCache::new(Arc::new(MemoryStore::new()));
        let calls = Arc::new(AtomicUsize::new(0));

        let _query = CachedQuery::mount(
            cache,
            "once",
            Duration::from_millis(1),
            Some(Duration::ZERO),
            counting_fetch(calls.clone()),
        );

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_nothing_is_written_after_unmount() {
        let store = Arc::new(MemoryStore::new());
        let cache = LocalCache::new(store.clone());
        cache.cache_data("beds", &vec![9u32]);
        let calls = Arc::new(AtomicUsize::new(0));

        let query = CachedQuery::mount(cache, "beds", Duration::from_secs(60), None, counting_fetch(calls.clone()));
        let rx = query.subscribe();
        query.refresh();
        query.unmount();

        tokio::task::yield_now().await;
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(rx.borrow().data, None);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_older_result_does_not_overwrite_newer() {
        let store = Arc::new(MemoryStore::new());
        let cache = LocalCache::new(store.clone());
        let reader = cache.clone();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let fetch: QueryFn<Vec<u32>> = Arc::new(move || {
            let counter = counter.clone();
            async move {
                let n = counter.fetch_add(1, Ordering::SeqCst);
                let delay = if n == 0 { 500 } else { 100 };
                tokio::time::sleep(Duration::from_millis(delay)).await;
                Ok::<_, NetworkError>(vec![n as u32])
            }
            .boxed()
        });

        let query = CachedQuery::mount(cache, "census", Duration::from_secs(60), None, fetch);
        tokio::time::sleep(Duration::from_millis(10)).await;
        query.refresh();

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(query.snapshot().data, Some(vec![1]));

        tokio::time::sleep(Duration::from_millis(500)).await;
        let bundle = query.snapshot();
        assert_eq!(bundle.data, Some(vec![1]));
        assert!(!bundle.loading);
        assert_eq!(reader.get_cached_data::<Vec<u32>>("census"), Some(vec![1]));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
