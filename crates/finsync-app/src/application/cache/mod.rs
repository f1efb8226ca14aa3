//! Keyed cache of server resources with stale-while-revalidate reads,
//! per-key request de-duplication and invalidate-after-success writes.
//!
//! Values are type-erased in the slot and recovered by downcast, so one
//! cache serves every resource. Every fetch runs as its own tokio task:
//! an observer that stops waiting does not cancel it, and the result still
//! lands in the cache for whoever reads next.
//!
//! Results are ordered by a cache-wide generation counter. A fetch only
//! replaces the slot when it was issued after the one that produced the
//! current value, so a slow response can never overwrite newer data.

mod error;
mod infinite;
mod key;
mod options;


use std::any::Any;
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt, Shared};
use tokio::task::AbortHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

pub use error::QueryError;
pub use infinite::{InfiniteOptions, InfinitePages};
pub use key::{KeyPrefix, QueryKey};
pub use options::{MutationOptions, QueryOptions, DEFAULT_STALE_TIME};

type AnyValue = Arc<dyn Any + Send + Sync>;
type FetchResult = Result<AnyValue, QueryError>;
type SharedFetch = Shared<BoxFuture<'static, FetchResult>>;
type Fetcher = Arc<dyn Fn() -> BoxFuture<'static, FetchResult> + Send + Sync>;

/// A value read through the cache
#[derive(Debug)]
pub struct QueryResult<T> {
    pub data: Arc<T>,
    /// Served from cache while a refresh runs in the background
    pub is_stale: bool,
}

impl<T> Clone for QueryResult<T> {
    fn clone(&self) -> Self {
        Self {
            data: self.data.clone(),
            is_stale: self.is_stale,
        }
    }
}

/// Synchronous view of a slot, without fetching
#[derive(Debug, Clone)]
pub enum QueryState<T> {
    /// Nothing cached
    Missing,
    /// Nothing cached and the last attempt failed
    Failed(QueryError),
    Ready {
        data: Arc<T>,
        is_stale: bool,
        last_error: Option<QueryError>,
    },
}

impl<T> QueryState<T> {
    pub fn data(&self) -> Option<&Arc<T>> {
        match self {
            QueryState::Ready { data, .. } => Some(data),
            _ => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, QueryState::Missing | QueryState::Failed(_))
    }
}

struct InFlight {
    generation: u64,
    fetch: SharedFetch,
}

struct Entry {
    value: Option<AnyValue>,
    fetched_at: Option<Instant>,
    stale_after: Duration,
    invalidated: bool,
    last_error: Option<QueryError>,
    /// Generation of the fetch that produced `value`
    applied: u64,
    /// Fetches issued before this generation cannot clear `invalidated`
    valid_from: u64,
    in_flight: Option<InFlight>,
    poller: Option<AbortHandle>,
}

impl Entry {
    fn new(stale_after: Duration, floor: u64) -> Self {
        Self {
            value: None,
            fetched_at: None,
            stale_after,
            invalidated: false,
            last_error: None,
            // Results of fetches started for an earlier, removed slot are ignored
            applied: floor,
            valid_from: 0,
            in_flight: None,
            poller: None,
        }
    }

    fn is_fresh(&self, now: Instant) -> bool {
        match (&self.value, self.fetched_at) {
            (Some(_), Some(at)) => !self.invalidated && now.duration_since(at) <= self.stale_after,
            _ => false,
        }
    }
}

impl Drop for Entry {
    fn drop(&mut self) {
        if let Some(poller) = self.poller.take() {
            poller.abort();
        }
    }
}

struct Inner {
    entries: Mutex<HashMap<QueryKey, Entry>>,
    generation: AtomicU64,
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, HashMap<QueryKey, Entry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn current_generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Apply a finished fetch and return what its waiters should see
    fn complete(&self, key: &QueryKey, generation: u64, result: FetchResult) -> FetchResult {
        let mut entries = self.lock();
        let Some(entry) = entries.get_mut(key) else {
            debug!(key = %key, "Slot removed before its fetch completed");
            return result;
        };

        if entry
            .in_flight
            .as_ref()
            .is_some_and(|f| f.generation == generation)
        {
            entry.in_flight = None;
        }

        if generation <= entry.applied {
            debug!(
                key = %key,
                generation,
                applied = entry.applied,
                "Discarding out-of-order fetch result"
            );
            return match &entry.value {
                Some(current) => Ok(current.clone()),
                None => result,
            };
        }

        match &result {
            Ok(value) => {
                entry.value = Some(value.clone());
                entry.fetched_at = Some(Instant::now());
                entry.applied = generation;
                entry.last_error = None;
                if generation >= entry.valid_from {
                    entry.invalidated = false;
                }
                debug!(key = %key, generation, "Cache slot updated");
            }
            Err(e) => {
                warn!(key = %key, error = %e, "Fetch failed, keeping last known value");
                entry.last_error = Some(e.clone());
            }
        }
        result
    }
}

/// Shared handle; clones see the same slots
#[derive(Clone)]
pub struct QueryCache {
    inner: Arc<Inner>,
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new()
    }
}

impl QueryCache {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                entries: Mutex::new(HashMap::new()),
                generation: AtomicU64::new(0),
            }),
        }
    }

    /// Cached value when present, even if stale; fetches when the slot is
    /// empty and refreshes in the background when it is stale or invalidated.
    pub async fn query<T, F, Fut, E>(
        &self,
        key: &QueryKey,
        options: &QueryOptions,
        fetch: F,
    ) -> Result<QueryResult<T>, QueryError>
    where
        T: Send + Sync + 'static,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        E: Into<QueryError> + Send + 'static,
    {
        let (value, is_stale) = self.read(key, options, erase(fetch)).await?;
        Ok(QueryResult {
            data: downcast(key, value)?,
            is_stale,
        })
    }

    /// Fetch now and wait for the result, joining a fetch already running
    pub async fn refetch<T, F, Fut, E>(
        &self,
        key: &QueryKey,
        options: &QueryOptions,
        fetch: F,
    ) -> Result<QueryResult<T>, QueryError>
    where
        T: Send + Sync + 'static,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        E: Into<QueryError> + Send + 'static,
    {
        let value = self.force(key, options, erase(fetch)).await?;
        Ok(QueryResult {
            data: downcast(key, value)?,
            is_stale: false,
        })
    }

    /// Run a write; on success drop `removes` and mark `invalidates` stale.
    /// A failed write leaves the cache untouched.
    pub async fn mutate<T, E, Fut>(
        &self,
        mutation: Fut,
        options: MutationOptions,
    ) -> Result<T, QueryError>
    where
        Fut: Future<Output = Result<T, E>>,
        E: Into<QueryError>,
    {
        let output = mutation.await.map_err(|e| {
            let err = e.into();
            warn!(error = %err, "Mutation failed, cache left unchanged");
            err
        })?;

        for prefix in options.removes {
            self.remove(prefix);
        }
        for prefix in options.invalidates {
            self.invalidate(prefix);
        }
        Ok(output)
    }

    pub fn peek<T: Send + Sync + 'static>(&self, key: &QueryKey) -> Result<QueryState<T>, QueryError> {
        let entries = self.inner.lock();
        let Some(entry) = entries.get(key) else {
            return Ok(QueryState::Missing);
        };
        match &entry.value {
            Some(value) => Ok(QueryState::Ready {
                data: downcast(key, value.clone())?,
                is_stale: !entry.is_fresh(Instant::now()),
                last_error: entry.last_error.clone(),
            }),
            None => Ok(match &entry.last_error {
                Some(e) => QueryState::Failed(e.clone()),
                None => QueryState::Missing,
            }),
        }
    }

    /// Mark matching slots stale so the next read refetches. Fetches already
    /// running are detached: they may still store their value but cannot
    /// make the slot fresh again.
    pub fn invalidate(&self, prefix: impl Into<KeyPrefix>) -> usize {
        let prefix = prefix.into();
        let valid_from = self.inner.current_generation() + 1;
        let mut entries = self.inner.lock();
        let mut count = 0;
        for (_, entry) in entries.iter_mut().filter(|(key, _)| key.matches(&prefix)) {
            entry.invalidated = true;
            entry.valid_from = valid_from;
            entry.in_flight = None;
            count += 1;
        }
        info!(prefix = %prefix, count, "Invalidated cached queries");
        count
    }

    /// Drop matching slots and stop their polling
    pub fn remove(&self, prefix: impl Into<KeyPrefix>) -> usize {
        let prefix = prefix.into();
        let mut entries = self.inner.lock();
        let before = entries.len();
        entries.retain(|key, _| !key.matches(&prefix));
        let count = before - entries.len();
        info!(prefix = %prefix, count, "Removed cached queries");
        count
    }

    pub fn clear(&self) {
        let mut entries = self.inner.lock();
        let count = entries.len();
        entries.clear();
        info!(count, "Cleared query cache");
    }

    pub fn is_fetching(&self, key: &QueryKey) -> bool {
        self.inner
            .lock()
            .get(key)
            .is_some_and(|entry| entry.in_flight.is_some())
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    async fn read(
        &self,
        key: &QueryKey,
        options: &QueryOptions,
        fetcher: Fetcher,
    ) -> Result<(AnyValue, bool), QueryError> {
        let pending = {
            let mut entries = self.inner.lock();
            let entry = self.slot(&mut entries, key, options, &fetcher);

            if let Some(value) = entry.value.clone() {
                let fresh = entry.is_fresh(Instant::now());
                if fresh {
                    debug!(key = %key, "Cache hit");
                } else if entry.in_flight.is_none() {
                    debug!(key = %key, "Serving stale value, refreshing in background");
                    self.refresh_in_background(key, entry, &fetcher);
                }
                return Ok((value, !fresh));
            }

            match entry.in_flight.as_ref().map(|f| f.fetch.clone()) {
                Some(fetch) => {
                    debug!(key = %key, "Joining in-flight fetch");
                    fetch
                }
                None => {
                    debug!(key = %key, "Cache miss");
                    self.start_fetch(key, entry, &fetcher)
                }
            }
        };

        Ok((pending.await?, false))
    }

    async fn force(
        &self,
        key: &QueryKey,
        options: &QueryOptions,
        fetcher: Fetcher,
    ) -> FetchResult {
        let pending = {
            let mut entries = self.inner.lock();
            let entry = self.slot(&mut entries, key, options, &fetcher);
            match entry.in_flight.as_ref().map(|f| f.fetch.clone()) {
                Some(fetch) => fetch,
                None => self.start_fetch(key, entry, &fetcher),
            }
        };
        pending.await
    }

    fn slot<'a>(
        &self,
        entries: &'a mut HashMap<QueryKey, Entry>,
        key: &QueryKey,
        options: &QueryOptions,
        fetcher: &Fetcher,
    ) -> &'a mut Entry {
        let floor = self.inner.current_generation();
        let entry = entries
            .entry(key.clone())
            .or_insert_with(|| Entry::new(options.stale_time, floor));
        entry.stale_after = options.stale_time;

        if let Some(interval) = options.refetch_interval {
            if entry.poller.is_none() && !interval.is_zero() {
                entry.poller = Some(self.spawn_poller(key.clone(), interval, fetcher.clone()));
            }
        }
        entry
    }

    fn start_fetch(&self, key: &QueryKey, entry: &mut Entry, fetcher: &Fetcher) -> SharedFetch {
        let generation = self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let future = fetcher();
        let inner = Arc::downgrade(&self.inner);
        let task_key = key.clone();

        let task = tokio::spawn(async move {
            let result = future.await;
            match inner.upgrade() {
                Some(inner) => inner.complete(&task_key, generation, result),
                None => result,
            }
        });

        let key_label = key.to_string();
        let fetch = async move {
            task.await.unwrap_or_else(|e| {
                Err(QueryError::Aborted {
                    key: key_label,
                    reason: e.to_string(),
                })
            })
        }
        .boxed()
        .shared();

        entry.in_flight = Some(InFlight {
            generation,
            fetch: fetch.clone(),
        });
        fetch
    }

    /// The spawned task stores the outcome; nobody waits on the handle
    fn refresh_in_background(&self, key: &QueryKey, entry: &mut Entry, fetcher: &Fetcher) {
        drop(self.start_fetch(key, entry, fetcher));
    }

    fn spawn_poller(&self, key: QueryKey, interval: Duration, fetcher: Fetcher) -> AbortHandle {
        let inner = Arc::downgrade(&self.inner);
        debug!(key = %key, interval_ms = interval.as_millis() as u64, "Starting background polling");

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let Some(inner) = inner.upgrade() else {
                    break;
                };
                QueryCache { inner }.poll(&key, &fetcher);
            }
        });
        task.abort_handle()
    }

    fn poll(&self, key: &QueryKey, fetcher: &Fetcher) {
        let mut entries = self.inner.lock();
        let Some(entry) = entries.get_mut(key) else {
            return;
        };
        if entry.in_flight.is_none() {
            debug!(key = %key, "Polling refresh");
            self.refresh_in_background(key, entry, fetcher);
        }
    }
}

fn erase<T, F, Fut, E>(fetch: F) -> Fetcher
where
    T: Send + Sync + 'static,
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
    E: Into<QueryError> + Send + 'static,
{
    Arc::new(move || {
        let future = fetch();
        async move {
            future
                .await
                .map(|value| Arc::new(value) as AnyValue)
                .map_err(Into::into)
        }
        .boxed()
    })
}

fn downcast<T: Send + Sync + 'static>(key: &QueryKey, value: AnyValue) -> Result<Arc<T>, QueryError> {
    value.downcast::<T>().map_err(|_| QueryError::TypeMismatch {
        key: key.to_string(),
    })
}
