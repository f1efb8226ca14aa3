use std::future::Future;
use std::sync::Arc;

use futures::future::FutureExt;
use tracing::debug;

use finsync_infrastructure::http::Page;

use super::{
    downcast, erase, AnyValue, Fetcher, QueryCache, QueryError, QueryKey, QueryOptions,
    QueryResult, SharedFetch,
};

pub const FIRST_PAGE: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InfiniteOptions {
    pub query: QueryOptions,
    pub initial_page: u32,
}

impl Default for InfiniteOptions {
    fn default() -> Self {
        Self {
            query: QueryOptions::default(),
            initial_page: FIRST_PAGE,
        }
    }
}

impl From<QueryOptions> for InfiniteOptions {
    fn from(query: QueryOptions) -> Self {
        Self {
            query,
            initial_page: FIRST_PAGE,
        }
    }
}

/// Pages loaded so far for one list key, in fetch order.
///
/// Only ever grows forward; a refresh starts again from the first page.
#[derive(Debug, Clone, PartialEq)]
pub struct InfinitePages<T> {
    pages: Vec<Page<T>>,
}

impl<T> InfinitePages<T> {
    pub fn pages(&self) -> &[Page<T>] {
        &self.pages
    }

    pub fn items(&self) -> impl Iterator<Item = &T> {
        self.pages.iter().flat_map(|page| page.items.iter())
    }

    /// Cursor for the page after the last one loaded
    pub fn next_cursor(&self) -> Option<u32> {
        self.pages.last().and_then(|page| page.next_page())
    }

    pub fn has_next_page(&self) -> bool {
        self.next_cursor().is_some()
    }

    pub fn total_count(&self) -> Option<u64> {
        self.pages.last().map(|page| page.pagination.total_count)
    }
}

enum NextStep {
    Restart,
    /// Wait for a fetch someone else started; `loaded` pages were cached before it
    Join { fetch: SharedFetch, loaded: usize },
    Advance(SharedFetch),
    Complete(AnyValue),
}

impl QueryCache {
    /// Paged list read through the cache; the slot holds every page loaded
    /// so far. A stale or invalidated slot refreshes from the first page.
    pub async fn infinite_query<T, F, Fut, E>(
        &self,
        key: &QueryKey,
        options: &InfiniteOptions,
        fetch_page: F,
    ) -> Result<QueryResult<InfinitePages<T>>, QueryError>
    where
        T: Clone + Send + Sync + 'static,
        F: Fn(u32) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Page<T>, E>> + Send + 'static,
        E: Into<QueryError> + Send + 'static,
    {
        let fetcher = first_page(Arc::new(fetch_page), options.initial_page);
        let (value, is_stale) = self.read(key, &options.query, fetcher).await?;
        Ok(QueryResult {
            data: downcast(key, value)?,
            is_stale,
        })
    }

    /// Append the page after the last loaded one. Returns the current pages
    /// unchanged at the end of the sequence; an empty or invalidated slot
    /// loads from the first page instead. A call that lands on a running
    /// first-page refresh waits for it and then advances from page one.
    pub async fn fetch_next_page<T, F, Fut, E>(
        &self,
        key: &QueryKey,
        options: &InfiniteOptions,
        fetch_page: F,
    ) -> Result<QueryResult<InfinitePages<T>>, QueryError>
    where
        T: Clone + Send + Sync + 'static,
        F: Fn(u32) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Page<T>, E>> + Send + 'static,
        E: Into<QueryError> + Send + 'static,
    {
        let fetch_page = Arc::new(fetch_page);
        let mut rejoined = false;

        loop {
            let step = self.next_step::<T, F, Fut, E>(key, &fetch_page)?;
            let value = match step {
                NextStep::Complete(value) => value,
                NextStep::Advance(fetch) => fetch.await?,
                NextStep::Join { fetch, loaded } => {
                    let value = fetch.await?;
                    let pages = downcast::<InfinitePages<T>>(key, value.clone())?;
                    // A first-page refresh was running; advance from its result once
                    if !rejoined && pages.pages.len() <= loaded {
                        debug!(key = %key, "Joined a refresh, advancing from its result");
                        rejoined = true;
                        continue;
                    }
                    value
                }
                NextStep::Restart => {
                    let fetcher = first_page(fetch_page.clone(), options.initial_page);
                    self.force(key, &options.query, fetcher).await?
                }
            };
            return Ok(QueryResult {
                data: downcast(key, value)?,
                is_stale: false,
            });
        }
    }

    fn next_step<T, F, Fut, E>(
        &self,
        key: &QueryKey,
        fetch_page: &Arc<F>,
    ) -> Result<NextStep, QueryError>
    where
        T: Clone + Send + Sync + 'static,
        F: Fn(u32) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Page<T>, E>> + Send + 'static,
        E: Into<QueryError> + Send + 'static,
    {
        let mut entries = self.inner.lock();
        let Some(entry) = entries.get_mut(key) else {
            return Ok(NextStep::Restart);
        };

        if let Some(in_flight) = &entry.in_flight {
            let loaded = match entry.value.clone() {
                Some(value) => downcast::<InfinitePages<T>>(key, value)?.pages.len(),
                None => 0,
            };
            return Ok(NextStep::Join {
                fetch: in_flight.fetch.clone(),
                loaded,
            });
        }

        let value = match entry.value.clone() {
            Some(value) if !entry.invalidated => value,
            _ => return Ok(NextStep::Restart),
        };
        let current = downcast::<InfinitePages<T>>(key, value.clone())?;
        Ok(match current.next_cursor() {
            None => NextStep::Complete(value),
            Some(cursor) => {
                debug!(key = %key, cursor, "Fetching next page");
                let fetcher = append_page(fetch_page.clone(), current, cursor);
                NextStep::Advance(self.start_fetch(key, entry, &fetcher))
            }
        })
    }
}

fn first_page<T, F, Fut, E>(fetch_page: Arc<F>, initial_page: u32) -> Fetcher
where
    T: Send + Sync + 'static,
    F: Fn(u32) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Page<T>, E>> + Send + 'static,
    E: Into<QueryError> + Send + 'static,
{
    erase(move || {
        let future = fetch_page(initial_page);
        async move {
            let page = future.await?;
            Ok::<_, E>(InfinitePages { pages: vec![page] })
        }
    })
}

fn append_page<T, F, Fut, E>(
    fetch_page: Arc<F>,
    base: Arc<InfinitePages<T>>,
    cursor: u32,
) -> Fetcher
where
    T: Clone + Send + Sync + 'static,
    F: Fn(u32) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Page<T>, E>> + Send + 'static,
    E: Into<QueryError> + Send + 'static,
{
    Arc::new(move || {
        let future = fetch_page(cursor);
        let base = base.clone();
        async move {
            let page = future.await.map_err(Into::into)?;
            let mut pages = InfinitePages::clone(&base);
            pages.pages.push(page);
            Ok(Arc::new(pages) as AnyValue)
        }
        .boxed()
    })
}
