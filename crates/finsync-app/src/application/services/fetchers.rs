//! Fetch closures handed to the query cache. Each call clones what it
//! needs, so the closure can be re-run by background refreshes and polling.

use futures::future::{BoxFuture, FutureExt};
use serde::de::DeserializeOwned;

use finsync_infrastructure::http::{ApiClient, ApiEnvelope, ApiError, ListEnvelope, Page, QueryParams};

pub(crate) type FetchFn<T> = Box<dyn Fn() -> BoxFuture<'static, Result<T, ApiError>> + Send + Sync>;
pub(crate) type PageFetchFn<T> =
    Box<dyn Fn(u32) -> BoxFuture<'static, Result<Page<T>, ApiError>> + Send + Sync>;

/// `{success, data}` single-entity endpoint
pub(crate) fn entity<T>(client: &ApiClient, path: String, params: QueryParams) -> FetchFn<T>
where
    T: DeserializeOwned + Send + 'static,
{
    let client = client.clone();
    Box::new(move || {
        let client = client.clone();
        let path = path.clone();
        let params = params.clone();
        async move {
            let envelope: ApiEnvelope<T> = client.get(&path, &params).await?;
            envelope.into_data()
        }
        .boxed()
    })
}

/// List endpoint returning one fixed page
pub(crate) fn page<T>(client: &ApiClient, path: String, params: QueryParams) -> FetchFn<Page<T>>
where
    T: DeserializeOwned + Send + 'static,
{
    let client = client.clone();
    Box::new(move || {
        let client = client.clone();
        let path = path.clone();
        let params = params.clone();
        async move {
            let envelope: ListEnvelope<T> = client.get(&path, &params).await?;
            envelope.into_page()
        }
        .boxed()
    })
}

/// Unpaginated list endpoint
pub(crate) fn list<T>(client: &ApiClient, path: String, params: QueryParams) -> FetchFn<Vec<T>>
where
    T: DeserializeOwned + Send + 'static,
{
    let fetch_page = page::<T>(client, path, params);
    Box::new(move || {
        let future = fetch_page();
        async move { Ok::<_, ApiError>(future.await?.items) }.boxed()
    })
}

/// List endpoint addressed by page number; `build_params` renders the
/// query for a given page
pub(crate) fn pages<T, P>(client: &ApiClient, path: String, build_params: P) -> PageFetchFn<T>
where
    T: DeserializeOwned + Send + 'static,
    P: Fn(u32) -> QueryParams + Send + Sync + 'static,
{
    let client = client.clone();
    Box::new(move |page| {
        let client = client.clone();
        let path = path.clone();
        let params = build_params(page);
        async move {
            let envelope: ListEnvelope<T> = client.get(&path, &params).await?;
            envelope.into_page()
        }
        .boxed()
    })
}
