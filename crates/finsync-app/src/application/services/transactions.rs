use tracing::info;

use finsync_domain::shared::TransactionId;
use finsync_domain::transaction::{Transaction, TransactionDraft};
use finsync_infrastructure::config::CacheConfig;
use finsync_infrastructure::http::{Acknowledgement, ApiClient, ApiEnvelope, Page, QueryParams};

use super::fetchers;
use super::resources::{ANALYTICS, CATEGORIES, DASHBOARD, GOALS, TRANSACTIONS};
use crate::application::cache::{
    InfiniteOptions, InfinitePages, KeyPrefix, MutationOptions, QueryCache, QueryError, QueryKey,
    QueryOptions, QueryResult,
};
use crate::application::dtos::TransactionFilters;

const FIRST_PAGE: u32 = 1;

#[derive(Clone)]
pub struct TransactionsApi {
    client: ApiClient,
    cache: QueryCache,
    options: QueryOptions,
    per_page: u32,
}

impl TransactionsApi {
    pub fn new(client: ApiClient, cache: QueryCache, config: &CacheConfig) -> Self {
        Self {
            client,
            cache,
            options: QueryOptions::from_config(config),
            per_page: config.default_per_page,
        }
    }

    pub fn list_key(filters: &TransactionFilters) -> QueryKey {
        filters.key(TRANSACTIONS, FIRST_PAGE)
    }

    pub fn pages_key(filters: &TransactionFilters) -> QueryKey {
        filters.filter_key(QueryKey::new(TRANSACTIONS).segment("pages"))
    }

    pub fn detail_key(id: &TransactionId) -> QueryKey {
        QueryKey::new(TRANSACTIONS).segment(id)
    }

    /// One page of transactions
    pub async fn list(
        &self,
        filters: &TransactionFilters,
    ) -> Result<QueryResult<Page<Transaction>>, QueryError> {
        let page = filters.page.unwrap_or(FIRST_PAGE);
        let params = filters.params(page, self.per_page);
        let fetch = fetchers::page(&self.client, "/transactions".to_string(), params);
        self.cache
            .query(&Self::list_key(filters), &self.options, fetch)
            .await
    }

    /// Every page loaded so far for these filters; `filters.page` is ignored
    pub async fn pages(
        &self,
        filters: &TransactionFilters,
    ) -> Result<QueryResult<InfinitePages<Transaction>>, QueryError> {
        self.cache
            .infinite_query(&Self::pages_key(filters), &self.infinite_options(), self.page_fetcher(filters))
            .await
    }

    pub async fn next_page(
        &self,
        filters: &TransactionFilters,
    ) -> Result<QueryResult<InfinitePages<Transaction>>, QueryError> {
        self.cache
            .fetch_next_page(&Self::pages_key(filters), &self.infinite_options(), self.page_fetcher(filters))
            .await
    }

    pub async fn get(&self, id: &TransactionId) -> Result<QueryResult<Transaction>, QueryError> {
        let fetch = fetchers::entity(
            &self.client,
            format!("/transactions/{}", id),
            QueryParams::new(),
        );
        self.cache
            .query(&Self::detail_key(id), &self.options, fetch)
            .await
    }

    pub async fn create(&self, draft: &TransactionDraft) -> Result<Transaction, QueryError> {
        draft.validate()?;
        let created = self
            .cache
            .mutate(
                async {
                    let envelope: ApiEnvelope<Transaction> =
                        self.client.post("/transactions", draft).await?;
                    envelope.into_data()
                },
                Self::write_effects(),
            )
            .await?;
        info!(id = %created.id, "Transaction created");
        Ok(created)
    }

    pub async fn update(
        &self,
        id: &TransactionId,
        draft: &TransactionDraft,
    ) -> Result<Transaction, QueryError> {
        draft.validate()?;
        let path = format!("/transactions/{}", id);
        self.cache
            .mutate(
                async {
                    let envelope: ApiEnvelope<Transaction> = self.client.put(&path, draft).await?;
                    envelope.into_data()
                },
                Self::write_effects(),
            )
            .await
    }

    pub async fn delete(&self, id: &TransactionId) -> Result<(), QueryError> {
        let path = format!("/transactions/{}", id);
        self.cache
            .mutate(
                async {
                    let ack: Option<Acknowledgement> = self.client.delete(&path).await?;
                    ack.map_or(Ok(()), Acknowledgement::into_result)
                },
                Self::write_effects().remove(KeyPrefix::new(TRANSACTIONS).segment(id)),
            )
            .await?;
        info!(id = %id, "Transaction deleted");
        Ok(())
    }

    /// A transaction feeds lists, totals, category usage and goal progress
    fn write_effects() -> MutationOptions {
        MutationOptions::new()
            .invalidate(TRANSACTIONS)
            .invalidate(DASHBOARD)
            .invalidate(ANALYTICS)
            .invalidate(CATEGORIES)
            .invalidate(GOALS)
    }

    fn infinite_options(&self) -> InfiniteOptions {
        InfiniteOptions::from(self.options)
    }

    fn page_fetcher(&self, filters: &TransactionFilters) -> fetchers::PageFetchFn<Transaction> {
        let filters = filters.clone();
        let per_page = self.per_page;
        fetchers::pages(&self.client, "/transactions".to_string(), move |page| {
            filters.params(page, per_page)
        })
    }
}
