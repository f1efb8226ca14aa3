use tracing::{info, warn};

use finsync_domain::category::{Category, CategoryDraft, CategoryUsage};
use finsync_domain::shared::CategoryId;
use finsync_infrastructure::config::CacheConfig;
use finsync_infrastructure::http::{Acknowledgement, ApiClient, ApiEnvelope, QueryParams};

use super::fetchers;
use super::resources::{ANALYTICS, CATEGORIES, DASHBOARD, TRANSACTIONS};
use crate::application::cache::{
    KeyPrefix, MutationOptions, QueryCache, QueryError, QueryKey, QueryOptions, QueryResult,
};
use crate::application::dtos::CategoryFilters;

#[derive(Clone)]
pub struct CategoriesApi {
    client: ApiClient,
    cache: QueryCache,
    options: QueryOptions,
}

impl CategoriesApi {
    pub fn new(client: ApiClient, cache: QueryCache, config: &CacheConfig) -> Self {
        Self {
            client,
            cache,
            options: QueryOptions::from_config(config),
        }
    }

    pub fn list_key(filters: &CategoryFilters) -> QueryKey {
        filters.key(QueryKey::new(CATEGORIES).segment("list"))
    }

    pub fn detail_key(id: &CategoryId) -> QueryKey {
        QueryKey::new(CATEGORIES).segment(id)
    }

    pub fn usage_key(id: &CategoryId) -> QueryKey {
        Self::detail_key(id).segment("usage")
    }

    pub async fn list(
        &self,
        filters: &CategoryFilters,
    ) -> Result<QueryResult<Vec<Category>>, QueryError> {
        let fetch = fetchers::list(&self.client, "/categories".to_string(), filters.params());
        self.cache
            .query(&Self::list_key(filters), &self.options, fetch)
            .await
    }

    pub async fn get(&self, id: &CategoryId) -> Result<QueryResult<Category>, QueryError> {
        let fetch = fetchers::entity(&self.client, format!("/categories/{}", id), QueryParams::new());
        self.cache
            .query(&Self::detail_key(id), &self.options, fetch)
            .await
    }

    pub async fn usage(&self, id: &CategoryId) -> Result<QueryResult<CategoryUsage>, QueryError> {
        self.cache
            .query(&Self::usage_key(id), &self.options, self.usage_fetcher(id))
            .await
    }

    pub async fn create(&self, draft: &CategoryDraft) -> Result<Category, QueryError> {
        draft.validate()?;
        let created = self
            .cache
            .mutate(
                async {
                    let envelope: ApiEnvelope<Category> =
                        self.client.post("/categories", draft).await?;
                    envelope.into_data()
                },
                Self::write_effects(),
            )
            .await?;
        info!(id = %created.id, name = %created.name, "Category created");
        Ok(created)
    }

    pub async fn update(&self, id: &CategoryId, draft: &CategoryDraft) -> Result<Category, QueryError> {
        draft.validate()?;
        let path = format!("/categories/{}", id);
        self.cache
            .mutate(
                async {
                    let envelope: ApiEnvelope<Category> = self.client.put(&path, draft).await?;
                    envelope.into_data()
                },
                // Renames and colors show up on every transaction row
                Self::write_effects().invalidate(TRANSACTIONS),
            )
            .await
    }

    /// Refuses while any transaction still references the category. Usage
    /// is re-read from the server first so a stale count cannot let a
    /// delete through.
    pub async fn delete(&self, category: &Category) -> Result<(), QueryError> {
        let usage = self
            .cache
            .refetch(&Self::usage_key(&category.id), &self.options, self.usage_fetcher(&category.id))
            .await?;
        if let Err(e) = category.ensure_deletable(&usage.data) {
            warn!(id = %category.id, "Category delete refused: {}", e);
            return Err(e.into());
        }

        let path = format!("/categories/{}", category.id);
        self.cache
            .mutate(
                async {
                    let ack: Option<Acknowledgement> = self.client.delete(&path).await?;
                    ack.map_or(Ok(()), Acknowledgement::into_result)
                },
                Self::write_effects().remove(KeyPrefix::new(CATEGORIES).segment(&category.id)),
            )
            .await?;
        info!(id = %category.id, "Category deleted");
        Ok(())
    }

    fn write_effects() -> MutationOptions {
        MutationOptions::new()
            .invalidate(CATEGORIES)
            .invalidate(DASHBOARD)
            .invalidate(ANALYTICS)
    }

    fn usage_fetcher(&self, id: &CategoryId) -> fetchers::FetchFn<CategoryUsage> {
        fetchers::entity(&self.client, format!("/categories/{}/usage", id), QueryParams::new())
    }
}
