use tracing::info;

use finsync_infrastructure::config::CacheConfig;
use finsync_infrastructure::http::{ApiClient, BinaryPayload};

use super::fetchers;
use super::resources::ANALYTICS;
use crate::application::cache::{QueryCache, QueryError, QueryKey, QueryOptions, QueryResult};
use crate::application::dtos::{
    CategoryBreakdownDto, DateRange, ExportFormat, IncomeVsExpensesDto, SpendingTrendDto,
};

#[derive(Clone)]
pub struct AnalyticsApi {
    client: ApiClient,
    cache: QueryCache,
    options: QueryOptions,
}

impl AnalyticsApi {
    pub fn new(client: ApiClient, cache: QueryCache, config: &CacheConfig) -> Self {
        Self {
            client,
            cache,
            options: QueryOptions::fresh_for(config.analytics_stale_time),
        }
    }

    pub fn report_key(report: &str, range: &DateRange) -> QueryKey {
        range.key(QueryKey::new(ANALYTICS).segment(report))
    }

    pub async fn spending_trends(
        &self,
        range: &DateRange,
    ) -> Result<QueryResult<Vec<SpendingTrendDto>>, QueryError> {
        self.report("spending_trends", range).await
    }

    pub async fn category_breakdown(
        &self,
        range: &DateRange,
    ) -> Result<QueryResult<Vec<CategoryBreakdownDto>>, QueryError> {
        self.report("category_breakdown", range).await
    }

    pub async fn income_vs_expenses(
        &self,
        range: &DateRange,
    ) -> Result<QueryResult<IncomeVsExpensesDto>, QueryError> {
        self.report("income_vs_expenses", range).await
    }

    /// Downloads are handed straight to the caller, never cached
    pub async fn export(
        &self,
        range: &DateRange,
        format: ExportFormat,
    ) -> Result<BinaryPayload, QueryError> {
        let params = range.params().push("format", format.as_str());
        let mut payload = self.client.get_binary("/analytics/export", &params).await?;
        if payload.filename.is_none() {
            payload.filename = Some(format!("finsync-report.{}", format.extension()));
        }
        info!(
            format = format.as_str(),
            bytes = payload.bytes.len(),
            "Report exported"
        );
        Ok(payload)
    }

    async fn report<T>(&self, report: &str, range: &DateRange) -> Result<QueryResult<T>, QueryError>
    where
        T: serde::de::DeserializeOwned + Send + Sync + 'static,
    {
        let fetch = fetchers::entity(&self.client, format!("/analytics/{}", report), range.params());
        self.cache
            .query(&Self::report_key(report, range), &self.options, fetch)
            .await
    }
}
