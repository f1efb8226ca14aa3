use chrono::{Local, NaiveDate};

use finsync_infrastructure::config::CacheConfig;
use finsync_infrastructure::http::{ApiClient, QueryParams};

use super::fetchers;
use super::resources::DASHBOARD;
use super::transactions::TransactionsApi;
use crate::application::cache::{QueryCache, QueryError, QueryKey, QueryOptions, QueryResult};
use crate::application::dtos::{
    DashboardChartsDto, DashboardPeriod, DashboardSummaryDto, DateRange, TransactionFilters,
};

/// Transactions pulled per chart render
pub const CHART_PAGE_SIZE: u32 = 500;

#[derive(Clone)]
pub struct DashboardApi {
    client: ApiClient,
    cache: QueryCache,
    transactions: TransactionsApi,
    options: QueryOptions,
}

impl DashboardApi {
    pub fn new(
        client: ApiClient,
        cache: QueryCache,
        transactions: TransactionsApi,
        config: &CacheConfig,
    ) -> Self {
        let mut options = QueryOptions::fresh_for(config.dashboard_stale_time);
        if let Some(interval) = config.dashboard_refetch_interval {
            options = options.with_refetch_interval(interval);
        }
        Self {
            client,
            cache,
            transactions,
            options,
        }
    }

    pub fn summary_key(period: DashboardPeriod) -> QueryKey {
        QueryKey::new(DASHBOARD)
            .segment("summary")
            .param("period", period.as_str())
    }

    /// Headline figures; polled in the background while the slot lives
    pub async fn summary(
        &self,
        period: DashboardPeriod,
    ) -> Result<QueryResult<DashboardSummaryDto>, QueryError> {
        let fetch = fetchers::entity(
            &self.client,
            "/dashboard".to_string(),
            QueryParams::new().push("period", period.as_str()),
        );
        self.cache
            .query(&Self::summary_key(period), &self.options, fetch)
            .await
    }

    pub async fn charts(&self, range: &DateRange) -> Result<DashboardChartsDto, QueryError> {
        self.charts_on(range, Local::now().date_naive()).await
    }

    /// Chart data is recomputed from the cached transaction list on every
    /// call and never stored itself.
    pub async fn charts_on(
        &self,
        range: &DateRange,
        today: NaiveDate,
    ) -> Result<DashboardChartsDto, QueryError> {
        let filters = TransactionFilters {
            per_page: Some(CHART_PAGE_SIZE),
            start_date: range.start_date,
            end_date: range.end_date,
            ..TransactionFilters::default()
        };
        let page = self.transactions.list(&filters).await?;
        Ok(DashboardChartsDto::from_transactions(&page.data.items, today))
    }
}
