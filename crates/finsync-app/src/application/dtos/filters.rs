use chrono::NaiveDate;

use finsync_domain::category::CategoryKind;
use finsync_domain::goal::GoalStatus;
use finsync_domain::shared::{AccountId, CategoryId};
use finsync_domain::transaction::TransactionType;
use finsync_infrastructure::http::QueryParams;

use crate::application::cache::QueryKey;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Transaction list filters. Every field is optional; unset fields are
/// left out of both the request and the cache key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionFilters {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub kind: Option<TransactionType>,
    pub category_id: Option<CategoryId>,
    pub account_id: Option<AccountId>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub search: Option<String>,
}

impl TransactionFilters {
    pub fn page(page: u32) -> Self {
        Self {
            page: Some(page),
            ..Self::default()
        }
    }

    pub fn between(start_date: NaiveDate, end_date: NaiveDate) -> Self {
        Self {
            start_date: Some(start_date),
            end_date: Some(end_date),
            ..Self::default()
        }
    }

    /// Key for a single page; the page number is the cursor
    pub fn key(&self, resource: &str, default_page: u32) -> QueryKey {
        self.filter_key(QueryKey::new(resource))
            .cursor(self.page.unwrap_or(default_page))
    }

    /// Key shared by every page of an infinite list
    pub fn filter_key(&self, base: QueryKey) -> QueryKey {
        base.param_opt("per_page", self.per_page)
            .param_opt("type", self.kind.map(|k| k.as_str()))
            .param_opt("category_id", self.category_id.as_ref())
            .param_opt("account_id", self.account_id.as_ref())
            .param_opt("start_date", self.start_date.map(|d| d.format(DATE_FORMAT)))
            .param_opt("end_date", self.end_date.map(|d| d.format(DATE_FORMAT)))
            .param_opt("search", self.search.as_deref().map(str::trim))
    }

    pub fn params(&self, page: u32, default_per_page: u32) -> QueryParams {
        QueryParams::new()
            .push("page", page)
            .push("per_page", self.per_page.unwrap_or(default_per_page))
            .push_opt("type", self.kind.map(|k| k.as_str()))
            .push_opt("category_id", self.category_id.as_ref())
            .push_opt("account_id", self.account_id.as_ref())
            .push_opt("start_date", self.start_date.map(|d| d.format(DATE_FORMAT)))
            .push_opt("end_date", self.end_date.map(|d| d.format(DATE_FORMAT)))
            .push_opt("search", self.search.as_deref().map(str::trim))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryFilters {
    pub kind: Option<CategoryKind>,
    pub active: Option<bool>,
}

impl CategoryFilters {
    pub fn key(&self, base: QueryKey) -> QueryKey {
        base.param_opt("type", self.kind.map(|k| k.as_str()))
            .param_opt("active", self.active)
    }

    pub fn params(&self) -> QueryParams {
        QueryParams::new()
            .push_opt("type", self.kind.map(|k| k.as_str()))
            .push_opt("active", self.active)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GoalFilters {
    pub status: Option<GoalStatus>,
}

impl GoalFilters {
    pub fn key(&self, base: QueryKey) -> QueryKey {
        base.param_opt("status", self.status.map(|s| s.as_str()))
    }

    pub fn params(&self) -> QueryParams {
        QueryParams::new().push_opt("status", self.status.map(|s| s.as_str()))
    }
}

/// Inclusive date range for analytics endpoints
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl DateRange {
    pub fn new(start_date: NaiveDate, end_date: NaiveDate) -> Self {
        Self {
            start_date: Some(start_date),
            end_date: Some(end_date),
        }
    }

    pub fn key(&self, base: QueryKey) -> QueryKey {
        base.param_opt("start_date", self.start_date.map(|d| d.format(DATE_FORMAT)))
            .param_opt("end_date", self.end_date.map(|d| d.format(DATE_FORMAT)))
    }

    pub fn params(&self) -> QueryParams {
        QueryParams::new()
            .push_opt("start_date", self.start_date.map(|d| d.format(DATE_FORMAT)))
            .push_opt("end_date", self.end_date.map(|d| d.format(DATE_FORMAT)))
    }
}
