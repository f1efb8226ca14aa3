//! Resource services. Each one owns the cache keys and invalidation rules
//! for its resource; reads go through `QueryCache::query`, writes through
//! `QueryCache::mutate`.

mod analytics;
mod categories;
mod dashboard;
mod fetchers;
mod goals;
mod preferences;
mod transactions;

pub use analytics::AnalyticsApi;
pub use categories::CategoriesApi;
pub use dashboard::{DashboardApi, CHART_PAGE_SIZE};
pub use goals::GoalsApi;
pub use preferences::{PreferencesService, Theme, DEFAULT_LOCALE};
pub use transactions::TransactionsApi;

/// Leading key segment per resource, shared by reads and invalidations
pub mod resources {
    pub const TRANSACTIONS: &str = "transactions";
    pub const CATEGORIES: &str = "categories";
    pub const GOALS: &str = "goals";
    pub const DASHBOARD: &str = "dashboard";
    pub const ANALYTICS: &str = "analytics";
}
