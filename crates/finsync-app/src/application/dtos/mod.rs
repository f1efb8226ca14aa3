mod analytics_dto;
mod dashboard_dto;
mod filters;

pub use analytics_dto::{CategoryBreakdownDto, ExportFormat, IncomeVsExpensesDto, SpendingTrendDto};
pub use dashboard_dto::{DashboardChartsDto, DashboardPeriod, DashboardSummaryDto};
pub use filters::{CategoryFilters, DateRange, GoalFilters, TransactionFilters};
