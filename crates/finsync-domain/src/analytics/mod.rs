//! Chart-ready aggregations derived from a raw transaction list.
//!
//! Everything here is synchronous and free of side effects. Functions that
//! depend on "today" come in two flavours: one reading the local wall clock,
//! and an `_on` variant taking the reference date explicitly.

mod comparison;
mod daily;
mod distribution;

use chrono::{Local, NaiveDate};

pub use comparison::{
    income_vs_expense_totals, month_to_month_comparison, month_to_month_comparison_on,
    BreakdownSlice, MonthComparison, MonthTotals,
};
pub use daily::{
    daily_evolution, daily_evolution_on, DailyBucket, DEFAULT_WINDOW_DAYS, MAX_WINDOW_DAYS,
};
pub use distribution::{
    category_distribution, CategorySlice, DEFAULT_TOP_N, UNCATEGORIZED_LABEL,
};

pub(crate) fn today() -> NaiveDate {
    Local::now().date_naive()
}
