use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use finsync_domain::analytics::{
    category_distribution, daily_evolution_on, income_vs_expense_totals,
    month_to_month_comparison_on, BreakdownSlice, CategorySlice, DailyBucket, MonthComparison,
    DEFAULT_TOP_N, DEFAULT_WINDOW_DAYS,
};
use finsync_domain::goal::Goal;
use finsync_domain::transaction::Transaction;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DashboardPeriod {
    Week,
    #[default]
    Month,
    Quarter,
    Year,
}

impl DashboardPeriod {
    pub fn as_str(&self) -> &'static str {
        match self {
            DashboardPeriod::Week => "week",
            DashboardPeriod::Month => "month",
            DashboardPeriod::Quarter => "quarter",
            DashboardPeriod::Year => "year",
        }
    }
}

/// `GET /dashboard` payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardSummaryDto {
    #[serde(default)]
    pub total_balance: Decimal,
    #[serde(default, alias = "total_income")]
    pub monthly_income: Decimal,
    #[serde(default, alias = "total_expenses")]
    pub monthly_expenses: Decimal,
    #[serde(default)]
    pub savings_rate: Option<Decimal>,
    #[serde(default)]
    pub recent_transactions: Vec<Transaction>,
    #[serde(default, alias = "goals")]
    pub active_goals: Vec<Goal>,
}

impl DashboardSummaryDto {
    pub fn net_income(&self) -> Decimal {
        self.monthly_income - self.monthly_expenses
    }
}

/// Chart data derived on the client from a transaction list
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardChartsDto {
    pub daily: Vec<DailyBucket>,
    pub categories: Vec<CategorySlice>,
    pub comparison: MonthComparison,
    pub totals: Vec<BreakdownSlice>,
}

impl DashboardChartsDto {
    pub fn from_transactions(transactions: &[Transaction], today: NaiveDate) -> Self {
        Self {
            daily: daily_evolution_on(transactions, DEFAULT_WINDOW_DAYS, today),
            categories: category_distribution(transactions, DEFAULT_TOP_N),
            comparison: month_to_month_comparison_on(transactions, today),
            totals: income_vs_expense_totals(transactions),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_tolerates_sparse_payload() {
        let json = r#"{"total_balance": "1500.25", "total_income": 3000, "total_expenses": "1200.50"}"#;
        let summary: DashboardSummaryDto = serde_json::from_str(json).unwrap();
        assert_eq!(summary.net_income(), "1799.50".parse::<Decimal>().unwrap());
        assert!(summary.recent_transactions.is_empty());
        assert!(summary.savings_rate.is_none());
    }
}
