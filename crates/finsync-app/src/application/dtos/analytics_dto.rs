use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpendingTrendDto {
    /// Bucket label as sent by the server, e.g. `2025-03`
    #[serde(alias = "month", alias = "date")]
    pub period: String,
    #[serde(default)]
    pub income: Decimal,
    #[serde(default, alias = "expense")]
    pub expenses: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryBreakdownDto {
    #[serde(alias = "name", alias = "category_name")]
    pub category: String,
    pub amount: Decimal,
    #[serde(default)]
    pub percentage: Option<Decimal>,
    #[serde(default)]
    pub color: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncomeVsExpensesDto {
    #[serde(default)]
    pub income: Decimal,
    #[serde(default)]
    pub expenses: Decimal,
}

impl IncomeVsExpensesDto {
    pub fn net(&self) -> Decimal {
        self.income - self.expenses
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Csv,
    Pdf,
    Xlsx,
}

impl ExportFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Pdf => "pdf",
            ExportFormat::Xlsx => "xlsx",
        }
    }

    pub fn extension(&self) -> &'static str {
        self.as_str()
    }
}
