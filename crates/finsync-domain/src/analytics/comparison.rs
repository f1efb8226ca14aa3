use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::transaction::{Transaction, TransactionType};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthTotals {
    pub year: i32,
    pub month: u32,
    pub income: Decimal,
    pub expense: Decimal,
}

impl MonthTotals {
    fn empty(year: i32, month: u32) -> Self {
        Self {
            year,
            month,
            income: Decimal::ZERO,
            expense: Decimal::ZERO,
        }
    }

    fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }

    fn add(&mut self, tx: &Transaction) {
        match tx.kind {
            TransactionType::Income => self.income += tx.amount,
            TransactionType::Expense => self.expense += tx.amount,
            TransactionType::Transfer => {}
        }
    }

    pub fn balance(&self) -> Decimal {
        self.income - self.expense
    }

    /// `YYYY-MM` label
    pub fn label(&self) -> String {
        format!("{:04}-{:02}", self.year, self.month)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthComparison {
    pub current: MonthTotals,
    pub previous: MonthTotals,
}

impl MonthComparison {
    pub fn income_change_pct(&self) -> Option<Decimal> {
        change_pct(self.previous.income, self.current.income)
    }

    pub fn expense_change_pct(&self) -> Option<Decimal> {
        change_pct(self.previous.expense, self.current.expense)
    }
}

fn change_pct(before: Decimal, after: Decimal) -> Option<Decimal> {
    if before.is_zero() {
        return None;
    }
    Some(((after - before) * Decimal::ONE_HUNDRED / before).round_dp(2))
}

/// Current vs previous calendar month by wall-clock date
pub fn month_to_month_comparison(transactions: &[Transaction]) -> MonthComparison {
    month_to_month_comparison_on(transactions, super::today())
}

pub fn month_to_month_comparison_on(
    transactions: &[Transaction],
    today: NaiveDate,
) -> MonthComparison {
    let (prev_year, prev_month) = if today.month() == 1 {
        (today.year() - 1, 12)
    } else {
        (today.year(), today.month() - 1)
    };

    let mut current = MonthTotals::empty(today.year(), today.month());
    let mut previous = MonthTotals::empty(prev_year, prev_month);

    for tx in transactions {
        if current.contains(tx.date) {
            current.add(tx);
        } else if previous.contains(tx.date) {
            previous.add(tx);
        }
    }

    MonthComparison { current, previous }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreakdownSlice {
    pub kind: TransactionType,
    pub amount: Decimal,
}

/// Income and expense totals over the whole list, income first
pub fn income_vs_expense_totals(transactions: &[Transaction]) -> Vec<BreakdownSlice> {
    let (income, expense) = transactions.iter().fold(
        (Decimal::ZERO, Decimal::ZERO),
        |(income, expense), tx| match tx.kind {
            TransactionType::Income => (income + tx.amount, expense),
            TransactionType::Expense => (income, expense + tx.amount),
            TransactionType::Transfer => (income, expense),
        },
    );

    vec![
        BreakdownSlice {
            kind: TransactionType::Income,
            amount: income,
        },
        BreakdownSlice {
            kind: TransactionType::Expense,
            amount: expense,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::TransactionId;

    fn tx(y: i32, m: u32, d: u32, kind: TransactionType, amount: i64) -> Transaction {
        Transaction {
            id: TransactionId::from_string("t"),
            description: "x".to_string(),
            amount: Decimal::from(amount),
            kind,
            date: NaiveDate::from_ymd_opt(y, m, d).unwrap(),
            category: None,
            account: None,
        }
    }

    #[test]
    fn test_month_split_across_year_boundary() {
        let today = NaiveDate::from_ymd_opt(2025, 1, 10).unwrap();
        let txs = vec![
            tx(2025, 1, 2, TransactionType::Income, 300),
            tx(2025, 1, 5, TransactionType::Expense, 120),
            tx(2024, 12, 20, TransactionType::Income, 200),
            tx(2024, 12, 24, TransactionType::Expense, 240),
            tx(2024, 11, 1, TransactionType::Income, 999),
        ];
        let cmp = month_to_month_comparison_on(&txs, today);

        assert_eq!(cmp.current.label(), "2025-01");
        assert_eq!(cmp.previous.label(), "2024-12");
        assert_eq!(cmp.current.income, Decimal::from(300));
        assert_eq!(cmp.current.expense, Decimal::from(120));
        assert_eq!(cmp.previous.income, Decimal::from(200));
        assert_eq!(cmp.previous.balance(), Decimal::from(-40));
        assert_eq!(cmp.income_change_pct(), Some(Decimal::from(50)));
        assert_eq!(cmp.expense_change_pct(), Some(Decimal::from(-50)));
    }

    #[test]
    fn test_change_pct_undefined_without_previous() {
        let today = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        let txs = vec![tx(2025, 6, 1, TransactionType::Income, 10)];
        let cmp = month_to_month_comparison_on(&txs, today);
        assert_eq!(cmp.income_change_pct(), None);
    }

    #[test]
    fn test_income_vs_expense_totals() {
        let txs = vec![
            tx(2020, 1, 1, TransactionType::Income, 100),
            tx(2023, 5, 1, TransactionType::Expense, 30),
            tx(2024, 5, 1, TransactionType::Transfer, 70),
            tx(2025, 5, 1, TransactionType::Expense, 20),
        ];
        let slices = income_vs_expense_totals(&txs);
        assert_eq!(slices.len(), 2);
        assert_eq!(slices[0].kind, TransactionType::Income);
        assert_eq!(slices[0].amount, Decimal::from(100));
        assert_eq!(slices[1].amount, Decimal::from(50));
    }
}
