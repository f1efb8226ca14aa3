use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::transaction::{Transaction, TransactionType};

pub const DEFAULT_WINDOW_DAYS: u32 = 30;
/// Longest window served; larger requests are clamped to it
pub const MAX_WINDOW_DAYS: u32 = 3660;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyBucket {
    pub date: NaiveDate,
    pub income: Decimal,
    pub expense: Decimal,
    /// Running income minus expense since the first day of the window
    pub balance: Decimal,
}

/// Daily income/expense over the last `window_days` days ending today
pub fn daily_evolution(transactions: &[Transaction], window_days: u32) -> Vec<DailyBucket> {
    daily_evolution_on(transactions, window_days, super::today())
}

/// One bucket per calendar day from `today - (window_days - 1)` through
/// `today`, zero-filled. Transfers do not move the balance.
///
/// The window is clamped to [`MAX_WINDOW_DAYS`] and never starts before the
/// earliest representable date.
pub fn daily_evolution_on(
    transactions: &[Transaction],
    window_days: u32,
    today: NaiveDate,
) -> Vec<DailyBucket> {
    let window_days = window_days.min(MAX_WINDOW_DAYS);
    if window_days == 0 {
        return Vec::new();
    }
    let start = today
        .checked_sub_signed(Duration::days(i64::from(window_days) - 1))
        .unwrap_or(NaiveDate::MIN);

    let mut per_day: BTreeMap<NaiveDate, (Decimal, Decimal)> = BTreeMap::new();
    for tx in transactions {
        if tx.date < start || tx.date > today {
            continue;
        }
        let entry = per_day.entry(tx.date).or_insert((Decimal::ZERO, Decimal::ZERO));
        match tx.kind {
            TransactionType::Income => entry.0 += tx.amount,
            TransactionType::Expense => entry.1 += tx.amount,
            TransactionType::Transfer => {}
        }
    }

    let mut balance = Decimal::ZERO;
    let days = (today - start).num_days() + 1;
    start
        .iter_days()
        .take(days as usize)
        .map(|date| {
            let (income, expense) = per_day
                .get(&date)
                .copied()
                .unwrap_or((Decimal::ZERO, Decimal::ZERO));
            balance += income - expense;
            DailyBucket {
                date,
                income,
                expense,
                balance,
            }
        })
        .collect()
}
