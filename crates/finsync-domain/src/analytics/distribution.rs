use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::transaction::Transaction;

pub const DEFAULT_TOP_N: usize = 8;
pub const UNCATEGORIZED_LABEL: &str = "Uncategorized";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorySlice {
    pub name: String,
    pub color: Option<String>,
    pub amount: Decimal,
}

/// Expense totals per category name, largest first.
///
/// Ties keep first-seen order. Categories past `top_n` are dropped rather
/// than folded into an "other" slice.
pub fn category_distribution(transactions: &[Transaction], top_n: usize) -> Vec<CategorySlice> {
    let mut slices: Vec<CategorySlice> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for tx in transactions.iter().filter(|tx| tx.is_expense()) {
        let name = tx.category_name().unwrap_or(UNCATEGORIZED_LABEL);
        match index.get(name) {
            Some(&i) => slices[i].amount += tx.amount,
            None => {
                index.insert(name.to_string(), slices.len());
                slices.push(CategorySlice {
                    name: name.to_string(),
                    color: tx.category.as_ref().and_then(|c| c.color.clone()),
                    amount: tx.amount,
                });
            }
        }
    }

    // sort_by is stable, so equal totals stay in insertion order
    slices.sort_by(|a, b| b.amount.cmp(&a.amount));
    slices.truncate(top_n);
    slices
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::{CategoryId, TransactionId};
    use crate::transaction::{CategoryRef, TransactionType};
    use chrono::NaiveDate;

    fn expense(category: Option<&str>, amount: i64) -> Transaction {
        Transaction {
            id: TransactionId::from_string("t"),
            description: "x".to_string(),
            amount: Decimal::from(amount),
            kind: TransactionType::Expense,
            date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            category: category.map(|name| CategoryRef {
                id: CategoryId::from_string(name),
                name: name.to_string(),
                color: Some("#123456".to_string()),
                icon: None,
            }),
            account: None,
        }
    }

    #[test]
    fn test_groups_and_sorts_descending() {
        let mut txs = vec![
            expense(Some("Food"), 10),
            expense(Some("Rent"), 500),
            expense(Some("Food"), 30),
            expense(None, 5),
        ];
        let mut income = expense(Some("Salary"), 9000);
        income.kind = TransactionType::Income;
        txs.push(income);

        let slices = category_distribution(&txs, DEFAULT_TOP_N);
        let names: Vec<&str> = slices.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Rent", "Food", UNCATEGORIZED_LABEL]);
        assert_eq!(slices[1].amount, Decimal::from(40));
        assert_eq!(slices[0].color.as_deref(), Some("#123456"));
        assert!(slices[2].color.is_none());
    }

    #[test]
    fn test_ties_keep_insertion_order() {
        let txs = vec![
            expense(Some("B"), 20),
            expense(Some("A"), 20),
            expense(Some("C"), 20),
        ];
        let names: Vec<String> = category_distribution(&txs, 8)
            .into_iter()
            .map(|s| s.name)
            .collect();
        assert_eq!(names, vec!["B", "A", "C"]);
    }

    #[test]
    fn test_top_n_truncates_without_other_bucket() {
        let txs: Vec<Transaction> = (1..=12)
            .map(|i| expense(Some(&format!("C{}", i)), i))
            .collect();
        let slices = category_distribution(&txs, 8);
        assert_eq!(slices.len(), 8);
        assert_eq!(slices[0].name, "C12");
        assert_eq!(slices[7].name, "C5");
        assert!(slices.windows(2).all(|w| w[0].amount >= w[1].amount));
    }
}
