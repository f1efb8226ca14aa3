use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::shared::{CategoryId, DomainError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoryKind {
    Income,
    Expense,
}

impl CategoryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CategoryKind::Income => "income",
            CategoryKind::Expense => "expense",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(rename = "type", alias = "category_type")]
    pub kind: CategoryKind,
    #[serde(default)]
    pub is_default: bool,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

/// Usage statistics reported by the server for a single category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryUsage {
    pub transactions_count: u64,
    #[serde(default)]
    pub total_amount: Decimal,
}

impl CategoryUsage {
    pub fn is_unused(&self) -> bool {
        self.transactions_count == 0
    }
}

impl Category {
    /// A category can only be removed when no transaction references it.
    /// Built-in categories are never removable.
    pub fn ensure_deletable(&self, usage: &CategoryUsage) -> Result<(), DomainError> {
        if self.is_default {
            return Err(DomainError::CategoryInUse(format!(
                "'{}' is a default category",
                self.name
            )));
        }
        if !usage.is_unused() {
            return Err(DomainError::CategoryInUse(format!(
                "'{}' is used by {} transaction(s)",
                self.name, usage.transactions_count
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryDraft {
    pub name: String,
    #[serde(rename = "category_type")]
    pub kind: CategoryKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

impl CategoryDraft {
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.name.trim().is_empty() {
            return Err(DomainError::Validation(
                "Category name cannot be empty".to_string(),
            ));
        }
        if let Some(color) = &self.color {
            let hex = color.strip_prefix('#').unwrap_or("");
            if !(hex.len() == 6 || hex.len() == 3) || !hex.chars().all(|c| c.is_ascii_hexdigit())
            {
                return Err(DomainError::Validation(format!(
                    "Invalid color '{}', expected #RRGGBB",
                    color
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn category(is_default: bool) -> Category {
        Category {
            id: CategoryId::from(1),
            name: "Food".to_string(),
            color: Some("#00aa00".to_string()),
            icon: None,
            kind: CategoryKind::Expense,
            is_default,
            is_active: true,
        }
    }

    #[test]
    fn test_unused_category_is_deletable() {
        let usage = CategoryUsage {
            transactions_count: 0,
            total_amount: Decimal::ZERO,
        };
        assert!(category(false).ensure_deletable(&usage).is_ok());
    }

    #[test]
    fn test_used_category_is_not_deletable() {
        let usage = CategoryUsage {
            transactions_count: 3,
            total_amount: Decimal::new(1250, 2),
        };
        let err = category(false).ensure_deletable(&usage).unwrap_err();
        assert!(matches!(err, DomainError::CategoryInUse(_)));
    }

    #[test]
    fn test_default_category_is_not_deletable() {
        let usage = CategoryUsage {
            transactions_count: 0,
            total_amount: Decimal::ZERO,
        };
        assert!(category(true).ensure_deletable(&usage).is_err());
    }

    #[test]
    fn test_draft_color_validation() {
        let mut draft = CategoryDraft {
            name: "Travel".to_string(),
            kind: CategoryKind::Expense,
            color: Some("#1a2b3c".to_string()),
            icon: None,
            is_active: None,
        };
        assert!(draft.validate().is_ok());

        draft.color = Some("blue".to_string());
        assert!(draft.validate().is_err());
    }

    #[test]
    fn test_is_active_defaults_to_true() {
        let json = r#"{"id":2,"name":"Salary","type":"income"}"#;
        let category: Category = serde_json::from_str(json).unwrap();
        assert!(category.is_active);
        assert!(!category.is_default);
    }
}
