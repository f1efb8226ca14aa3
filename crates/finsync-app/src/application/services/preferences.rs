use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use finsync_domain::shared::DomainError;
use finsync_domain::storage::{keys, KeyValueStore};

pub const DEFAULT_LOCALE: &str = "en";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
    #[default]
    System,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
            Theme::System => "system",
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Theme {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            "system" => Ok(Theme::System),
            other => Err(DomainError::InvalidInput(format!("Unknown theme '{}'", other))),
        }
    }
}

/// Device-local, non-sensitive settings
#[derive(Clone)]
pub struct PreferencesService {
    store: Arc<dyn KeyValueStore>,
}

impl PreferencesService {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub async fn locale(&self) -> Result<String, DomainError> {
        Ok(self
            .store
            .get(keys::LOCALE)
            .await?
            .unwrap_or_else(|| DEFAULT_LOCALE.to_string()))
    }

    /// Accepts tags like `en`, `pt-BR` or `zh-Hant-TW`
    pub async fn set_locale(&self, locale: &str) -> Result<(), DomainError> {
        let locale = locale.trim();
        validate_locale(locale)?;
        self.store.set(keys::LOCALE, locale).await?;
        debug!(locale, "Locale saved");
        Ok(())
    }

    /// Unknown stored values fall back to the default theme
    pub async fn theme(&self) -> Result<Theme, DomainError> {
        let stored = self.store.get(keys::THEME).await?;
        Ok(stored
            .and_then(|raw| raw.parse().ok())
            .unwrap_or_default())
    }

    pub async fn set_theme(&self, theme: Theme) -> Result<(), DomainError> {
        self.store.set(keys::THEME, theme.as_str()).await
    }

    pub async fn is_onboarding_complete(&self, flag: &str) -> Result<bool, DomainError> {
        let value = self.store.get(&onboarding_key(flag)?).await?;
        Ok(value.as_deref() == Some("true"))
    }

    pub async fn complete_onboarding(&self, flag: &str) -> Result<(), DomainError> {
        self.store.set(&onboarding_key(flag)?, "true").await
    }

    pub async fn reset_onboarding(&self, flag: &str) -> Result<(), DomainError> {
        self.store.remove(&onboarding_key(flag)?).await
    }
}

fn onboarding_key(flag: &str) -> Result<String, DomainError> {
    let flag = flag.trim();
    if flag.is_empty() {
        return Err(DomainError::InvalidInput(
            "Onboarding flag cannot be empty".to_string(),
        ));
    }
    Ok(format!("{}{}", keys::ONBOARDING_PREFIX, flag))
}

fn validate_locale(locale: &str) -> Result<(), DomainError> {
    let mut subtags = locale.split('-');
    let primary = subtags.next().unwrap_or("");
    let primary_ok = (2..=3).contains(&primary.len()) && primary.chars().all(|c| c.is_ascii_alphabetic());
    let rest_ok = subtags.all(|s| (2..=8).contains(&s.len()) && s.chars().all(|c| c.is_ascii_alphanumeric()));
    if primary_ok && rest_ok {
        Ok(())
    } else {
        Err(DomainError::InvalidInput(format!("Invalid locale '{}'", locale)))
    }
}
