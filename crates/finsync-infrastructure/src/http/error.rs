use finsync_domain::shared::DomainError;
use serde::Deserialize;

/// Failure at the HTTP boundary
///
/// `Clone` so a single in-flight result can be handed to every caller
/// waiting on it.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ApiError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Unexpected response shape: {0}")]
    Decode(String),

    #[error("Request rejected: {0}")]
    Rejected(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_network(&self) -> bool {
        matches!(self, ApiError::Network(_))
    }

    /// Token missing, expired or revoked
    pub fn is_unauthorized(&self) -> bool {
        matches!(self.status(), Some(401) | Some(403))
    }

    pub fn error_body(&self) -> Option<ErrorBody> {
        match self {
            ApiError::Http { body, .. } => ErrorBody::parse(body),
            _ => None,
        }
    }

    /// Best human-readable message available
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Http { status, body } => ErrorBody::parse(body)
                .and_then(|b| b.summary())
                .unwrap_or_else(|| format!("Request failed with status {}", status)),
            ApiError::Rejected(message) => message.clone(),
            other => other.to_string(),
        }
    }
}

impl From<ApiError> for DomainError {
    fn from(err: ApiError) -> Self {
        match err.status() {
            Some(404) => DomainError::NotFound(err.user_message()),
            Some(422) => DomainError::Validation(err.user_message()),
            _ => match err {
                ApiError::Decode(msg) => DomainError::Serialization(msg),
                ApiError::InvalidRequest(msg) => DomainError::InvalidInput(msg),
                other => DomainError::Infrastructure(other.user_message()),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ErrorEntry {
    Field { field: String, message: String },
    Plain(String),
}

/// Error payload: `{message?|error?|errors:[{field,message}|string]}`
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub errors: Vec<ErrorEntry>,
}

impl ErrorBody {
    pub fn parse(raw: &str) -> Option<Self> {
        serde_json::from_str(raw).ok()
    }

    pub fn summary(&self) -> Option<String> {
        if let Some(message) = self.message.as_ref().filter(|m| !m.is_empty()) {
            return Some(message.clone());
        }
        if let Some(error) = self.error.as_ref().filter(|m| !m.is_empty()) {
            return Some(error.clone());
        }
        let parts: Vec<String> = self
            .errors
            .iter()
            .map(|entry| match entry {
                ErrorEntry::Field { field, message } => format!("{} {}", field, message),
                ErrorEntry::Plain(message) => message.clone(),
            })
            .collect();
        if parts.is_empty() {
            None
        } else {
            Some(parts.join(", "))
        }
    }

    pub fn field_errors(&self) -> Vec<FieldError> {
        self.errors
            .iter()
            .filter_map(|entry| match entry {
                ErrorEntry::Field { field, message } => Some(FieldError {
                    field: field.clone(),
                    message: message.clone(),
                }),
                ErrorEntry::Plain(_) => None,
            })
            .collect()
    }
}
