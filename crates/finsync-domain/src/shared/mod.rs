use serde::{Deserialize, Deserializer, Serialize};

pub mod dates;

/// Server identifiers arrive either as JSON strings or integers; both are
/// normalised to their string form.
macro_rules! define_id {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn from_string(s: &str) -> Self {
                Self(s.to_string())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                Ok(Self(RawId::deserialize(deserializer)?.into_string()))
            }
        }

        impl From<i64> for $name {
            fn from(value: i64) -> Self {
                Self(value.to_string())
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self::from_string(value)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Number(i64),
}

impl RawId {
    fn into_string(self) -> String {
        match self {
            RawId::Text(s) => s,
            RawId::Number(n) => n.to_string(),
        }
    }
}

define_id!(UserId);
define_id!(TransactionId);
define_id!(CategoryId);
define_id!(AccountId);
define_id!(GoalId);
define_id!(ContributionId);

/// Error codes for structured error handling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    // Authentication (1xxx)
    InvalidCredentials = 1001,
    ExpiredSession = 1002,

    // Resource Not Found (2xxx)
    ResourceNotFound = 2001,

    // Business Logic (3xxx)
    CategoryInUse = 3001,
    GoalNotActive = 3002,

    // Data & Persistence (4xxx)
    StorageError = 4001,
    SerializationError = 4004,
    EncryptionError = 4005,

    // Infrastructure (5xxx)
    InfrastructureError = 5001,
    NetworkError = 5002,

    // Validation (6xxx)
    ValidationError = 6001,
    InvalidInput = 6002,
}

impl ErrorCode {
    /// Get error code as integer
    pub fn code(&self) -> u16 {
        *self as u16
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            ErrorCode::InvalidCredentials
            | ErrorCode::ExpiredSession
            | ErrorCode::NetworkError => ErrorSeverity::Warning,

            ErrorCode::ResourceNotFound
            | ErrorCode::CategoryInUse
            | ErrorCode::GoalNotActive
            | ErrorCode::ValidationError
            | ErrorCode::InvalidInput => ErrorSeverity::Info,

            ErrorCode::StorageError
            | ErrorCode::SerializationError
            | ErrorCode::EncryptionError
            | ErrorCode::InfrastructureError => ErrorSeverity::Error,
        }
    }

    /// Whether retrying the same operation can succeed
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ErrorCode::NetworkError | ErrorCode::InfrastructureError
        )
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorSeverity {
    Info,
    Warning,
    Error,
    Critical,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomainError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Category in use: {0}")]
    CategoryInUse(String),

    #[error("Goal not active: {0}")]
    GoalNotActive(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Encryption error: {0}")]
    Encryption(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Infrastructure error: {0}")]
    Infrastructure(String),
}

impl DomainError {
    pub fn code(&self) -> ErrorCode {
        match self {
            DomainError::Validation(_) => ErrorCode::ValidationError,
            DomainError::InvalidInput(_) => ErrorCode::InvalidInput,
            DomainError::NotFound(_) => ErrorCode::ResourceNotFound,
            DomainError::CategoryInUse(_) => ErrorCode::CategoryInUse,
            DomainError::GoalNotActive(_) => ErrorCode::GoalNotActive,
            DomainError::Storage(_) => ErrorCode::StorageError,
            DomainError::Encryption(_) => ErrorCode::EncryptionError,
            DomainError::Serialization(_) => ErrorCode::SerializationError,
            DomainError::Infrastructure(_) => ErrorCode::InfrastructureError,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            DomainError::Validation(msg)
            | DomainError::InvalidInput(msg)
            | DomainError::NotFound(msg)
            | DomainError::CategoryInUse(msg)
            | DomainError::GoalNotActive(msg)
            | DomainError::Storage(msg)
            | DomainError::Encryption(msg)
            | DomainError::Serialization(msg)
            | DomainError::Infrastructure(msg) => msg,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        self.code().severity()
    }

    pub fn is_recoverable(&self) -> bool {
        self.code().is_recoverable()
    }

    /// Format error with code
    pub fn format_with_code(&self) -> String {
        format!("[{}] {}", self.code().code(), self)
    }
}
