use finsync_domain::shared::DomainError;
use finsync_infrastructure::http::ApiError;

/// Failure surfaced by a cached read or a mutation
///
/// `Clone` so one in-flight result can be delivered to every waiter.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum QueryError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Domain(#[from] DomainError),

    /// The slot holds a value of another type than the one requested
    #[error("Cached value for '{key}' has an unexpected type")]
    TypeMismatch { key: String },

    /// The fetch task panicked or was aborted
    #[error("Fetch for '{key}' did not complete: {reason}")]
    Aborted { key: String, reason: String },
}

impl QueryError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, QueryError::Api(e) if e.is_unauthorized())
    }

    pub fn is_network(&self) -> bool {
        matches!(self, QueryError::Api(e) if e.is_network())
    }

    pub fn user_message(&self) -> String {
        match self {
            QueryError::Api(e) => e.user_message(),
            QueryError::Domain(e) => e.message().to_string(),
            other => other.to_string(),
        }
    }
}

impl From<QueryError> for DomainError {
    fn from(err: QueryError) -> Self {
        match err {
            QueryError::Api(e) => e.into(),
            QueryError::Domain(e) => e,
            other => DomainError::Infrastructure(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unauthorized_detection() {
        let err = QueryError::from(ApiError::Http {
            status: 401,
            body: String::new(),
        });
        assert!(err.is_unauthorized());
        assert!(!QueryError::from(ApiError::Network("down".into())).is_unauthorized());
        assert!(QueryError::from(ApiError::Network("down".into())).is_network());
    }

    #[test]
    fn test_into_domain_error() {
        let err: DomainError = QueryError::from(ApiError::Http {
            status: 404,
            body: r#"{"error":"Goal not found"}"#.to_string(),
        })
        .into();
        assert!(matches!(err, DomainError::NotFound(ref m) if m == "Goal not found"));

        let err: DomainError = QueryError::TypeMismatch {
            key: "goals".to_string(),
        }
        .into();
        assert!(matches!(err, DomainError::Infrastructure(_)));
    }

    #[test]
    fn test_waiters_compare_equal_outcomes() {
        let a = QueryError::from(DomainError::GoalNotActive("paused".to_string()));
        let b = QueryError::Domain(DomainError::GoalNotActive("paused".to_string()));
        assert_eq!(a, b);
        assert_ne!(a, QueryError::from(DomainError::CategoryInUse("paused".to_string())));
    }
}
