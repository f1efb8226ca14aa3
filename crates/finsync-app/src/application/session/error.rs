use finsync_infrastructure::http::{ApiError, FieldError};

/// Sign-in or sign-up failure, ready for display next to the form
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{message}")]
pub struct AuthError {
    pub message: String,
    pub field_errors: Vec<FieldError>,
}

impl AuthError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            field_errors: Vec::new(),
        }
    }

    pub fn with_fields(message: impl Into<String>, field_errors: Vec<FieldError>) -> Self {
        Self {
            message: message.into(),
            field_errors,
        }
    }

    pub fn field(&self, name: &str) -> Option<&str> {
        self.field_errors
            .iter()
            .find(|e| e.field == name)
            .map(|e| e.message.as_str())
    }

    /// Map a failed auth call, preferring the server's own wording
    pub fn from_api(err: &ApiError, fallback: &str) -> Self {
        match err {
            ApiError::Network(_) => Self::new("Unable to reach the server"),
            ApiError::Http { status, .. } => {
                let body = err.error_body().unwrap_or_default();
                let message = body.summary().unwrap_or_else(|| match status {
                    401 | 403 => fallback.to_string(),
                    _ => format!("Request failed with status {}", status),
                });
                Self::with_fields(message, body.field_errors())
            }
            other => Self::new(other.user_message()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_errors_are_extracted() {
        let err = ApiError::Http {
            status: 422,
            body: r#"{"errors":[{"field":"email","message":"has already been taken"},"Password too weak"]}"#
                .to_string(),
        };
        let auth = AuthError::from_api(&err, "Sign up failed");
        assert_eq!(auth.field("email"), Some("has already been taken"));
        assert_eq!(auth.field_errors.len(), 1);
        assert_eq!(
            auth.message,
            "email has already been taken, Password too weak"
        );
    }

    #[test]
    fn test_unauthorized_without_body_uses_fallback() {
        let err = ApiError::Http {
            status: 401,
            body: String::new(),
        };
        assert_eq!(
            AuthError::from_api(&err, "Invalid email or password").message,
            "Invalid email or password"
        );
        assert_eq!(
            AuthError::from_api(&ApiError::Network("refused".into()), "x").message,
            "Unable to reach the server"
        );
    }
}
