mod repository;

use serde::{Deserialize, Serialize};

use crate::shared::{DomainError, UserId};

pub use repository::TokenStore;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: UserId,
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub currency: Option<String>,
}

/// Authentication lifecycle
///
/// `Anonymous -> Validating -> Authenticated -> Anonymous`
#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    Anonymous,
    /// A persisted token is awaiting confirmation from the server
    Validating,
    Authenticated { user: UserProfile },
}

impl SessionState {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, SessionState::Authenticated { .. })
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, SessionState::Validating)
    }

    pub fn user(&self) -> Option<&UserProfile> {
        match self {
            SessionState::Authenticated { user } => Some(user),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            SessionState::Anonymous => "anonymous",
            SessionState::Validating => "validating",
            SessionState::Authenticated { .. } => "authenticated",
        }
    }
}

/// Token issued by the sign-in, sign-up and validation endpoints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthGrant {
    pub user: UserProfile,
    pub token: String,
}

impl AuthGrant {
    pub fn new(user: UserProfile, token: String) -> Result<Self, DomainError> {
        if token.is_empty() {
            return Err(DomainError::Validation(
                "Session token cannot be empty".to_string(),
            ));
        }
        Ok(Self { user, token })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignInRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: String,
    pub password_confirmation: String,
}

impl Registration {
    /// Field-level checks mirrored from the sign-up form; the server
    /// remains the authority.
    pub fn field_errors(&self) -> Vec<(String, String)> {
        let mut errors = Vec::new();
        if self.name.trim().is_empty() {
            errors.push(("name".to_string(), "can't be blank".to_string()));
        }
        if !self.email.contains('@') {
            errors.push(("email".to_string(), "is invalid".to_string()));
        }
        if self.password.len() < 6 {
            errors.push((
                "password".to_string(),
                "is too short (minimum is 6 characters)".to_string(),
            ));
        }
        if self.password != self.password_confirmation {
            errors.push((
                "password_confirmation".to_string(),
                "doesn't match Password".to_string(),
            ));
        }
        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> UserProfile {
        UserProfile {
            id: UserId::from(1),
            email: "ana@example.com".to_string(),
            name: Some("Ana".to_string()),
            currency: None,
        }
    }

    #[test]
    fn test_empty_token_rejected() {
        assert!(AuthGrant::new(user(), String::new()).is_err());
        assert!(AuthGrant::new(user(), "tok".to_string()).is_ok());
    }

    #[test]
    fn test_state_accessors() {
        let state = SessionState::Authenticated { user: user() };
        assert!(state.is_authenticated());
        assert!(!state.is_loading());
        assert_eq!(state.user().unwrap().email, "ana@example.com");
        assert!(SessionState::Validating.is_loading());
        assert!(SessionState::Anonymous.user().is_none());
    }

    #[test]
    fn test_registration_field_errors() {
        let registration = Registration {
            name: "".to_string(),
            email: "nope".to_string(),
            password: "123".to_string(),
            password_confirmation: "321".to_string(),
        };
        let fields: Vec<String> = registration
            .field_errors()
            .into_iter()
            .map(|(field, _)| field)
            .collect();
        assert_eq!(
            fields,
            vec!["name", "email", "password", "password_confirmation"]
        );
    }
}
