use std::sync::Arc;

use tokio::sync::{broadcast, watch, OnceCell};
use tracing::{debug, info, warn};

use finsync_domain::session::{AuthGrant, Registration, SessionState, SignInRequest, TokenStore, UserProfile};
use finsync_infrastructure::http::{AccessToken, ApiError, FieldError};

use super::{AuthError, AuthGateway};

const NOTICE_CAPACITY: usize = 16;

/// Out-of-band session events for the UI layer
#[derive(Debug, Clone, PartialEq)]
pub enum SessionNotice {
    /// The server rejected the session; the user must sign in again
    SessionExpired,
    /// A stored token could not be checked because the server was unreachable.
    /// The token is kept for the next attempt.
    ValidationUnavailable { message: String },
}

/// Owner of the authentication lifecycle.
///
/// State changes are published on a `watch` channel. The access token is
/// written to the shared [`AccessToken`] cell that the HTTP client reads on
/// every request, and persisted through a [`TokenStore`].
pub struct SessionStore {
    gateway: Arc<dyn AuthGateway>,
    tokens: Arc<dyn TokenStore>,
    access_token: AccessToken,
    state: watch::Sender<SessionState>,
    notices: broadcast::Sender<SessionNotice>,
    startup: OnceCell<()>,
}

impl SessionStore {
    pub fn new(
        gateway: Arc<dyn AuthGateway>,
        tokens: Arc<dyn TokenStore>,
        access_token: AccessToken,
    ) -> Self {
        let (state, _) = watch::channel(SessionState::Anonymous);
        let (notices, _) = broadcast::channel(NOTICE_CAPACITY);
        Self {
            gateway,
            tokens,
            access_token,
            state,
            notices,
            startup: OnceCell::new(),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    pub fn notices(&self) -> broadcast::Receiver<SessionNotice> {
        self.notices.subscribe()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.borrow().is_authenticated()
    }

    pub fn current_user(&self) -> Option<UserProfile> {
        self.state.borrow().user().cloned()
    }

    pub fn access_token(&self) -> &AccessToken {
        &self.access_token
    }

    /// Sign in; on failure the session is left as it was
    pub async fn login(&self, email: &str, password: &str) -> Result<UserProfile, AuthError> {
        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            return Err(AuthError::new("Email and password are required"));
        }

        let request = SignInRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let grant = self.gateway.sign_in(&request).await.map_err(|e| {
            warn!(status = ?e.status(), "Sign-in failed");
            AuthError::from_api(&e, "Invalid email or password")
        })?;

        Ok(self.establish(grant).await)
    }

    pub async fn register(&self, registration: &Registration) -> Result<UserProfile, AuthError> {
        let local_errors = registration.field_errors();
        if !local_errors.is_empty() {
            let field_errors = local_errors
                .into_iter()
                .map(|(field, message)| FieldError { field, message })
                .collect();
            return Err(AuthError::with_fields(
                "Please correct the highlighted fields",
                field_errors,
            ));
        }

        let grant = self.gateway.sign_up(registration).await.map_err(|e| {
            warn!(status = ?e.status(), "Sign-up failed");
            AuthError::from_api(&e, "Sign up failed")
        })?;

        Ok(self.establish(grant).await)
    }

    /// Always ends anonymous. Server sign-out and storage cleanup are best-effort.
    pub async fn logout(&self) {
        if self.access_token.is_present() {
            if let Err(e) = self.gateway.sign_out().await {
                warn!(error = %e, "Server sign-out failed, clearing local session anyway");
            }
        }
        if let Err(e) = self.tokens.clear().await {
            warn!(error = %e, "Failed to clear stored session token");
        }
        self.access_token.clear();
        self.set_state(SessionState::Anonymous);
    }

    /// Confirm a persisted token with the server. Runs once per store;
    /// concurrent and later callers wait for that single run and get its outcome.
    pub async fn validate_on_startup(&self) -> SessionState {
        self.startup.get_or_init(|| self.restore()).await;
        self.state()
    }

    /// The server rejected the current token mid-session
    pub async fn expire(&self) {
        let active = self.access_token.is_present() || !matches!(self.state(), SessionState::Anonymous);
        if !active {
            return;
        }
        self.access_token.clear();
        if let Err(e) = self.tokens.clear().await {
            warn!(error = %e, "Failed to clear expired session token");
        }
        self.set_state(SessionState::Anonymous);
        let _ = self.notices.send(SessionNotice::SessionExpired);
    }

    async fn restore(&self) {
        let token = match self.tokens.load().await {
            Ok(Some(token)) if !token.is_empty() => token,
            Ok(_) => {
                debug!("No stored session token");
                return;
            }
            Err(e) => {
                warn!(error = %e, "Failed to read stored session token");
                return;
            }
        };

        self.access_token.set(token.as_str());
        self.set_state(SessionState::Validating);

        let outcome = self.gateway.validate().await;

        // A login, register or logout finished while validating; that outcome wins
        if self.access_token.get().as_deref() != Some(token.as_str()) {
            debug!("Session changed during startup validation, discarding its outcome");
            return;
        }

        match outcome {
            Ok(user) => self.set_state(SessionState::Authenticated { user }),
            Err(e) if is_transient(&e) => {
                warn!(error = %e, "Could not validate stored session, keeping token for next start");
                self.access_token.clear();
                self.set_state(SessionState::Anonymous);
                let _ = self.notices.send(SessionNotice::ValidationUnavailable {
                    message: e.user_message(),
                });
            }
            Err(e) => {
                info!(status = ?e.status(), "Stored session rejected by server");
                self.expire().await;
            }
        }
    }

    async fn establish(&self, grant: AuthGrant) -> UserProfile {
        if let Err(e) = self.tokens.save(&grant.token).await {
            warn!(error = %e, "Failed to persist session token, session will not survive a restart");
        }
        self.access_token.set(grant.token);
        self.set_state(SessionState::Authenticated {
            user: grant.user.clone(),
        });
        grant.user
    }

    fn set_state(&self, next: SessionState) {
        let previous = self.state.send_replace(next);
        let current = self.state.borrow();
        info!(from = previous.name(), to = current.name(), "Session state changed");
    }
}

/// Server unreachable or failing, as opposed to refusing the token
fn is_transient(err: &ApiError) -> bool {
    err.is_network() || err.status().is_some_and(|status| status >= 500)
}
