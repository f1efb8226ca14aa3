use async_trait::async_trait;
use serde::Deserialize;

use finsync_domain::session::{AuthGrant, Registration, SignInRequest, UserProfile};
use finsync_infrastructure::http::{Acknowledgement, ApiClient, ApiEnvelope, ApiError, QueryParams};

/// Backend authentication endpoints
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AuthGateway: Send + Sync {
    async fn sign_in(&self, request: &SignInRequest) -> Result<AuthGrant, ApiError>;

    async fn sign_up(&self, registration: &Registration) -> Result<AuthGrant, ApiError>;

    /// Confirm the token currently attached to requests
    async fn validate(&self) -> Result<UserProfile, ApiError>;

    async fn sign_out(&self) -> Result<(), ApiError>;
}

#[derive(Debug, Deserialize)]
struct GrantPayload {
    user: UserProfile,
    #[serde(alias = "access_token")]
    token: String,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum UserPayload {
    Wrapped { user: UserProfile },
    Bare(UserProfile),
}

/// `AuthGateway` over the REST API
pub struct HttpAuthGateway {
    client: ApiClient,
}

impl HttpAuthGateway {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    fn into_grant(envelope: ApiEnvelope<GrantPayload>) -> Result<AuthGrant, ApiError> {
        let payload = envelope.into_data()?;
        AuthGrant::new(payload.user, payload.token)
            .map_err(|e| ApiError::Decode(e.to_string()))
    }
}

#[async_trait]
impl AuthGateway for HttpAuthGateway {
    async fn sign_in(&self, request: &SignInRequest) -> Result<AuthGrant, ApiError> {
        let envelope = self.client.post("/auth/sign_in", request).await?;
        Self::into_grant(envelope)
    }

    async fn sign_up(&self, registration: &Registration) -> Result<AuthGrant, ApiError> {
        let envelope = self.client.post("/auth/sign_up", registration).await?;
        Self::into_grant(envelope)
    }

    async fn validate(&self) -> Result<UserProfile, ApiError> {
        let envelope: ApiEnvelope<UserPayload> = self
            .client
            .get("/auth/validate", &QueryParams::new())
            .await?;
        Ok(match envelope.into_data()? {
            UserPayload::Wrapped { user } => user,
            UserPayload::Bare(user) => user,
        })
    }

    async fn sign_out(&self) -> Result<(), ApiError> {
        // Some deployments answer 204 with no body
        let ack: Option<Acknowledgement> = self.client.delete("/auth/sign_out").await?;
        ack.map_or(Ok(()), Acknowledgement::into_result)
    }
}
