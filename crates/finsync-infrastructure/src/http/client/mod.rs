mod binary;
mod json;

pub use binary::BinaryPayload;

use std::time::Instant;

use log::{debug, warn};
use reqwest::{header, Client, Method, RequestBuilder, Response};
use url::Url;
use uuid::Uuid;

use super::{AccessToken, ApiError, QueryParams};
use crate::config::TimeoutConfig;

pub const USER_AGENT: &str = concat!("finsync/", env!("CARGO_PKG_VERSION"));

const REQUEST_ID_HEADER: &str = "x-request-id";

/// Single point of contact with the backend REST API.
///
/// Stateless apart from the shared [`AccessToken`], which is read at call
/// time. No automatic retries; callers decide.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: Url,
    token: AccessToken,
}

impl ApiClient {
    pub fn new(
        base_url: Url,
        token: AccessToken,
        timeouts: &TimeoutConfig,
    ) -> Result<Self, ApiError> {
        let mut default_headers = header::HeaderMap::new();
        default_headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/json"),
        );

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(default_headers)
            .timeout(timeouts.http_request)
            .connect_timeout(timeouts.connect)
            .gzip(true)
            .build()
            .map_err(|e| ApiError::InvalidRequest(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url,
            token,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn access_token(&self) -> &AccessToken {
        &self.token
    }

    /// Resolve `path` under the base URL (keeping any base path prefix)
    pub fn endpoint(&self, path: &str, params: &QueryParams) -> Result<Url, ApiError> {
        let joined = format!(
            "{}/{}",
            self.base_url.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        let mut url = Url::parse(&joined)
            .map_err(|e| ApiError::InvalidRequest(format!("Invalid URL '{}': {}", joined, e)))?;
        params.apply_to(&mut url);
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let mut builder = self
            .client
            .request(method, url)
            .header(REQUEST_ID_HEADER, Uuid::new_v4().to_string());

        // Read on every call so a token set after construction is honoured
        if let Some(token) = self.token.get() {
            builder = builder.bearer_auth(token);
        }
        builder
    }

    /// Send and fail on any status outside 200-299
    async fn execute(
        &self,
        method: Method,
        url: Url,
        body: Option<&serde_json::Value>,
    ) -> Result<Response, ApiError> {
        let started_at = Instant::now();
        let path = url.path().to_string();
        let mut builder = self.request(method.clone(), url);
        if let Some(body) = body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|e| {
            warn!("{} {} failed before a response: {}", method, path, e);
            ApiError::Network(e.to_string())
        })?;

        let status = response.status();
        debug!(
            "{} {} -> {} ({}ms)",
            method,
            path,
            status.as_u16(),
            started_at.elapsed().as_millis()
        );

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(
                "{} {} returned {}: {}",
                method,
                path,
                status.as_u16(),
                &body[..floor_char_boundary(&body, 200)]
            );
            return Err(ApiError::Http {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response)
    }
}

fn floor_char_boundary(s: &str, max: usize) -> usize {
    if s.len() <= max {
        return s.len();
    }
    let mut idx = max;
    while !s.is_char_boundary(idx) {
        idx -= 1;
    }
    idx
}
