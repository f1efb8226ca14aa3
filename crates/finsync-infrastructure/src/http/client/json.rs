use reqwest::Method;
use serde::{de::DeserializeOwned, Serialize};

use super::ApiClient;
use crate::http::{ApiError, QueryParams};

impl ApiClient {
    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &QueryParams,
    ) -> Result<T, ApiError> {
        let url = self.endpoint(path, params)?;
        self.send_json(Method::GET, url, None).await
    }

    pub async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let url = self.endpoint(path, &QueryParams::new())?;
        let body = encode_body(body)?;
        self.send_json(Method::POST, url, Some(&body)).await
    }

    pub async fn put<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let url = self.endpoint(path, &QueryParams::new())?;
        let body = encode_body(body)?;
        self.send_json(Method::PUT, url, Some(&body)).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let url = self.endpoint(path, &QueryParams::new())?;
        self.send_json(Method::DELETE, url, None).await
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        method: Method,
        url: url::Url,
        body: Option<&serde_json::Value>,
    ) -> Result<T, ApiError> {
        let path = url.path().to_string();
        let response = self.execute(method, url, body).await?;
        let text = response
            .text()
            .await
            .map_err(|e| ApiError::Network(format!("Failed to read response body: {}", e)))?;
        decode_body(&path, &text)
    }
}

fn encode_body<B: Serialize + ?Sized>(body: &B) -> Result<serde_json::Value, ApiError> {
    serde_json::to_value(body)
        .map_err(|e| ApiError::InvalidRequest(format!("Failed to encode request body: {}", e)))
}

/// Parse at the boundary; a shape mismatch fails here instead of leaking
/// untyped data inward. Empty bodies decode as JSON `null`.
pub(super) fn decode_body<T: DeserializeOwned>(path: &str, text: &str) -> Result<T, ApiError> {
    let source = if text.trim().is_empty() { "null" } else { text };
    serde_json::from_str(source).map_err(|e| {
        log::warn!("Response from {} did not match expected shape: {}", path, e);
        ApiError::Decode(format!("{}: {}", path, e))
    })
}
