use reqwest::{header, Method};

use super::ApiClient;
use crate::http::{ApiError, QueryParams};

/// Raw download, e.g. an exported report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryPayload {
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
    pub filename: Option<String>,
}

impl ApiClient {
    pub async fn get_binary(
        &self,
        path: &str,
        params: &QueryParams,
    ) -> Result<BinaryPayload, ApiError> {
        let url = self.endpoint(path, params)?;
        let response = self.execute(Method::GET, url, None).await?;

        let headers = response.headers();
        let content_type = headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let filename = headers
            .get(header::CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
            .and_then(filename_from_disposition);

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ApiError::Network(format!("Failed to read download: {}", e)))?
            .to_vec();

        log::info!("Downloaded {} bytes from {}", bytes.len(), path);

        Ok(BinaryPayload {
            bytes,
            content_type,
            filename,
        })
    }
}

/// `attachment; filename="report.csv"` -> `report.csv`
fn filename_from_disposition(value: &str) -> Option<String> {
    value.split(';').map(str::trim).find_map(|part| {
        let raw = part.strip_prefix("filename=")?;
        let name = raw.trim_matches('"');
        if name.is_empty() {
            None
        } else {
            Some(name.to_string())
        }
    })
}
