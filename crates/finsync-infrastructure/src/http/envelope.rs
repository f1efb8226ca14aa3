use serde::{Deserialize, Serialize};

use super::ApiError;

fn default_success() -> bool {
    true
}

/// Single-entity response: `{success, data, message?}`
#[derive(Debug, Clone, Deserialize)]
pub struct ApiEnvelope<T> {
    #[serde(default = "default_success")]
    pub success: bool,
    pub data: T,
    #[serde(default)]
    pub message: Option<String>,
}

impl<T> ApiEnvelope<T> {
    pub fn into_data(self) -> Result<T, ApiError> {
        if !self.success {
            return Err(ApiError::Rejected(
                self.message
                    .unwrap_or_else(|| "Server reported failure".to_string()),
            ));
        }
        Ok(self.data)
    }
}

/// Response without a payload, e.g. deletes
#[derive(Debug, Clone, Deserialize)]
pub struct Acknowledgement {
    #[serde(default = "default_success")]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}

impl Acknowledgement {
    pub fn into_result(self) -> Result<(), ApiError> {
        if self.success {
            Ok(())
        } else {
            Err(ApiError::Rejected(
                self.message
                    .unwrap_or_else(|| "Server reported failure".to_string()),
            ))
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationMeta {
    pub current_page: u32,
    pub total_pages: u32,
    pub total_count: u64,
    pub per_page: u32,
}

impl PaginationMeta {
    /// Page after this one, or `None` at the end of the sequence
    pub fn next_page(&self) -> Option<u32> {
        if self.current_page < self.total_pages {
            Some(self.current_page + 1)
        } else {
            None
        }
    }

    pub fn single(count: usize) -> Self {
        Self {
            current_page: 1,
            total_pages: 1,
            total_count: count as u64,
            per_page: count as u32,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListMeta {
    #[serde(default)]
    pub pagination: Option<PaginationMeta>,
}

/// List response: `{success, data, meta:{pagination}}`
#[derive(Debug, Clone, Deserialize)]
pub struct ListEnvelope<T> {
    #[serde(default = "default_success")]
    pub success: bool,
    pub data: Vec<T>,
    #[serde(default)]
    pub meta: ListMeta,
    #[serde(default)]
    pub message: Option<String>,
}

impl<T> ListEnvelope<T> {
    pub fn into_page(self) -> Result<Page<T>, ApiError> {
        if !self.success {
            return Err(ApiError::Rejected(
                self.message
                    .unwrap_or_else(|| "Server reported failure".to_string()),
            ));
        }
        let pagination = self
            .meta
            .pagination
            .unwrap_or_else(|| PaginationMeta::single(self.data.len()));
        Ok(Page {
            items: self.data,
            pagination,
        })
    }
}

/// One page of a list resource
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub pagination: PaginationMeta,
}

impl<T> Page<T> {
    pub fn next_page(&self) -> Option<u32> {
        self.pagination.next_page()
    }
}
