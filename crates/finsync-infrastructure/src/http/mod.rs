pub mod client;
mod envelope;
mod error;
mod params;
mod token;

pub use client::{ApiClient, BinaryPayload, USER_AGENT};
pub use envelope::{Acknowledgement, ApiEnvelope, ListEnvelope, ListMeta, Page, PaginationMeta};
pub use error::{ApiError, ErrorBody, ErrorEntry, FieldError};
pub use params::QueryParams;
pub use token::AccessToken;
