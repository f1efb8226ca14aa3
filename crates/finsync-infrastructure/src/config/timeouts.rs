use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Network timeouts for the API client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeoutConfig {
    /// Whole-request timeout, body included
    pub http_request: Duration,

    /// TCP/TLS connect timeout
    pub connect: Duration,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            http_request: Duration::from_secs(30),
            connect: Duration::from_secs(10),
        }
    }
}
