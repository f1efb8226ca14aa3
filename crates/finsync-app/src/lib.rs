// Application layer - Session lifecycle, query cache and resource services
// Depends on domain and infrastructure layers

pub mod application;
pub mod presentation;

pub use application::cache::{QueryCache, QueryError, QueryKey, QueryOptions, QueryResult, QueryState};
pub use presentation::bootstrap::init_logging;
pub use presentation::state::{ClientParts, FinanceClient, Services};
