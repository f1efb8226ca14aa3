// Domain layer - Pure finance types and derived computations
// No dependencies on infrastructure or application layers

pub mod analytics;
pub mod category;
pub mod goal;
pub mod session;
pub mod shared;
pub mod storage;
pub mod transaction;

// Re-exports for convenience
pub use shared::{CategoryId, DomainError, GoalId, TransactionId};
