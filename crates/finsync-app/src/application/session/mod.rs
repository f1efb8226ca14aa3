mod error;
mod gateway;
mod store;


pub use error::AuthError;
#[cfg(test)]
pub use gateway::MockAuthGateway;
pub use gateway::{AuthGateway, HttpAuthGateway};
pub use store::{SessionNotice, SessionStore};
