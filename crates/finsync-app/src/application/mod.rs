pub mod cache;
pub mod dtos;
pub mod services;
pub mod session;
