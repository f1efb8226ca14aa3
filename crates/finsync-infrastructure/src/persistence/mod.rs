mod database;
mod kv_store;
mod memory_store;

pub use database::Database;
pub use kv_store::SqliteKeyValueStore;
pub use memory_store::MemoryKeyValueStore;
