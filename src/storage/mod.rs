mod keys;
mod kv;
mod schema;
mod types;

pub use keys::*;
pub use kv::{load_json, save_json, KeyValueStore, MemoryStore};
pub use schema::Database;
pub use types::DatabaseError;
