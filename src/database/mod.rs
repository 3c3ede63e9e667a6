pub mod manager;
pub mod memory;
pub mod models;
pub mod postgres;
pub mod store;

pub use manager::{DatabaseError, DatabaseManager, StoreResult};
pub use memory::MemoryStore;
pub use postgres::PgStore;
pub use store::{CascadeStep, Store};
