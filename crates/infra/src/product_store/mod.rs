//! Durable product storage boundary.
//!
//! The catalog only talks to [`ProductStore`]; which backend sits behind it is a
//! startup decision.

pub mod in_memory;
pub mod postgres;
pub mod r#trait;

pub use in_memory::InMemoryProductStore;
pub use postgres::PostgresProductStore;
pub use r#trait::{ProductStore, StoreError};
