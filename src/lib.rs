pub mod api;
pub mod cache;
pub mod catalog;
pub mod config;
pub mod error;
pub mod evolution;
pub mod pokemon;
pub mod routes;
pub mod storage;
pub mod store;

#[cfg(test)]
mod testing;

pub use api::{CatalogSource, PokeApi};
pub use cache::*;
pub use config::*;
pub use error::*;
pub use pokemon::*;
pub use storage::{FileStore, KeyValueStore, MemoryStore};
pub use store::{CatalogState, CatalogStore, LoadOutcome};
