//! Database layer for Lectern
//!
//! The article store is a trait so the routing layer never depends on a
//! concrete backend: MongoDB in production, an in-memory map in dev mode.

pub mod memory;
pub mod mongo;
pub mod schemas;
mod store;

pub use memory::MemoryArticleStore;
pub use mongo::{MongoArticleStore, MongoClient};
pub use schemas::{ArticleDoc, Comment};
pub use store::ArticleStore;
