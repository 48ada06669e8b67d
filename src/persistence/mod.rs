//! Durable recording of shape points and chat messages.
//!
//! The [`PersistenceWriter`] turns one client operation into one batch of rows
//! and submits it to a [`StorageBackend`] inside a retried transaction.

pub mod backend;
pub mod error;
pub mod memory;
pub mod retry;
pub mod writer;

pub use backend::*;
pub use error::*;
pub use memory::MemoryStore;
pub use retry::RetryPolicy;
pub use writer::PersistenceWriter;
