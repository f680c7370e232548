//! Storage layer for roster data.
//!
//! The [`Storage`] trait is the contract between the scheduling engine and
//! the persistence collaborator. Two backends ship with it: an in-memory
//! store for tests and embedding, and a JSON-file store used by the CLI.

mod json_store;
mod memory;
mod trait_;

pub use json_store::JsonStorage;
pub use memory::MemoryStorage;
pub use trait_::{Result, Storage, StorageError};
