//! Storage layer abstraction.
//!
//! The host environment provides a durable key-value store. This module
//! defines that contract ([`KeyValueStore`]), ships two implementations
//! (filesystem and in-memory) and wraps them in [`StateStore`], the single
//! typed entry point for all persisted state.

pub mod persistence;
mod state;
pub mod traits;

pub use persistence::{FilesystemStore, MemoryStore};
pub use state::{StateStore, keys};
pub use traits::KeyValueStore;
