//! Persistent key-value storage for serialized blobs.
//!
//! The session store and the auth session cache each keep one JSON document
//! under a named key. Backends only move strings; encoding is the caller's
//! concern.

pub mod file;
pub mod memory;

pub use file::FileKeyValueStore;
pub use memory::MemoryKeyValueStore;

use crate::error::ChatError;

/// Storage abstraction for named string blobs.
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`, or `None` if nothing is stored.
    fn get(&self, key: &str) -> Result<Option<String>, ChatError>;
    /// Replace the value stored under `key`.
    fn set(&self, key: &str, value: &str) -> Result<(), ChatError>;
    /// Remove `key`. Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<(), ChatError>;
}
