//! Durable key-value storage used to persist the client session.
//!
//! The session layer only needs `get`/`set`/`remove` on string keys, the same
//! surface a browser's local storage offers. Two backends are provided:
//! [`MemoryStorage`] for tests and embedding, and [`FileStorage`] which keeps
//! the entries in a JSON file under the client config directory.

mod file;
mod memory;

pub use file::{default_config_dir, FileStorage};
pub use memory::MemoryStorage;

use std::sync::Arc;

use thiserror::Error;

/// Key holding the session token issued by the login flow.
pub const TOKEN_KEY: &str = "token";

/// Key holding the serialized user record.
pub const USER_KEY: &str = "user";

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage file is corrupt: {0}")]
    Corrupt(String),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

pub trait DurableStorage: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

impl<T: DurableStorage + ?Sized> DurableStorage for Arc<T> {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        (**self).remove(key)
    }
}
