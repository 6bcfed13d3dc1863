//! Persistence layer: data directory, config file, card records.

mod storage;

pub use storage::{DataConfig, DataDirectory, StorageError};
