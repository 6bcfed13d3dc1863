//! Perktrack application shell
//!
//! Wires the pure lifecycle engine in `perktrack_core` to a data
//! directory and a CLI: persistence of the card records (schema-validated
//! JSON with atomic writes), a YAML config file, rotating file logs, and
//! the named mutation entry points the commands drive.

pub mod app;
pub mod commands;
pub mod data;
pub mod logging;

pub use app::{App, AppError};
pub use commands::Command;
pub use data::{DataConfig, DataDirectory, StorageError};
pub use logging::init_logging;
