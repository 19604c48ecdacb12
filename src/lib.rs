pub mod config;
pub mod error;
pub mod handlers;
pub mod local_storage;
pub mod services;

#[cfg(test)]
mod test;

use local_storage::CoreLocalStorage;
use std::path::PathBuf;

/// Creates the registry tables in the SQLite file at `db_path`.
pub fn initialize_database(db_path: impl Into<PathBuf>) -> error::Result<()> {
    CoreLocalStorage::new(db_path).initialize_schema()
}
