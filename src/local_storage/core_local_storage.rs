use crate::config::Config;
use crate::error::Result;
use crate::local_storage::attachment::AttachmentTable;
use crate::local_storage::car::CarTable;
use crate::local_storage::driver::DriverTable;
use crate::local_storage::order::OrderTable;
use crate::local_storage::owner::OwnerTable;
use rusqlite::{Connection, params};
#[cfg(test)]
use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

/// Owns the location of the SQLite file. Every logical operation
/// acquires its own connection through [`CoreLocalStorage::get_connection`]
/// and releases it when the connection is dropped.
#[derive(Debug, Clone)]
pub struct CoreLocalStorage {
    db_path: PathBuf,
    busy_timeout: Duration,
}

impl CoreLocalStorage {
    pub fn new(db_path: impl Into<PathBuf>) -> Self {
        CoreLocalStorage {
            db_path: db_path.into(),
            busy_timeout: Duration::from_secs(5),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        CoreLocalStorage {
            db_path: PathBuf::from(&config.database_path),
            busy_timeout: config.busy_timeout,
        }
    }

    #[cfg(test)]
    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    pub fn get_connection(&self) -> Result<Connection> {
        let conn = Connection::open(&self.db_path)?;
        conn.busy_timeout(self.busy_timeout)?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        Ok(conn)
    }

    /// Creates missing tables and seeds the attachment categories.
    pub fn initialize_schema(&self) -> Result<()> {
        let mut conn = self.get_connection()?;
        let tx = conn.transaction()?;

        tx.execute(&OwnerTable::create_table(), [])?;
        tx.execute(&DriverTable::create_table(), [])?;
        tx.execute(&AttachmentTable::create_table(), [])?;
        tx.execute(&CarTable::create_table(), [])?;
        tx.execute(&OrderTable::create_table(), [])?;

        for (code, name) in AttachmentTable::seed_values() {
            tx.execute(&AttachmentTable::seed_row(), params![code, name])?;
        }

        tx.commit()?;
        tracing::info!("Database schema initialized at {}", self.db_path.display());
        Ok(())
    }

    /// `table_name` must be one of the `*Table::TABLE_NAME` constants.
    pub fn delete_by_id(conn: &Connection, table_name: &str, id: i64) -> Result<usize> {
        let query = format!("DELETE FROM {} WHERE id = ?1", table_name);
        Ok(conn.execute(&query, params![id])?)
    }

    #[cfg(test)]
    pub fn count(&self, table_name: &str) -> Result<i64> {
        let conn = self.get_connection()?;
        let query = format!("SELECT COUNT(*) FROM {}", table_name);
        Ok(conn.query_row(&query, [], |row| row.get(0))?)
    }
}

/// Trims `value`, returning `None` when nothing is left.
pub fn non_empty(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    if trimmed.is_empty() { None } else { Some(trimmed) }
}

/// Upper-cases the first character and lower-cases the rest.
pub fn capitalize(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(|c| c.to_lowercase()))
            .collect(),
        None => String::new(),
    }
}
