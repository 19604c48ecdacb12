use crate::local_storage::attachment::Attachment;

/// Provides constants and utilities for working with
/// the "attachment" lookup table.
pub struct AttachmentTable;

impl AttachmentTable {
    /// The name of the database table
    pub const TABLE_NAME: &'static str = "attachment";

    /// The column name for the category code.
    pub const COLUMN_ID: &'static str = "id";

    /// The column name for the category name.
    pub const COLUMN_NAME: &'static str = "name";

    /// SQL statement for creating the attachment table with the defined schema.
    pub fn create_table() -> String {
        format!(
            "CREATE TABLE IF NOT EXISTS {} (
                {} INTEGER PRIMARY KEY NOT NULL,
                {} TEXT NOT NULL UNIQUE
            )",
            Self::TABLE_NAME,
            Self::COLUMN_ID,
            Self::COLUMN_NAME
        )
    }

    /// SQL statement seeding one row; bind the code and the name.
    pub fn seed_row() -> String {
        format!(
            "INSERT OR IGNORE INTO {} ({}, {}) VALUES (?1, ?2)",
            Self::TABLE_NAME,
            Self::COLUMN_ID,
            Self::COLUMN_NAME
        )
    }

    pub fn seed_values() -> [(i64, &'static str); 3] {
        Attachment::ALL.map(|attachment| (attachment.code(), attachment.name()))
    }
}
