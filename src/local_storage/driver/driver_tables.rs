use crate::local_storage::owner::OwnerTable;

/// Provides constants and utilities for working with
/// the "drivers" database table.
pub struct DriverTable;

impl DriverTable {
    /// The name of the database table
    pub const TABLE_NAME: &'static str = "drivers";

    /// The column name for the primary key identifier of a representative.
    pub const COLUMN_ID: &'static str = "id";

    /// The column name for the first name.
    pub const COLUMN_NAME: &'static str = "name";

    /// The column name for the last name.
    pub const COLUMN_LASTNAME: &'static str = "lastname";

    /// The column name for the position inside the client company.
    pub const COLUMN_POSITION: &'static str = "position";

    /// The column name for the contact phone.
    pub const COLUMN_MOBILE_PHONE: &'static str = "mobile_phone";

    /// The column name for the owning company id.
    pub const COLUMN_COMPANY_ID: &'static str = "company_id";

    /// SQL statement for creating the drivers table with the defined schema.
    pub fn create_table() -> String {
        format!(
            "CREATE TABLE IF NOT EXISTS {} (
                {} INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL,
                {} TEXT,
                {} TEXT,
                {} TEXT,
                {} TEXT,
                {} INTEGER,
                FOREIGN KEY ({}) REFERENCES {}({}) ON DELETE CASCADE ON UPDATE CASCADE
            )",
            Self::TABLE_NAME,
            Self::COLUMN_ID,
            Self::COLUMN_NAME,
            Self::COLUMN_LASTNAME,
            Self::COLUMN_POSITION,
            Self::COLUMN_MOBILE_PHONE,
            Self::COLUMN_COMPANY_ID,
            Self::COLUMN_COMPANY_ID,
            OwnerTable::TABLE_NAME,
            OwnerTable::COLUMN_ID
        )
    }
}
