/// Provides constants and utilities for working with
/// the "owners" database table.
pub struct OwnerTable;

impl OwnerTable {
    /// The name of the database table
    pub const TABLE_NAME: &'static str = "owners";

    /// The column name for the primary key identifier of a client company.
    pub const COLUMN_ID: &'static str = "id";

    /// The column name for the short company name.
    pub const COLUMN_COMPANY_NAME: &'static str = "company_name";

    /// The column name for the full legal company name.
    pub const COLUMN_COMPANY_FULL_NAME: &'static str = "company_full_name";

    /// The column name for the tax registration code (unique).
    pub const COLUMN_UNP_CODE: &'static str = "company_unp_code";

    /// The column name for the registered address.
    pub const COLUMN_ADDRESS: &'static str = "company_address";

    /// The column name for the contact phones.
    pub const COLUMN_PHONE: &'static str = "company_phone";

    /// Longest accepted short company name.
    pub const COMPANY_NAME_MAX_LEN: usize = 100;

    /// SQL statement for creating the owners table with the defined schema.
    pub fn create_table() -> String {
        format!(
            "CREATE TABLE IF NOT EXISTS {} (
                {} INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL,
                {} TEXT NOT NULL,
                {} TEXT NOT NULL,
                {} TEXT NOT NULL UNIQUE,
                {} TEXT,
                {} TEXT
            )",
            Self::TABLE_NAME,
            Self::COLUMN_ID,
            Self::COLUMN_COMPANY_NAME,
            Self::COLUMN_COMPANY_FULL_NAME,
            Self::COLUMN_UNP_CODE,
            Self::COLUMN_ADDRESS,
            Self::COLUMN_PHONE
        )
    }
}
