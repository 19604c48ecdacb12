use crate::local_storage::attachment::{Attachment, AttachmentTable};
use crate::local_storage::owner::OwnerTable;

/// Text stored in place of brand, model and chassis code for
/// records that describe spare parts rather than a vehicle.
pub const PARTS_PLACEHOLDER: &str = "Запчасти";

/// Provides constants and utilities for working with
/// the "cars" database table.
pub struct CarTable;

impl CarTable {
    /// The name of the database table
    pub const TABLE_NAME: &'static str = "cars";

    /// The column name for the primary key identifier of a car.
    pub const COLUMN_ID: &'static str = "id";

    /// The column name for the owning company id.
    pub const COLUMN_COMPANY_ID: &'static str = "company_id";

    /// The column name for the vehicle brand.
    pub const COLUMN_BRAND: &'static str = "brand";

    /// The column name for the vehicle model.
    pub const COLUMN_MODEL: &'static str = "model";

    /// The column name for the normalized plate number (unique).
    pub const COLUMN_NUMBER: &'static str = "number";

    /// The column name for the chassis code.
    pub const COLUMN_UZM_CODE: &'static str = "uzm_code";

    /// The column name for the manufacture year.
    pub const COLUMN_YEAR: &'static str = "year";

    /// The column name for the attachment category code.
    pub const COLUMN_ATTACHMENT: &'static str = "attachment";

    /// SQL statement for creating the cars table with the defined schema.
    pub fn create_table() -> String {
        format!(
            "CREATE TABLE IF NOT EXISTS {table} (
                {id} INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL,
                {company} INTEGER NOT NULL,
                {brand} TEXT NOT NULL DEFAULT '{placeholder}',
                {model} TEXT NOT NULL DEFAULT '{placeholder}',
                {number} TEXT NOT NULL UNIQUE,
                {uzm} TEXT,
                {year} INTEGER,
                {attachment} INTEGER NOT NULL DEFAULT {parts},
                FOREIGN KEY ({company}) REFERENCES {owners}({owner_id}) ON DELETE CASCADE ON UPDATE CASCADE,
                FOREIGN KEY ({attachment}) REFERENCES {attachments}({attachment_id})
            )",
            table = Self::TABLE_NAME,
            id = Self::COLUMN_ID,
            company = Self::COLUMN_COMPANY_ID,
            brand = Self::COLUMN_BRAND,
            model = Self::COLUMN_MODEL,
            number = Self::COLUMN_NUMBER,
            uzm = Self::COLUMN_UZM_CODE,
            year = Self::COLUMN_YEAR,
            attachment = Self::COLUMN_ATTACHMENT,
            placeholder = PARTS_PLACEHOLDER,
            parts = Attachment::SpareParts.code(),
            owners = OwnerTable::TABLE_NAME,
            owner_id = OwnerTable::COLUMN_ID,
            attachments = AttachmentTable::TABLE_NAME,
            attachment_id = AttachmentTable::COLUMN_ID
        )
    }
}
