use crate::local_storage::car::CarTable;
use crate::local_storage::driver::DriverTable;
use crate::local_storage::owner::OwnerTable;

/// Provides constants and utilities for working with
/// the "orders" (service acts) database table.
pub struct OrderTable;

impl OrderTable {
    /// The name of the database table
    pub const TABLE_NAME: &'static str = "orders";

    /// The column name for the act number.
    pub const COLUMN_ID: &'static str = "id";

    /// The column name for the revision letter appended to the act number.
    pub const COLUMN_PREFIX: &'static str = "prefix";

    /// The column name for the client company id.
    pub const COLUMN_COMPANY_ID: &'static str = "company_id";

    /// The column name for the serviced car id.
    pub const COLUMN_CAR_ID: &'static str = "car_id";

    /// The column name for the client's representative id.
    pub const COLUMN_DRIVER_ID: &'static str = "driver_id";

    /// The column name for the opening date.
    pub const COLUMN_START_DATE: &'static str = "start_date";

    /// The column name for the closing date (NULL while open).
    pub const COLUMN_FINISH_DATE: &'static str = "finish_date";

    /// The column name for the mileage at opening.
    pub const COLUMN_CAR_MILEAGE: &'static str = "car_mileage";

    /// The column name for the "first record of this act" flag.
    pub const COLUMN_FIRST_OPEN: &'static str = "first_open";

    /// The column name for the open/closed state.
    pub const COLUMN_OPENING_ORDER: &'static str = "opening_order";

    /// The column name for the path of the rendered act document.
    pub const COLUMN_DOCUMENT_PATH: &'static str = "document_path";

    /// SQL statement for creating the orders table with the defined schema.
    pub fn create_table() -> String {
        format!(
            "CREATE TABLE IF NOT EXISTS {table} (
                {id} INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL,
                {prefix} TEXT NOT NULL DEFAULT 'A',
                {company} INTEGER NOT NULL,
                {car} INTEGER NOT NULL,
                {driver} INTEGER,
                {start} TEXT NOT NULL,
                {finish} TEXT,
                {mileage} INTEGER NOT NULL DEFAULT 0,
                {first_open} INTEGER NOT NULL DEFAULT 1,
                {opening} INTEGER NOT NULL DEFAULT 1,
                {path} TEXT,
                FOREIGN KEY ({company}) REFERENCES {owners}({owner_id}) ON DELETE CASCADE ON UPDATE CASCADE,
                FOREIGN KEY ({car}) REFERENCES {cars}({car_id}) ON DELETE CASCADE ON UPDATE CASCADE,
                FOREIGN KEY ({driver}) REFERENCES {drivers}({driver_id}) ON DELETE CASCADE ON UPDATE CASCADE
            )",
            table = Self::TABLE_NAME,
            id = Self::COLUMN_ID,
            prefix = Self::COLUMN_PREFIX,
            company = Self::COLUMN_COMPANY_ID,
            car = Self::COLUMN_CAR_ID,
            driver = Self::COLUMN_DRIVER_ID,
            start = Self::COLUMN_START_DATE,
            finish = Self::COLUMN_FINISH_DATE,
            mileage = Self::COLUMN_CAR_MILEAGE,
            first_open = Self::COLUMN_FIRST_OPEN,
            opening = Self::COLUMN_OPENING_ORDER,
            path = Self::COLUMN_DOCUMENT_PATH,
            owners = OwnerTable::TABLE_NAME,
            owner_id = OwnerTable::COLUMN_ID,
            cars = CarTable::TABLE_NAME,
            car_id = CarTable::COLUMN_ID,
            drivers = DriverTable::TABLE_NAME,
            driver_id = DriverTable::COLUMN_ID
        )
    }
}
