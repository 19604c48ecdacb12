use crate::error::{RegistryError, Result};
use crate::local_storage::core_local_storage::{CoreLocalStorage, capitalize, non_empty};
use crate::local_storage::driver::driver_tables::DriverTable;
use crate::services::integrity_service::{Presence, check_presence};
use rusqlite::{Connection, OptionalExtension, Row, params};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A representative of a client company.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Driver {
    pub id: i64,
    pub name: Option<String>,
    pub lastname: Option<String>,
    pub position: Option<String>,
    pub mobile_phone: Option<String>,
    pub company_id: Option<i64>,
}

impl Driver {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Driver {
            id: row.get(DriverTable::COLUMN_ID)?,
            name: row.get(DriverTable::COLUMN_NAME)?,
            lastname: row.get(DriverTable::COLUMN_LASTNAME)?,
            position: row.get(DriverTable::COLUMN_POSITION)?,
            mobile_phone: row.get(DriverTable::COLUMN_MOBILE_PHONE)?,
            company_id: row.get(DriverTable::COLUMN_COMPANY_ID)?,
        })
    }

    /// "Name Lastname", or the id when neither is known.
    pub fn display_name(&self) -> String {
        let parts: Vec<&str> = [self.name.as_deref(), self.lastname.as_deref()]
            .into_iter()
            .flatten()
            .collect();
        if parts.is_empty() {
            format!("#{}", self.id)
        } else {
            parts.join(" ")
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DriverForm {
    pub name: String,
    pub lastname: String,
    pub position: String,
    pub mobile_phone: String,
}

pub struct DriverLocalStorage {
    core_storage: Arc<CoreLocalStorage>,
}

impl DriverLocalStorage {
    pub fn new(core_storage: Arc<CoreLocalStorage>) -> Self {
        DriverLocalStorage { core_storage }
    }

    pub fn find_by_id(conn: &Connection, id: i64) -> Result<Option<Driver>> {
        let query = format!(
            "SELECT * FROM {} WHERE {} = ?1",
            DriverTable::TABLE_NAME,
            DriverTable::COLUMN_ID
        );
        Ok(conn.query_row(&query, params![id], Driver::from_row).optional()?)
    }

    /// Every representative, or only those of `owner_id`, sorted by name.
    pub fn get_drivers(&self, owner_id: Option<i64>) -> Result<Vec<Driver>> {
        let conn = self.core_storage.get_connection()?;
        if let Some(owner_id) = owner_id {
            check_presence(&conn, Presence::Owner(owner_id))?;
        }

        let query = format!(
            "SELECT * FROM {table} WHERE (?1 IS NULL OR {company} = ?1) ORDER BY {name}, {lastname}, {id}",
            table = DriverTable::TABLE_NAME,
            company = DriverTable::COLUMN_COMPANY_ID,
            name = DriverTable::COLUMN_NAME,
            lastname = DriverTable::COLUMN_LASTNAME,
            id = DriverTable::COLUMN_ID
        );
        let mut stmt = conn.prepare(&query)?;
        let drivers = stmt
            .query_map(params![owner_id], Driver::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(drivers)
    }

    /// Adds a representative to `company_id`, or with `driver_id` overwrites
    /// the supplied fields of one already working for it.
    pub fn save_driver(&self, company_id: i64, form: &DriverForm, driver_id: Option<i64>) -> Result<Driver> {
        let mut conn = self.core_storage.get_connection()?;
        let tx = conn.transaction()?;

        check_presence(&tx, Presence::Owner(company_id))?;
        let id = match driver_id {
            Some(id) => {
                check_presence(
                    &tx,
                    Presence::Driver {
                        driver_id: id,
                        owner_id: company_id,
                    },
                )?;
                Self::update_driver(&tx, id, form)?;
                id
            }
            None => Self::insert_driver(&tx, company_id, form)?,
        };

        let driver = Self::find_by_id(&tx, id)?.ok_or_else(|| {
            RegistryError::not_found("Representative", format!("no representative with id {}", id))
        })?;
        tx.commit()?;

        tracing::debug!("Saved representative {} of client {}", driver.id, company_id);
        Ok(driver)
    }

    fn insert_driver(conn: &Connection, company_id: i64, form: &DriverForm) -> Result<i64> {
        let query = format!(
            "INSERT INTO {} ({}, {}, {}, {}, {}) VALUES (?1, ?2, ?3, ?4, ?5)",
            DriverTable::TABLE_NAME,
            DriverTable::COLUMN_NAME,
            DriverTable::COLUMN_LASTNAME,
            DriverTable::COLUMN_POSITION,
            DriverTable::COLUMN_MOBILE_PHONE,
            DriverTable::COLUMN_COMPANY_ID
        );
        conn.execute(
            &query,
            params![
                non_empty(&form.name).map(capitalize),
                non_empty(&form.lastname).map(capitalize),
                non_empty(&form.position).map(capitalize),
                non_empty(&form.mobile_phone),
                company_id
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    fn update_driver(conn: &Connection, id: i64, form: &DriverForm) -> Result<()> {
        let mut driver = Self::find_by_id(conn, id)?.ok_or_else(|| {
            RegistryError::not_found("Representative", format!("no representative with id {}", id))
        })?;

        if let Some(name) = non_empty(&form.name) {
            driver.name = Some(capitalize(name));
        }
        if let Some(lastname) = non_empty(&form.lastname) {
            driver.lastname = Some(capitalize(lastname));
        }
        if let Some(position) = non_empty(&form.position) {
            driver.position = Some(capitalize(position));
        }
        if let Some(phone) = non_empty(&form.mobile_phone) {
            driver.mobile_phone = Some(phone.to_string());
        }

        let query = format!(
            "UPDATE {} SET {} = ?1, {} = ?2, {} = ?3, {} = ?4 WHERE {} = ?5",
            DriverTable::TABLE_NAME,
            DriverTable::COLUMN_NAME,
            DriverTable::COLUMN_LASTNAME,
            DriverTable::COLUMN_POSITION,
            DriverTable::COLUMN_MOBILE_PHONE,
            DriverTable::COLUMN_ID
        );
        conn.execute(
            &query,
            params![driver.name, driver.lastname, driver.position, driver.mobile_phone, id],
        )?;
        Ok(())
    }
}
