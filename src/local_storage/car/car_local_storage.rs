use crate::error::{RegistryError, Result};
use crate::local_storage::attachment::Attachment;
use crate::local_storage::car::car_tables::{CarTable, PARTS_PLACEHOLDER};
use crate::local_storage::core_local_storage::{CoreLocalStorage, non_empty};
use crate::services::integrity_service::{Presence, check_presence};
use crate::services::plate_service::normalize_plate;
use rusqlite::{Connection, OptionalExtension, Row, params};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A vehicle, a trailer or a spare-parts placeholder owned by a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Car {
    pub id: i64,
    pub company_id: i64,
    pub brand: String,
    pub model: String,
    pub number: String,
    pub uzm_code: Option<String>,
    pub year: Option<i32>,
    pub attachment: Attachment,
}

impl Car {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Car {
            id: row.get(CarTable::COLUMN_ID)?,
            company_id: row.get(CarTable::COLUMN_COMPANY_ID)?,
            brand: row.get(CarTable::COLUMN_BRAND)?,
            model: row.get(CarTable::COLUMN_MODEL)?,
            number: row.get(CarTable::COLUMN_NUMBER)?,
            uzm_code: row.get(CarTable::COLUMN_UZM_CODE)?,
            year: row.get(CarTable::COLUMN_YEAR)?,
            attachment: row.get(CarTable::COLUMN_ATTACHMENT)?,
        })
    }
}

/// Values entered for a car. Blank fields and a missing attachment count as not supplied.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CarForm {
    pub brand: String,
    pub model: String,
    pub number: String,
    pub uzm_code: String,
    pub year: String,
    pub attachment: Option<Attachment>,
}

pub struct CarLocalStorage {
    core_storage: Arc<CoreLocalStorage>,
}

impl CarLocalStorage {
    pub fn new(core_storage: Arc<CoreLocalStorage>) -> Self {
        CarLocalStorage { core_storage }
    }

    pub fn find_by_id(conn: &Connection, id: i64) -> Result<Option<Car>> {
        let query = format!(
            "SELECT * FROM {} WHERE {} = ?1",
            CarTable::TABLE_NAME,
            CarTable::COLUMN_ID
        );
        Ok(conn.query_row(&query, params![id], Car::from_row).optional()?)
    }

    fn find_by_number(conn: &Connection, number: &str) -> Result<Option<Car>> {
        let query = format!(
            "SELECT * FROM {} WHERE {} = ?1",
            CarTable::TABLE_NAME,
            CarTable::COLUMN_NUMBER
        );
        Ok(conn.query_row(&query, params![number], Car::from_row).optional()?)
    }

    /// Every car, or the fleet of `owner_id`, sorted by plate number.
    pub fn get_cars(&self, owner_id: Option<i64>) -> Result<Vec<Car>> {
        let conn = self.core_storage.get_connection()?;
        if let Some(owner_id) = owner_id {
            check_presence(&conn, Presence::Owner(owner_id))?;
        }

        let query = format!(
            "SELECT * FROM {table} WHERE (?1 IS NULL OR {company} = ?1) ORDER BY {number}",
            table = CarTable::TABLE_NAME,
            company = CarTable::COLUMN_COMPANY_ID,
            number = CarTable::COLUMN_NUMBER
        );
        let mut stmt = conn.prepare(&query)?;
        let cars = stmt
            .query_map(params![owner_id], Car::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(cars)
    }

    /// Looks a car up by plate. Input that does not normalize (spare-parts
    /// labels, for one) is matched as typed.
    pub fn get_car(&self, plate: &str) -> Result<Car> {
        let conn = self.core_storage.get_connection()?;
        let number = normalize_plate(plate, None, None).unwrap_or_else(|err| {
            tracing::debug!("Looking up \"{}\" verbatim: {}", plate, err);
            plate.trim().to_string()
        });
        Self::find_by_number(&conn, &number)?
            .ok_or_else(|| RegistryError::not_found("Car", format!("no car with number {}", number)))
    }

    /// Registers a car for `company_id`, or with `car_id` overwrites the
    /// supplied fields of a car in that client's fleet.
    pub fn save_car(&self, company_id: i64, form: &CarForm, car_id: Option<i64>) -> Result<Car> {
        let mut conn = self.core_storage.get_connection()?;
        let tx = conn.transaction()?;

        check_presence(&tx, Presence::Owner(company_id))?;
        let id = match car_id {
            Some(id) => {
                check_presence(
                    &tx,
                    Presence::Car {
                        car_id: id,
                        owner_id: company_id,
                    },
                )?;
                Self::update_car(&tx, id, form)?;
                id
            }
            None => Self::insert_car(&tx, company_id, form)?,
        };

        let car = Self::find_by_id(&tx, id)?
            .ok_or_else(|| RegistryError::not_found("Car", format!("no car with id {}", id)))?;
        tx.commit()?;

        tracing::debug!("Saved car {} ({}) of client {}", car.id, car.number, company_id);
        Ok(car)
    }

    fn insert_car(conn: &Connection, company_id: i64, form: &CarForm) -> Result<i64> {
        let attachment = form.attachment.unwrap_or_default();
        let year = parse_year(&form.year)?;
        // only parts records fall back to the placeholder text
        let placeholder = |value: &str| match non_empty(value) {
            Some(text) => text.to_string(),
            None if attachment == Attachment::SpareParts => PARTS_PLACEHOLDER.to_string(),
            None => String::new(),
        };
        let uzm_code = match non_empty(&form.uzm_code) {
            Some(code) => Some(code.to_string()),
            None if attachment == Attachment::SpareParts => Some(PARTS_PLACEHOLDER.to_string()),
            None => None,
        };

        // parts labels embed the row id, so they get a provisional number first
        let number = match attachment {
            Attachment::SpareParts => format!("{}:{}", PARTS_PLACEHOLDER, company_id),
            _ => {
                let raw = non_empty(&form.number).ok_or_else(|| {
                    RegistryError::Validation("plate number is required for vehicles and trailers".into())
                })?;
                let number = normalize_plate(raw, None, Some(attachment))?;
                Self::ensure_number_is_free(conn, &number, None)?;
                number
            }
        };

        let query = format!(
            "INSERT INTO {} ({}, {}, {}, {}, {}, {}, {}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            CarTable::TABLE_NAME,
            CarTable::COLUMN_COMPANY_ID,
            CarTable::COLUMN_BRAND,
            CarTable::COLUMN_MODEL,
            CarTable::COLUMN_NUMBER,
            CarTable::COLUMN_UZM_CODE,
            CarTable::COLUMN_YEAR,
            CarTable::COLUMN_ATTACHMENT
        );
        conn.execute(
            &query,
            params![
                company_id,
                placeholder(&form.brand),
                placeholder(&form.model),
                number,
                uzm_code,
                year,
                attachment
            ],
        )?;
        let id = conn.last_insert_rowid();

        if attachment == Attachment::SpareParts {
            let label = normalize_plate(&form.number, Some(id), Some(attachment))?;
            Self::write_number(conn, id, &label)?;
        }

        Ok(id)
    }

    fn update_car(conn: &Connection, id: i64, form: &CarForm) -> Result<()> {
        let mut car = Self::find_by_id(conn, id)?
            .ok_or_else(|| RegistryError::not_found("Car", format!("no car with id {}", id)))?;

        if let Some(brand) = non_empty(&form.brand) {
            car.brand = brand.to_string();
        }
        if let Some(model) = non_empty(&form.model) {
            car.model = model.to_string();
        }
        if let Some(uzm_code) = non_empty(&form.uzm_code) {
            car.uzm_code = Some(uzm_code.to_string());
        }
        if let Some(year) = parse_year(&form.year)? {
            car.year = Some(year);
        }
        let was_parts = car.attachment == Attachment::SpareParts;
        if let Some(attachment) = form.attachment {
            car.attachment = attachment;
        }
        match non_empty(&form.number) {
            Some(raw) => {
                let number = normalize_plate(raw, Some(id), Some(car.attachment))?;
                Self::ensure_number_is_free(conn, &number, Some(id))?;
                car.number = number;
            }
            None if was_parts && car.attachment != Attachment::SpareParts => {
                return Err(RegistryError::Validation(
                    "plate number is required when a spare-parts record becomes a vehicle".into(),
                ));
            }
            None if !was_parts && car.attachment == Attachment::SpareParts => {
                let label = normalize_plate("", Some(id), Some(Attachment::SpareParts))?;
                Self::ensure_number_is_free(conn, &label, Some(id))?;
                car.number = label;
            }
            None => {}
        }

        let query = format!(
            "UPDATE {} SET {} = ?1, {} = ?2, {} = ?3, {} = ?4, {} = ?5, {} = ?6 WHERE {} = ?7",
            CarTable::TABLE_NAME,
            CarTable::COLUMN_BRAND,
            CarTable::COLUMN_MODEL,
            CarTable::COLUMN_NUMBER,
            CarTable::COLUMN_UZM_CODE,
            CarTable::COLUMN_YEAR,
            CarTable::COLUMN_ATTACHMENT,
            CarTable::COLUMN_ID
        );
        conn.execute(
            &query,
            params![car.brand, car.model, car.number, car.uzm_code, car.year, car.attachment, id],
        )?;
        Ok(())
    }

    fn write_number(conn: &Connection, id: i64, number: &str) -> Result<()> {
        Self::ensure_number_is_free(conn, number, Some(id))?;
        let query = format!(
            "UPDATE {} SET {} = ?1 WHERE {} = ?2",
            CarTable::TABLE_NAME,
            CarTable::COLUMN_NUMBER,
            CarTable::COLUMN_ID
        );
        conn.execute(&query, params![number, id])?;
        Ok(())
    }

    fn ensure_number_is_free(conn: &Connection, number: &str, car_id: Option<i64>) -> Result<()> {
        match Self::find_by_number(conn, number)? {
            Some(existing) if Some(existing.id) != car_id => Err(RegistryError::Integrity(format!(
                "plate number {} is already registered to car {}",
                number, existing.id
            ))),
            _ => Ok(()),
        }
    }
}

fn parse_year(value: &str) -> Result<Option<i32>> {
    match non_empty(value) {
        None => Ok(None),
        Some(text) => match text.parse::<i32>() {
            Ok(year) if year > 0 => Ok(Some(year)),
            _ => Err(RegistryError::Validation(format!(
                "manufacture year \"{}\" is not a valid year",
                text
            ))),
        },
    }
}
