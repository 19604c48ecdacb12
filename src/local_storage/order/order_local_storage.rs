use crate::error::{RegistryError, Result};
use crate::local_storage::car::{Car, CarLocalStorage};
use crate::local_storage::core_local_storage::CoreLocalStorage;
use crate::local_storage::driver::{Driver, DriverLocalStorage};
use crate::local_storage::order::order_tables::OrderTable;
use crate::local_storage::owner::{Owner, OwnerLocalStorage};
use crate::services::integrity_service::{Presence, check_presence};
use chrono::{Local, NaiveDate};
use rusqlite::{Connection, OptionalExtension, Row, params};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

const FIRST_PREFIX: &str = "A";
const DATE_FORMAT: &str = "%d.%m.%Y";

/// A service act opened against one car of one client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub prefix: String,
    pub company_id: i64,
    pub car_id: i64,
    pub driver_id: Option<i64>,
    pub start_date: NaiveDate,
    pub finish_date: Option<NaiveDate>,
    pub car_mileage: i64,
    pub first_open: bool,
    pub opening_order: bool,
    pub document_path: Option<String>,
}

impl Order {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Order {
            id: row.get(OrderTable::COLUMN_ID)?,
            prefix: row.get(OrderTable::COLUMN_PREFIX)?,
            company_id: row.get(OrderTable::COLUMN_COMPANY_ID)?,
            car_id: row.get(OrderTable::COLUMN_CAR_ID)?,
            driver_id: row.get(OrderTable::COLUMN_DRIVER_ID)?,
            start_date: row.get(OrderTable::COLUMN_START_DATE)?,
            finish_date: row.get(OrderTable::COLUMN_FINISH_DATE)?,
            car_mileage: row.get(OrderTable::COLUMN_CAR_MILEAGE)?,
            first_open: row.get(OrderTable::COLUMN_FIRST_OPEN)?,
            opening_order: row.get(OrderTable::COLUMN_OPENING_ORDER)?,
            document_path: row.get(OrderTable::COLUMN_DOCUMENT_PATH)?,
        })
    }

    /// The number printed on documents, e.g. `17-B`.
    pub fn act_number(&self) -> String {
        format!("{}-{}", self.id, self.prefix)
    }

    pub fn status(&self) -> OrderStatus {
        if self.opening_order {
            OrderStatus::Open
        } else {
            OrderStatus::Closed
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OrderStatus {
    #[default]
    Open,
    Closed,
}

impl OrderStatus {
    pub fn is_open(self) -> bool {
        self == OrderStatus::Open
    }
}

/// Restricts an act listing to one client or one car.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderScope {
    Owner(i64),
    Car(i64),
}

/// Both the scope and the status apply.
#[derive(Debug, Clone, Copy, Default)]
pub struct OrderFilter {
    pub scope: Option<OrderScope>,
    pub status: OrderStatus,
}

/// Changes to an act. Without `order_id` a new act is opened instead.
///
/// `opening_order` is the state the act should be in afterwards: passing
/// `false` closes an open act, `true` reopens a closed one.
#[derive(Debug, Clone)]
pub struct OrderUpdate {
    pub order_id: Option<i64>,
    pub rollover_prefix: bool,
    pub company_id: Option<i64>,
    pub car_id: Option<i64>,
    pub driver_id: Option<i64>,
    pub start_date: Option<NaiveDate>,
    pub finish_date: Option<NaiveDate>,
    pub car_mileage: Option<i64>,
    pub opening_order: bool,
}

impl Default for OrderUpdate {
    fn default() -> Self {
        OrderUpdate {
            order_id: None,
            rollover_prefix: false,
            company_id: None,
            car_id: None,
            driver_id: None,
            start_date: None,
            finish_date: None,
            car_mileage: None,
            opening_order: true,
        }
    }
}

/// What was removed by [`OrderLocalStorage::delete_order`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeletedOrder {
    pub id: i64,
    pub prefix: String,
    pub start_date: NaiveDate,
    pub company_name: String,
}

impl fmt::Display for DeletedOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Deleted act №{}-{} from {}. Client: {}.",
            self.id,
            self.prefix,
            self.start_date.format(DATE_FORMAT),
            self.company_name
        )
    }
}

/// An act with everything the document renderer prints on it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActDocument {
    pub order: Order,
    pub owner: Owner,
    pub car: Car,
    pub driver: Option<Driver>,
}

impl ActDocument {
    pub fn templates(&self) -> &'static [&'static str] {
        self.car.attachment.document_templates()
    }

    /// Template context for the act documents.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "order_id": self.order.id,
            "order_number": self.order.act_number(),
            "prefix": self.order.prefix,
            "name": self.owner.company_name,
            "full_name": self.owner.company_full_name,
            "unp_code": self.owner.unp_code,
            "address": self.owner.company_address.clone().unwrap_or_default(),
            "phone": self.owner.company_phone.clone().unwrap_or_default(),
            "brand": self.car.brand,
            "model": self.car.model,
            "car_number": self.car.number,
            "mileage": self.order.car_mileage,
            "driver": self.driver.as_ref().map(Driver::display_name).unwrap_or_default(),
            "mphone": self
                .driver
                .as_ref()
                .and_then(|d| d.mobile_phone.clone())
                .unwrap_or_default(),
            "curdata": self.order.start_date.format(DATE_FORMAT).to_string(),
            "finish_date": self
                .order
                .finish_date
                .map(|d| d.format(DATE_FORMAT).to_string()),
            "templates": self.templates(),
        })
    }
}

/// Advances a revision letter: A, B, ..., Z. There is nothing after Z.
pub fn next_prefix(prefix: &str) -> Result<String> {
    let mut chars = prefix.chars();
    match (chars.next(), chars.next()) {
        (Some('Z'), None) => Err(RegistryError::Validation(
            "act prefix Z is the last revision letter".into(),
        )),
        (Some(letter), None) if letter.is_ascii_uppercase() => {
            Ok(char::from(letter as u8 + 1).to_string())
        }
        _ => Err(RegistryError::Validation(format!(
            "act prefix \"{}\" is not a single letter A-Z",
            prefix
        ))),
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn validate_mileage(mileage: i64) -> Result<i64> {
    if mileage < 0 {
        return Err(RegistryError::Validation(format!(
            "mileage {} must not be negative",
            mileage
        )));
    }
    Ok(mileage)
}

fn act_not_found(id: i64) -> RegistryError {
    RegistryError::not_found("Act", format!("act {} is not in the database", id))
}

pub struct OrderLocalStorage {
    core_storage: Arc<CoreLocalStorage>,
}

impl OrderLocalStorage {
    pub fn new(core_storage: Arc<CoreLocalStorage>) -> Self {
        OrderLocalStorage { core_storage }
    }

    pub fn find_by_id(conn: &Connection, id: i64) -> Result<Option<Order>> {
        let query = format!(
            "SELECT * FROM {} WHERE {} = ?1",
            OrderTable::TABLE_NAME,
            OrderTable::COLUMN_ID
        );
        Ok(conn.query_row(&query, params![id], Order::from_row).optional()?)
    }

    /// Opens a new act for a car of `company_id`.
    pub fn create_order(
        &self,
        company_id: i64,
        car_id: i64,
        driver_id: Option<i64>,
        car_mileage: Option<i64>,
    ) -> Result<Order> {
        let mut conn = self.core_storage.get_connection()?;
        let tx = conn.transaction()?;

        let id = Self::insert_order(&tx, company_id, car_id, driver_id, car_mileage)?;
        let order = Self::find_by_id(&tx, id)?.ok_or_else(|| act_not_found(id))?;
        tx.commit()?;

        tracing::debug!("Opened act {} for client {}", order.act_number(), company_id);
        Ok(order)
    }

    fn insert_order(
        conn: &Connection,
        company_id: i64,
        car_id: i64,
        driver_id: Option<i64>,
        car_mileage: Option<i64>,
    ) -> Result<i64> {
        check_presence(conn, Presence::Owner(company_id))?;
        check_presence(
            conn,
            Presence::Car {
                car_id,
                owner_id: company_id,
            },
        )?;
        if let Some(driver_id) = driver_id {
            check_presence(
                conn,
                Presence::Driver {
                    driver_id,
                    owner_id: company_id,
                },
            )?;
        }
        let car_mileage = validate_mileage(car_mileage.unwrap_or(0))?;

        let query = format!(
            "INSERT INTO {} ({}, {}, {}, {}, {}, {}, {}, {}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, 1, 1)",
            OrderTable::TABLE_NAME,
            OrderTable::COLUMN_PREFIX,
            OrderTable::COLUMN_COMPANY_ID,
            OrderTable::COLUMN_CAR_ID,
            OrderTable::COLUMN_DRIVER_ID,
            OrderTable::COLUMN_START_DATE,
            OrderTable::COLUMN_CAR_MILEAGE,
            OrderTable::COLUMN_FIRST_OPEN,
            OrderTable::COLUMN_OPENING_ORDER
        );
        conn.execute(
            &query,
            params![FIRST_PREFIX, company_id, car_id, driver_id, today(), car_mileage],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Acts in the requested state, optionally limited to a client or a car, by act number.
    pub fn get_orders(&self, filter: &OrderFilter) -> Result<Vec<Order>> {
        let conn = self.core_storage.get_connection()?;
        let (owner_id, car_id) = match filter.scope {
            Some(OrderScope::Owner(id)) => (Some(id), None),
            Some(OrderScope::Car(id)) => (None, Some(id)),
            None => (None, None),
        };

        let query = format!(
            "SELECT * FROM {table} WHERE {opening} = ?1
                AND (?2 IS NULL OR {company} = ?2)
                AND (?3 IS NULL OR {car} = ?3)
             ORDER BY {id}",
            table = OrderTable::TABLE_NAME,
            opening = OrderTable::COLUMN_OPENING_ORDER,
            company = OrderTable::COLUMN_COMPANY_ID,
            car = OrderTable::COLUMN_CAR_ID,
            id = OrderTable::COLUMN_ID
        );
        let mut stmt = conn.prepare(&query)?;
        let orders = stmt
            .query_map(
                params![filter.status.is_open(), owner_id, car_id],
                Order::from_row,
            )?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(orders)
    }

    /// Applies `update` in one transaction; any failed check leaves the act untouched.
    pub fn update_order(&self, update: &OrderUpdate) -> Result<Order> {
        let Some(order_id) = update.order_id else {
            let company_id = update
                .company_id
                .ok_or_else(|| RegistryError::Validation("a new act needs a client".into()))?;
            let car_id = update
                .car_id
                .ok_or_else(|| RegistryError::Validation("a new act needs a car".into()))?;
            return self.create_order(company_id, car_id, update.driver_id, update.car_mileage);
        };

        let mut conn = self.core_storage.get_connection()?;
        let tx = conn.transaction()?;

        let mut order = Self::find_by_id(&tx, order_id)?.ok_or_else(|| act_not_found(order_id))?;

        if update.rollover_prefix {
            order.prefix = next_prefix(&order.prefix)?;
            order.first_open = false;
        }

        let owner_id = update.company_id.unwrap_or(order.company_id);
        let car_id = update.car_id.unwrap_or(order.car_id);
        let driver_id = update.driver_id.or(order.driver_id);

        if let Some(company_id) = update.company_id {
            check_presence(&tx, Presence::Owner(company_id))?;
        }
        if update.company_id.is_some() || update.car_id.is_some() {
            check_presence(&tx, Presence::Car { car_id, owner_id })?;
        }
        if update.company_id.is_some() || update.driver_id.is_some() {
            if let Some(driver_id) = driver_id {
                check_presence(&tx, Presence::Driver { driver_id, owner_id })?;
            }
        }
        order.company_id = owner_id;
        order.car_id = car_id;
        order.driver_id = driver_id;

        if let Some(start_date) = update.start_date {
            order.start_date = start_date;
        }
        if let Some(car_mileage) = update.car_mileage {
            order.car_mileage = validate_mileage(car_mileage)?;
        }

        if !update.opening_order && order.opening_order {
            order.opening_order = false;
            order.finish_date = Some(today());
            tracing::debug!("Closing act {}", order.act_number());
        } else if update.opening_order && !order.opening_order {
            order.opening_order = true;
            order.finish_date = None;
            tracing::debug!("Reopening act {}", order.act_number());
        }

        if let Some(finish_date) = update.finish_date {
            if order.opening_order {
                return Err(RegistryError::Validation(format!(
                    "act {} is open and cannot have a closing date",
                    order.act_number()
                )));
            }
            order.finish_date = Some(finish_date);
        }

        Self::write_order(&tx, &order)?;
        tx.commit()?;
        Ok(order)
    }

    /// Records where the rendered act was saved; the act state is left alone.
    pub fn update_order_path(&self, order_id: i64, path: &str) -> Result<Order> {
        let mut conn = self.core_storage.get_connection()?;
        let tx = conn.transaction()?;

        let mut order = Self::find_by_id(&tx, order_id)?.ok_or_else(|| act_not_found(order_id))?;
        order.document_path = Some(path.trim().to_string()).filter(|p| !p.is_empty());
        Self::write_order(&tx, &order)?;
        tx.commit()?;
        Ok(order)
    }

    fn write_order(conn: &Connection, order: &Order) -> Result<()> {
        let query = format!(
            "UPDATE {} SET {} = ?1, {} = ?2, {} = ?3, {} = ?4, {} = ?5, {} = ?6, {} = ?7, {} = ?8, {} = ?9, {} = ?10
             WHERE {} = ?11",
            OrderTable::TABLE_NAME,
            OrderTable::COLUMN_PREFIX,
            OrderTable::COLUMN_COMPANY_ID,
            OrderTable::COLUMN_CAR_ID,
            OrderTable::COLUMN_DRIVER_ID,
            OrderTable::COLUMN_START_DATE,
            OrderTable::COLUMN_FINISH_DATE,
            OrderTable::COLUMN_CAR_MILEAGE,
            OrderTable::COLUMN_FIRST_OPEN,
            OrderTable::COLUMN_OPENING_ORDER,
            OrderTable::COLUMN_DOCUMENT_PATH,
            OrderTable::COLUMN_ID
        );
        conn.execute(
            &query,
            params![
                order.prefix,
                order.company_id,
                order.car_id,
                order.driver_id,
                order.start_date,
                order.finish_date,
                order.car_mileage,
                order.first_open,
                order.opening_order,
                order.document_path,
                order.id
            ],
        )?;
        Ok(())
    }

    /// Loads an act together with its client, car and representative.
    pub fn get_act(&self, order_id: i64) -> Result<ActDocument> {
        let conn = self.core_storage.get_connection()?;

        let order = Self::find_by_id(&conn, order_id)?.ok_or_else(|| act_not_found(order_id))?;
        let owner = OwnerLocalStorage::find_by_id(&conn, order.company_id)?.ok_or_else(|| {
            RegistryError::not_found("Client", format!("no client with id {}", order.company_id))
        })?;
        let car = CarLocalStorage::find_by_id(&conn, order.car_id)?.ok_or_else(|| {
            RegistryError::not_found("Car", format!("no car with id {}", order.car_id))
        })?;
        let driver = match order.driver_id {
            Some(driver_id) => DriverLocalStorage::find_by_id(&conn, driver_id)?,
            None => None,
        };

        Ok(ActDocument {
            order,
            owner,
            car,
            driver,
        })
    }

    pub fn delete_order(&self, order_id: i64) -> Result<DeletedOrder> {
        let mut conn = self.core_storage.get_connection()?;
        let tx = conn.transaction()?;

        let order = Self::find_by_id(&tx, order_id)?.ok_or_else(|| act_not_found(order_id))?;
        let company_name = OwnerLocalStorage::find_by_id(&tx, order.company_id)?
            .map(|owner| owner.company_name)
            .unwrap_or_default();

        CoreLocalStorage::delete_by_id(&tx, OrderTable::TABLE_NAME, order.id)?;
        tx.commit()?;

        Ok(DeletedOrder {
            id: order.id,
            prefix: order.prefix,
            start_date: order.start_date,
            company_name,
        })
    }
}
