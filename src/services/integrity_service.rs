use crate::error::{RegistryError, Result};
use crate::local_storage::car::CarLocalStorage;
use crate::local_storage::core_local_storage::CoreLocalStorage;
use crate::local_storage::driver::DriverLocalStorage;
use crate::local_storage::owner::{Owner, OwnerLocalStorage};
use rusqlite::Connection;
use std::sync::Arc;

/// A relationship that has to hold before a row may reference it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    /// The client company exists.
    Owner(i64),
    /// The car exists and is part of the client's fleet.
    Car { car_id: i64, owner_id: i64 },
    /// The representative exists and works for the client.
    Driver { driver_id: i64, owner_id: i64 },
}

/// Checks `presence` on the connection the guarded write will use,
/// so a check and its write see the same rows.
pub fn check_presence(conn: &Connection, presence: Presence) -> Result<()> {
    match presence {
        Presence::Owner(owner_id) => require_owner(conn, owner_id).map(|_| ()),
        Presence::Car { car_id, owner_id } => {
            let owner = require_owner(conn, owner_id)?;
            match CarLocalStorage::find_by_id(conn, car_id)? {
                None => Err(RegistryError::not_found(
                    "Car",
                    format!("client {} has no car with id {}", owner.company_name, car_id),
                )),
                Some(car) if car.company_id != owner.id => Err(RegistryError::Integrity(format!(
                    "car {} does not belong to client {}",
                    car.number, owner.company_name
                ))),
                Some(_) => Ok(()),
            }
        }
        Presence::Driver {
            driver_id,
            owner_id,
        } => {
            let owner = require_owner(conn, owner_id)?;
            match DriverLocalStorage::find_by_id(conn, driver_id)? {
                None => Err(RegistryError::not_found(
                    "Representative",
                    format!(
                        "client {} has no representative with id {}",
                        owner.company_name, driver_id
                    ),
                )),
                Some(driver) if driver.company_id != Some(owner.id) => {
                    Err(RegistryError::Integrity(format!(
                        "representative {} does not work for client {}",
                        driver.display_name(),
                        owner.company_name
                    )))
                }
                Some(_) => Ok(()),
            }
        }
    }
}

fn require_owner(conn: &Connection, owner_id: i64) -> Result<Owner> {
    OwnerLocalStorage::find_by_id(conn, owner_id)?
        .ok_or_else(|| RegistryError::not_found("Client", format!("no client with id {}", owner_id)))
}

/// Stand-alone entry point for callers that only want to ask.
pub struct IntegrityService {
    core_storage: Arc<CoreLocalStorage>,
}

impl IntegrityService {
    pub fn new(core_storage: Arc<CoreLocalStorage>) -> Self {
        IntegrityService { core_storage }
    }

    pub fn check_presence(&self, presence: Presence) -> Result<()> {
        let conn = self.core_storage.get_connection()?;
        check_presence(&conn, presence)
    }
}
