use crate::error::{RegistryError, Result};
use crate::local_storage::core_local_storage::{CoreLocalStorage, non_empty};
use crate::local_storage::owner::owner_tables::OwnerTable;
use crate::services::integrity_service::{Presence, check_presence};
use rusqlite::{Connection, OptionalExtension, Row, params};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A client company.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Owner {
    pub id: i64,
    pub company_name: String,
    pub company_full_name: String,
    pub unp_code: String,
    pub company_address: Option<String>,
    pub company_phone: Option<String>,
}

impl Owner {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Owner {
            id: row.get(OwnerTable::COLUMN_ID)?,
            company_name: row.get(OwnerTable::COLUMN_COMPANY_NAME)?,
            company_full_name: row.get(OwnerTable::COLUMN_COMPANY_FULL_NAME)?,
            unp_code: row.get(OwnerTable::COLUMN_UNP_CODE)?,
            company_address: row.get(OwnerTable::COLUMN_ADDRESS)?,
            company_phone: row.get(OwnerTable::COLUMN_PHONE)?,
        })
    }
}

/// Values entered for a client company. Blank fields count as not supplied.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OwnerForm {
    pub company_name: String,
    pub company_full_name: String,
    pub unp_code: String,
    pub company_address: String,
    pub company_phone: String,
}

/// How a single client is looked up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OwnerKey {
    Id(i64),
    Name(String),
}

impl From<i64> for OwnerKey {
    fn from(id: i64) -> Self {
        OwnerKey::Id(id)
    }
}

impl From<&str> for OwnerKey {
    fn from(name: &str) -> Self {
        OwnerKey::Name(name.to_string())
    }
}

impl From<String> for OwnerKey {
    fn from(name: String) -> Self {
        OwnerKey::Name(name)
    }
}

pub struct OwnerLocalStorage {
    core_storage: Arc<CoreLocalStorage>,
}

impl OwnerLocalStorage {
    pub fn new(core_storage: Arc<CoreLocalStorage>) -> Self {
        OwnerLocalStorage { core_storage }
    }

    pub fn find_by_id(conn: &Connection, id: i64) -> Result<Option<Owner>> {
        let query = format!(
            "SELECT * FROM {} WHERE {} = ?1",
            OwnerTable::TABLE_NAME,
            OwnerTable::COLUMN_ID
        );
        Ok(conn.query_row(&query, params![id], Owner::from_row).optional()?)
    }

    fn find_by_name(conn: &Connection, name: &str) -> Result<Option<Owner>> {
        let query = format!(
            "SELECT * FROM {} WHERE {} = ?1 ORDER BY {} LIMIT 1",
            OwnerTable::TABLE_NAME,
            OwnerTable::COLUMN_COMPANY_NAME,
            OwnerTable::COLUMN_ID
        );
        Ok(conn
            .query_row(&query, params![name.trim()], Owner::from_row)
            .optional()?)
    }

    fn find_id_by_unp(conn: &Connection, unp_code: &str) -> Result<Option<i64>> {
        let query = format!(
            "SELECT {} FROM {} WHERE {} = ?1",
            OwnerTable::COLUMN_ID,
            OwnerTable::TABLE_NAME,
            OwnerTable::COLUMN_UNP_CODE
        );
        Ok(conn
            .query_row(&query, params![unp_code], |row| row.get(0))
            .optional()?)
    }

    /// All clients, sorted by short name.
    pub fn get_owners(&self) -> Result<Vec<Owner>> {
        let conn = self.core_storage.get_connection()?;
        let query = format!(
            "SELECT * FROM {} ORDER BY {}, {}",
            OwnerTable::TABLE_NAME,
            OwnerTable::COLUMN_COMPANY_NAME,
            OwnerTable::COLUMN_ID
        );
        let mut stmt = conn.prepare(&query)?;
        let owners = stmt
            .query_map([], Owner::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(owners)
    }

    pub fn get_owner(&self, key: &OwnerKey) -> Result<Owner> {
        let conn = self.core_storage.get_connection()?;
        match key {
            OwnerKey::Id(id) => Self::find_by_id(&conn, *id)?
                .ok_or_else(|| RegistryError::not_found("Client", format!("no client with id {}", id))),
            OwnerKey::Name(name) => Self::find_by_name(&conn, name)?
                .ok_or_else(|| RegistryError::not_found("Client", format!("no client named {}", name))),
        }
    }

    /// Registers a client, or with `owner_id` overwrites the supplied fields of an existing one.
    pub fn save_owner(&self, form: &OwnerForm, owner_id: Option<i64>) -> Result<Owner> {
        let mut conn = self.core_storage.get_connection()?;
        let tx = conn.transaction()?;

        let id = match owner_id {
            Some(id) => {
                check_presence(&tx, Presence::Owner(id))?;
                Self::update_owner(&tx, id, form)?;
                id
            }
            None => Self::insert_owner(&tx, form)?,
        };

        let owner = Self::find_by_id(&tx, id)?
            .ok_or_else(|| RegistryError::not_found("Client", format!("no client with id {}", id)))?;
        tx.commit()?;

        tracing::debug!("Saved client {} ({})", owner.id, owner.company_name);
        Ok(owner)
    }

    fn insert_owner(conn: &Connection, form: &OwnerForm) -> Result<i64> {
        let company_name = validate_company_name(&form.company_name)?;
        let company_full_name = non_empty(&form.company_full_name)
            .map(switch_quotes)
            .ok_or_else(|| RegistryError::Validation("full company name is required".into()))?;
        let unp_code = validate_unp_code(&form.unp_code)?;
        Self::ensure_unp_is_free(conn, &unp_code, None)?;

        let query = format!(
            "INSERT INTO {} ({}, {}, {}, {}, {}) VALUES (?1, ?2, ?3, ?4, ?5)",
            OwnerTable::TABLE_NAME,
            OwnerTable::COLUMN_COMPANY_NAME,
            OwnerTable::COLUMN_COMPANY_FULL_NAME,
            OwnerTable::COLUMN_UNP_CODE,
            OwnerTable::COLUMN_ADDRESS,
            OwnerTable::COLUMN_PHONE
        );
        conn.execute(
            &query,
            params![
                company_name,
                company_full_name,
                unp_code,
                non_empty(&form.company_address),
                non_empty(&form.company_phone)
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    fn update_owner(conn: &Connection, id: i64, form: &OwnerForm) -> Result<()> {
        let mut owner = Self::find_by_id(conn, id)?
            .ok_or_else(|| RegistryError::not_found("Client", format!("no client with id {}", id)))?;

        if non_empty(&form.company_name).is_some() {
            owner.company_name = validate_company_name(&form.company_name)?;
        }
        if let Some(full_name) = non_empty(&form.company_full_name) {
            owner.company_full_name = switch_quotes(full_name);
        }
        if non_empty(&form.unp_code).is_some() {
            let unp_code = validate_unp_code(&form.unp_code)?;
            Self::ensure_unp_is_free(conn, &unp_code, Some(id))?;
            owner.unp_code = unp_code;
        }
        if let Some(address) = non_empty(&form.company_address) {
            owner.company_address = Some(address.to_string());
        }
        if let Some(phone) = non_empty(&form.company_phone) {
            owner.company_phone = Some(phone.to_string());
        }

        let query = format!(
            "UPDATE {} SET {} = ?1, {} = ?2, {} = ?3, {} = ?4, {} = ?5 WHERE {} = ?6",
            OwnerTable::TABLE_NAME,
            OwnerTable::COLUMN_COMPANY_NAME,
            OwnerTable::COLUMN_COMPANY_FULL_NAME,
            OwnerTable::COLUMN_UNP_CODE,
            OwnerTable::COLUMN_ADDRESS,
            OwnerTable::COLUMN_PHONE,
            OwnerTable::COLUMN_ID
        );
        conn.execute(
            &query,
            params![
                owner.company_name,
                owner.company_full_name,
                owner.unp_code,
                owner.company_address,
                owner.company_phone,
                id
            ],
        )?;
        Ok(())
    }

    fn ensure_unp_is_free(conn: &Connection, unp_code: &str, owner_id: Option<i64>) -> Result<()> {
        match Self::find_id_by_unp(conn, unp_code)? {
            Some(existing) if Some(existing) != owner_id => Err(RegistryError::Integrity(format!(
                "tax code {} is already registered to client {}",
                unp_code, existing
            ))),
            _ => Ok(()),
        }
    }
}

fn validate_company_name(value: &str) -> Result<String> {
    let name = non_empty(value)
        .ok_or_else(|| RegistryError::Validation("company name is required".into()))?;
    if name.chars().count() > OwnerTable::COMPANY_NAME_MAX_LEN {
        return Err(RegistryError::Validation(format!(
            "company name is longer than {} characters",
            OwnerTable::COMPANY_NAME_MAX_LEN
        )));
    }
    Ok(name.to_string())
}

fn validate_unp_code(value: &str) -> Result<String> {
    let code = non_empty(value)
        .ok_or_else(|| RegistryError::Validation("tax code is required".into()))?;
    if !code.chars().all(|c| c.is_ascii_digit()) {
        return Err(RegistryError::Validation(format!(
            "tax code \"{}\" must contain digits only",
            code
        )));
    }
    Ok(code.to_string())
}

/// Replaces straight double quotes with alternating guillemets, which
/// survive the document templates.
pub fn switch_quotes(text: &str) -> String {
    let mut opening = true;
    text.trim()
        .chars()
        .map(|c| match c {
            '"' => {
                let quote = if opening { '«' } else { '»' };
                opening = !opening;
                quote
            }
            other => other,
        })
        .collect()
}
