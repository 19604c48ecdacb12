use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};

/// What a car record describes. Stored as the code of the
/// matching row in the attachment lookup table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Attachment {
    Vehicle = 1,
    Trailer = 2,
    #[default]
    SpareParts = 3,
}

impl Attachment {
    pub const ALL: [Attachment; 3] = [
        Attachment::Vehicle,
        Attachment::Trailer,
        Attachment::SpareParts,
    ];

    pub fn code(self) -> i64 {
        self as i64
    }

    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            1 => Some(Attachment::Vehicle),
            2 => Some(Attachment::Trailer),
            3 => Some(Attachment::SpareParts),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Attachment::Vehicle => "car",
            Attachment::Trailer => "trailer",
            Attachment::SpareParts => "parts",
        }
    }

    /// Document templates the act renderer fills for this category.
    pub fn document_templates(self) -> &'static [&'static str] {
        match self {
            Attachment::SpareParts => &["act_tmc"],
            Attachment::Vehicle | Attachment::Trailer => &["act_repair", "act_work", "order"],
        }
    }
}

impl ToSql for Attachment {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.code()))
    }
}

impl FromSql for Attachment {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let code = i64::column_result(value)?;
        Attachment::from_code(code).ok_or(FromSqlError::OutOfRange(code))
    }
}
