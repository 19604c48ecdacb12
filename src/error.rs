use thiserror::Error;

/// Stable labels handed to the error channel together with the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Type,
    Value,
    Integrity,
    NotFound,
    Database,
}

impl ErrorCategory {
    pub fn label(&self) -> &'static str {
        match self {
            ErrorCategory::Type => "TypeError",
            ErrorCategory::Value => "ValueError",
            ErrorCategory::Integrity => "IntegrityError",
            ErrorCategory::NotFound => "NotFoundError",
            ErrorCategory::Database => "DatabaseError",
        }
    }
}

/// Rejections raised while normalizing a plate number.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlateError {
    #[error("Plate number is empty")]
    Empty,

    #[error(
        "Character \"{0}\" is not used in plate numbers. If the vehicle is registered in another \
         country, put the country code in front of the number: RU for Russian vehicles, EU for \
         other countries (e.g. RU \"A 111 AA 22\")"
    )]
    UnsupportedCharacter(char),

    #[error("Plate \"{digits} {letters}\" does not match the standard: expected 5 digits and 2 letters")]
    LengthMismatch { digits: String, letters: String },

    #[error("Region code \"{letters}-{region}\" must be between 1 and 7")]
    RegionCode { letters: String, region: char },
}

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Plate number is not valid. {0}")]
    Plate(#[from] PlateError),

    #[error("Invalid value: {0}")]
    Validation(String),

    #[error("Integrity violation: {0}")]
    Integrity(String),

    #[error("{entity} not found: {detail}")]
    NotFound { entity: &'static str, detail: String },

    #[error("Database error: {0}")]
    Database(rusqlite::Error),
}

impl RegistryError {
    pub fn not_found(entity: &'static str, detail: impl Into<String>) -> Self {
        RegistryError::NotFound {
            entity,
            detail: detail.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            RegistryError::Plate(PlateError::UnsupportedCharacter(_))
            | RegistryError::Plate(PlateError::RegionCode { .. }) => ErrorCategory::Type,
            RegistryError::Plate(_) | RegistryError::Validation(_) => ErrorCategory::Value,
            RegistryError::Integrity(_) => ErrorCategory::Integrity,
            RegistryError::NotFound { .. } => ErrorCategory::NotFound,
            RegistryError::Database(_) => ErrorCategory::Database,
        }
    }
}

// UNIQUE / FOREIGN KEY failures are integrity errors, not storage faults
impl From<rusqlite::Error> for RegistryError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(failure, message)
                if failure.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                RegistryError::Integrity(
                    message.clone().unwrap_or_else(|| failure.to_string()),
                )
            }
            _ => RegistryError::Database(err),
        }
    }
}

pub type Result<T> = std::result::Result<T, RegistryError>;
