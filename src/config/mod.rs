use std::env;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
	pub database_path: String,
	pub busy_timeout: Duration,
	pub log_filter: String,
}

impl Config {
	/// Reads settings from the environment, loading `.env` first when present.
	pub fn from_env() -> Result<Self, ConfigError> {
		dotenvy::dotenv().ok();

		let database_path = env::var("DATABASE_PATH").unwrap_or_else(|_| "database.db".to_string());
		if database_path.trim().is_empty() {
			return Err(ConfigError::EmptyDatabasePath);
		}

		Ok(Self {
			database_path,
			busy_timeout: Duration::from_millis(
				env::var("SQLITE_BUSY_TIMEOUT_MS")
					.unwrap_or_else(|_| "5000".to_string())
					.parse()
					.map_err(|_| ConfigError::InvalidBusyTimeout)?,
			),
			log_filter: env::var("LOG_FILTER").unwrap_or_else(|_| "info".to_string()),
		})
	}
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
	#[error("DATABASE_PATH must not be empty")]
	EmptyDatabasePath,

	#[error("SQLITE_BUSY_TIMEOUT_MS must be a number of milliseconds")]
	InvalidBusyTimeout,
}
