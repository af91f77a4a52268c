//! Connection configuration and setup.

use crate::DbError;

/// Connection settings for the permit database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Database to open: a MotherDuck URL
    /// (`md:<db>?motherduck_token=<token>`) or a local `DuckDB` file path.
    pub database: String,
    /// Schema holding the month partition tables.
    pub schema: String,
}

impl StoreConfig {
    /// Reads the configuration from `WORKS_MAP_DATABASE` and
    /// `WORKS_MAP_SCHEMA`.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Config`] if `WORKS_MAP_DATABASE` is not set.
    /// The schema defaults to `street_works`.
    pub fn from_env() -> Result<Self, DbError> {
        let database = std::env::var("WORKS_MAP_DATABASE").map_err(|_| DbError::Config {
            message: "WORKS_MAP_DATABASE is not set".to_string(),
        })?;
        let schema =
            std::env::var("WORKS_MAP_SCHEMA").unwrap_or_else(|_| "street_works".to_string());
        Ok(Self { database, schema })
    }
}

/// Opens a connection to the configured database.
///
/// # Errors
///
/// Returns the `DuckDB` error unchanged if the connection fails.
pub fn connect(config: &StoreConfig) -> Result<duckdb::Connection, DbError> {
    Ok(duckdb::Connection::open(&config.database)?)
}
