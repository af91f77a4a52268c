#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Query layer for street-works permit data.
//!
//! Permit rows live in a `DuckDB`/MotherDuck database, one table per month
//! partition. This crate owns credentials, SQL generation, and row
//! mapping; the rest of the system consumes it through the
//! [`WorkEventStore`] trait and trusts that rows come back deduplicated by
//! permit reference and restricted to completed work-stop events.

pub mod db;
pub mod queries;

use async_trait::async_trait;
use works_map_permit_models::{CategoryFilter, RawWorkRecord};

/// The highway authorities present in the permit dataset.
pub const KNOWN_AUTHORITIES: &[&str] = &[
    "NEWCASTLE CITY COUNCIL",
    "SUNDERLAND CITY COUNCIL",
    "DARLINGTON BOROUGH COUNCIL",
    "DURHAM COUNTY COUNCIL",
    "SOUTH TYNESIDE COUNCIL",
    "NORTH TYNESIDE COUNCIL",
];

/// Errors that can occur in the query layer.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// Required configuration is absent. Fatal: surfaced immediately,
    /// never retried.
    #[error("Missing configuration: {message}")]
    Config {
        /// What was missing.
        message: String,
    },

    /// The month partition identifier is not of the `MM_YYYY` form.
    /// Partition identifiers become table names, so they are validated
    /// instead of interpolated blindly.
    #[error("Invalid month partition identifier: {month:?}")]
    InvalidMonth {
        /// The offending identifier.
        month: String,
    },

    /// A `DuckDB` error, propagated unchanged so callers can distinguish
    /// connectivity problems from logic errors.
    #[error(transparent)]
    Duckdb(#[from] duckdb::Error),
}

/// Which highway authorities a query covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthorityFilter {
    /// All known authorities in one query.
    All,
    /// A single named authority.
    One(String),
}

impl AuthorityFilter {
    /// Display label, also used as the partition tag for merged output.
    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            Self::All => "ALL AUTHORITIES",
            Self::One(name) => name,
        }
    }
}

/// The data-store seam the pipeline consumes.
///
/// Implementations return rows already deduplicated by permit reference
/// within one partition and already filtered to completed work-stop
/// events; the core trusts both.
#[async_trait]
pub trait WorkEventStore: Send + Sync {
    /// Fetches the raw records for one (authority x month) partition,
    /// restricted by the compiled category filter.
    async fn fetch(
        &self,
        authority: &AuthorityFilter,
        month: &str,
        filter: &CategoryFilter,
    ) -> Result<Vec<RawWorkRecord>, DbError>;
}

/// [`WorkEventStore`] backed by `DuckDB` (a MotherDuck URL or a local
/// database file).
pub struct DuckDbStore {
    config: db::StoreConfig,
}

impl DuckDbStore {
    /// Creates a store from an explicit configuration.
    #[must_use]
    pub const fn new(config: db::StoreConfig) -> Self {
        Self { config }
    }

    /// Creates a store from the environment.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Config`] if required variables are absent.
    pub fn from_env() -> Result<Self, DbError> {
        Ok(Self::new(db::StoreConfig::from_env()?))
    }
}

#[async_trait]
impl WorkEventStore for DuckDbStore {
    async fn fetch(
        &self,
        authority: &AuthorityFilter,
        month: &str,
        filter: &CategoryFilter,
    ) -> Result<Vec<RawWorkRecord>, DbError> {
        if !queries::is_valid_month(month) {
            return Err(DbError::InvalidMonth {
                month: month.to_string(),
            });
        }

        // The connection stays inside this non-await section; DuckDB
        // connections must not be held across suspension points.
        let conn = db::connect(&self.config)?;
        let query = queries::fetch_query(&self.config.schema, month, authority, filter);

        let mut stmt = conn.prepare(&query)?;
        let mut rows = match authority {
            AuthorityFilter::One(name) => stmt.query(duckdb::params![name])?,
            AuthorityFilter::All => stmt.query([])?,
        };

        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            records.push(RawWorkRecord {
                permit_reference: row.get(0)?,
                activity_type: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
                work_category: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
                work_status: row.get(3)?,
                event_type: row.get(4)?,
                geometry_wkt: row.get(5)?,
            });
        }

        log::info!(
            "Fetched {} permit records for {} in {month}",
            records.len(),
            authority.label()
        );
        Ok(records)
    }
}
