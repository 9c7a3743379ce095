//! Persistence gateway
//!
//! One operation per entity type per verb: list, create, update by id and
//! delete by id. [`SqliteGateway`] implements [`Gateway`] for all five
//! entities, one file per entity.
//!
//! Writes are single statements with no transaction, batching or
//! optimistic-concurrency check. Concurrent edits of one record silently
//! overwrite each other and an update of a deleted record changes nothing
//! and still succeeds. List ordering ties follow SQLite storage order,
//! which is not guaranteed.

mod grades;
mod groups;
mod students;
mod subjects;
mod teachers;

use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::sqlite::SqliteQueryResult;
use sqlx::SqlitePool;
use std::future::Future;
use tracing::warn;
use uuid::Uuid;

use crate::model::Entity;
use crate::{Error, Result};

/// CRUD operations for one entity type
pub trait Gateway<E: Entity>: Send + Sync {
    /// All records in the entity's display order, related objects joined
    fn list(&self) -> impl Future<Output = Result<Vec<E>>> + Send;

    /// Insert a new record and return its id
    fn create(&self, fields: &E::Fields) -> impl Future<Output = Result<Uuid>> + Send;

    /// Replace every field of the record with `id`
    fn update(&self, id: Uuid, fields: &E::Fields) -> impl Future<Output = Result<()>> + Send;

    /// Remove the record with `id`
    fn delete(&self, id: Uuid) -> impl Future<Output = Result<()>> + Send;
}

/// Gateway backed by the journal's SQLite database
#[derive(Debug, Clone)]
pub struct SqliteGateway {
    pool: SqlitePool,
}

impl SqliteGateway {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

/// Timestamp written to `created_at`/`updated_at`
///
/// Fixed-width RFC 3339 so that text ordering matches time ordering.
pub(crate) fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn parse_id(value: &str) -> Result<Uuid> {
    Uuid::parse_str(value)
        .map_err(|e| Error::Internal(format!("Invalid stored id '{}': {}", value, e)))
}

pub(crate) fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| Error::Internal(format!("Invalid stored timestamp '{}': {}", value, e)))
}

/// Log writes that matched no row; they still count as success
pub(crate) fn note_untouched(result: &SqliteQueryResult, label: &str, action: &str, id: Uuid) {
    if result.rows_affected() == 0 {
        warn!("{} {} matched no record: {}", label, action, id);
    }
}
