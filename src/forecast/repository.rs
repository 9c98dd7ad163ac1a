use async_trait::async_trait;
use chrono::NaiveDate;
use rusqlite::{Row, params};
use thiserror::Error;

use crate::database::DatabaseConnection;
use crate::forecast::ForecastId;

/// Row of the `forecast` table.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastRecord {
    pub id: ForecastId,
    pub date: NaiveDate,
    pub temperature_c: i32,
    pub summary: Option<String>,
}

/// Values for a row that is about to be inserted.
#[derive(Debug, Clone, PartialEq)]
pub struct NewForecastRecord {
    pub date: NaiveDate,
    pub temperature_c: i32,
    pub summary: Option<String>,
}

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Failed to {action} forecast in db: {source}")]
    Query {
        action: &'static str,
        source: rusqlite::Error,
    },
}

fn query_error(action: &'static str) -> impl FnOnce(rusqlite::Error) -> RepositoryError {
    move |source| RepositoryError::Query { action, source }
}

#[async_trait]
pub trait ForecastRepository: Send + Sync {
    async fn get_all(&self) -> Result<Vec<ForecastRecord>, RepositoryError>;
    async fn get_by_id(&self, id: ForecastId) -> Result<Option<ForecastRecord>, RepositoryError>;
    async fn create(&self, record: NewForecastRecord) -> Result<ForecastId, RepositoryError>;
    /// Replace the row with the record's id. Returns `false` if there was no
    /// such row, in which case nothing is written.
    async fn update(&self, record: ForecastRecord) -> Result<bool, RepositoryError>;
    /// Remove the row with `id`. Returns `false` if there was no such row.
    async fn delete(&self, id: ForecastId) -> Result<bool, RepositoryError>;
}

#[derive(Clone)]
pub struct SqliteForecastRepository {
    connection: DatabaseConnection,
}

impl SqliteForecastRepository {
    pub fn new(connection: DatabaseConnection) -> SqliteForecastRepository {
        SqliteForecastRepository { connection }
    }
}

fn read_record(row: &Row) -> rusqlite::Result<ForecastRecord> {
    Ok(ForecastRecord {
        id: row.get(0)?,
        date: row.get(1)?,
        temperature_c: row.get(2)?,
        summary: row.get(3)?,
    })
}

#[async_trait]
impl ForecastRepository for SqliteForecastRepository {
    async fn get_all(&self) -> Result<Vec<ForecastRecord>, RepositoryError> {
        let conn = self.connection.lock().await;
        let mut statement = conn
            .prepare("SELECT id, date, temperature_c, summary FROM forecast ORDER BY id")
            .map_err(query_error("fetch"))?;
        let records = statement
            .query_map([], read_record)
            .map_err(query_error("fetch"))?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(query_error("fetch"))?;
        Ok(records)
    }

    async fn get_by_id(&self, id: ForecastId) -> Result<Option<ForecastRecord>, RepositoryError> {
        let conn = self.connection.lock().await;
        match conn.query_row(
            "SELECT id, date, temperature_c, summary FROM forecast WHERE id = (?1)",
            (id,),
            read_record,
        ) {
            Ok(record) => Ok(Some(record)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(source) => Err(query_error("fetch")(source)),
        }
    }

    async fn create(&self, record: NewForecastRecord) -> Result<ForecastId, RepositoryError> {
        let conn = self.connection.lock().await;
        conn.execute(
            "INSERT INTO forecast (date, temperature_c, summary) VALUES ((?1), (?2), (?3))",
            params![record.date, record.temperature_c, record.summary],
        )
        .map_err(query_error("insert"))?;
        Ok(conn.last_insert_rowid())
    }

    async fn update(&self, record: ForecastRecord) -> Result<bool, RepositoryError> {
        let conn = self.connection.lock().await;
        let changed = conn
            .execute(
                "UPDATE forecast SET date = (?1), temperature_c = (?2), summary = (?3) WHERE id = (?4)",
                params![record.date, record.temperature_c, record.summary, record.id],
            )
            .map_err(query_error("update"))?;
        Ok(changed > 0)
    }

    async fn delete(&self, id: ForecastId) -> Result<bool, RepositoryError> {
        let conn = self.connection.lock().await;
        let changed = conn
            .execute("DELETE FROM forecast WHERE id = (?1)", (id,))
            .map_err(query_error("delete"))?;
        Ok(changed > 0)
    }
}
