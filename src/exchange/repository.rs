use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{Row, params};
use rust_decimal::Decimal;
use std::str::FromStr;
use thiserror::Error;

use crate::database::DatabaseConnection;
use crate::exchange::ExchangeRateSnapshot;

#[derive(Debug, Error)]
pub enum SnapshotRepositoryError {
    #[error("Failed to {action} exchange rate snapshot in db: {source}")]
    Query {
        action: &'static str,
        source: rusqlite::Error,
    },
}

fn query_error(action: &'static str) -> impl Fn(rusqlite::Error) -> SnapshotRepositoryError {
    move |source| SnapshotRepositoryError::Query { action, source }
}

fn read_snapshot(row: &Row) -> rusqlite::Result<ExchangeRateSnapshot> {
    let rate: String = row.get(2)?;
    let rate = Decimal::from_str(&rate)
        .map_err(|err| rusqlite::Error::FromSqlConversionFailure(2, Type::Text, Box::new(err)))?;
    Ok(ExchangeRateSnapshot {
        id: row.get(0)?,
        currency: row.get(1)?,
        rate,
        retrieved_at: row.get(3)?,
    })
}

/// Append-only store of fetched exchange rates. Snapshots are never updated
/// or deleted.
#[derive(Clone)]
pub struct SnapshotRepository {
    connection: DatabaseConnection,
}

impl SnapshotRepository {
    pub fn new(connection: DatabaseConnection) -> SnapshotRepository {
        SnapshotRepository { connection }
    }

    pub async fn append(
        &self,
        currency: &str,
        rate: Decimal,
        retrieved_at: DateTime<Utc>,
    ) -> Result<ExchangeRateSnapshot, SnapshotRepositoryError> {
        let conn = self.connection.lock().await;
        conn.execute(
            "INSERT INTO exchange_rate_snapshot (currency, rate, retrieved_at) VALUES ((?1), (?2), (?3))",
            params![currency, rate.to_string(), retrieved_at],
        )
        .map_err(query_error("insert"))?;
        Ok(ExchangeRateSnapshot {
            id: conn.last_insert_rowid(),
            currency: currency.to_string(),
            rate,
            retrieved_at,
        })
    }

    /// All snapshots, oldest first, optionally only those for `currency`.
    pub async fn list(
        &self,
        currency: Option<&str>,
    ) -> Result<Vec<ExchangeRateSnapshot>, SnapshotRepositoryError> {
        let conn = self.connection.lock().await;
        let mut statement = conn
            .prepare(
                "SELECT id, currency, rate, retrieved_at FROM exchange_rate_snapshot \
                 WHERE (?1) IS NULL OR currency = (?1) ORDER BY id",
            )
            .map_err(query_error("fetch"))?;
        let snapshots = statement
            .query_map((currency,), read_snapshot)
            .map_err(query_error("fetch"))?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(query_error("fetch"))?;
        Ok(snapshots)
    }

    pub async fn latest(
        &self,
        currency: &str,
    ) -> Result<Option<ExchangeRateSnapshot>, SnapshotRepositoryError> {
        let conn = self.connection.lock().await;
        match conn.query_row(
            "SELECT id, currency, rate, retrieved_at FROM exchange_rate_snapshot \
             WHERE currency = (?1) ORDER BY id DESC LIMIT 1",
            (currency,),
            read_snapshot,
        ) {
            Ok(snapshot) => Ok(Some(snapshot)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(source) => Err(query_error("fetch")(source)),
        }
    }
}
