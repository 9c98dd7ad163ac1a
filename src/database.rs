use log::debug;
use rusqlite::Connection;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;

/// Shared handle to the single SQLite connection.
///
/// Handlers lock it for the duration of one statement, so it is never held
/// across an outbound call.
pub type DatabaseConnection = Arc<Mutex<Connection>>;

pub const IN_MEMORY_DATABASE: &str = ":memory:";

#[derive(Debug, Error)]
pub enum SqliteDatabaseError {
    #[error("Could not open database: {source}")]
    RusqliteError {
        #[from]
        source: rusqlite::Error,
    },
    #[error("Could not apply database migrations: {source}")]
    MigrationError {
        #[from]
        source: refinery::Error,
    },
}

mod embedded {
    use refinery::embed_migrations;
    embed_migrations!("./sql_migrations");
}

pub fn apply_migrations(connection: &mut Connection) -> Result<(), SqliteDatabaseError> {
    let report = embedded::migrations::runner().run(connection)?;
    debug!("Applied migrations\n{:?}", report);
    Ok(())
}

pub fn create_sqlite_database_on_disk(
    file_path: impl Into<PathBuf>,
) -> Result<Connection, SqliteDatabaseError> {
    let file_path = file_path.into();
    let mut connection = Connection::open(&file_path)?;
    apply_migrations(&mut connection)?;
    Ok(connection)
}

/// Create a migrated database that lives only as long as the connection.
pub fn create_sqlite_database_in_memory() -> Result<Connection, SqliteDatabaseError> {
    let mut connection = Connection::open_in_memory()?;
    apply_migrations(&mut connection)?;
    Ok(connection)
}

/// Open the database named by `path`, where `:memory:` selects a
/// throwaway in-memory database.
pub fn open_database(path: &str) -> Result<DatabaseConnection, SqliteDatabaseError> {
    let connection = if path == IN_MEMORY_DATABASE {
        create_sqlite_database_in_memory()?
    } else {
        create_sqlite_database_on_disk(path)?
    };
    Ok(Arc::new(Mutex::new(connection)))
}
