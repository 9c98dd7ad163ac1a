use axum_server::tls_rustls::RustlsConfig;
use clap::Parser;
use std::io;
use std::net::SocketAddr;
use std::process::ExitCode;
use thiserror::Error;

use app::{create_app, create_state};
use config::{Config, ConfigError};
use database::{SqliteDatabaseError, open_database};

mod app;
mod config;
mod database;
mod error;
mod exchange;
mod forecast;
mod integration;
mod weather;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// TOML configuration file. Defaults are used if it does not exist.
    #[arg(long, env = "FORECAST_CONFIG", default_value = "forecast.toml")]
    config: String,

    /// SQLite database file, or `:memory:`. Overrides `[database] path`.
    #[arg(short, long, env = "DATABASE_PATH")]
    database_path: Option<String>,

    #[arg(short, long, env = "PORT", default_value_t = 3000)]
    port: u16,

    #[arg(short, long, env = "KEY_FILE_PATH")]
    key_file_path: Option<String>,

    #[arg(short, long, env = "CERT_FILE_PATH")]
    cert_file_path: Option<String>,
}

#[derive(Debug, Error)]
enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Database(#[from] SqliteDatabaseError),
    #[error("A key file was given without a cert file")]
    MissingCertFile,
    #[error("Server failed: {0}")]
    Io(#[from] io::Error),
}

async fn run(args: Args) -> Result<(), StartupError> {
    let mut config = Config::load(&args.config)?;
    if let Some(database_path) = args.database_path {
        config.database.path = database_path;
    }

    log::info!("using database {}", config.database.path);
    let database_connection = open_database(&config.database.path)?;
    let app = create_app(create_state(database_connection, config));

    let addr = SocketAddr::from(([0, 0, 0, 0], args.port));
    log::info!("listening on {}", addr);
    if let Some(key_file_path) = args.key_file_path {
        let cert_file_path = args.cert_file_path.ok_or(StartupError::MissingCertFile)?;
        log::info!(
            "using tls with key file {} and cert file {}",
            key_file_path,
            cert_file_path
        );
        let tls = RustlsConfig::from_pem_file(cert_file_path, key_file_path).await?;
        axum_server::bind_rustls(addr, tls)
            .serve(app.into_make_service())
            .await?;
    } else {
        axum_server::bind(addr)
            .serve(app.into_make_service())
            .await?;
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::init();

    let args = Args::parse();
    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{}", err);
            ExitCode::FAILURE
        }
    }
}
