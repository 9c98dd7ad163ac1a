use axum::middleware;
use axum::{Router, routing::get};
use reqwest::Client;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::database::DatabaseConnection;
use crate::error::render_problems;
use crate::exchange;
use crate::exchange::ExchangeClient;
use crate::exchange::repository::SnapshotRepository;
use crate::forecast;
use crate::forecast::repository::SqliteForecastRepository;
use crate::forecast::routes::FORECAST_ROUTE;
use crate::forecast::service::ForecastService;
use crate::weather;
use crate::weather::WeatherClient;

// Anything that goes in here must be a handle or pointer that can be cloned.
// The underlying state itself should be shared.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub forecasts: ForecastService,
    pub snapshots: SnapshotRepository,
    pub weather: WeatherClient,
    pub exchange: ExchangeClient,
}

pub fn create_state(database_connection: DatabaseConnection, config: Config) -> AppState {
    let http = Client::new();
    let repository = SqliteForecastRepository::new(database_connection.clone());
    AppState {
        forecasts: ForecastService::new(Arc::new(repository)),
        snapshots: SnapshotRepository::new(database_connection),
        weather: WeatherClient::new(config.weather.clone(), http.clone()),
        exchange: ExchangeClient::new(config.exchange.clone(), http),
        config: Arc::new(config),
    }
}

pub fn create_app(state: AppState) -> Router {
    let problem_config = state.config.problem.clone();
    Router::new()
        .route("/weather", get(weather::get_weather_info))
        .with_state(state.clone())
        .nest(FORECAST_ROUTE, forecast::routes::routes(state.clone()))
        .nest("/exchangerates", exchange::routes::routes(state))
        .layer(middleware::from_fn_with_state(
            problem_config,
            render_problems,
        ))
        .layer(TraceLayer::new_for_http())
}
