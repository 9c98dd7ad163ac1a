use axum::extract::rejection::QueryRejection;
use axum::extract::{Json, Query, State};
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::app::AppState;
use crate::config::WeatherApiConfig;
use crate::error::ApiError;
use crate::integration::{IntegrationError, decode_json};

const SERVICE: &str = "open weather API";

/// Current conditions for a city. The default value, with every reading
/// empty, is what clients get when the weather API could not be reached.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WeatherInfo {
    pub city: String,
    pub temperature_c: Option<f64>,
    pub summary: Option<String>,
    pub observed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    description: String,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    name: String,
    dt: i64,
    main: OwMain,
    #[serde(default)]
    weather: Vec<OwWeather>,
}

impl From<OwCurrentResponse> for WeatherInfo {
    fn from(response: OwCurrentResponse) -> Self {
        WeatherInfo {
            city: response.name,
            temperature_c: Some(response.main.temp),
            summary: response.weather.into_iter().next().map(|w| w.description),
            observed_at: DateTime::from_timestamp(response.dt, 0),
        }
    }
}

#[derive(Debug, Clone)]
pub struct WeatherClient {
    config: WeatherApiConfig,
    http: Client,
}

impl WeatherClient {
    pub fn new(config: WeatherApiConfig, http: Client) -> WeatherClient {
        WeatherClient { config, http }
    }

    /// One request for the current weather in `city`, metric units.
    pub async fn fetch_current(&self, city: &str) -> Result<WeatherInfo, IntegrationError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or_else(|| IntegrationError::NotConfigured {
                service: SERVICE,
                reason: "no api_key set in [weather]".to_string(),
            })?;
        let url = format!(
            "{}/data/2.5/weather",
            self.config.base_url.trim_end_matches('/')
        );
        log::debug!("Fetching current weather for {} from {}", city, url);
        let response = self
            .http
            .get(url)
            .query(&[("q", city), ("appid", api_key), ("units", "metric")])
            .send()
            .await
            .map_err(|source| IntegrationError::request(SERVICE, source))?;
        let parsed: OwCurrentResponse = decode_json(SERVICE, response).await?;
        Ok(parsed.into())
    }
}

#[derive(Debug, Deserialize)]
pub struct WeatherQuery {
    city: Option<String>,
}

pub async fn get_weather_info(
    State(state): State<AppState>,
    query: Result<Query<WeatherQuery>, QueryRejection>,
) -> Result<Json<WeatherInfo>, ApiError> {
    let Query(query) = query?;
    let city = query
        .city
        .unwrap_or_else(|| state.config.weather.default_city.clone());
    let fetched = state.weather.fetch_current(&city).await;
    let mut weather_info = state.config.weather.on_failure.resolve(fetched)?;
    if weather_info.city.is_empty() {
        weather_info.city = city;
    }
    Ok(Json(weather_info))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::app::{create_app, create_state};
    use crate::config::Config;
    use crate::database::{IN_MEMORY_DATABASE, open_database};
    use crate::error::ProblemDetails;
    use crate::integration::FailurePolicy;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    // Nothing listens on port 1, so every request fails fast.
    const UNREACHABLE: &str = "http://127.0.0.1:1";

    fn unreachable_config(on_failure: FailurePolicy) -> Config {
        let mut config = Config::default();
        config.weather.base_url = UNREACHABLE.to_string();
        config.weather.api_key = Some("key".to_string());
        config.weather.on_failure = on_failure;
        config
    }

    async fn get(config: Config, uri: &str) -> (StatusCode, Vec<u8>) {
        let connection = open_database(IN_MEMORY_DATABASE).unwrap();
        let app = create_app(create_state(connection, config));
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, body.to_vec())
    }

    #[test]
    fn open_weather_response_is_mapped() {
        let response: OwCurrentResponse = serde_json::from_str(
            r#"{
                "name": "Onsala",
                "dt": 1751371200,
                "main": {"temp": 17.5, "feels_like": 16.9, "humidity": 70},
                "weather": [{"description": "light rain"}, {"description": "mist"}],
                "wind": {"speed": 4.1}
            }"#,
        )
        .unwrap();
        let info = WeatherInfo::from(response);
        assert_eq!(info.city, "Onsala");
        assert_eq!(info.temperature_c, Some(17.5));
        assert_eq!(info.summary.as_deref(), Some("light rain"));
        assert_eq!(info.observed_at, DateTime::from_timestamp(1751371200, 0));
    }

    #[tokio::test]
    async fn missing_api_key_is_reported() {
        let client = WeatherClient::new(WeatherApiConfig::default(), Client::new());
        let err = client.fetch_current("Onsala").await.unwrap_err();
        assert!(matches!(err, IntegrationError::NotConfigured { .. }));
    }

    #[tokio::test]
    async fn unreachable_api_falls_back_to_empty_weather() {
        let (status, body) = get(
            unreachable_config(FailurePolicy::Default),
            "/weather?city=Onsala",
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let info: WeatherInfo = serde_json::from_slice(&body).unwrap();
        assert_eq!(
            info,
            WeatherInfo {
                city: "Onsala".to_string(),
                ..Default::default()
            }
        );
    }

    #[tokio::test]
    async fn unreachable_api_is_a_bad_gateway_when_configured() {
        let (status, body) = get(unreachable_config(FailurePolicy::Error), "/weather").await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        let problem: ProblemDetails = serde_json::from_slice(&body).unwrap();
        assert_eq!(problem.title, "Upstream Service Failure");
        assert_eq!(problem.instance, "/weather");
    }

    #[tokio::test]
    async fn api_key_never_reaches_the_client() {
        let mut config = unreachable_config(FailurePolicy::Error);
        config.weather.api_key = Some("SUPERSECRET".to_string());
        let (status, body) = get(config, "/weather?city=Onsala").await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        let problem: ProblemDetails = serde_json::from_slice(&body).unwrap();
        assert!(problem.detail.starts_with("Request to open weather API failed"));
        assert!(!problem.detail.contains("SUPERSECRET"));
        assert!(!problem.detail.contains(UNREACHABLE));
    }
}
