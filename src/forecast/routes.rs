use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::{
    Router,
    extract::{Json, Path, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};

use crate::app::AppState;
use crate::error::ApiError;
use crate::forecast::validation::validate_new_forecast;
use crate::forecast::{ForecastId, ForecastRequest, ForecastResponse};

pub const FORECAST_ROUTE: &str = "/weatherforecast";

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/", get(get_forecasts).post(create_forecast))
        .route(
            "/{id}",
            get(get_forecast).put(update_forecast).delete(delete_forecast),
        )
        .with_state(state)
}

fn not_found(id: ForecastId) -> ApiError {
    ApiError::NotFound(format!("Forecast {id} was not found"))
}

async fn get_forecasts(
    State(state): State<AppState>,
) -> Result<Json<Vec<ForecastResponse>>, ApiError> {
    let forecasts = state.forecasts.get_all().await?;
    Ok(Json(
        forecasts.into_iter().map(ForecastResponse::from).collect(),
    ))
}

async fn get_forecast(
    State(state): State<AppState>,
    id: Result<Path<ForecastId>, PathRejection>,
) -> Result<Json<ForecastResponse>, ApiError> {
    let Path(id) = id?;
    let forecast = state.forecasts.get_by_id(id).await?.ok_or_else(|| not_found(id))?;
    Ok(Json(forecast.into()))
}

async fn create_forecast(
    State(state): State<AppState>,
    request: Result<Json<ForecastRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(request) = request?;
    validate_new_forecast(&request).map_err(ApiError::Validation)?;
    let id = state.forecasts.create(request.into()).await?;
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, format!("{FORECAST_ROUTE}/{id}"))],
    )
        .into_response())
}

async fn update_forecast(
    State(state): State<AppState>,
    id: Result<Path<ForecastId>, PathRejection>,
    request: Result<Json<ForecastRequest>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    let Path(id) = id?;
    let Json(request) = request?;
    // A single conditional UPDATE, so a concurrent delete cannot slip in
    // between an existence check and the write.
    if !state.forecasts.update(request.into_forecast(id)).await? {
        return Err(not_found(id));
    }
    Ok(StatusCode::NO_CONTENT)
}

async fn delete_forecast(
    State(state): State<AppState>,
    id: Result<Path<ForecastId>, PathRejection>,
) -> Result<StatusCode, ApiError> {
    let Path(id) = id?;
    if !state.forecasts.delete(id).await? {
        return Err(not_found(id));
    }
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::app::{create_app, create_state};
    use crate::config::Config;
    use crate::database::{IN_MEMORY_DATABASE, open_database};
    use crate::error::{PROBLEM_JSON, ProblemDetails};
    use axum::body::{Body, to_bytes};
    use axum::http::{self, Request};
    use chrono::{Days, NaiveDate, Utc};
    use serde::de::DeserializeOwned;
    use tower::ServiceExt;

    fn create_test_app() -> Router {
        let connection = open_database(IN_MEMORY_DATABASE).unwrap();
        create_app(create_state(connection, Config::default()))
    }

    fn json_request(method: http::Method, uri: &str, body: &serde_json::Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(http::header::CONTENT_TYPE, mime::APPLICATION_JSON.as_ref())
            .body(Body::from(serde_json::to_vec(body).unwrap()))
            .unwrap()
    }

    fn empty_request(method: http::Method, uri: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    async fn send(app: &Router, request: Request<Body>) -> Response {
        app.clone().oneshot(request).await.unwrap()
    }

    async fn read_json<T: DeserializeOwned>(response: Response) -> T {
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    fn forecast_body(date: NaiveDate, temperature_c: i32, summary: &str) -> serde_json::Value {
        serde_json::json!({
            "date": date,
            "temperatureC": temperature_c,
            "summary": summary,
        })
    }

    async fn post_forecast(app: &Router, body: &serde_json::Value) -> Response {
        send(app, json_request(http::Method::POST, FORECAST_ROUTE, body)).await
    }

    #[tokio::test]
    async fn create_read_update_delete_scenario() {
        let app = create_test_app();
        let today = Utc::now().date_naive();
        let tomorrow = today.checked_add_days(Days::new(1)).unwrap();

        let response = post_forecast(&app, &forecast_body(today, 10, "Test")).await;
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(
            response.headers()[http::header::LOCATION],
            "/weatherforecast/1"
        );
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(body.is_empty());

        let response = send(&app, empty_request(http::Method::GET, "/weatherforecast/1")).await;
        assert_eq!(response.status(), StatusCode::OK);
        let forecast: ForecastResponse = read_json(response).await;
        assert_eq!(
            forecast,
            ForecastResponse {
                id: 1,
                date: today,
                temperature_c: 10,
                summary: Some("Test".to_string()),
            }
        );

        let response = send(
            &app,
            json_request(
                http::Method::PUT,
                "/weatherforecast/1",
                &forecast_body(tomorrow, 20, "Updated"),
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let response = send(&app, empty_request(http::Method::GET, "/weatherforecast/1")).await;
        let forecast: ForecastResponse = read_json(response).await;
        assert_eq!(forecast.date, tomorrow);
        assert_eq!(forecast.temperature_c, 20);
        assert_eq!(forecast.summary.as_deref(), Some("Updated"));

        let response = send(&app, empty_request(http::Method::DELETE, "/weatherforecast/1")).await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let response = send(&app, empty_request(http::Method::GET, "/weatherforecast/1")).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn list_returns_every_forecast() {
        let app = create_test_app();
        let date = NaiveDate::from_ymd_opt(2025, 7, 1).unwrap();
        for summary in ["Sunny", "Rainy"] {
            post_forecast(&app, &forecast_body(date, 15, summary)).await;
        }
        let response = send(&app, empty_request(http::Method::GET, FORECAST_ROUTE)).await;
        assert_eq!(response.status(), StatusCode::OK);
        let forecasts: Vec<ForecastResponse> = read_json(response).await;
        let summaries: Vec<_> = forecasts
            .iter()
            .map(|f| f.summary.clone().unwrap())
            .collect();
        assert_eq!(summaries, vec!["Sunny", "Rainy"]);
    }

    #[tokio::test]
    async fn empty_summary_is_rejected_and_not_stored() {
        let app = create_test_app();
        let date = NaiveDate::from_ymd_opt(2025, 7, 1).unwrap();
        let response = post_forecast(&app, &forecast_body(date, 10, "")).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            response.headers()[http::header::CONTENT_TYPE],
            PROBLEM_JSON
        );
        let problem: ProblemDetails = read_json(response).await;
        assert_eq!(
            problem,
            ProblemDetails {
                status: 400,
                title: "Validation Error".to_string(),
                detail: "Summary is required.".to_string(),
                instance: FORECAST_ROUTE.to_string(),
            }
        );

        let response = send(&app, empty_request(http::Method::GET, FORECAST_ROUTE)).await;
        let forecasts: Vec<ForecastResponse> = read_json(response).await;
        assert!(forecasts.is_empty());
    }

    #[tokio::test]
    async fn missing_summary_is_rejected() {
        let app = create_test_app();
        let body = serde_json::json!({"date": "2025-07-01", "temperatureC": 3});
        let response = post_forecast(&app, &body).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn malformed_body_is_a_validation_problem() {
        let app = create_test_app();
        let body = serde_json::json!({"date": "not a date", "temperatureC": 3, "summary": "x"});
        let response = post_forecast(&app, &body).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let problem: ProblemDetails = read_json(response).await;
        assert_eq!(problem.title, "Validation Error");
    }

    #[tokio::test]
    async fn update_allows_empty_summary() {
        let app = create_test_app();
        let date = NaiveDate::from_ymd_opt(2025, 7, 1).unwrap();
        post_forecast(&app, &forecast_body(date, 10, "Test")).await;
        let response = send(
            &app,
            json_request(
                http::Method::PUT,
                "/weatherforecast/1",
                &forecast_body(date, 11, ""),
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn unknown_ids_are_not_found() {
        let app = create_test_app();
        let date = NaiveDate::from_ymd_opt(2025, 7, 1).unwrap();
        let requests = [
            empty_request(http::Method::GET, "/weatherforecast/99"),
            json_request(
                http::Method::PUT,
                "/weatherforecast/99",
                &forecast_body(date, 1, "x"),
            ),
            empty_request(http::Method::DELETE, "/weatherforecast/99"),
        ];
        for request in requests {
            let response = send(&app, request).await;
            assert_eq!(response.status(), StatusCode::NOT_FOUND);
            let problem: ProblemDetails = read_json(response).await;
            assert_eq!(problem.title, "Resource Not Found");
            assert_eq!(problem.instance, "/weatherforecast/99");
        }
    }

    #[tokio::test]
    async fn deleted_forecast_stays_gone() {
        let app = create_test_app();
        let date = NaiveDate::from_ymd_opt(2025, 7, 1).unwrap();
        post_forecast(&app, &forecast_body(date, 10, "a")).await;
        post_forecast(&app, &forecast_body(date, 11, "b")).await;

        let response = send(&app, empty_request(http::Method::DELETE, "/weatherforecast/1")).await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        let response = send(&app, empty_request(http::Method::DELETE, "/weatherforecast/1")).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let response = send(
            &app,
            json_request(
                http::Method::PUT,
                "/weatherforecast/1",
                &forecast_body(date, 12, "back"),
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let response = send(&app, empty_request(http::Method::GET, "/weatherforecast/1")).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = send(&app, empty_request(http::Method::GET, FORECAST_ROUTE)).await;
        let forecasts: Vec<ForecastResponse> = read_json(response).await;
        assert_eq!(forecasts.len(), 1);

        // Ids are never handed out twice.
        let response = post_forecast(&app, &forecast_body(date, 12, "c")).await;
        assert_eq!(
            response.headers()[http::header::LOCATION],
            "/weatherforecast/3"
        );
    }

    #[tokio::test]
    async fn non_numeric_id_is_a_bad_request() {
        let app = create_test_app();
        let response = send(&app, empty_request(http::Method::GET, "/weatherforecast/abc")).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
