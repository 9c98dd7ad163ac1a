use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub mod mapping;
pub mod repository;
pub mod routes;
pub mod service;
pub mod validation;

pub type ForecastId = i64;

/// A stored forecast as the rest of the service sees it.
#[derive(Debug, Clone, PartialEq)]
pub struct Forecast {
    pub id: ForecastId,
    pub date: NaiveDate,
    pub temperature_c: i32,
    pub summary: Option<String>,
}

/// A forecast that has not been given an id by storage yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewForecast {
    pub date: NaiveDate,
    pub temperature_c: i32,
    pub summary: Option<String>,
}

/// Body of `POST` and `PUT` on `/weatherforecast`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ForecastRequest {
    pub date: NaiveDate,
    pub temperature_c: i32,
    pub summary: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ForecastResponse {
    pub id: ForecastId,
    pub date: NaiveDate,
    pub temperature_c: i32,
    pub summary: Option<String>,
}
