//! Field-by-field conversions between the storage, domain and wire shapes of
//! a forecast.

use crate::forecast::repository::{ForecastRecord, NewForecastRecord};
use crate::forecast::{Forecast, ForecastId, ForecastRequest, ForecastResponse, NewForecast};

impl From<ForecastRecord> for Forecast {
    fn from(record: ForecastRecord) -> Self {
        Forecast {
            id: record.id,
            date: record.date,
            temperature_c: record.temperature_c,
            summary: record.summary,
        }
    }
}

impl From<Forecast> for ForecastRecord {
    fn from(forecast: Forecast) -> Self {
        ForecastRecord {
            id: forecast.id,
            date: forecast.date,
            temperature_c: forecast.temperature_c,
            summary: forecast.summary,
        }
    }
}

impl From<NewForecast> for NewForecastRecord {
    fn from(forecast: NewForecast) -> Self {
        NewForecastRecord {
            date: forecast.date,
            temperature_c: forecast.temperature_c,
            summary: forecast.summary,
        }
    }
}

impl From<ForecastRequest> for NewForecast {
    fn from(request: ForecastRequest) -> Self {
        NewForecast {
            date: request.date,
            temperature_c: request.temperature_c,
            summary: request.summary,
        }
    }
}

impl ForecastRequest {
    /// The forecast that replaces the one stored under `id`.
    pub fn into_forecast(self, id: ForecastId) -> Forecast {
        Forecast {
            id,
            date: self.date,
            temperature_c: self.temperature_c,
            summary: self.summary,
        }
    }
}

impl From<Forecast> for ForecastResponse {
    fn from(forecast: Forecast) -> Self {
        ForecastResponse {
            id: forecast.id,
            date: forecast.date,
            temperature_c: forecast.temperature_c,
            summary: forecast.summary,
        }
    }
}
