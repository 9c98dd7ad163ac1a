use chrono::{DateTime, Utc};
use reqwest::Client;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::config::ExchangeApiConfig;
use crate::exchange::repository::{SnapshotRepository, SnapshotRepositoryError};
use crate::integration::{IntegrationError, decode_json};

pub mod repository;
pub mod routes;

const SERVICE: &str = "currency exchange API";

/// A fetched rate as it was stored, one row per currency and fetch.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeRateSnapshot {
    pub id: i64,
    pub currency: String,
    pub rate: Decimal,
    pub retrieved_at: DateTime<Utc>,
}

/// Rates of every known currency against `base`. Empty when the exchange
/// API could not be reached.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct ExchangeRates {
    pub base: String,
    pub rates: BTreeMap<String, Decimal>,
}

#[derive(Debug, Deserialize)]
struct LatestRatesResponse {
    result: String,
    #[serde(default)]
    base_code: Option<String>,
    #[serde(default)]
    rates: BTreeMap<String, Decimal>,
    #[serde(rename = "error-type", default)]
    error_type: Option<String>,
}

impl TryFrom<LatestRatesResponse> for ExchangeRates {
    type Error = IntegrationError;

    fn try_from(response: LatestRatesResponse) -> Result<Self, Self::Error> {
        if response.result != "success" {
            return Err(IntegrationError::Rejected {
                service: SERVICE,
                reason: response
                    .error_type
                    .unwrap_or_else(|| format!("result was '{}'", response.result)),
            });
        }
        Ok(ExchangeRates {
            base: response.base_code.unwrap_or_default(),
            rates: response.rates,
        })
    }
}

/// Accept three-letter currency codes in any case, answer in upper case.
pub fn normalize_currency_code(code: &str) -> Option<String> {
    let code = code.trim();
    if code.len() == 3 && code.chars().all(|c| c.is_ascii_alphabetic()) {
        Some(code.to_ascii_uppercase())
    } else {
        None
    }
}

#[derive(Debug, Clone)]
pub struct ExchangeClient {
    config: ExchangeApiConfig,
    http: Client,
}

impl ExchangeClient {
    pub fn new(config: ExchangeApiConfig, http: Client) -> ExchangeClient {
        ExchangeClient { config, http }
    }

    fn latest_url(&self, base: &str) -> String {
        let base_url = self.config.base_url.trim_end_matches('/');
        match &self.config.api_key {
            Some(api_key) => format!("{base_url}/v6/{api_key}/latest/{base}"),
            None => format!("{base_url}/v6/latest/{base}"),
        }
    }

    /// One request for the latest rates against `base`.
    pub async fn fetch_latest(&self, base: &str) -> Result<ExchangeRates, IntegrationError> {
        let url = self.latest_url(base);
        log::debug!("Fetching {} exchange rates", base);
        let response =
            self.http
                .get(url)
                .send()
                .await
                .map_err(|source| IntegrationError::request(SERVICE, source))?;
        let parsed: LatestRatesResponse = decode_json(SERVICE, response).await?;
        parsed.try_into()
    }
}

/// Append one snapshot per fetched rate, all stamped with `retrieved_at`.
///
/// With a `threshold`, a currency whose rate moved less than it since that
/// currency's latest snapshot is skipped.
pub async fn record_snapshots(
    repository: &SnapshotRepository,
    rates: &ExchangeRates,
    threshold: Option<Decimal>,
    retrieved_at: DateTime<Utc>,
) -> Result<Vec<ExchangeRateSnapshot>, SnapshotRepositoryError> {
    let mut stored = Vec::new();
    for (currency, rate) in &rates.rates {
        if let Some(threshold) = threshold {
            if let Some(latest) = repository.latest(currency).await? {
                if (*rate - latest.rate).abs() < threshold {
                    log::debug!(
                        "Skipping {} snapshot, {} is within {} of {}",
                        currency,
                        rate,
                        threshold,
                        latest.rate
                    );
                    continue;
                }
            }
        }
        stored.push(repository.append(currency, *rate, retrieved_at).await?);
    }
    log::info!(
        "Stored {} of {} {} exchange rates",
        stored.len(),
        rates.rates.len(),
        rates.base
    );
    Ok(stored)
}
