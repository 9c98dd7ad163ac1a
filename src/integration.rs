use log::warn;
use reqwest::{Response, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

const MAX_ERROR_BODY_LEN: usize = 200;

/// Failure of a single outbound call to an external API.
#[derive(Debug, Error)]
pub enum IntegrationError {
    #[error("{service} is not configured: {reason}")]
    NotConfigured {
        service: &'static str,
        reason: String,
    },
    #[error("Request to {service} failed: {source}")]
    Request {
        service: &'static str,
        source: reqwest::Error,
    },
    #[error("{service} responded with status {status}: {body}")]
    Status {
        service: &'static str,
        status: StatusCode,
        body: String,
    },
    #[error("Could not decode {service} response: {source}")]
    Decode {
        service: &'static str,
        source: serde_json::Error,
    },
    #[error("{service} rejected the request: {reason}")]
    Rejected {
        service: &'static str,
        reason: String,
    },
}

/// What a route does when an outbound call fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Log the failure and answer with the empty default value.
    #[default]
    Default,
    /// Surface the failure to the client as a 502.
    Error,
}

impl IntegrationError {
    /// A transport failure. The request URL may carry an API key, so it is
    /// stripped before the error can reach a log line or a client.
    pub fn request(service: &'static str, source: reqwest::Error) -> IntegrationError {
        IntegrationError::Request {
            service,
            source: source.without_url(),
        }
    }
}

impl FailurePolicy {
    pub fn resolve<T: Default>(
        self,
        result: Result<T, IntegrationError>,
    ) -> Result<T, IntegrationError> {
        match (self, result) {
            (_, Ok(value)) => Ok(value),
            (FailurePolicy::Default, Err(err)) => {
                warn!("{}, answering with default value", err);
                Ok(T::default())
            }
            (FailurePolicy::Error, Err(err)) => Err(err),
        }
    }
}

/// Read a response body and decode it as JSON, turning non-success statuses
/// into [`IntegrationError::Status`].
pub async fn decode_json<T: DeserializeOwned>(
    service: &'static str,
    response: Response,
) -> Result<T, IntegrationError> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|source| IntegrationError::request(service, source))?;
    if !status.is_success() {
        return Err(IntegrationError::Status {
            service,
            status,
            body: truncate_body(&body),
        });
    }
    serde_json::from_str(&body).map_err(|source| IntegrationError::Decode { service, source })
}

fn truncate_body(body: &str) -> String {
    match body.char_indices().nth(MAX_ERROR_BODY_LEN) {
        Some((index, _)) => format!("{}...", &body[..index]),
        None => body.to_string(),
    }
}
