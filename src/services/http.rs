use crate::config::Config;
use crate::core::{PipguardError, PipguardResult};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;

/// Build the pooled HTTP client used by one service for the duration of a run.
///
/// Every request is bounded by the configured timeout so that a hung service surfaces
/// as "unavailable" instead of stalling the run.
pub fn build_client(config: &Config) -> PipguardResult<Client> {
    Client::builder()
        .timeout(config.request_timeout())
        .connect_timeout(config.connect_timeout())
        .user_agent(format!("pipguard/{}", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(PipguardError::Http)
}

/// GET a JSON document.
///
/// Returns `None` when the resource does not exist, the request fails or times out, or
/// the body does not parse. Callers treat all of these as "data unavailable".
pub async fn get_json<T: DeserializeOwned>(
    client: &Client,
    url: &str,
    headers: &[(&str, &str)],
) -> Option<T> {
    let mut request = client.get(url);
    for (name, value) in headers {
        request = request.header(*name, *value);
    }

    let response = match request.send().await {
        Ok(response) => response,
        Err(e) => {
            tracing::debug!("Request to {} failed: {}", url, e);
            return None;
        }
    };

    if response.status() == StatusCode::NOT_FOUND {
        tracing::debug!("{} not found", url);
        return None;
    }
    if !response.status().is_success() {
        tracing::debug!("Request to {} returned {}", url, response.status());
        return None;
    }

    match response.json::<T>().await {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            tracing::debug!("Failed to parse response from {}: {}", url, e);
            None
        }
    }
}
