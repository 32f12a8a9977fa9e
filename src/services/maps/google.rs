use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use serde::Deserialize;

use super::Geocoder;
use crate::errors::ProviderError;
use crate::services::auth::supabase::map_send_error;

const AUTOCOMPLETE_URL: &str = "https://maps.googleapis.com/maps/api/place/autocomplete/json";
const GEOCODE_URL: &str = "https://maps.googleapis.com/maps/api/geocode/json";
const COUNTRY_RESTRICTION: &str = "country:id";

#[derive(Debug, Deserialize)]
struct AutocompleteResponse {
    status: String,
    #[serde(default)]
    predictions: Vec<Prediction>,
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Prediction {
    description: String,
}

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    status: String,
    #[serde(default)]
    results: Vec<GeocodeResult>,
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResult {
    formatted_address: String,
}

pub struct GoogleGeocoder {
    api_key: String,
    client: reqwest::Client,
}

impl GoogleGeocoder {
    pub fn new(api_key: String, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build maps HTTP client")?;
        Ok(Self { api_key, client })
    }
}

fn check_status(status: &str, error_message: Option<String>) -> Result<(), ProviderError> {
    match status {
        "OK" => Ok(()),
        "ZERO_RESULTS" => Err(ProviderError::NotFound),
        "OVER_QUERY_LIMIT" | "UNKNOWN_ERROR" => Err(ProviderError::Connection(
            error_message.unwrap_or_else(|| status.to_string()),
        )),
        _ => Err(ProviderError::Rejected(
            error_message.unwrap_or_else(|| status.to_string()),
        )),
    }
}

#[async_trait]
impl Geocoder for GoogleGeocoder {
    async fn autocomplete(&self, input: &str) -> Result<Vec<String>, ProviderError> {
        let resp: AutocompleteResponse = self
            .client
            .get(AUTOCOMPLETE_URL)
            .query(&[
                ("input", input),
                ("components", COUNTRY_RESTRICTION),
                ("key", self.api_key.as_str()),
            ])
            .send()
            .await
            .map_err(map_send_error)?
            .json()
            .await
            .context("failed to parse autocomplete response")?;

        match check_status(&resp.status, resp.error_message) {
            Ok(()) => Ok(resp.predictions.into_iter().map(|p| p.description).collect()),
            Err(ProviderError::NotFound) => Ok(Vec::new()),
            Err(e) => Err(e),
        }
    }

    async fn reverse_geocode(&self, lat: f64, lng: f64) -> Result<String, ProviderError> {
        let latlng = format!("{lat},{lng}");
        let resp: GeocodeResponse = self
            .client
            .get(GEOCODE_URL)
            .query(&[("latlng", latlng.as_str()), ("key", self.api_key.as_str())])
            .send()
            .await
            .map_err(map_send_error)?
            .json()
            .await
            .context("failed to parse geocode response")?;

        check_status(&resp.status, resp.error_message)?;
        resp.results
            .into_iter()
            .next()
            .map(|r| r.formatted_address)
            .ok_or(ProviderError::NotFound)
    }
}
