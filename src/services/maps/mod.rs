pub mod google;

use async_trait::async_trait;

use crate::errors::ProviderError;

#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Address suggestions for a partially typed location.
    async fn autocomplete(&self, input: &str) -> Result<Vec<String>, ProviderError>;

    /// Formatted address for device coordinates, `NotFound` when there is none.
    async fn reverse_geocode(&self, lat: f64, lng: f64) -> Result<String, ProviderError>;
}
