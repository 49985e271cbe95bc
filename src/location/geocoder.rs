//! Reverse geocoding over an ordered provider list.
//!
//! Flow:  provider 1 → provider 2 → … → no address

use super::providers::GeocodeProvider;
use super::types::{Coordinate, ResolveError};

pub struct ReverseGeocoder {
    providers: Vec<Box<dyn GeocodeProvider>>,
}

impl ReverseGeocoder {
    pub fn new(providers: Vec<Box<dyn GeocodeProvider>>) -> Self {
        Self { providers }
    }

    pub fn provider_names(&self) -> Vec<&'static str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    /// Query providers strictly in order, one at a time. A failed provider is
    /// skipped immediately.
    pub async fn try_reverse_geocode(&self, coord: Coordinate) -> Result<String, ResolveError> {
        for provider in &self.providers {
            match provider.reverse(coord).await {
                Ok(address) => {
                    tracing::info!(provider = provider.name(), %coord, "address resolved");
                    return Ok(address);
                }
                Err(e) => {
                    tracing::warn!(provider = provider.name(), %coord, error = %e, "reverse geocoding failed");
                }
            }
        }
        Err(ResolveError::NoGeocodeMatch)
    }

    /// Address for `coord`, or `None` when every provider failed.
    pub async fn reverse_geocode(&self, coord: Coordinate) -> Option<String> {
        self.try_reverse_geocode(coord).await.ok()
    }
}
