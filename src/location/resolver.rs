//! Location pipeline: orchestrates the resolution stages.
//!
//! URL flow:     short-link expansion (if shortener) → pattern extraction → reverse geocoding
//! Device flow:  reverse geocoding
//!
//! Stage errors never escape: they are folded into [`ResolutionOutcome::status`].

use super::geocoder::ReverseGeocoder;
use super::http::{HttpFetch, UreqFetcher};
use super::patterns;
use super::providers::{AllOriginsProxy, BigDataCloud, GeocodeProvider, LinkExpander, Nominatim, UnshortenMe};
use super::shortlink::ShortLinkResolver;
use super::types::{Coordinate, ResolutionOutcome, ResolutionRequest, ResolveError, TransportError};
use crate::config::{ExpanderSpec, GeocoderSpec, PipelineConfig};
use std::sync::Arc;
use std::time::Duration;

/// The resolution pipeline with its provider strategy lists.
pub struct LocationPipeline {
    short_links: ShortLinkResolver,
    geocoder: ReverseGeocoder,
}

impl LocationPipeline {
    pub fn new(short_links: ShortLinkResolver, geocoder: ReverseGeocoder) -> Self {
        Self { short_links, geocoder }
    }

    /// Build the pipeline over the real network transport.
    pub fn from_config(config: &PipelineConfig) -> Result<Self, TransportError> {
        let http = Arc::new(UreqFetcher::new(
            &config.user_agent,
            Duration::from_secs(config.timeout_secs),
        ));
        Self::with_transport(config, http)
    }

    /// Build the pipeline over any transport (tests inject a scripted one).
    pub fn with_transport(config: &PipelineConfig, http: Arc<dyn HttpFetch>) -> Result<Self, TransportError> {
        let expanders = config
            .expanders
            .iter()
            .map(|spec| -> Result<Box<dyn LinkExpander>, TransportError> {
                let expander: Box<dyn LinkExpander> = match spec {
                    ExpanderSpec::UnshortenMe { endpoint } => Box::new(UnshortenMe::new(
                        http.clone(),
                        endpoint.as_deref().unwrap_or(UnshortenMe::DEFAULT_ENDPOINT),
                    )?),
                    ExpanderSpec::AllOrigins { endpoint } => Box::new(AllOriginsProxy::new(
                        http.clone(),
                        endpoint.as_deref().unwrap_or(AllOriginsProxy::DEFAULT_ENDPOINT),
                    )?),
                };
                Ok(expander)
            })
            .collect::<Result<Vec<_>, _>>()?;

        let geocoders = config
            .geocoders
            .iter()
            .map(|spec| -> Result<Box<dyn GeocodeProvider>, TransportError> {
                let provider: Box<dyn GeocodeProvider> = match spec {
                    GeocoderSpec::Nominatim { endpoint } => Box::new(Nominatim::new(
                        http.clone(),
                        endpoint.as_deref().unwrap_or(Nominatim::DEFAULT_ENDPOINT),
                    )?),
                    GeocoderSpec::BigDataCloud { endpoint } => Box::new(BigDataCloud::new(
                        http.clone(),
                        endpoint.as_deref().unwrap_or(BigDataCloud::DEFAULT_ENDPOINT),
                    )?),
                };
                Ok(provider)
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self::new(
            ShortLinkResolver::new(config.shortener_domains.clone(), expanders),
            ReverseGeocoder::new(geocoders),
        ))
    }

    pub fn short_links(&self) -> &ShortLinkResolver {
        &self.short_links
    }

    pub fn geocoder(&self) -> &ReverseGeocoder {
        &self.geocoder
    }

    /// Run one independent resolution.
    pub async fn resolve(&self, request: &ResolutionRequest) -> ResolutionOutcome {
        match request {
            ResolutionRequest::Url(raw) => self.resolve_url(raw).await,
            ResolutionRequest::DeviceLocation(coord) => self.locate(*coord).await,
        }
    }

    /// Expand-if-short, extract, then geocode.
    pub async fn resolve_url(&self, raw: &str) -> ResolutionOutcome {
        match self.coordinate_for(raw).await {
            Ok(coord) => self.locate(coord).await,
            Err(e) => {
                tracing::info!(url = raw, error = %e, "no coordinate");
                ResolutionOutcome::failure()
            }
        }
    }

    /// Geocode a coordinate that is already known.
    pub async fn locate(&self, coord: Coordinate) -> ResolutionOutcome {
        let address = match self.geocoder.try_reverse_geocode(coord).await {
            Ok(address) => Some(address),
            Err(e) => {
                tracing::info!(%coord, error = %e, "coordinate without address");
                None
            }
        };
        ResolutionOutcome::located(coord, address)
    }

    async fn coordinate_for(&self, raw: &str) -> Result<Coordinate, ResolveError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(ResolveError::NoCoordinateMatch);
        }
        let target = if self.short_links.is_short_link(raw) {
            self.short_links.expand(raw).await
        } else {
            raw.to_string()
        };
        patterns::extract(&target).ok_or(ResolveError::NoCoordinateMatch)
    }
}

#[cfg(test)]
mod tests {
    use super::super::http::testing::ScriptedHttp;
    use super::super::types::ResolutionStatus;
    use super::*;

    const NOMINATIM: &str = "https://nominatim.openstreetmap.org/";
    const BDC: &str = "https://api.bigdatacloud.net/";
    const UNSHORTEN: &str = "https://unshorten.me/";
    const ALLORIGINS: &str = "https://api.allorigins.win/";

    fn pipeline(http: Arc<ScriptedHttp>) -> LocationPipeline {
        LocationPipeline::with_transport(&PipelineConfig::default(), http).unwrap()
    }

    fn geocoders_ok(http: ScriptedHttp) -> ScriptedHttp {
        http.reply(NOMINATIM, 200, r#"{"display_name":"Jabalpur, Madhya Pradesh, India"}"#)
            .reply(BDC, 200, r#"{"city":"Jabalpur","principalSubdivision":"Madhya Pradesh","countryName":"India"}"#)
    }

    fn geocoders_down(http: ScriptedHttp) -> ScriptedHttp {
        http.fail(NOMINATIM).fail(BDC)
    }

    #[tokio::test]
    async fn test_url_success() {
        let http = Arc::new(geocoders_ok(ScriptedHttp::new()));
        let p = pipeline(http.clone());
        let outcome = p
            .resolve(&ResolutionRequest::Url("https://maps.google.com/?q=23.153710,79.753135".into()))
            .await;
        assert_eq!(outcome.status, ResolutionStatus::Success);
        assert_eq!(outcome.coordinate, Coordinate::new(23.15371, 79.753135));
        assert_eq!(outcome.address.as_deref(), Some("Jabalpur, Madhya Pradesh, India"));
        // not a short link: no expansion request
        assert!(http.requests().iter().all(|u| !u.starts_with(UNSHORTEN)));
    }

    #[tokio::test]
    async fn test_url_without_pattern_fails() {
        let http = Arc::new(geocoders_ok(ScriptedHttp::new()));
        let p = pipeline(http.clone());
        let outcome = p
            .resolve(&ResolutionRequest::Url("https://example.com/contact".into()))
            .await;
        assert_eq!(outcome, ResolutionOutcome::failure());
        assert!(http.requests().is_empty());
    }

    #[tokio::test]
    async fn test_empty_url_fails() {
        let p = pipeline(Arc::new(ScriptedHttp::new()));
        let outcome = p.resolve(&ResolutionRequest::Url("   ".into())).await;
        assert_eq!(outcome.status, ResolutionStatus::Failure);
    }

    #[tokio::test]
    async fn test_geocoders_down_is_partial() {
        let http = Arc::new(geocoders_down(ScriptedHttp::new()));
        let p = pipeline(http);
        let outcome = p
            .resolve(&ResolutionRequest::Url("https://www.google.com/maps/@23.15371,79.753135,15z".into()))
            .await;
        assert_eq!(outcome.status, ResolutionStatus::PartialSuccess);
        assert!(outcome.coordinate.is_some());
        assert!(outcome.address.is_none());
    }

    #[tokio::test]
    async fn test_short_link_expanded_then_extracted() {
        let http = Arc::new(geocoders_ok(ScriptedHttp::new()).reply(
            UNSHORTEN,
            200,
            "https://www.google.com/maps/place/Shop/@23.15371,79.753135,17z",
        ));
        let p = pipeline(http.clone());
        let outcome = p
            .resolve(&ResolutionRequest::Url("https://maps.app.goo.gl/AbCd".into()))
            .await;
        assert_eq!(outcome.status, ResolutionStatus::Success);
        assert_eq!(outcome.coordinate.unwrap().to_string(), "23.153710, 79.753135");
        assert!(http.requests()[0].starts_with(UNSHORTEN));
    }

    #[tokio::test]
    async fn test_short_link_unexpandable_fails_at_extraction() {
        let http = Arc::new(geocoders_ok(ScriptedHttp::new()).fail(UNSHORTEN).fail(ALLORIGINS));
        let p = pipeline(http.clone());
        let outcome = p
            .resolve(&ResolutionRequest::Url("https://bit.ly/3xyz".into()))
            .await;
        assert_eq!(outcome.status, ResolutionStatus::Failure);
        assert_eq!(http.requests().len(), 2);
    }

    #[tokio::test]
    async fn test_short_link_with_embedded_coordinate_survives_failed_expansion() {
        let http = Arc::new(geocoders_ok(ScriptedHttp::new()).fail(UNSHORTEN).fail(ALLORIGINS));
        let p = pipeline(http);
        let outcome = p
            .resolve(&ResolutionRequest::Url("https://tinyurl.com/x?q=10.5,20.25".into()))
            .await;
        assert_eq!(outcome.status, ResolutionStatus::Success);
        assert_eq!(outcome.coordinate.unwrap().to_string(), "10.500000, 20.250000");
    }

    #[tokio::test]
    async fn test_device_location_skips_extraction() {
        let http = Arc::new(geocoders_ok(ScriptedHttp::new()));
        let p = pipeline(http.clone());
        let coord = Coordinate::new(23.15371, 79.753135).unwrap();
        let outcome = p.resolve(&ResolutionRequest::DeviceLocation(coord)).await;
        assert_eq!(outcome.status, ResolutionStatus::Success);
        assert_eq!(outcome.coordinate, Some(coord));
        assert!(http.requests()[0].starts_with(NOMINATIM));
    }

    #[tokio::test]
    async fn test_device_location_partial() {
        let p = pipeline(Arc::new(geocoders_down(ScriptedHttp::new())));
        let coord = Coordinate::new(-33.8688, 151.2093).unwrap();
        let outcome = p.resolve(&ResolutionRequest::DeviceLocation(coord)).await;
        assert_eq!(outcome, ResolutionOutcome::located(coord, None));
    }

    #[test]
    fn test_default_strategy_order() {
        let p = pipeline(Arc::new(ScriptedHttp::new()));
        assert_eq!(p.short_links().expander_names(), vec!["unshorten.me", "allorigins"]);
        assert_eq!(p.geocoder().provider_names(), vec!["nominatim", "bigdatacloud"]);
    }

    #[test]
    fn test_custom_strategy_order() {
        let config = PipelineConfig {
            expanders: vec![ExpanderSpec::AllOrigins { endpoint: None }],
            geocoders: vec![
                GeocoderSpec::BigDataCloud { endpoint: None },
                GeocoderSpec::Nominatim { endpoint: Some("http://localhost:8080/reverse".into()) },
            ],
            ..PipelineConfig::default()
        };
        let p = LocationPipeline::with_transport(&config, Arc::new(ScriptedHttp::new())).unwrap();
        assert_eq!(p.short_links().expander_names(), vec!["allorigins"]);
        assert_eq!(p.geocoder().provider_names(), vec!["bigdatacloud", "nominatim"]);
    }

    #[test]
    fn test_bad_endpoint_rejected() {
        let config = PipelineConfig {
            geocoders: vec![GeocoderSpec::Nominatim { endpoint: Some("::nope".into()) }],
            ..PipelineConfig::default()
        };
        assert!(LocationPipeline::with_transport(&config, Arc::new(ScriptedHttp::new())).is_err());
    }
}
