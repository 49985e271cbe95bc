//! Network providers: short-link expansion services and reverse geocoders.
//!
//! Each provider issues exactly one GET through the injected [`HttpFetch`] and
//! applies its own success criterion. Providers never retry.

use super::http::HttpFetch;
use super::patterns;
use super::types::{Coordinate, TransportError};
use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use std::sync::{Arc, LazyLock};
use url::Url;

/// Expands a short link into the long URL it points at.
#[async_trait]
pub trait LinkExpander: Send + Sync {
    fn name(&self) -> &'static str;
    async fn expand(&self, short_url: &str) -> Result<String, TransportError>;
}

/// Turns a coordinate into a human-readable address.
#[async_trait]
pub trait GeocodeProvider: Send + Sync {
    fn name(&self) -> &'static str;
    async fn reverse(&self, coord: Coordinate) -> Result<String, TransportError>;
}

fn parse_endpoint(endpoint: &str) -> Result<Url, TransportError> {
    Url::parse(endpoint).map_err(|e| TransportError::InvalidUrl(format!("{}: {}", endpoint, e)))
}

/// An absolute http(s) URL, or `None`.
fn as_web_url(text: &str) -> Option<String> {
    let url = Url::parse(text.trim()).ok()?;
    matches!(url.scheme(), "http" | "https").then(|| url.to_string())
}

// ─── unshorten.me ───────────────────────────────────────────────

/// Marker the expansion service puts in its plain-text body on failure.
const EXPANSION_ERROR_MARKER: &str = "Error";

/// Plain-text expansion service: `GET {endpoint}/{short url}` → long URL.
pub struct UnshortenMe {
    http: Arc<dyn HttpFetch>,
    endpoint: Url,
}

impl UnshortenMe {
    pub const DEFAULT_ENDPOINT: &'static str = "https://unshorten.me/s/";

    pub fn new(http: Arc<dyn HttpFetch>, endpoint: &str) -> Result<Self, TransportError> {
        Ok(Self {
            http,
            endpoint: parse_endpoint(endpoint)?,
        })
    }

    fn request_url(&self, short_url: &str) -> Result<Url, TransportError> {
        let mut url = self.endpoint.clone();
        url.path_segments_mut()
            .map_err(|_| TransportError::InvalidUrl(self.endpoint.to_string()))?
            .pop_if_empty()
            .push(short_url);
        Ok(url)
    }
}

#[async_trait]
impl LinkExpander for UnshortenMe {
    fn name(&self) -> &'static str {
        "unshorten.me"
    }

    async fn expand(&self, short_url: &str) -> Result<String, TransportError> {
        let response = self.http.get(&self.request_url(short_url)?).await?;
        if !response.is_ok() {
            return Err(TransportError::Status(response.status));
        }
        let body = response.body.trim();
        if body.is_empty() || body.contains(EXPANSION_ERROR_MARKER) {
            return Err(TransportError::InvalidResponse("expansion service reported an error".into()));
        }
        as_web_url(body).ok_or_else(|| TransportError::InvalidResponse("body is not a URL".into()))
    }
}

// ─── allorigins proxy ───────────────────────────────────────────

#[derive(Deserialize)]
struct ProxyEnvelope {
    #[serde(default)]
    contents: Option<String>,
}

/// Absolute http(s) URLs inside an HTML or JSON body.
static EMBEDDED_URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"https?://[^\s"'<>\\]+"#).expect("embedded URL regex"));

/// Cross-origin proxy that relays the short link's page body as JSON `contents`.
pub struct AllOriginsProxy {
    http: Arc<dyn HttpFetch>,
    endpoint: Url,
}

impl AllOriginsProxy {
    pub const DEFAULT_ENDPOINT: &'static str = "https://api.allorigins.win/get";

    pub fn new(http: Arc<dyn HttpFetch>, endpoint: &str) -> Result<Self, TransportError> {
        Ok(Self {
            http,
            endpoint: parse_endpoint(endpoint)?,
        })
    }

    /// Accept the relayed contents only when they are a URL, or when the page
    /// embeds a map URL the pattern library can read.
    fn url_from_contents(contents: &str) -> Option<String> {
        if let Some(url) = as_web_url(contents) {
            return Some(url);
        }
        EMBEDDED_URL
            .find_iter(contents)
            .map(|m| m.as_str().replace("&amp;", "&"))
            .find(|candidate| patterns::extract(candidate).is_some())
    }
}

#[async_trait]
impl LinkExpander for AllOriginsProxy {
    fn name(&self) -> &'static str {
        "allorigins"
    }

    async fn expand(&self, short_url: &str) -> Result<String, TransportError> {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut().append_pair("url", short_url);

        let response = self.http.get(&url).await?;
        if !response.is_ok() {
            return Err(TransportError::Status(response.status));
        }
        let envelope: ProxyEnvelope = response.json()?;
        let contents = envelope
            .contents
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| TransportError::InvalidResponse("no contents field".into()))?;

        Self::url_from_contents(&contents)
            .ok_or_else(|| TransportError::InvalidResponse("contents hold no usable URL".into()))
    }
}

// ─── Nominatim reverse geocoding ────────────────────────────────

#[derive(Deserialize)]
struct NominatimReverse {
    #[serde(default)]
    display_name: Option<String>,
}

/// OpenStreetMap Nominatim `/reverse`.
pub struct Nominatim {
    http: Arc<dyn HttpFetch>,
    endpoint: Url,
}

impl Nominatim {
    pub const DEFAULT_ENDPOINT: &'static str = "https://nominatim.openstreetmap.org/reverse";

    pub fn new(http: Arc<dyn HttpFetch>, endpoint: &str) -> Result<Self, TransportError> {
        Ok(Self {
            http,
            endpoint: parse_endpoint(endpoint)?,
        })
    }
}

#[async_trait]
impl GeocodeProvider for Nominatim {
    fn name(&self) -> &'static str {
        "nominatim"
    }

    async fn reverse(&self, coord: Coordinate) -> Result<String, TransportError> {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("format", "json")
            .append_pair("lat", &format!("{:.6}", coord.lat))
            .append_pair("lon", &format!("{:.6}", coord.lon))
            .append_pair("zoom", "18")
            .append_pair("addressdetails", "1");

        let response = self.http.get(&url).await?;
        if !response.is_ok() {
            return Err(TransportError::Status(response.status));
        }
        let r: NominatimReverse = response.json()?;
        r.display_name
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| TransportError::InvalidResponse("no display_name".into()))
    }
}

// ─── BigDataCloud reverse geocoding ─────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct BigDataCloudReverse {
    #[serde(default)]
    city: Option<String>,
    #[serde(default)]
    principal_subdivision: Option<String>,
    #[serde(default)]
    country_name: Option<String>,
}

/// BigDataCloud client-side reverse geocoding. Yields `"city, region, country"`.
pub struct BigDataCloud {
    http: Arc<dyn HttpFetch>,
    endpoint: Url,
}

impl BigDataCloud {
    pub const DEFAULT_ENDPOINT: &'static str =
        "https://api.bigdatacloud.net/data/reverse-geocode-client";

    pub fn new(http: Arc<dyn HttpFetch>, endpoint: &str) -> Result<Self, TransportError> {
        Ok(Self {
            http,
            endpoint: parse_endpoint(endpoint)?,
        })
    }
}

#[async_trait]
impl GeocodeProvider for BigDataCloud {
    fn name(&self) -> &'static str {
        "bigdatacloud"
    }

    async fn reverse(&self, coord: Coordinate) -> Result<String, TransportError> {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("latitude", &format!("{:.6}", coord.lat))
            .append_pair("longitude", &format!("{:.6}", coord.lon))
            .append_pair("localityLanguage", "en");

        let response = self.http.get(&url).await?;
        if !response.is_ok() {
            return Err(TransportError::Status(response.status));
        }
        let r: BigDataCloudReverse = response.json()?;
        let city = r
            .city
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| TransportError::InvalidResponse("no city".into()))?;

        // Empty region or country parts are dropped rather than rendered as ", ,"
        let parts: Vec<String> = [Some(city), r.principal_subdivision, r.country_name]
            .into_iter()
            .flatten()
            .filter(|s| !s.trim().is_empty())
            .collect();
        Ok(parts.join(", "))
    }
}
