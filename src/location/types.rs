//! Core types for the location subsystem.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A latitude/longitude pair in signed decimal degrees.
///
/// Both components are always finite. Values built through [`Coordinate::rounded`]
/// carry exactly the precision of their canonical text form.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinate {
    /// Build a coordinate from raw components. Returns `None` for NaN or infinities.
    pub fn new(lat: f64, lon: f64) -> Option<Self> {
        if lat.is_finite() && lon.is_finite() {
            Some(Self { lat, lon })
        } else {
            None
        }
    }

    /// Build a coordinate normalized to six fractional digits.
    pub fn rounded(lat: f64, lon: f64) -> Option<Self> {
        let c = Self::new(lat, lon)?;
        Some(Self {
            lat: round6(c.lat),
            lon: round6(c.lon),
        })
    }

    /// `https://maps.google.com/?q=lat,lng`
    pub fn map_url(&self) -> String {
        format!("https://maps.google.com/?q={:.6},{:.6}", self.lat + 0.0, self.lon + 0.0)
    }

    /// Google Maps search link for the canonical text form.
    pub fn search_url(&self) -> String {
        format!(
            "https://www.google.com/maps/search/?api=1&query={}",
            encode_component(&self.to_string())
        )
    }
}

/// Percent-encode a URI component with `%20` for spaces.
pub fn encode_component(s: &str) -> String {
    // byte_serialize writes '+' for space and "%2B" for a literal plus
    url::form_urlencoded::byte_serialize(s.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}

/// Round through the six-digit text form so the value matches what is displayed.
fn round6(v: f64) -> f64 {
    // Adding 0.0 folds -0.0 into 0.0, so "-0.000000" is never rendered.
    format!("{:.6}", v).parse::<f64>().unwrap_or(v) + 0.0
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6}, {:.6}", self.lat + 0.0, self.lon + 0.0)
    }
}

/// Error returned when coordinate text cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid coordinates: '{0}'. Expected 'lat, lng'")]
pub struct ParseCoordinateError(pub String);

impl FromStr for Coordinate {
    type Err = ParseCoordinateError;

    /// Parse `"23.15371, 79.753135"` (the stored text form) into a rounded coordinate.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseCoordinateError(s.to_string());
        let (lat, lon) = s.split_once(',').ok_or_else(err)?;
        let lat: f64 = lat.trim().parse().map_err(|_| err())?;
        let lon: f64 = lon.trim().parse().map_err(|_| err())?;
        Coordinate::rounded(lat, lon).ok_or_else(err)
    }
}

/// Input to a single pipeline run.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolutionRequest {
    /// A pasted map link, possibly shortened.
    Url(String),
    /// A reading from the device's location service.
    DeviceLocation(Coordinate),
}

/// Overall result status of a pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionStatus {
    /// Coordinate and address were both obtained.
    Success,
    /// A coordinate was obtained but no address could be resolved.
    PartialSuccess,
    /// No coordinate could be obtained.
    Failure,
}

impl fmt::Display for ResolutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::PartialSuccess => write!(f, "partial_success"),
            Self::Failure => write!(f, "failure"),
        }
    }
}

/// The only externally visible result of [`super::LocationPipeline::resolve`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolutionOutcome {
    pub coordinate: Option<Coordinate>,
    pub address: Option<String>,
    pub status: ResolutionStatus,
}

impl ResolutionOutcome {
    pub fn failure() -> Self {
        Self {
            coordinate: None,
            address: None,
            status: ResolutionStatus::Failure,
        }
    }

    /// Outcome for a known coordinate; status follows from whether an address was found.
    pub fn located(coordinate: Coordinate, address: Option<String>) -> Self {
        let status = if address.is_some() {
            ResolutionStatus::Success
        } else {
            ResolutionStatus::PartialSuccess
        };
        Self {
            coordinate: Some(coordinate),
            address,
            status,
        }
    }

    /// User-facing status line for this outcome.
    pub fn status_message(&self) -> &'static str {
        match self.status {
            ResolutionStatus::Success => "Coordinates and address extracted successfully!",
            ResolutionStatus::PartialSuccess => "Coordinates extracted! Address not available.",
            ResolutionStatus::Failure => "Could not find coordinates in this URL",
        }
    }
}

/// Errors raised by the HTTP transport.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("HTTP status {0}")]
    Status(u16),

    #[error("Invalid API response: {0}")]
    InvalidResponse(String),

    #[error("Invalid request URL: {0}")]
    InvalidUrl(String),
}

/// Failure taxonomy of the resolution pipeline.
///
/// None of these reach the caller of `resolve`; they are folded into the
/// outcome status at the orchestrator boundary.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    #[error("No expansion service could expand the short link")]
    NoShortLinkExpansion,

    #[error("No coordinate pattern matched")]
    NoCoordinateMatch,

    #[error("No geocoding provider returned an address")]
    NoGeocodeMatch,

    #[error(transparent)]
    Transport(#[from] TransportError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_canonical_text_form() {
        let c = Coordinate::new(23.15371, 79.753135).unwrap();
        assert_eq!(c.to_string(), "23.153710, 79.753135");
    }

    #[test]
    fn test_rounded_six_digits() {
        let c = Coordinate::rounded(23.1537104999, -79.7531359).unwrap();
        assert_relative_eq!(c.lat, 23.15371);
        assert_relative_eq!(c.lon, -79.753136);
    }

    #[test]
    fn test_negative_zero_renders_positive() {
        let c = Coordinate::rounded(-0.0000001, 0.0).unwrap();
        assert_eq!(c.to_string(), "0.000000, 0.000000");
    }

    #[test]
    fn test_rejects_non_finite() {
        assert!(Coordinate::new(f64::NAN, 1.0).is_none());
        assert!(Coordinate::rounded(1.0, f64::INFINITY).is_none());
    }

    #[test]
    fn test_parse_text_form() {
        let c: Coordinate = "23.15371, 79.753135".parse().unwrap();
        assert_eq!(c.to_string(), "23.153710, 79.753135");
        assert!("abc, 1.0".parse::<Coordinate>().is_err());
        assert!("23.1".parse::<Coordinate>().is_err());
    }

    #[test]
    fn test_map_links() {
        let c = Coordinate::new(23.15371, 79.753135).unwrap();
        assert_eq!(c.map_url(), "https://maps.google.com/?q=23.153710,79.753135");
        assert_eq!(
            c.search_url(),
            "https://www.google.com/maps/search/?api=1&query=23.153710%2C%2079.753135"
        );
    }

    #[test]
    fn test_status_text_matches_json() {
        for status in [ResolutionStatus::Success, ResolutionStatus::PartialSuccess, ResolutionStatus::Failure] {
            let json = serde_json::to_value(status).unwrap();
            assert_eq!(json, status.to_string());
        }
    }

    #[test]
    fn test_outcome_status() {
        let c = Coordinate::new(1.0, 2.0).unwrap();
        assert_eq!(ResolutionOutcome::located(c, Some("X".into())).status, ResolutionStatus::Success);
        assert_eq!(ResolutionOutcome::located(c, None).status, ResolutionStatus::PartialSuccess);
        let f = ResolutionOutcome::failure();
        assert_eq!(f.status, ResolutionStatus::Failure);
        assert!(f.coordinate.is_none() && f.address.is_none());
    }
}
