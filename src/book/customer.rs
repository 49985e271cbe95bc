//! Customer records and the editable contact form.

use super::photo::{self, PhotoError, MAX_PHOTOS, MAX_PHOTO_BYTES};
use crate::location::{Coordinate, ResolutionOutcome, ResolutionRequest};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Stored in place of coordinates when none were captured.
pub const NO_COORDINATES: &str = "Not provided";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Photo {
    pub id: i64,
    pub name: String,
    /// `data:image/...;base64,...`
    pub data_url: String,
    #[serde(default)]
    pub uploaded: Option<DateTime<Utc>>,
}

/// One saved customer, in the book's JSON layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: i64,
    pub name: String,
    pub mobile: String,
    pub address: String,
    /// Canonical `"lat, lng"` text or [`NO_COORDINATES`].
    pub coordinates: String,
    #[serde(default)]
    pub map_url: Option<String>,
    #[serde(default)]
    pub photos: Vec<Photo>,
    #[serde(default)]
    pub created: Option<DateTime<Utc>>,
}

impl Customer {
    pub fn coordinate(&self) -> Option<Coordinate> {
        self.coordinates.parse().ok()
    }

    /// `https://maps.google.com/?q=...` for this customer, if located.
    pub fn map_link(&self) -> Option<String> {
        self.coordinate().map(|c| c.map_url())
    }
}

/// The record currently being edited.
///
/// Passed explicitly into and out of the resolution flow instead of living in
/// shared state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContactForm {
    pub name: String,
    pub mobile: String,
    pub address: String,
    pub coordinates: String,
    pub map_url: String,
    #[serde(default)]
    pub photos: Vec<Photo>,
}

impl ContactForm {
    /// Pre-fill the form from a saved customer.
    pub fn from_customer(c: &Customer) -> Self {
        Self {
            name: c.name.clone(),
            mobile: c.mobile.clone(),
            address: c.address.clone(),
            coordinates: c.coordinates.clone(),
            map_url: c.map_url.clone().unwrap_or_default(),
            photos: c.photos.clone(),
        }
    }

    /// Populate coordinate and address fields from a pipeline result.
    ///
    /// A located outcome without an address gets a placeholder address. A failed
    /// outcome leaves the form untouched. Returns whether anything changed.
    pub fn apply_outcome(&mut self, request: &ResolutionRequest, outcome: &ResolutionOutcome) -> bool {
        let placeholder = match request {
            ResolutionRequest::Url(_) => "Location at",
            ResolutionRequest::DeviceLocation(_) => "My Location at",
        };
        if !self.fill_location(outcome, placeholder) {
            return false;
        }
        if let ResolutionRequest::Url(raw) = request {
            self.map_url = raw.trim().to_string();
        }
        true
    }

    /// Same as [`apply_outcome`](Self::apply_outcome) for a coordinate typed by
    /// hand: the placeholder reads like a link result, not a device reading.
    pub fn apply_manual_outcome(&mut self, outcome: &ResolutionOutcome) -> bool {
        self.fill_location(outcome, "Location at")
    }

    fn fill_location(&mut self, outcome: &ResolutionOutcome, placeholder: &str) -> bool {
        let Some(coord) = outcome.coordinate else {
            return false;
        };
        self.coordinates = coord.to_string();
        self.address = match &outcome.address {
            Some(address) => address.clone(),
            None => format!("{} {}", placeholder, coord),
        };
        true
    }

    /// Attach an image, enforcing the count, size and MIME limits.
    pub fn attach_photo(&mut self, name: &str, mime: &str, bytes: &[u8]) -> Result<&Photo, PhotoError> {
        if self.photos.len() >= MAX_PHOTOS {
            return Err(PhotoError::TooMany);
        }
        if bytes.len() > MAX_PHOTO_BYTES {
            return Err(PhotoError::TooLarge(name.to_string()));
        }
        if !mime.starts_with("image/") {
            return Err(PhotoError::NotImage(name.to_string()));
        }
        let now = Utc::now();
        let max = self.photos.iter().map(|p| p.id).max().unwrap_or(0);
        self.photos.push(Photo {
            id: now.timestamp_millis().max(max + 1),
            name: name.to_string(),
            data_url: photo::to_data_url(mime, bytes),
            uploaded: Some(now),
        });
        Ok(&self.photos[self.photos.len() - 1])
    }

    /// Attach an image sent as a `data:` URL.
    pub fn attach_data_url(&mut self, name: &str, data_url: &str) -> Result<&Photo, PhotoError> {
        let (mime, bytes) = photo::from_data_url(name, data_url)?;
        self.attach_photo(name, &mime, &bytes)
    }

    pub fn remove_photo(&mut self, id: i64) -> Result<Photo, PhotoError> {
        let idx = self
            .photos
            .iter()
            .position(|p| p.id == id)
            .ok_or(PhotoError::NotFound(id))?;
        Ok(self.photos.remove(idx))
    }

    /// Check required fields and the 10-digit mobile number.
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() || self.mobile.trim().is_empty() || self.address.trim().is_empty() {
            return Err("Please fill all required fields".into());
        }
        let mobile = self.mobile.trim();
        if mobile.len() != 10 || !mobile.chars().all(|c| c.is_ascii_digit()) {
            return Err("Please enter valid 10-digit number".into());
        }
        Ok(())
    }

    /// Build the stored record. Missing coordinates become [`NO_COORDINATES`];
    /// a missing map URL is derived from the coordinates when possible.
    pub fn into_customer(self, id: i64, created: DateTime<Utc>) -> Customer {
        let coordinates = match self.coordinates.trim() {
            "" => NO_COORDINATES.to_string(),
            c => c.to_string(),
        };
        let map_url = match self.map_url.trim() {
            "" => coordinates
                .parse::<Coordinate>()
                .ok()
                .map(|c| c.map_url()),
            u => Some(u.to_string()),
        };
        Customer {
            id,
            name: self.name.trim().to_string(),
            mobile: self.mobile.trim().to_string(),
            address: self.address.trim().to_string(),
            coordinates,
            map_url,
            photos: self.photos,
            created: Some(created),
        }
    }
}
