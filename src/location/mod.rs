//! Location resolution subsystem for pinbook.
//!
//! Turns pasted map links (including shortened ones) into coordinates, and
//! coordinates into human-readable addresses via reverse geocoding.

pub mod geocoder;
pub mod http;
pub mod patterns;
pub mod providers;
pub mod resolver;
pub mod shortlink;
pub mod types;

pub use geocoder::ReverseGeocoder;
pub use patterns::{extract, PatternLibrary};
pub use resolver::LocationPipeline;
pub use shortlink::ShortLinkResolver;
pub use types::{
    Coordinate, ParseCoordinateError, ResolutionOutcome, ResolutionRequest, ResolutionStatus, ResolveError,
    TransportError,
};
