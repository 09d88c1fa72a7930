//! Geocoding: the persistent coordinate cache and the rate-limited client
//! for the external service.

pub mod cache;
pub mod client;
mod throttle;

pub use cache::GeocodeCache;
pub use client::{GeocodeOutcome, Geocoder, NominatimClient, NominatimConfig};
pub use throttle::Throttle;
