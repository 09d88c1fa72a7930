//! Memberatlas - address resolution and layer classification for a
//! membership map.
//!
//! Member addresses are normalized, looked up in a persistent geocode cache
//! and, on a miss, resolved through a rate-limited geocoding service. The
//! resolved members are grouped by coordinate and split into a base layer
//! plus named overlay groups for the map renderer.

pub mod address;
pub mod error;
pub mod geocode;
pub mod groups;
pub mod models;
pub mod pipeline;
pub mod report;
mod store;

pub use error::{Error, Result};
pub use models::{Coordinate, FailureRecord, MemberEntry, MemberRecord};
