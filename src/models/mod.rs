//! Core data models for the membership map.

pub mod coordinate;
pub mod member;

pub use coordinate::Coordinate;
pub use member::{FailureRecord, MemberEntry, MemberRecord};
