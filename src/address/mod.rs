//! Address normalization: raw member fields to the canonical query string
//! used as both geocoding query and cache key.

mod rewrite;

pub use rewrite::RewriteTable;

/// Keep only the part of a raw street before its first comma, trimmed.
///
/// Floor and door designations ("Hovedgaden 3, 2. tv") confuse the
/// geocoder and are dropped.
pub fn clean_street(raw: &str) -> &str {
    raw.split(',').next().unwrap_or(raw).trim()
}

/// Join a cleaned street and a postal/city string as `"<street>, <city>"`.
pub fn canonical_address(clean_street: &str, city_postal: &str) -> String {
    format!("{}, {}", clean_street, city_postal)
}

/// Full normalization of a street/city pair, rewrite overrides included.
pub fn normalize(street: &str, city_postal: &str, rewrites: &RewriteTable) -> String {
    let canonical = canonical_address(clean_street(street), city_postal);
    rewrites.apply(&canonical).to_string()
}
