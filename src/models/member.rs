//! Member records flowing into and out of the resolver.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Popup label used when a member has no known birthday.
pub const UNKNOWN_BIRTHDAY: &str = "Fødselsdato ukendt";

/// One row of the membership export. Read-only to the pipeline.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberRecord {
    pub name: String,
    /// Street, house number and optional floor, e.g. "Søborg Hovedgade 1, 2. tv"
    pub street: Option<String>,
    /// Postal code and city, e.g. "2860 Søborg"
    pub city: Option<String>,
    pub birthday: Option<NaiveDate>,
}

impl MemberRecord {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_address(mut self, street: impl Into<String>, city: impl Into<String>) -> Self {
        self.street = Some(street.into());
        self.city = Some(city.into());
        self
    }

    pub fn with_birthday(mut self, birthday: NaiveDate) -> Self {
        self.birthday = Some(birthday);
        self
    }
}

/// A successfully placed member: name, the canonical address that was
/// geocoded, and birthday.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberEntry {
    pub name: String,
    pub address: String,
    pub birthday: Option<NaiveDate>,
}

impl MemberEntry {
    /// Popup fragment for this member: name, address and birthday on
    /// separate lines.
    pub fn popup_line(&self) -> String {
        format!(
            "{}<br>{}<br>{}",
            self.name,
            self.address,
            format_birthday(self.birthday)
        )
    }
}

/// A member that could not be placed on the map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureRecord {
    pub name: String,
    /// Canonical address when one was attempted, otherwise the raw fields
    /// joined as well as possible.
    pub address: String,
    pub birthday: Option<NaiveDate>,
}

impl std::fmt::Display for FailureRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}, {}, {}",
            self.name,
            self.address,
            format_birthday(self.birthday)
        )
    }
}

pub fn format_birthday(birthday: Option<NaiveDate>) -> String {
    birthday
        .map(|d| d.format("%d-%m-%Y").to_string())
        .unwrap_or_else(|| UNKNOWN_BIRTHDAY.to_string())
}
