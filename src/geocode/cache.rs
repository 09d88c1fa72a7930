//! Durable canonical-address -> coordinate store.
//!
//! Loaded once before the resolution pass and persisted once after it.
//! Only successful geocodes are stored, so a failed address is retried on
//! every run until it is rewritten or the service starts finding it.

use hashbrown::HashMap;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{info, warn};

use crate::error::Result;
use crate::models::Coordinate;
use crate::store;

#[derive(Debug, Clone, Default)]
pub struct GeocodeCache {
    entries: HashMap<String, Coordinate>,
}

impl GeocodeCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the cache file. A missing file gives an empty cache; a corrupt
    /// one is an error, there is no recovery.
    pub fn load(path: &Path) -> Result<Self> {
        let raw: Option<BTreeMap<String, (f64, f64)>> = store::read_json_if_exists(path)?;

        match raw {
            Some(raw) => {
                let entries: HashMap<String, Coordinate> = raw
                    .into_iter()
                    .map(|(address, pair)| (address, Coordinate::from(pair)))
                    .collect();
                info!(
                    "Loaded {} cached geocodes from {}",
                    entries.len(),
                    path.display()
                );
                Ok(Self { entries })
            }
            None => {
                info!("No geocode cache at {}, starting empty", path.display());
                Ok(Self::default())
            }
        }
    }

    pub fn get(&self, address: &str) -> Option<Coordinate> {
        self.entries.get(address).copied()
    }

    /// Upsert a successful geocode. Non-finite or out-of-range coordinates
    /// are rejected, since they would not load back from the cache file.
    /// Storing the same value again is a no-op; a conflicting value for an
    /// existing key is ignored so an entry never changes within a run.
    /// Returns true if a new entry was added.
    pub fn put(&mut self, address: &str, coordinate: Coordinate) -> bool {
        if !coordinate.is_valid() {
            warn!("Refusing to cache invalid geocode {} for '{}'", coordinate, address);
            return false;
        }

        match self.entries.get(address) {
            Some(existing) if *existing == coordinate => false,
            Some(existing) => {
                warn!(
                    "Ignoring conflicting geocode for '{}': cached {}, got {}",
                    address, existing, coordinate
                );
                false
            }
            None => {
                self.entries.insert(address.to_string(), coordinate);
                true
            }
        }
    }

    /// Write the whole cache to `path`, replacing the previous file.
    pub fn persist(&self, path: &Path) -> Result<()> {
        let sorted: BTreeMap<&str, (f64, f64)> = self
            .entries
            .iter()
            .map(|(address, coordinate)| (address.as_str(), (*coordinate).into()))
            .collect();

        store::write_json(path, &sorted)?;
        info!(
            "Saved {} cached geocodes to {}",
            sorted.len(),
            path.display()
        );
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(String, Coordinate)> for GeocodeCache {
    fn from_iter<I: IntoIterator<Item = (String, Coordinate)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}
