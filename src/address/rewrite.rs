use std::collections::{HashMap, HashSet};
use std::path::Path;
use tracing::{info, warn};

use crate::error::Result;
use crate::store;

/// Manual corrections for addresses the geocoder gets wrong or cannot
/// find: canonical address -> corrected canonical address.
///
/// Chains (`A -> B`, `B -> C`) are resolved when the table is built, so a
/// single lookup always lands on a final address and applying the table to
/// its own output changes nothing. Entries that loop back on themselves are
/// dropped.
#[derive(Debug, Clone, Default)]
pub struct RewriteTable {
    replacements: HashMap<String, String>,
}

impl RewriteTable {
    /// Load the table from a JSON object file. A missing file is an empty
    /// table; malformed JSON is an error.
    pub fn load(path: &Path) -> Result<Self> {
        match store::read_json_if_exists::<HashMap<String, String>>(path)? {
            Some(raw) => {
                let table: Self = raw.into_iter().collect();
                info!(
                    "Loaded {} address rewrites from {}",
                    table.len(),
                    path.display()
                );
                Ok(table)
            }
            None => {
                info!("No address rewrites at {}", path.display());
                Ok(Self::default())
            }
        }
    }

    /// Exact-string lookup. Returns the replacement if one exists,
    /// otherwise `canonical` itself.
    pub fn apply<'a>(&'a self, canonical: &'a str) -> &'a str {
        self.replacements
            .get(canonical)
            .map(String::as_str)
            .unwrap_or(canonical)
    }

    pub fn len(&self) -> usize {
        self.replacements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.replacements.is_empty()
    }
}

impl FromIterator<(String, String)> for RewriteTable {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        let raw: HashMap<String, String> = iter.into_iter().collect();
        let mut replacements = HashMap::with_capacity(raw.len());

        for (from, to) in &raw {
            match final_target(&raw, from, to) {
                Some(target) => {
                    replacements.insert(from.clone(), target.to_string());
                }
                None => warn!("Dropping circular address rewrite: {} -> {}", from, to),
            }
        }

        Self { replacements }
    }
}

/// Follow `from -> to -> ...` until an address with no rewrite of its own.
/// `None` if the chain revisits an address.
fn final_target<'a>(
    raw: &'a HashMap<String, String>,
    from: &'a str,
    to: &'a str,
) -> Option<&'a str> {
    let mut seen = HashSet::from([from]);
    let mut target = to;
    loop {
        if !seen.insert(target) {
            return None;
        }
        match raw.get(target) {
            Some(next) => target = next.as_str(),
            None => return Some(target),
        }
    }
}
