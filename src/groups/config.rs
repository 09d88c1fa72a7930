use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::OnceLock;
use tracing::info;

use crate::error::Result;
use crate::store;

/// A named, colored overlay selected by exact member name.
///
/// This is configuration only and never mutated; which names have been
/// claimed during a run is tracked by the classifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchGroup {
    pub name: String,
    pub matches: Vec<String>,
    /// Passed through to the renderer untouched. Optional in the file.
    #[serde(default)]
    pub color: String,
}

impl MatchGroup {
    pub fn new(name: impl Into<String>, color: impl Into<String>, matches: &[&str]) -> Self {
        Self {
            name: name.into(),
            color: color.into(),
            matches: matches.iter().map(|m| collapse_whitespace(m)).collect(),
        }
    }
}

/// Load the groups file: a JSON array of `{name, matches, color}`.
///
/// A missing file means no groups. Whitespace runs inside match names are
/// collapsed to single spaces; case is left alone.
pub fn load_groups(path: &Path) -> Result<Vec<MatchGroup>> {
    let Some(mut groups) = store::read_json_if_exists::<Vec<MatchGroup>>(path)? else {
        info!("No match groups at {}", path.display());
        return Ok(Vec::new());
    };

    for group in &mut groups {
        for name in &mut group.matches {
            *name = collapse_whitespace(name);
        }
    }

    info!(
        "Loaded {} match groups from {}",
        groups.len(),
        path.display()
    );
    Ok(groups)
}

/// Trim and squash internal whitespace runs to a single space.
pub fn collapse_whitespace(s: &str) -> String {
    static WHITESPACE: OnceLock<Regex> = OnceLock::new();
    let re = WHITESPACE.get_or_init(|| Regex::new(r"\s+").unwrap());
    re.replace_all(s.trim(), " ").into_owned()
}
