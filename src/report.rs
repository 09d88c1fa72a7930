//! Resolver output handed to the map renderer.

use serde::Serialize;
use std::path::Path;
use tracing::info;

use crate::error::Result;
use crate::groups::{Classification, GroupLayer, Marker, Unmatched};
use crate::models::{Coordinate, FailureRecord};
use crate::store;

/// Everything the renderer needs to draw the membership map.
#[derive(Debug, Clone, Serialize)]
pub struct MapReport {
    pub title: String,
    /// Initial map center
    pub center: Coordinate,
    pub base: Vec<Marker>,
    pub groups: Vec<GroupLayer>,
    /// Members that could not be placed on the map
    pub failures: Vec<FailureRecord>,
    /// Group names that were listed but never matched
    pub unmatched: Vec<Unmatched>,
}

impl MapReport {
    pub fn new(
        title: impl Into<String>,
        center: Coordinate,
        classification: Classification,
        failures: Vec<FailureRecord>,
    ) -> Self {
        Self {
            title: title.into(),
            center,
            base: classification.base,
            groups: classification.groups,
            failures,
            unmatched: classification.unmatched,
        }
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        store::write_json(path, self)?;
        info!("Map report saved to {}", path.display());
        Ok(())
    }
}
