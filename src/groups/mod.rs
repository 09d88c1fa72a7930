//! Match groups and the classifier that splits resolved members into the
//! base layer and named overlay layers.

mod classifier;
mod config;

pub use classifier::{classify, Classification, GroupLayer, Marker, Unmatched};
pub use config::{collapse_whitespace, load_groups, MatchGroup};
