//! Address resolution: member records in, coordinate-keyed aggregation and
//! failure list out.

mod aggregation;
mod resolver;

pub use aggregation::Aggregation;
pub use resolver::{resolve_all, FlushPolicy, Resolution, ResolveStats, Resolver};
