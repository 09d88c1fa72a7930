use std::path::PathBuf;
use tracing::{debug, info, warn};

use super::Aggregation;
use crate::address::{self, RewriteTable};
use crate::geocode::{GeocodeCache, GeocodeOutcome, Geocoder};
use crate::models::{FailureRecord, MemberEntry, MemberRecord};

/// When the cache is written during a resolution pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum FlushPolicy {
    /// Never during the pass; the caller persists once at the end.
    #[default]
    AtEnd,
    /// Additionally persist to `path` after every `resolves` fresh geocodes.
    Every { resolves: usize, path: PathBuf },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolveStats {
    pub cache_hits: usize,
    pub geocoded: usize,
    pub not_found: usize,
    pub missing_fields: usize,
}

/// Output of a resolution pass.
#[derive(Debug, Clone, Default)]
pub struct Resolution {
    pub aggregation: Aggregation,
    pub failures: Vec<FailureRecord>,
    pub stats: ResolveStats,
}

/// Drives members through normalization, the cache and the geocoder.
pub struct Resolver<'a, G: Geocoder + ?Sized> {
    rewrites: &'a RewriteTable,
    geocoder: &'a G,
    flush: FlushPolicy,
}

impl<'a, G: Geocoder + ?Sized> Resolver<'a, G> {
    pub fn new(rewrites: &'a RewriteTable, geocoder: &'a G) -> Self {
        Self {
            rewrites,
            geocoder,
            flush: FlushPolicy::AtEnd,
        }
    }

    pub fn with_flush_policy(mut self, flush: FlushPolicy) -> Self {
        self.flush = flush;
        self
    }

    /// Resolve every member in order.
    pub async fn resolve_all<'m, I>(&self, members: I, cache: &mut GeocodeCache) -> Resolution
    where
        I: IntoIterator<Item = &'m MemberRecord>,
    {
        self.resolve_all_with(members, cache, |_| {}).await
    }

    /// Like [`Resolver::resolve_all`], calling `on_member` with the running
    /// result after each member (progress reporting).
    pub async fn resolve_all_with<'m, I, F>(
        &self,
        members: I,
        cache: &mut GeocodeCache,
        mut on_member: F,
    ) -> Resolution
    where
        I: IntoIterator<Item = &'m MemberRecord>,
        F: FnMut(&Resolution),
    {
        let mut resolution = Resolution::default();
        for member in members {
            self.resolve_member(member, cache, &mut resolution).await;
            on_member(&resolution);
        }

        info!(
            "Resolved {} members at {} locations ({} cached, {} geocoded, {} failed)",
            resolution.aggregation.member_count(),
            resolution.aggregation.len(),
            resolution.stats.cache_hits,
            resolution.stats.geocoded,
            resolution.failures.len()
        );
        resolution
    }

    /// Resolve a single member into `out`, either as an aggregation entry
    /// or as a failure record.
    async fn resolve_member(
        &self,
        member: &MemberRecord,
        cache: &mut GeocodeCache,
        out: &mut Resolution,
    ) {
        let (street, city) = match (&member.street, &member.city) {
            (Some(street), Some(city)) => (street, city),
            (street, city) => {
                debug!("Missing address fields for '{}'", member.name);
                out.stats.missing_fields += 1;
                out.failures.push(FailureRecord {
                    name: member.name.clone(),
                    address: format!(
                        "{}, {}",
                        street.as_deref().unwrap_or_default(),
                        city.as_deref().unwrap_or_default()
                    ),
                    birthday: member.birthday,
                });
                return;
            }
        };

        let canonical = address::normalize(street, city, self.rewrites);

        let coordinate = match cache.get(&canonical) {
            Some(coordinate) => {
                out.stats.cache_hits += 1;
                coordinate
            }
            None => match self.geocoder.resolve(&canonical).await {
                GeocodeOutcome::Found(coordinate) if coordinate.is_valid() => {
                    cache.put(&canonical, coordinate);
                    out.stats.geocoded += 1;
                    self.maybe_flush(cache, out.stats.geocoded);
                    coordinate
                }
                outcome => {
                    if let GeocodeOutcome::Found(bad) = outcome {
                        warn!("Discarding invalid geocode {} for '{}'", bad, canonical);
                    }
                    out.stats.not_found += 1;
                    out.failures.push(FailureRecord {
                        name: member.name.clone(),
                        address: canonical,
                        birthday: member.birthday,
                    });
                    return;
                }
            },
        };

        out.aggregation.push(
            coordinate,
            MemberEntry {
                name: member.name.clone(),
                address: canonical,
                birthday: member.birthday,
            },
        );
    }

    fn maybe_flush(&self, cache: &GeocodeCache, geocoded: usize) {
        if let FlushPolicy::Every { resolves, path } = &self.flush {
            if *resolves > 0 && geocoded % resolves == 0 {
                // A failed intermediate flush is not fatal; the final persist
                // still runs.
                if let Err(e) = cache.persist(path) {
                    warn!("Intermediate cache flush failed: {}", e);
                }
            }
        }
    }
}

/// Resolve all members with the default flush policy.
pub async fn resolve_all<G: Geocoder + ?Sized>(
    members: &[MemberRecord],
    rewrites: &RewriteTable,
    cache: &mut GeocodeCache,
    geocoder: &G,
) -> Resolution {
    Resolver::new(rewrites, geocoder)
        .resolve_all(members, cache)
        .await
}
