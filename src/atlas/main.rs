//! Membership map pipeline.
//!
//! Reads the member export, geocodes addresses through the cache and the
//! external service, classifies members into map layers and writes the
//! report consumed by the map renderer.

mod config;
mod members;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use memberatlas::address::RewriteTable;
use memberatlas::geocode::{GeocodeCache, NominatimClient};
use memberatlas::groups::{classify, load_groups};
use memberatlas::pipeline::{FlushPolicy, Resolver};
use memberatlas::report::MapReport;

use crate::config::Config;
use crate::members::load_members;

#[derive(Parser, Debug)]
#[command(name = "atlas")]
#[command(about = "Geocode member addresses and build map layers")]
struct Args {
    /// Member CSV export
    input: PathBuf,

    /// Report file for the map renderer (JSON)
    output: PathBuf,

    /// TOML config file (optional, defaults apply otherwise)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Leading lines to skip before the CSV header
    #[arg(long, default_value = "0")]
    skip_rows: usize,

    /// CSV field delimiter
    #[arg(long, default_value = ",")]
    delimiter: char,

    /// Persist the geocode cache after this many fresh geocodes
    #[arg(long)]
    flush_every: Option<usize>,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(if args.verbose {
            Level::DEBUG
        } else {
            Level::INFO
        })
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = match &args.config {
        Some(path) => Config::load_from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => Config::default(),
    };

    if !args.delimiter.is_ascii() {
        anyhow::bail!("Delimiter must be a single ASCII character");
    }

    info!("Memberatlas");
    info!(
        "Input: {}, geocode cache: {}",
        args.input.display(),
        config.files.cache.display()
    );

    let members = load_members(&args.input, args.skip_rows, args.delimiter as u8)?;
    let rewrites =
        RewriteTable::load(&config.files.rewrites).context("Failed to load address rewrites")?;
    let groups = load_groups(&config.files.groups).context("Failed to load match groups")?;
    let mut cache =
        GeocodeCache::load(&config.files.cache).context("Failed to load geocode cache")?;

    let geocoder = NominatimClient::new(config.geocoder.nominatim())
        .context("Failed to create geocoding client")?;

    let flush = match args.flush_every.or(config.flush_every) {
        Some(resolves) if resolves > 0 => FlushPolicy::Every {
            resolves,
            path: config.files.cache.clone(),
        },
        _ => FlushPolicy::AtEnd,
    };
    let resolver = Resolver::new(&rewrites, &geocoder).with_flush_policy(flush);

    let pb = ProgressBar::new(members.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len}")?
            .progress_chars("#>-"),
    );

    let resolution = resolver
        .resolve_all_with(&members, &mut cache, |_| pb.inc(1))
        .await;
    pb.finish_with_message("Geocoding complete");

    cache
        .persist(&config.files.cache)
        .context("Failed to save geocode cache")?;

    let classification = classify(&resolution.aggregation, &groups);

    if !resolution.failures.is_empty() {
        warn!(
            "{} members could not be placed on the map:",
            resolution.failures.len()
        );
        for failure in &resolution.failures {
            warn!("  {}", failure);
        }
    }
    for unmatched in &classification.unmatched {
        warn!(
            "Group '{}' unmatched: {}",
            unmatched.group,
            unmatched.names.join(", ")
        );
    }

    let report = MapReport::new(
        config.map.title.clone(),
        config.map.center(),
        classification,
        resolution.failures,
    );
    report
        .write(&args.output)
        .context("Failed to write map report")?;

    Ok(())
}
