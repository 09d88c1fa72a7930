//! Member input from a CSV export of the membership spreadsheet.

use anyhow::{Context, Result};
use chrono::{NaiveDate, NaiveDateTime};
use csv::ReaderBuilder;
use std::borrow::Cow;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

use memberatlas::groups::collapse_whitespace;
use memberatlas::MemberRecord;

const NAME_COLUMN: &str = "Navn";
const STREET_COLUMN: &str = "Vej, husnr. og evt. etage";
const CITY_COLUMN: &str = "Postnummer og by";
const BIRTHDAY_COLUMN: &str = "Fødselsdag";

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d-%m-%Y", "%d.%m.%Y", "%d/%m/%Y"];

/// Load members from `path`. `skip_rows` leading lines (export banners)
/// are dropped before the header row.
///
/// Spreadsheet exports arrive as UTF-8 (with or without a byte order mark)
/// or as Latin-1/Windows-1252; cells that are not valid UTF-8 are read as
/// Latin-1.
pub fn load_members(path: &Path, skip_rows: usize, delimiter: u8) -> Result<Vec<MemberRecord>> {
    info!("Loading members from {}", path.display());

    let bytes = fs::read(path)
        .with_context(|| format!("Failed to read member file: {}", path.display()))?;
    let content = bytes.strip_prefix(UTF8_BOM).unwrap_or(&bytes);
    if std::str::from_utf8(content).is_err() {
        warn!("{} is not valid UTF-8, reading it as Latin-1", path.display());
    }
    let body = skip_lines(content, skip_rows);

    let members = parse_members(body, delimiter)
        .with_context(|| format!("Failed to parse member file: {}", path.display()))?;

    info!("Loaded {} members", members.len());
    Ok(members)
}

fn parse_members(data: &[u8], delimiter: u8) -> Result<Vec<MemberRecord>> {
    let mut csv_reader = ReaderBuilder::new()
        .has_headers(true)
        .delimiter(delimiter)
        .flexible(true)
        .from_reader(data);

    let headers: Vec<String> = csv_reader
        .byte_headers()?
        .iter()
        .map(|h| decode(h).trim().to_string())
        .collect();
    let column = |name: &str| {
        headers
            .iter()
            .position(|h| h == name)
            .with_context(|| format!("Column '{}' not found", name))
    };

    let name_idx = column(NAME_COLUMN)?;
    let street_idx = column(STREET_COLUMN)?;
    let city_idx = column(CITY_COLUMN)?;
    // Birthday is optional in older exports
    let birthday_idx = column(BIRTHDAY_COLUMN).ok();

    let mut members = Vec::new();
    for result in csv_reader.byte_records() {
        let record = result?;
        let cell = |idx: usize| {
            record
                .get(idx)
                .map(|v| decode(v).trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let name = collapse_whitespace(&record.get(name_idx).map(decode).unwrap_or_default());
        let birthday = birthday_idx.and_then(|idx| cell(idx)).and_then(|raw| {
            let parsed = parse_birthday(&raw);
            if parsed.is_none() {
                warn!("Unreadable birthday '{}' for '{}'", raw, name);
            }
            parsed
        });

        members.push(MemberRecord {
            street: cell(street_idx),
            city: cell(city_idx),
            birthday,
            name,
        });
    }

    Ok(members)
}

fn skip_lines(data: &[u8], count: usize) -> &[u8] {
    let mut rest = data;
    for _ in 0..count {
        match rest.iter().position(|&b| b == b'\n') {
            Some(pos) => rest = &rest[pos + 1..],
            None => return &[],
        }
    }
    rest
}

/// UTF-8 if it is valid, otherwise Latin-1 (every byte is its own code point).
fn decode(field: &[u8]) -> Cow<'_, str> {
    match std::str::from_utf8(field) {
        Ok(s) => Cow::Borrowed(s),
        Err(_) => Cow::Owned(field.iter().map(|&b| char::from(b)).collect()),
    }
}

fn parse_birthday(raw: &str) -> Option<NaiveDate> {
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            // Spreadsheet exports sometimes carry a midnight timestamp
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
                .ok()
                .map(|dt| dt.date())
        })
}
