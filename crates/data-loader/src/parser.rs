//! Parser for catalog snapshot files.
//!
//! The snapshot is a delimited text file with a header row. Columns are
//! matched by name, so their order does not matter:
//!
//! | column         | field          |
//! |----------------|----------------|
//! | `titre_str`    | title (required column) |
//! | `date`         | release_date   |
//! | `keywords`     | keywords       |
//! | `actors`       | actors         |
//! | `director`     | director       |
//! | `titre_genres` | genres         |
//! | `image`        | image_url      |
//! | `overview`     | overview       |
//! | `youtube`      | trailer_url    |
//! | `tagline`      | tagline        |
//! | `runtime`, `rating_avg`, `rating_vote`, `popularity` | display metrics |
//!
//! Any other column lands in `RawRecord::extra`.

use crate::config::LoaderConfig;
use crate::error::{DataIntegrityError, DataLoadError, Result};
use crate::types::RawRecord;
use csv::StringRecord;
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, warn};

pub const TITLE_COLUMN: &str = "titre_str";

const KNOWN_COLUMNS: [&str; 14] = [
    TITLE_COLUMN,
    "date",
    "keywords",
    "actors",
    "director",
    "titre_genres",
    "image",
    "overview",
    "youtube",
    "tagline",
    "runtime",
    "rating_avg",
    "rating_vote",
    "popularity",
];

/// Parse a snapshot file from disk
pub fn parse_catalog_file(path: &Path, config: &LoaderConfig) -> Result<Vec<RawRecord>> {
    let file = File::open(path)?;
    parse_catalog_reader(file, config)
}

/// Parse a snapshot from any reader (file, in-memory buffer, ...)
pub fn parse_catalog_reader<R: Read>(reader: R, config: &LoaderConfig) -> Result<Vec<RawRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(config.delimiter)
        .has_headers(true)
        // Short rows are reported below with their line number
        .flexible(true)
        .from_reader(reader);

    let columns = ColumnMap::from_headers(reader.headers()?)?;
    debug!("Snapshot header has {} columns", columns.positions.len());

    let mut records = Vec::new();
    for result in reader.records() {
        let row = result?;
        let line = row.position().map(|p| p.line()).unwrap_or(0);
        records.push(columns.to_raw_record(&row, line)?);
    }
    Ok(records)
}

/// Column name -> position, resolved once from the header row
struct ColumnMap {
    positions: HashMap<String, usize>,
    extra: Vec<(String, usize)>,
}

impl ColumnMap {
    fn from_headers(headers: &StringRecord) -> Result<Self> {
        let mut positions = HashMap::new();
        let mut extra = Vec::new();
        for (position, name) in headers.iter().enumerate() {
            // Spreadsheet exports sometimes keep a byte-order mark on the first header
            let name = name.trim_start_matches('\u{feff}').trim();
            if KNOWN_COLUMNS.contains(&name) {
                positions.insert(name.to_string(), position);
            } else {
                extra.push((name.to_string(), position));
            }
        }

        if !positions.contains_key(TITLE_COLUMN) {
            return Err(DataIntegrityError::MissingColumn {
                column: TITLE_COLUMN.to_string(),
            }
            .into());
        }
        Ok(Self { positions, extra })
    }

    fn text(&self, row: &StringRecord, column: &str) -> Option<String> {
        let position = *self.positions.get(column)?;
        row.get(position).map(str::to_string)
    }

    fn to_raw_record(&self, row: &StringRecord, line: u64) -> Result<RawRecord> {
        if row.len() < self.positions.len() + self.extra.len() {
            return Err(DataLoadError::ParseError {
                line,
                reason: format!(
                    "expected {} fields but found {}",
                    self.positions.len() + self.extra.len(),
                    row.len()
                ),
            });
        }

        let extra = self
            .extra
            .iter()
            .filter_map(|(name, position)| {
                row.get(*position)
                    .map(|value| (name.clone(), value.to_string()))
            })
            .collect();

        Ok(RawRecord {
            title: self.text(row, TITLE_COLUMN),
            release_date: self.text(row, "date"),
            keywords: self.text(row, "keywords"),
            actors: self.text(row, "actors"),
            director: self.text(row, "director"),
            genres: self.text(row, "titre_genres"),
            image_url: self.text(row, "image"),
            overview: self.text(row, "overview"),
            trailer_url: self.text(row, "youtube"),
            tagline: self.text(row, "tagline"),
            runtime: self.whole_number(row, "runtime", line),
            rating_avg: self.number(row, "rating_avg", line),
            rating_vote: self.whole_number(row, "rating_vote", line),
            popularity: self.number(row, "popularity", line),
            extra,
        })
    }

    /// Malformed numbers are display-only data: coerce to `None` and warn
    fn number<T: FromStr>(&self, row: &StringRecord, column: &str, line: u64) -> Option<T> {
        let raw = self.text(row, column)?;
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        match raw.parse::<T>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Line {}: ignoring invalid {} value '{}'", line, column, raw);
                None
            }
        }
    }

    /// Counts exported by dataframe tools often come out as "120.0"
    fn whole_number(&self, row: &StringRecord, column: &str, line: u64) -> Option<u32> {
        let value: f64 = self.number(row, column, line)?;
        if value.is_finite() && value >= 0.0 && value.fract() == 0.0 && value <= u32::MAX as f64 {
            Some(value as u32)
        } else {
            warn!("Line {}: ignoring non-integral {} value {}", line, column, value);
            None
        }
    }
}
