//! CSV ingestion: raw source rows in, validated records plus an exclusion
//! report out.

use crate::error::{ReconError, Result};
use crate::identity::{NameNormalizer, SourceTag};
use crate::metadata::CapitalRules;
use crate::records::{CapitalCandidate, CapitalRecord, Validate};
use csv::ReaderBuilder;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info, warn};

/// Rows excluded from one dataset during validation.
#[derive(Debug, Default)]
pub struct IngestReport {
    pub dataset: &'static str,
    pub accepted: usize,
    pub excluded: Vec<ReconError>,
}

impl IngestReport {
    pub fn excluded_count(&self) -> usize {
        self.excluded.len()
    }

    pub fn first_example(&self) -> Option<&ReconError> {
        self.excluded.first()
    }

    pub fn summary(&self) -> IngestSummary {
        IngestSummary {
            dataset: self.dataset,
            accepted: self.accepted,
            excluded: self.excluded.len(),
            example: self.first_example().map(|e| e.to_string()),
        }
    }
}

impl fmt::Display for IngestReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} accepted, {} excluded",
            self.dataset,
            self.accepted,
            self.excluded.len()
        )?;
        if let Some(example) = self.first_example() {
            write!(f, " (e.g. {})", example)?;
        }
        Ok(())
    }
}

/// Serializable view of an [`IngestReport`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IngestSummary {
    pub dataset: &'static str,
    pub accepted: usize,
    pub excluded: usize,
    pub example: Option<String>,
}

/// Parse CSV text with a header row into raw rows tagged with their line
/// numbers. A row that cannot be shaped into `T` (missing column) is kept as
/// an error so the caller can report it; header or I/O failures abort.
pub fn read_rows<T: DeserializeOwned, R: Read>(
    dataset: &'static str,
    reader: R,
) -> Result<Vec<(usize, std::result::Result<T, ReconError>)>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(reader);
    let headers = rdr.headers()?.clone();

    let mut out = Vec::new();
    for result in rdr.records() {
        let record = match result {
            Ok(record) => record,
            Err(e) if e.is_io_error() => return Err(e.into()),
            Err(e) => {
                let line = e.position().map(|p| p.line() as usize).unwrap_or(0);
                out.push((
                    line,
                    Err(ReconError::MalformedRecord {
                        dataset,
                        line,
                        reason: e.to_string(),
                    }),
                ));
                continue;
            }
        };
        let line = record.position().map(|p| p.line() as usize).unwrap_or(0);
        let row = record
            .deserialize::<T>(Some(&headers))
            .map_err(|e| ReconError::MalformedRecord {
                dataset,
                line,
                reason: e.to_string(),
            });
        out.push((line, row));
    }

    debug!("Read {} {} rows", out.len(), dataset);
    Ok(out)
}

pub fn read_rows_from_path<T: DeserializeOwned>(
    dataset: &'static str,
    path: impl AsRef<Path>,
) -> Result<Vec<(usize, std::result::Result<T, ReconError>)>> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| {
        ReconError::Config(format!("Failed to open {} data {}: {}", dataset, path.display(), e))
    })?;
    read_rows(dataset, file)
}

/// Validate raw rows. Malformed rows are excluded and reported, never
/// propagated.
pub fn validate_rows<T: Validate>(
    rows: impl IntoIterator<Item = (usize, std::result::Result<T, ReconError>)>,
) -> (Vec<T::Record>, IngestReport) {
    let mut records = Vec::new();
    let mut report = IngestReport {
        dataset: T::DATASET,
        ..Default::default()
    };

    for (line, row) in rows {
        match row.and_then(|raw| raw.validate(line)) {
            Ok(record) => records.push(record),
            Err(e) => report.excluded.push(e),
        }
    }
    report.accepted = records.len();

    if let Some(example) = report.first_example() {
        warn!(
            "Excluded {} malformed {} rows, first: {}",
            report.excluded_count(),
            report.dataset,
            example
        );
    }
    (records, report)
}

/// Pick one capital per country out of a world-cities listing.
///
/// Per canonical country: the designated city from `rules` if listed,
/// otherwise the first `primary` city, otherwise (only for countries in
/// `always_include`) the first city of any kind.
///
/// Country names are normalized exactly once here, so the returned records
/// already carry canonical keys and must not go through the normalizer again.
pub fn select_capitals(
    candidates: Vec<CapitalCandidate>,
    normalizer: &NameNormalizer,
    rules: &CapitalRules,
) -> Vec<CapitalRecord> {
    let mut by_country: BTreeMap<String, Vec<CapitalCandidate>> = BTreeMap::new();
    for mut candidate in candidates {
        if normalizer.is_excluded(&candidate.country, SourceTag::Capitals) {
            debug!("Excluding non-country '{}' from capitals source", candidate.country);
            continue;
        }
        candidate.country = normalizer.normalize(&candidate.country, SourceTag::Capitals);
        by_country
            .entry(candidate.country.clone())
            .or_default()
            .push(candidate);
    }

    let mut capitals = Vec::with_capacity(by_country.len());
    for (country, cities) in by_country {
        let chosen = match rules.designated_city(&country) {
            Some(city) => cities.iter().position(|c| c.is_named(city)),
            None => None,
        }
        .or_else(|| cities.iter().position(|c| c.is_primary()))
        .or_else(|| (rules.accepts_any_city(&country) && !cities.is_empty()).then_some(0));

        match chosen {
            Some(idx) => {
                let mut cities = cities;
                capitals.push(cities.swap_remove(idx).into_capital());
            }
            None => debug!("No capital selected for {}", country),
        }
    }

    info!("Selected {} capitals", capitals.len());
    capitals
}
