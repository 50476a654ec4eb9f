//! Source rows as they arrive, and the validated records built from them.

use crate::error::{ReconError, Result};
use serde::{Deserialize, Serialize};

/// A row that is keyed by country name.
pub trait Keyed {
    fn key(&self) -> &str;
    fn key_mut(&mut self) -> &mut String;
}

/// Shape validation from a raw (all-text) row into a typed record.
pub trait Validate {
    type Record;
    const DATASET: &'static str;

    /// `line` is the 1-based source line, used only for error context.
    fn validate(self, line: usize) -> Result<Self::Record>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawCaseRow {
    pub country: String,
    pub cases: String,
    pub deaths: String,
    pub region: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawPopulationRow {
    pub country: String,
    pub population: String,
}

/// One row of a world-cities table. Extra columns in the file are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawCityRow {
    pub city: String,
    #[serde(default)]
    pub city_ascii: Option<String>,
    pub lat: String,
    pub lng: String,
    pub country: String,
    #[serde(default)]
    pub capital: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseRecord {
    pub country: String,
    pub cases: u64,
    pub deaths: u64,
    pub region: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PopulationRecord {
    pub country: String,
    pub population: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapitalRecord {
    pub country: String,
    pub city: String,
    pub latitude: f64,
    pub longitude: f64,
}

/// A city that may be chosen as its country's capital.
#[derive(Debug, Clone, PartialEq)]
pub struct CapitalCandidate {
    pub country: String,
    /// ASCII spelling when the listing has one.
    pub city: String,
    /// Spelling from the listing's `city` column, accents kept.
    pub local_city: String,
    pub latitude: f64,
    pub longitude: f64,
    pub kind: String,
}

impl CapitalCandidate {
    pub fn is_primary(&self) -> bool {
        self.kind == "primary"
    }

    pub fn is_named(&self, name: &str) -> bool {
        self.city == name || self.local_city == name
    }

    pub fn into_capital(self) -> CapitalRecord {
        CapitalRecord {
            country: self.country,
            city: self.city,
            latitude: self.latitude,
            longitude: self.longitude,
        }
    }
}

/// One reconciled country, present in all three sources.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnifiedRow {
    pub country: String,
    pub cases: u64,
    pub deaths: u64,
    pub region: String,
    pub population: u64,
    pub city: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl UnifiedRow {
    pub fn join(cases: &CaseRecord, population: &PopulationRecord, capital: &CapitalRecord) -> Self {
        Self {
            country: cases.country.clone(),
            cases: cases.cases,
            deaths: cases.deaths,
            region: cases.region.clone(),
            population: population.population,
            city: capital.city.clone(),
            latitude: capital.latitude,
            longitude: capital.longitude,
        }
    }
}

macro_rules! keyed_by_country {
    ($($ty:ty),*) => {
        $(
            impl Keyed for $ty {
                fn key(&self) -> &str {
                    &self.country
                }

                fn key_mut(&mut self) -> &mut String {
                    &mut self.country
                }
            }
        )*
    };
}

keyed_by_country!(CaseRecord, PopulationRecord, CapitalRecord, CapitalCandidate, UnifiedRow);

fn malformed(dataset: &'static str, line: usize, reason: impl Into<String>) -> ReconError {
    ReconError::MalformedRecord {
        dataset,
        line,
        reason: reason.into(),
    }
}

/// Parse a non-negative count. Thousands separators are accepted ("1,234").
pub fn parse_count(value: &str) -> std::result::Result<u64, String> {
    let digits: String = value
        .trim()
        .chars()
        .filter(|c| *c != ',' && !c.is_whitespace())
        .collect();
    if digits.is_empty() {
        return Err("empty count".to_string());
    }
    digits
        .parse::<u64>()
        .map_err(|_| format!("'{}' is not a non-negative integer", value.trim()))
}

fn parse_coordinate(value: &str, limit: f64, axis: &str) -> std::result::Result<f64, String> {
    let parsed: f64 = value
        .trim()
        .parse()
        .map_err(|_| format!("{} '{}' is not a number", axis, value.trim()))?;
    if !parsed.is_finite() || parsed < -limit || parsed > limit {
        return Err(format!("{} {} outside [-{}, {}]", axis, parsed, limit, limit));
    }
    Ok(parsed)
}

fn require_name(dataset: &'static str, line: usize, country: &str) -> Result<()> {
    if country.trim().is_empty() {
        return Err(malformed(dataset, line, "empty country name"));
    }
    Ok(())
}

impl Validate for RawCaseRow {
    type Record = CaseRecord;
    const DATASET: &'static str = "cases";

    fn validate(self, line: usize) -> Result<CaseRecord> {
        require_name(Self::DATASET, line, &self.country)?;
        let cases = parse_count(&self.cases)
            .map_err(|e| malformed(Self::DATASET, line, format!("cases: {}", e)))?;
        let deaths = parse_count(&self.deaths)
            .map_err(|e| malformed(Self::DATASET, line, format!("deaths: {}", e)))?;
        Ok(CaseRecord {
            country: self.country,
            cases,
            deaths,
            region: self.region.trim().to_string(),
        })
    }
}

impl Validate for RawPopulationRow {
    type Record = PopulationRecord;
    const DATASET: &'static str = "population";

    fn validate(self, line: usize) -> Result<PopulationRecord> {
        require_name(Self::DATASET, line, &self.country)?;
        let population = parse_count(&self.population)
            .map_err(|e| malformed(Self::DATASET, line, format!("population: {}", e)))?;
        if population == 0 {
            return Err(malformed(Self::DATASET, line, "population must be positive"));
        }
        Ok(PopulationRecord {
            country: self.country,
            population,
        })
    }
}

impl Validate for RawCityRow {
    type Record = CapitalCandidate;
    const DATASET: &'static str = "capitals";

    fn validate(self, line: usize) -> Result<CapitalCandidate> {
        require_name(Self::DATASET, line, &self.country)?;
        let latitude = parse_coordinate(&self.lat, 90.0, "latitude")
            .map_err(|e| malformed(Self::DATASET, line, e))?;
        let longitude = parse_coordinate(&self.lng, 180.0, "longitude")
            .map_err(|e| malformed(Self::DATASET, line, e))?;
        let local_city = self.city.trim().to_string();
        let city = match self.city_ascii {
            Some(ascii) if !ascii.trim().is_empty() => ascii.trim().to_string(),
            _ => local_city.clone(),
        };
        Ok(CapitalCandidate {
            country: self.country,
            city,
            local_city,
            latitude,
            longitude,
            kind: self.capital.trim().to_string(),
        })
    }
}
