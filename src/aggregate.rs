//! Derived views over the unified table.

use crate::error::{ReconError, Result};
use crate::fuzzy_matcher::FuzzyMatcher;
use crate::records::UnifiedRow;
use itertools::Itertools;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, warn};

const PER_MILLION: f64 = 1_000_000.0;

/// Totals are `u128` so that summing any number of `u64` rows stays exact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegionSummary {
    pub region: String,
    pub total_cases: u128,
    pub total_deaths: u128,
    pub total_population: u128,
}

impl RegionSummary {
    fn empty(region: &str) -> Self {
        Self {
            region: region.to_string(),
            total_cases: 0,
            total_deaths: 0,
            total_population: 0,
        }
    }

    fn add(&mut self, row: &UnifiedRow) {
        self.total_cases += u128::from(row.cases);
        self.total_deaths += u128::from(row.deaths);
        self.total_population += u128::from(row.population);
    }

    /// Cases that did not end in death.
    pub fn recovered(&self) -> u128 {
        self.total_cases.saturating_sub(self.total_deaths)
    }

    /// Deaths as a share of cases, 0.0 when there are no cases.
    pub fn fatality_share(&self) -> f64 {
        if self.total_cases == 0 {
            0.0
        } else {
            self.total_deaths as f64 / self.total_cases as f64
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CountryRate {
    pub country: String,
    pub cases_per_capita: f64,
    pub deaths_per_capita: f64,
    pub population: u64,
}

impl CountryRate {
    pub fn cases_per_million(&self) -> f64 {
        self.cases_per_capita * PER_MILLION
    }

    pub fn deaths_per_million(&self) -> f64 {
        self.deaths_per_capita * PER_MILLION
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MortalityRanking {
    pub country: String,
    pub deaths_per_capita: f64,
    pub latitude: f64,
    pub longitude: f64,
}

impl MortalityRanking {
    pub fn deaths_per_million(&self) -> f64 {
        self.deaths_per_capita * PER_MILLION
    }
}

/// Read-only queries over a fixed set of unified rows.
pub struct AggregationEngine {
    rows: Vec<UnifiedRow>,
    by_country: HashMap<String, usize>,
    matcher: FuzzyMatcher,
}

impl AggregationEngine {
    /// Rows with zero population are dropped here so no rate ever divides by
    /// zero. For repeated countries the first row is kept.
    pub fn new(rows: Vec<UnifiedRow>) -> Self {
        let mut kept = Vec::with_capacity(rows.len());
        let mut by_country = HashMap::with_capacity(rows.len());

        for row in rows {
            if row.population == 0 {
                warn!("Dropping {} from aggregation: population is zero", row.country);
                continue;
            }
            if by_country.contains_key(&row.country) {
                warn!("Dropping repeated row for {}", row.country);
                continue;
            }
            by_country.insert(row.country.clone(), kept.len());
            kept.push(row);
        }

        debug!("Aggregation engine holds {} countries", kept.len());
        Self {
            rows: kept,
            by_country,
            matcher: FuzzyMatcher::default(),
        }
    }

    pub fn rows(&self) -> &[UnifiedRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, country: &str) -> Option<&UnifiedRow> {
        self.by_country.get(country).map(|&idx| &self.rows[idx])
    }

    /// One summary per distinct region, ascending by region name.
    pub fn region_rollup(&self) -> Vec<RegionSummary> {
        let mut groups: BTreeMap<&str, RegionSummary> = BTreeMap::new();
        for row in &self.rows {
            groups
                .entry(row.region.as_str())
                .or_insert_with(|| RegionSummary::empty(&row.region))
                .add(row);
        }
        groups.into_values().collect()
    }

    pub fn region_summary(&self, region: &str) -> Result<RegionSummary> {
        let mut summary = RegionSummary::empty(region);
        let mut found = false;
        for row in self.rows.iter().filter(|r| r.region == region) {
            summary.add(row);
            found = true;
        }
        if !found {
            return Err(ReconError::UnknownRegion {
                region: region.to_string(),
            });
        }
        Ok(summary)
    }

    /// Per-capita rates in request order. Each country that is not in the
    /// table yields its own `MissingCountry` error; the rest still resolve.
    /// An empty request means every country, in table order.
    pub fn country_rates<S: AsRef<str>>(&self, countries: &[S]) -> Vec<Result<CountryRate>> {
        if countries.is_empty() {
            return self.rows.iter().map(|row| Ok(Self::rate(row))).collect();
        }
        countries
            .iter()
            .map(|country| {
                let country = country.as_ref();
                self.get(country)
                    .map(Self::rate)
                    .ok_or_else(|| self.missing(country, "country_rates"))
            })
            .collect()
    }

    /// Like [`country_rates`](Self::country_rates) but fails on the first
    /// missing country.
    pub fn country_rates_strict<S: AsRef<str>>(&self, countries: &[S]) -> Result<Vec<CountryRate>> {
        self.country_rates(countries).into_iter().collect()
    }

    /// The `k` countries with the highest deaths per capita among those with
    /// population strictly above `population_floor`. Equal rates are ordered
    /// by ascending country name.
    pub fn top_k_mortality(&self, k: usize, population_floor: u64) -> Result<Vec<MortalityRanking>> {
        if k == 0 {
            return Err(ReconError::InvalidParameter(
                "k must be a positive integer".to_string(),
            ));
        }

        let eligible: Vec<MortalityRanking> = self
            .rows
            .iter()
            .filter(|row| row.population > population_floor)
            .map(|row| MortalityRanking {
                country: row.country.clone(),
                deaths_per_capita: row.deaths as f64 / row.population as f64,
                latitude: row.latitude,
                longitude: row.longitude,
            })
            .collect();

        if eligible.len() < k {
            return Err(ReconError::InsufficientData {
                requested: k,
                available: eligible.len(),
                population_floor,
            });
        }

        Ok(eligible
            .into_iter()
            .sorted_by(Self::by_mortality)
            .take(k)
            .collect())
    }

    fn by_mortality(a: &MortalityRanking, b: &MortalityRanking) -> Ordering {
        b.deaths_per_capita
            .total_cmp(&a.deaths_per_capita)
            .then_with(|| a.country.cmp(&b.country))
    }

    fn rate(row: &UnifiedRow) -> CountryRate {
        let population = row.population as f64;
        CountryRate {
            country: row.country.clone(),
            cases_per_capita: row.cases as f64 / population,
            deaths_per_capita: row.deaths as f64 / population,
            population: row.population,
        }
    }

    fn missing(&self, country: &str, stage: &'static str) -> ReconError {
        let suggestion = self
            .matcher
            .find_best_match(country, self.rows.iter().map(|r| r.country.as_str()))
            .map(|(name, _)| name);
        ReconError::MissingCountry {
            country: country.to_string(),
            stage,
            suggestion,
        }
    }
}
