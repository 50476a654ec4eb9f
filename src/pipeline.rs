use crate::aggregate::AggregationEngine;
use crate::dataset::SortedDataset;
use crate::error::{ReconError, Result};
use crate::identity::{NameNormalizer, SourceTag};
use crate::ingestion::{read_rows_from_path, select_capitals, validate_rows, IngestReport};
use crate::metadata::Metadata;
use crate::reconcile::{reconcile_with_report, ReconcileReport};
use crate::records::{RawCaseRow, RawCityRow, RawPopulationRow, UnifiedRow};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use tracing::info;

type Rows<T> = Vec<(usize, std::result::Result<T, ReconError>)>;

/// Raw rows of the three sources, as handed over by whatever fetched them.
pub struct RawSources {
    pub cases: Rows<RawCaseRow>,
    pub population: Rows<RawPopulationRow>,
    pub cities: Rows<RawCityRow>,
}

impl RawSources {
    /// Rows already in memory. Line numbers are the 1-based positions.
    pub fn from_rows(
        cases: Vec<RawCaseRow>,
        population: Vec<RawPopulationRow>,
        cities: Vec<RawCityRow>,
    ) -> Self {
        fn number<T>(rows: Vec<T>) -> Rows<T> {
            rows.into_iter().enumerate().map(|(i, r)| (i + 1, Ok(r))).collect()
        }
        Self {
            cases: number(cases),
            population: number(population),
            cities: number(cities),
        }
    }

    pub fn from_paths(
        cases: impl AsRef<Path>,
        population: impl AsRef<Path>,
        cities: impl AsRef<Path>,
    ) -> Result<Self> {
        Ok(Self {
            cases: read_rows_from_path("cases", cases)?,
            population: read_rows_from_path("population", population)?,
            cities: read_rows_from_path("capitals", cities)?,
        })
    }
}

pub struct ReconEngine {
    metadata: Metadata,
    normalizer: NameNormalizer,
}

impl Default for ReconEngine {
    fn default() -> Self {
        Self::new(Metadata::builtin())
    }
}

impl ReconEngine {
    pub fn new(metadata: Metadata) -> Self {
        let normalizer = metadata.normalizer();
        Self {
            metadata,
            normalizer,
        }
    }

    pub fn normalizer(&self) -> &NameNormalizer {
        &self.normalizer
    }

    pub fn run(&self, sources: RawSources) -> PipelineResult {
        // Step 1: shape validation, malformed rows are reported and left out
        let (cases, cases_report) = validate_rows(sources.cases);
        let (population, population_report) = validate_rows(sources.population);
        let (candidates, cities_report) = validate_rows(sources.cities);

        // Step 2: one capital per country, keys come back canonical
        let capitals = select_capitals(candidates, &self.normalizer, &self.metadata.capitals);

        // Step 3: normalize, deduplicate and sort each source
        let cases = SortedDataset::build(cases, &self.normalizer, SourceTag::Cases);
        let population = SortedDataset::build(population, &self.normalizer, SourceTag::Population);
        let capitals = SortedDataset::from_canonical(capitals, SourceTag::Capitals);

        let mut duplicates = BTreeMap::new();
        duplicates.insert(SourceTag::Cases, cases.duplicates().to_vec());
        duplicates.insert(SourceTag::Population, population.duplicates().to_vec());
        duplicates.insert(SourceTag::Capitals, capitals.duplicates().to_vec());

        // Step 4: three-way merge
        let (rows, reconcile) = reconcile_with_report(&cases, &population, &capitals);

        info!(
            "Pipeline finished: {} unified rows, {} unmatched keys",
            rows.len(),
            reconcile.unmatched_total()
        );

        PipelineResult {
            rows,
            ingest: vec![cases_report, population_report, cities_report],
            duplicates,
            reconcile,
        }
    }
}

pub struct PipelineResult {
    pub rows: Vec<UnifiedRow>,
    pub ingest: Vec<IngestReport>,
    pub duplicates: BTreeMap<SourceTag, Vec<String>>,
    pub reconcile: ReconcileReport,
}

impl PipelineResult {
    pub fn into_engine(self) -> AggregationEngine {
        AggregationEngine::new(self.rows)
    }
}

impl fmt::Display for PipelineResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Ingestion:")?;
        for report in &self.ingest {
            writeln!(f, "  {}", report)?;
        }
        for (source, keys) in &self.duplicates {
            if !keys.is_empty() {
                writeln!(f, "  duplicate {} keys dropped: {}", source, keys.join(", "))?;
            }
        }
        write!(f, "{}", self.reconcile)
    }
}
