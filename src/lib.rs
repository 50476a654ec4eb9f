pub mod aggregate;
pub mod config;
pub mod dataset;
pub mod error;
pub mod fuzzy_matcher;
pub mod identity;
pub mod ingestion;
pub mod metadata;
pub mod pipeline;
pub mod reconcile;
pub mod records;
pub mod table;

pub use aggregate::{AggregationEngine, CountryRate, MortalityRanking, RegionSummary};
pub use dataset::{Cursor, SortedDataset};
pub use error::{ReconError, Result};
pub use identity::{NameNormalizer, SourceTag};
pub use pipeline::{PipelineResult, RawSources, ReconEngine};
pub use reconcile::{merge_step, reconcile, reconcile_with_report, MergeStep, ReconcileReport};
pub use records::UnifiedRow;
