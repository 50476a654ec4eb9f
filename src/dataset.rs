use crate::identity::{NameNormalizer, SourceTag};
use crate::records::Keyed;
use std::collections::HashSet;
use tracing::{debug, warn};

/// Rows of one source, keyed by canonical country name, unique and sorted
/// ascending by key.
///
/// When two rows normalize to the same key the first one in input order is
/// kept and the later ones are recorded in `duplicates`.
#[derive(Debug, Clone)]
pub struct SortedDataset<R> {
    source: SourceTag,
    rows: Vec<R>,
    duplicates: Vec<String>,
    excluded: Vec<String>,
}

impl<R: Keyed> SortedDataset<R> {
    pub fn build(
        records: impl IntoIterator<Item = R>,
        normalizer: &NameNormalizer,
        source: SourceTag,
    ) -> Self {
        let mut excluded = Vec::new();
        let mut canonical = Vec::new();

        for mut record in records {
            if normalizer.is_excluded(record.key(), source) {
                debug!("Excluding non-country '{}' from {} source", record.key(), source);
                excluded.push(record.key().to_string());
                continue;
            }
            *record.key_mut() = normalizer.normalize(record.key(), source);
            canonical.push(record);
        }

        let mut dataset = Self::from_canonical(canonical, source);
        dataset.excluded = excluded;
        dataset
    }

    /// Rows whose keys are already canonical, such as the output of
    /// [`select_capitals`](crate::ingestion::select_capitals). Keys are taken
    /// as they are; only deduplication and sorting happen here.
    pub fn from_canonical(records: impl IntoIterator<Item = R>, source: SourceTag) -> Self {
        let mut seen: HashSet<String> = HashSet::new();
        let mut rows = Vec::new();
        let mut duplicates = Vec::new();

        for record in records {
            if seen.insert(record.key().to_string()) {
                rows.push(record);
            } else {
                warn!(
                    "Duplicate country '{}' in {} source, keeping first occurrence",
                    record.key(),
                    source
                );
                duplicates.push(record.key().to_string());
            }
        }

        rows.sort_by(|a, b| a.key().cmp(b.key()));

        Self {
            source,
            rows,
            duplicates,
            excluded: Vec::new(),
        }
    }

    pub fn source(&self) -> SourceTag {
        self.source
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[R] {
        &self.rows
    }

    pub fn iter(&self) -> impl Iterator<Item = &R> + '_ {
        self.rows.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.rows.iter().map(|r| r.key())
    }

    pub fn get(&self, key: &str) -> Option<&R> {
        self.rows
            .binary_search_by(|r| r.key().cmp(key))
            .ok()
            .map(|idx| &self.rows[idx])
    }

    /// Canonical keys dropped because an earlier row already claimed them.
    pub fn duplicates(&self) -> &[String] {
        &self.duplicates
    }

    /// Names dropped because they are listed as non-countries for this source.
    pub fn excluded(&self) -> &[String] {
        &self.excluded
    }

    pub fn cursor(&self) -> Cursor<'_, R> {
        Cursor {
            rows: &self.rows,
            pos: 0,
        }
    }
}

/// Forward-only position within a [`SortedDataset`].
#[derive(Debug, Clone)]
pub struct Cursor<'a, R> {
    rows: &'a [R],
    pos: usize,
}

impl<'a, R: Keyed> Cursor<'a, R> {
    pub fn current_key(&self) -> Option<&'a str> {
        self.current_row().map(|r| r.key())
    }

    pub fn current_row(&self) -> Option<&'a R> {
        self.rows.get(self.pos)
    }

    /// Advancing an exhausted cursor is a no-op.
    pub fn advance(&mut self) {
        if self.pos < self.rows.len() {
            self.pos += 1;
        }
    }

    pub fn exhausted(&self) -> bool {
        self.pos >= self.rows.len()
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    /// Rows not yet passed.
    pub fn remaining(&self) -> &'a [R] {
        &self.rows[self.pos.min(self.rows.len())..]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::PopulationRecord;

    fn pop(country: &str, population: u64) -> PopulationRecord {
        PopulationRecord {
            country: country.to_string(),
            population,
        }
    }

    #[test]
    fn test_build_sorts_by_canonical_key() {
        let dataset = SortedDataset::build(
            vec![pop("Japan", 500), pop("France", 1000), pop("Brazil", 2000)],
            &NameNormalizer::builtin(),
            SourceTag::Population,
        );

        let keys: Vec<&str> = dataset.keys().collect();
        assert_eq!(keys, vec!["Brazil", "France", "Japan"]);
        assert_eq!(dataset.len(), 3);
    }

    #[test]
    fn test_ordering_is_case_sensitive() {
        let dataset = SortedDataset::build(
            vec![pop("eSwatini", 1), pop("Zambia", 2), pop("Eswatini", 3)],
            &NameNormalizer::empty(),
            SourceTag::Population,
        );

        let keys: Vec<&str> = dataset.keys().collect();
        assert_eq!(keys, vec!["Eswatini", "Zambia", "eSwatini"]);
    }

    #[test]
    fn test_first_occurrence_wins_after_normalization() {
        let mut normalizer = NameNormalizer::empty();
        normalizer.add_alias(SourceTag::Population, "Czechia", "Czech Republic (Czechia)");

        let dataset = SortedDataset::build(
            vec![
                pop("Czechia", 10_700_000),
                pop("Czech Republic (Czechia)", 1),
            ],
            &normalizer,
            SourceTag::Population,
        );

        assert_eq!(dataset.len(), 1);
        assert_eq!(
            dataset.get("Czech Republic (Czechia)").unwrap().population,
            10_700_000
        );
        assert_eq!(dataset.duplicates(), &["Czech Republic (Czechia)".to_string()]);
    }

    #[test]
    fn test_canonical_keys_are_kept_verbatim() {
        let dataset = SortedDataset::from_canonical(
            vec![pop("Peru", 1), pop("Chad", 2), pop("Peru", 3)],
            SourceTag::Population,
        );

        assert_eq!(dataset.keys().collect::<Vec<_>>(), vec!["Chad", "Peru"]);
        assert_eq!(dataset.get("Peru").unwrap().population, 1);
        assert_eq!(dataset.duplicates(), &["Peru".to_string()]);
        assert!(dataset.excluded().is_empty());
    }

    #[test]
    fn test_excluded_names_never_enter() {
        let dataset = SortedDataset::build(
            vec![
                crate::records::CaseRecord {
                    country: "MS Zaandam".to_string(),
                    cases: 9,
                    deaths: 2,
                    region: "".to_string(),
                },
                crate::records::CaseRecord {
                    country: "Japan (+Diamond Princess)".to_string(),
                    cases: 50,
                    deaths: 5,
                    region: "Asia".to_string(),
                },
            ],
            &NameNormalizer::builtin(),
            SourceTag::Cases,
        );

        assert_eq!(dataset.keys().collect::<Vec<_>>(), vec!["Japan"]);
        assert_eq!(dataset.excluded(), &["MS Zaandam".to_string()]);
    }

    #[test]
    fn test_cursor_walks_and_stops() {
        let dataset = SortedDataset::build(
            vec![pop("B", 2), pop("A", 1)],
            &NameNormalizer::empty(),
            SourceTag::Population,
        );
        let mut cursor = dataset.cursor();

        assert_eq!(cursor.current_key(), Some("A"));
        assert_eq!(cursor.current_row().unwrap().population, 1);
        cursor.advance();
        assert_eq!(cursor.current_key(), Some("B"));
        assert!(!cursor.exhausted());
        cursor.advance();
        assert!(cursor.exhausted());
        assert_eq!(cursor.current_key(), None);
        assert!(cursor.remaining().is_empty());

        cursor.advance();
        assert!(cursor.exhausted());
        assert_eq!(cursor.position(), 2);
    }

    #[test]
    fn test_empty_dataset_cursor_is_exhausted() {
        let dataset: SortedDataset<PopulationRecord> =
            SortedDataset::build(Vec::new(), &NameNormalizer::empty(), SourceTag::Population);
        assert!(dataset.is_empty());
        assert!(dataset.cursor().exhausted());
        assert!(dataset.get("France").is_none());
    }
}
