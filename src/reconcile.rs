//! Three-way sorted merge of the case, population and capital datasets.

use crate::dataset::{Cursor, SortedDataset};
use crate::records::{CapitalRecord, CaseRecord, Keyed, PopulationRecord, UnifiedRow};
use serde::Serialize;
use std::fmt;
use tracing::{debug, info};

/// Which cursors to move when the three current keys are not all equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Advance {
    pub cases: bool,
    pub population: bool,
    pub capitals: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeStep {
    /// All three keys agree: emit a row and advance every cursor.
    Emit,
    /// Advance only the cursors holding the smallest key.
    Skip(Advance),
}

/// The single comparison rule of the merge.
///
/// A key strictly smaller than another cursor's key can never be matched by
/// that cursor again, so every cursor sitting on the minimum is moved.
pub fn merge_step(cases: &str, population: &str, capitals: &str) -> MergeStep {
    if cases == population && population == capitals {
        return MergeStep::Emit;
    }
    let min = cases.min(population).min(capitals);
    MergeStep::Skip(Advance {
        cases: cases == min,
        population: population == min,
        capitals: capitals == min,
    })
}

/// Keys each source held that found no partner in the other two.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReconcileReport {
    pub matched: usize,
    pub unmatched_cases: Vec<String>,
    pub unmatched_population: Vec<String>,
    pub unmatched_capitals: Vec<String>,
}

impl ReconcileReport {
    pub fn unmatched_total(&self) -> usize {
        self.unmatched_cases.len() + self.unmatched_population.len() + self.unmatched_capitals.len()
    }
}

impl fmt::Display for ReconcileReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Matched countries: {}", self.matched)?;
        for (label, keys) in [
            ("cases", &self.unmatched_cases),
            ("population", &self.unmatched_population),
            ("capitals", &self.unmatched_capitals),
        ] {
            write!(f, "Unmatched in {}: {}", label, keys.len())?;
            if !keys.is_empty() {
                write!(f, " ({})", keys.join(", "))?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Join the three datasets on canonical country name. A row is produced only
/// for keys present in all three.
pub fn reconcile(
    cases: &SortedDataset<CaseRecord>,
    population: &SortedDataset<PopulationRecord>,
    capitals: &SortedDataset<CapitalRecord>,
) -> Vec<UnifiedRow> {
    reconcile_with_report(cases, population, capitals).0
}

pub fn reconcile_with_report(
    cases: &SortedDataset<CaseRecord>,
    population: &SortedDataset<PopulationRecord>,
    capitals: &SortedDataset<CapitalRecord>,
) -> (Vec<UnifiedRow>, ReconcileReport) {
    let mut a = cases.cursor();
    let mut b = population.cursor();
    let mut c = capitals.cursor();
    let mut rows = Vec::with_capacity(cases.len().min(population.len()).min(capitals.len()));
    let mut report = ReconcileReport::default();

    while let (Some(case), Some(pop), Some(cap)) = (a.current_row(), b.current_row(), c.current_row()) {
        match merge_step(case.key(), pop.key(), cap.key()) {
            MergeStep::Emit => {
                rows.push(UnifiedRow::join(case, pop, cap));
                a.advance();
                b.advance();
                c.advance();
            }
            MergeStep::Skip(advance) => {
                if advance.cases {
                    skip(&mut a, &mut report.unmatched_cases);
                }
                if advance.population {
                    skip(&mut b, &mut report.unmatched_population);
                }
                if advance.capitals {
                    skip(&mut c, &mut report.unmatched_capitals);
                }
            }
        }
    }

    drain(&a, &mut report.unmatched_cases);
    drain(&b, &mut report.unmatched_population);
    drain(&c, &mut report.unmatched_capitals);
    report.matched = rows.len();

    info!(
        "Reconciled {} countries ({} cases, {} population, {} capitals rows in)",
        report.matched,
        cases.len(),
        population.len(),
        capitals.len()
    );
    debug!("Unmatched cases keys: {:?}", report.unmatched_cases);
    debug!("Unmatched population keys: {:?}", report.unmatched_population);
    debug!("Unmatched capitals keys: {:?}", report.unmatched_capitals);

    (rows, report)
}

fn skip<R: Keyed>(cursor: &mut Cursor<'_, R>, unmatched: &mut Vec<String>) {
    if let Some(key) = cursor.current_key() {
        unmatched.push(key.to_string());
    }
    cursor.advance();
}

fn drain<R: Keyed>(cursor: &Cursor<'_, R>, unmatched: &mut Vec<String>) {
    unmatched.extend(cursor.remaining().iter().map(|r| r.key().to_string()));
}
