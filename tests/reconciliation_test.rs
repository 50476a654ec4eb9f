//! Reconciliation and aggregation behaviour through the public API.

use country_recon::records::{CapitalRecord, CaseRecord, PopulationRecord};
use country_recon::{
    reconcile, AggregationEngine, NameNormalizer, ReconError, RegionSummary, SortedDataset,
    SourceTag, UnifiedRow,
};
use std::collections::BTreeSet;

fn case(country: &str, cases: u64, deaths: u64, region: &str) -> CaseRecord {
    CaseRecord {
        country: country.to_string(),
        cases,
        deaths,
        region: region.to_string(),
    }
}

fn pop(country: &str, population: u64) -> PopulationRecord {
    PopulationRecord {
        country: country.to_string(),
        population,
    }
}

fn cap(country: &str, latitude: f64, longitude: f64) -> CapitalRecord {
    CapitalRecord {
        country: country.to_string(),
        city: String::new(),
        latitude,
        longitude,
    }
}

fn build(
    cases: Vec<CaseRecord>,
    population: Vec<PopulationRecord>,
    capitals: Vec<CapitalRecord>,
) -> Vec<UnifiedRow> {
    let normalizer = NameNormalizer::builtin();
    let a = SortedDataset::build(cases, &normalizer, SourceTag::Cases);
    let b = SortedDataset::build(population, &normalizer, SourceTag::Population);
    let c = SortedDataset::build(capitals, &normalizer, SourceTag::Capitals);
    reconcile(&a, &b, &c)
}

#[test]
fn test_france_japan_scenario() {
    let rows = build(
        vec![case("France", 100, 10, "Europe"), case("Japan", 50, 5, "Asia")],
        vec![pop("France", 1000), pop("Japan", 500)],
        vec![cap("France", 48.85, 2.35), cap("Japan", 35.68, 139.69)],
    );
    assert_eq!(rows.len(), 2);

    let engine = AggregationEngine::new(rows);
    let rollup = engine.region_rollup();
    assert!(rollup.contains(&RegionSummary {
        region: "Europe".into(),
        total_cases: 100,
        total_deaths: 10,
        total_population: 1000,
    }));
    assert!(rollup.contains(&RegionSummary {
        region: "Asia".into(),
        total_cases: 50,
        total_deaths: 5,
        total_population: 500,
    }));

    let top = engine.top_k_mortality(1, 0).unwrap();
    assert_eq!(top.len(), 1);
    assert_eq!(top[0].country, "France");
    assert_eq!((top[0].latitude, top[0].longitude), (48.85, 2.35));
}

#[test]
fn test_country_missing_capital_never_surfaces() {
    let rows = build(
        vec![case("France", 100, 10, "Europe"), case("Tuvalu", 1, 0, "Oceania")],
        vec![pop("France", 1000), pop("Tuvalu", 11_000)],
        vec![cap("France", 48.85, 2.35)],
    );
    let engine = AggregationEngine::new(rows);

    assert!(engine.get("Tuvalu").is_none());
    assert!(engine.region_rollup().iter().all(|s| s.region != "Oceania"));
    assert!(engine.top_k_mortality(1, 0).unwrap()[0].country != "Tuvalu");
    assert!(matches!(
        engine.country_rates(&["Tuvalu"]).remove(0),
        Err(ReconError::MissingCountry { .. })
    ));
}

#[test]
fn test_intersection_under_shuffled_inputs() {
    let a: Vec<&str> = vec!["Peru", "Chad", "Fiji", "Oman", "Laos", "Cuba", "Iran"];
    let b: Vec<&str> = vec!["Oman", "Cuba", "Peru", "Mali", "Iran", "Togo"];
    let c: Vec<&str> = vec!["Iran", "Togo", "Laos", "Peru", "Cuba", "Chad"];

    let expected: BTreeSet<&str> = a
        .iter()
        .filter(|k| b.contains(k) && c.contains(k))
        .copied()
        .collect();

    let forward = build(
        a.iter().map(|k| case(k, 1, 0, "R")).collect(),
        b.iter().map(|k| pop(k, 10)).collect(),
        c.iter().map(|k| cap(k, 0.0, 0.0)).collect(),
    );
    let reversed = build(
        a.iter().rev().map(|k| case(k, 1, 0, "R")).collect(),
        b.iter().rev().map(|k| pop(k, 10)).collect(),
        c.iter().rev().map(|k| cap(k, 0.0, 0.0)).collect(),
    );

    let got: Vec<&str> = forward.iter().map(|r| r.country.as_str()).collect();
    assert_eq!(got, expected.into_iter().collect::<Vec<_>>());
    assert_eq!(forward, reversed);
}

#[test]
fn test_top_k_with_floor_reports_available() {
    let rows = build(
        vec![
            case("Andorra", 0, 100, "Europe"),
            case("Belgium", 0, 25_000, "Europe"),
            case("Chile", 0, 37_000, "South America"),
            case("Denmark", 0, 2_500, "Europe"),
            case("Nauru", 0, 1, "Oceania"),
        ],
        vec![
            pop("Andorra", 9_000),
            pop("Belgium", 11_500_000),
            pop("Chile", 19_000_000),
            pop("Denmark", 5_800_000),
            pop("Nauru", 10_000),
        ],
        vec![
            cap("Andorra", 42.5, 1.5),
            cap("Belgium", 50.8, 4.3),
            cap("Chile", -33.4, -70.6),
            cap("Denmark", 55.6, 12.5),
            cap("Nauru", -0.5, 166.9),
        ],
    );
    let engine = AggregationEngine::new(rows);

    match engine.top_k_mortality(5, 10_000) {
        Err(ReconError::InsufficientData { requested, available, .. }) => {
            assert_eq!((requested, available), (5, 3));
        }
        other => panic!("expected insufficient data, got {:?}", other),
    }

    let top = engine.top_k_mortality(3, 10_000).unwrap();
    let names: Vec<&str> = top.iter().map(|r| r.country.as_str()).collect();
    assert_eq!(names, vec!["Belgium", "Chile", "Denmark"]);
}
