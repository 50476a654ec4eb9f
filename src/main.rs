use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use country_recon::aggregate::{AggregationEngine, CountryRate, MortalityRanking, RegionSummary};
use country_recon::config::{parse_country_list, QueryConfig};
use country_recon::ingestion::IngestSummary;
use country_recon::metadata::Metadata;
use country_recon::pipeline::{RawSources, ReconEngine};
use country_recon::table;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "country-recon")]
#[command(about = "Reconcile per-country epidemic, population and capital data and summarize it")]
struct Args {
    /// Print results as JSON instead of text tables
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Join the three source files into one unified table
    Build {
        #[arg(long)]
        cases: PathBuf,
        #[arg(long)]
        population: PathBuf,
        /// World-cities listing the capitals are chosen from
        #[arg(long)]
        cities: PathBuf,
        #[arg(short, long, default_value = "unified.csv")]
        out: PathBuf,
        /// Directory with aliases.json / exclusions.json / capitals.json
        #[arg(short, long)]
        metadata_dir: Option<PathBuf>,
    },
    /// Cases, deaths and population summed per region
    Regions {
        #[arg(short, long, default_value = "unified.csv")]
        table: PathBuf,
        #[arg(short, long)]
        region: Option<String>,
    },
    /// Per-capita cases and deaths for selected countries
    Rates {
        #[arg(short, long, default_value = "unified.csv")]
        table: PathBuf,
        /// Comma separated; all countries when omitted
        #[arg(short, long)]
        countries: Option<String>,
    },
    /// Countries with the most deaths per capita
    Top {
        #[arg(short, long, default_value = "unified.csv")]
        table: PathBuf,
        #[arg(short, long)]
        k: Option<usize>,
        /// Only rank countries with population above this
        #[arg(short, long)]
        floor: Option<u64>,
    },
}

#[derive(Serialize)]
struct BuildOutput<'a> {
    rows: usize,
    ingest: Vec<IngestSummary>,
    reconcile: &'a country_recon::ReconcileReport,
}

fn main() -> Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    match args.command {
        Command::Build {
            cases,
            population,
            cities,
            out,
            metadata_dir,
        } => {
            let metadata = match metadata_dir {
                Some(dir) => Metadata::load(&dir)?,
                None => Metadata::builtin(),
            };
            let sources = RawSources::from_paths(&cases, &population, &cities)?;
            let result = ReconEngine::new(metadata).run(sources);
            table::write_table(&out, &result.rows)
                .with_context(|| format!("writing {}", out.display()))?;

            if args.json {
                let output = BuildOutput {
                    rows: result.rows.len(),
                    ingest: result.ingest.iter().map(|r| r.summary()).collect(),
                    reconcile: &result.reconcile,
                };
                println!("{}", serde_json::to_string_pretty(&output)?);
            } else {
                println!("{}", result);
                println!("Unified table written to {}", out.display());
            }
        }
        Command::Regions { table, region } => {
            let mut config = QueryConfig::from_env()?;
            config.region = region;
            let engine = load_engine(&table)?;
            let summaries = match &config.region {
                Some(region) => vec![engine.region_summary(region)?],
                None => engine.region_rollup(),
            };
            emit(args.json, &summaries, print_regions)?;
        }
        Command::Rates { table, countries } => {
            let mut config = QueryConfig::from_env()?;
            config.countries = countries.as_deref().map(parse_country_list).unwrap_or_default();
            let engine = load_engine(&table)?;
            let mut rates = Vec::new();
            let mut failures = 0;
            for result in engine.country_rates(&config.countries) {
                match result {
                    Ok(rate) => rates.push(rate),
                    Err(e) => {
                        error!("{}", e);
                        failures += 1;
                    }
                }
            }
            emit(args.json, &rates, print_rates)?;
            if failures > 0 {
                anyhow::bail!("{} requested countries could not be resolved", failures);
            }
        }
        Command::Top { table, k, floor } => {
            let mut config = QueryConfig::from_env()?;
            if let Some(k) = k {
                config.k = k;
            }
            if let Some(floor) = floor {
                config.population_floor = floor;
            }
            config.validate()?;
            let engine = load_engine(&table)?;
            let ranking = engine.top_k_mortality(config.k, config.population_floor)?;
            emit(args.json, &ranking, print_ranking)?;
        }
    }

    Ok(())
}

fn load_engine(path: &Path) -> Result<AggregationEngine> {
    let rows = table::read_table(path)?;
    info!("Loaded {} countries from {}", rows.len(), path.display());
    Ok(AggregationEngine::new(rows))
}

fn emit<T: Serialize>(json: bool, items: &[T], print: fn(&[T])) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(items)?);
    } else {
        print(items);
    }
    Ok(())
}

fn print_regions(summaries: &[RegionSummary]) {
    println!(
        "{:<24} {:>14} {:>12} {:>14} {:>9}",
        "region", "cases", "deaths", "population", "fatality"
    );
    for s in summaries {
        println!(
            "{:<24} {:>14} {:>12} {:>14} {:>8.3}%",
            s.region,
            s.total_cases,
            s.total_deaths,
            s.total_population,
            s.fatality_share() * 100.0
        );
    }
}

fn print_rates(rates: &[CountryRate]) {
    println!(
        "{:<32} {:>16} {:>16} {:>14}",
        "country", "cases per 1m", "deaths per 1m", "population"
    );
    for r in rates {
        println!(
            "{:<32} {:>16.3} {:>16.3} {:>14}",
            r.country,
            r.cases_per_million(),
            r.deaths_per_million(),
            r.population
        );
    }
}

fn print_ranking(ranking: &[MortalityRanking]) {
    println!(
        "{:>4} {:<32} {:>14} {:>10} {:>10}",
        "#", "country", "deaths per 1m", "lat", "lon"
    );
    for (i, r) in ranking.iter().enumerate() {
        println!(
            "{:>4} {:<32} {:>14.3} {:>10.4} {:>10.4}",
            i + 1,
            r.country,
            r.deaths_per_million(),
            r.latitude,
            r.longitude
        );
    }
}
