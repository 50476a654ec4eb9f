use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReconError {
    #[error("Missing country '{country}' at {stage}{}", suggestion_hint(.suggestion))]
    MissingCountry {
        country: String,
        stage: &'static str,
        suggestion: Option<String>,
    },

    #[error("Insufficient data: requested {requested} rows but only {available} have population above {population_floor}")]
    InsufficientData {
        requested: usize,
        available: usize,
        population_floor: u64,
    },

    #[error("Malformed {dataset} record at line {line}: {reason}")]
    MalformedRecord {
        dataset: &'static str,
        line: usize,
        reason: String,
    },

    #[error("Unknown region: {region}")]
    UnknownRegion { region: String },

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

fn suggestion_hint(suggestion: &Option<String>) -> String {
    match suggestion {
        Some(s) => format!(" (did you mean '{}'?)", s),
        None => String::new(),
    }
}

pub type Result<T> = std::result::Result<T, ReconError>;
