use crate::error::{ReconError, Result};
use serde::{Deserialize, Serialize};

pub const TOP_K_ENV: &str = "RECON_TOP_K";
pub const POPULATION_FLOOR_ENV: &str = "RECON_POPULATION_FLOOR";

/// Parameters of the derived views.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryConfig {
    /// Number of countries in the mortality ranking
    #[serde(default = "default_k")]
    pub k: usize,
    /// Only countries with population strictly above this are ranked
    #[serde(default)]
    pub population_floor: u64,
    /// Countries for the rate query; empty means all
    #[serde(default)]
    pub countries: Vec<String>,
    /// Single region to summarize; `None` means every region
    #[serde(default)]
    pub region: Option<String>,
}

fn default_k() -> usize {
    10
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            k: default_k(),
            population_floor: 0,
            countries: Vec::new(),
            region: None,
        }
    }
}

impl QueryConfig {
    /// Defaults overridden by `RECON_TOP_K` / `RECON_POPULATION_FLOOR`.
    /// Values must parse, but range checks wait for [`validate`](Self::validate)
    /// so that command-line flags can still replace them.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();
        if let Some(k) = lookup(TOP_K_ENV) {
            config.k = parse_var(TOP_K_ENV, &k)?;
        }
        if let Some(floor) = lookup(POPULATION_FLOOR_ENV) {
            config.population_floor = parse_var(POPULATION_FLOOR_ENV, &floor)?;
        }
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.k == 0 {
            return Err(ReconError::InvalidParameter(
                "k must be a positive integer".to_string(),
            ));
        }
        Ok(())
    }
}

fn parse_var<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| ReconError::Config(format!("{} has invalid value '{}'", key, value)))
}

/// Split a comma separated list, dropping blanks.
pub fn parse_country_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = QueryConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, QueryConfig::default());
        assert_eq!(config.k, 10);
    }

    #[test]
    fn test_env_overrides() {
        let config = QueryConfig::from_lookup(lookup(&[
            (TOP_K_ENV, "5"),
            (POPULATION_FLOOR_ENV, " 10000 "),
        ]))
        .unwrap();
        assert_eq!(config.k, 5);
        assert_eq!(config.population_floor, 10_000);
    }

    #[test]
    fn test_invalid_values() {
        assert!(matches!(
            QueryConfig::from_lookup(lookup(&[(TOP_K_ENV, "five")])),
            Err(ReconError::Config(_))
        ));
        assert!(matches!(
            QueryConfig::from_lookup(lookup(&[(POPULATION_FLOOR_ENV, "-1")])),
            Err(ReconError::Config(_))
        ));
    }

    #[test]
    fn test_zero_k_is_rejected_only_on_validate() {
        let mut config = QueryConfig::from_lookup(lookup(&[(TOP_K_ENV, "0")])).unwrap();
        assert!(matches!(
            config.validate(),
            Err(ReconError::InvalidParameter(_))
        ));

        config.k = 3;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_deserialize_partial() {
        let config: QueryConfig = serde_json::from_str(r#"{"region": "Europe"}"#).unwrap();
        assert_eq!(config.k, 10);
        assert_eq!(config.region.as_deref(), Some("Europe"));
    }

    #[test]
    fn test_parse_country_list() {
        assert_eq!(
            parse_country_list("France, Japan,,Peru "),
            vec!["France", "Japan", "Peru"]
        );
        assert!(parse_country_list("").is_empty());
    }
}
