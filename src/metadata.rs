use crate::error::{ReconError, Result};
use crate::identity::{NameNormalizer, SourceTag, BUILTIN_ALIASES, BUILTIN_EXCLUSIONS};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AliasEntry {
    pub source: SourceTag,
    pub spelling: String,
    pub canonical: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExclusionEntry {
    pub source: SourceTag,
    pub name: String,
}

/// How a single capital is chosen per country from a world-cities table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CapitalRules {
    /// Canonical country -> designated capital city, for countries whose
    /// de-facto capital is not the one flagged as primary.
    #[serde(default)]
    pub overrides: BTreeMap<String, String>,
    /// Countries that accept their first listed city when none is primary.
    #[serde(default)]
    pub always_include: Vec<String>,
}

impl CapitalRules {
    pub fn builtin() -> Self {
        let mut overrides = BTreeMap::new();
        overrides.insert("Canada".to_string(), "Ottawa".to_string());
        Self {
            overrides,
            always_include: vec!["Curaçao".to_string()],
        }
    }

    pub fn designated_city(&self, country: &str) -> Option<&str> {
        self.overrides.get(country).map(|s| s.as_str())
    }

    pub fn accepts_any_city(&self, country: &str) -> bool {
        self.always_include.iter().any(|c| c == country)
    }

    fn extend(&mut self, other: CapitalRules) {
        self.overrides.extend(other.overrides);
        for country in other.always_include {
            if !self.accepts_any_city(&country) {
                self.always_include.push(country);
            }
        }
    }
}

/// Name and capital tables. Built-ins first, then whatever the metadata
/// directory adds on top.
#[derive(Debug, Clone)]
pub struct Metadata {
    pub aliases: Vec<AliasEntry>,
    pub exclusions: Vec<ExclusionEntry>,
    pub capitals: CapitalRules,
}

impl Default for Metadata {
    fn default() -> Self {
        Self::builtin()
    }
}

impl Metadata {
    pub fn builtin() -> Self {
        let aliases = BUILTIN_ALIASES
            .iter()
            .map(|(source, spelling, canonical)| AliasEntry {
                source: *source,
                spelling: spelling.to_string(),
                canonical: canonical.to_string(),
            })
            .collect();
        let exclusions = BUILTIN_EXCLUSIONS
            .iter()
            .map(|(source, name)| ExclusionEntry {
                source: *source,
                name: name.to_string(),
            })
            .collect();

        Self {
            aliases,
            exclusions,
            capitals: CapitalRules::builtin(),
        }
    }

    /// Load `aliases.json`, `exclusions.json` and `capitals.json` from `dir`.
    /// Each file is optional; entries extend the built-in tables.
    pub fn load(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            return Err(ReconError::Config(format!(
                "Metadata directory not found: {}",
                dir.display()
            )));
        }

        let mut metadata = Self::builtin();

        if let Some(aliases) = Self::load_optional::<Vec<AliasEntry>>(dir.join("aliases.json"))? {
            metadata.aliases.extend(aliases);
        }
        if let Some(exclusions) =
            Self::load_optional::<Vec<ExclusionEntry>>(dir.join("exclusions.json"))?
        {
            metadata.exclusions.extend(exclusions);
        }
        if let Some(capitals) = Self::load_optional::<CapitalRules>(dir.join("capitals.json"))? {
            metadata.capitals.extend(capitals);
        }

        info!(
            "Loaded metadata from {}: {} aliases, {} exclusions, {} capital overrides",
            dir.display(),
            metadata.aliases.len(),
            metadata.exclusions.len(),
            metadata.capitals.overrides.len()
        );
        Ok(metadata)
    }

    fn load_optional<T: for<'de> Deserialize<'de>>(path: PathBuf) -> Result<Option<T>> {
        if !path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&path)
            .map_err(|e| ReconError::Config(format!("Failed to read {}: {}", path.display(), e)))?;
        serde_json::from_str(&content)
            .map(Some)
            .map_err(|e| ReconError::Config(format!("Failed to parse {}: {}", path.display(), e)))
    }

    pub fn normalizer(&self) -> NameNormalizer {
        let mut normalizer = NameNormalizer::empty();
        for alias in &self.aliases {
            normalizer.add_alias(alias.source, &alias.spelling, &alias.canonical);
        }
        for exclusion in &self.exclusions {
            normalizer.add_exclusion(exclusion.source, &exclusion.name);
        }
        normalizer
    }
}
