//! Canonical country identity across sources.
//!
//! Every source spells some countries its own way. The normalizer maps those
//! spellings onto one canonical vocabulary so that the reconciler can join on
//! exact key equality.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;

lazy_static! {
    static ref WHITESPACE: Regex = Regex::new(r"\s+").expect("static regex");
}

/// Which upstream dataset a name came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceTag {
    Cases,
    Population,
    Capitals,
}

impl SourceTag {
    pub fn label(&self) -> &'static str {
        match self {
            SourceTag::Cases => "cases",
            SourceTag::Population => "population",
            SourceTag::Capitals => "capitals",
        }
    }
}

impl fmt::Display for SourceTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Built-in spelling fixes: (source, spelling, canonical).
pub const BUILTIN_ALIASES: &[(SourceTag, &str, &str)] = &[
    (SourceTag::Cases, "Japan (+Diamond Princess)", "Japan"),
    (SourceTag::Capitals, "Micronesia Federated States Of", "Micronesia"),
    (SourceTag::Capitals, "Congo (Brazzaville)", "Congo"),
    (SourceTag::Capitals, "Congo (Kinshasa)", "DR Congo"),
    (SourceTag::Capitals, "Czechia", "Czech Republic (Czechia)"),
    (SourceTag::Capitals, "Côte D’Ivoire", "Côte d'Ivoire"),
    (SourceTag::Capitals, "Antigua And Barbuda", "Antigua and Barbuda"),
    (SourceTag::Capitals, "Bosnia And Herzegovina", "Bosnia and Herzegovina"),
    (SourceTag::Capitals, "Bahamas The", "Bahamas"),
    (SourceTag::Capitals, "Burma", "Myanmar"),
    (SourceTag::Capitals, "Macedonia", "North Macedonia"),
    (SourceTag::Capitals, "Saint Kitts And Nevis", "Saint Kitts & Nevis"),
    (SourceTag::Capitals, "Sao Tome And Principe", "Sao Tome & Principe"),
    (SourceTag::Capitals, "Saint Vincent And The Grenadines", "St. Vincent & Grenadines"),
    (SourceTag::Capitals, "West Bank", "State of Palestine"),
    (SourceTag::Capitals, "Trinidad And Tobago", "Trinidad and Tobago"),
    (SourceTag::Capitals, "Swaziland", "Eswatini"),
];

/// Rows that are reported alongside countries but are not countries.
pub const BUILTIN_EXCLUSIONS: &[(SourceTag, &str)] = &[
    (SourceTag::Cases, "MS Zaandam"),
    (SourceTag::Cases, "MS ZAANDAM"),
    (SourceTag::Cases, "Diamond Princess"),
];

/// Collapse inner whitespace runs and trim the ends.
pub fn clean_name(raw: &str) -> String {
    WHITESPACE.replace_all(raw.trim(), " ").into_owned()
}

#[derive(Debug, Clone, Default)]
pub struct NameNormalizer {
    aliases: HashMap<(SourceTag, String), String>,
    exclusions: HashSet<(SourceTag, String)>,
}

impl NameNormalizer {
    /// A normalizer with no entries; every name passes through cleaned.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn builtin() -> Self {
        let mut normalizer = Self::empty();
        for (source, spelling, canonical) in BUILTIN_ALIASES {
            normalizer.add_alias(*source, spelling, canonical);
        }
        for (source, name) in BUILTIN_EXCLUSIONS {
            normalizer.add_exclusion(*source, name);
        }
        normalizer
    }

    /// Later entries for the same (source, spelling) replace earlier ones.
    pub fn add_alias(&mut self, source: SourceTag, spelling: &str, canonical: &str) {
        self.aliases
            .insert((source, clean_name(spelling)), clean_name(canonical));
    }

    pub fn add_exclusion(&mut self, source: SourceTag, name: &str) {
        self.exclusions.insert((source, clean_name(name)));
    }

    pub fn alias_count(&self) -> usize {
        self.aliases.len()
    }

    /// Map a source spelling to its canonical name. Never fails: unknown
    /// spellings come back cleaned but otherwise unchanged.
    pub fn normalize(&self, raw_name: &str, source: SourceTag) -> String {
        let key = (source, clean_name(raw_name));
        match self.aliases.get(&key) {
            Some(canonical) => canonical.clone(),
            None => key.1,
        }
    }

    pub fn is_excluded(&self, raw_name: &str, source: SourceTag) -> bool {
        self.exclusions.contains(&(source, clean_name(raw_name)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_aliases_are_per_source() {
        let normalizer = NameNormalizer::builtin();

        assert_eq!(normalizer.normalize("Burma", SourceTag::Capitals), "Myanmar");
        // only the capitals source spells it this way
        assert_eq!(normalizer.normalize("Burma", SourceTag::Cases), "Burma");
        assert_eq!(
            normalizer.normalize("Japan (+Diamond Princess)", SourceTag::Cases),
            "Japan"
        );
        assert_eq!(
            normalizer.normalize("Congo (Kinshasa)", SourceTag::Capitals),
            "DR Congo"
        );
    }

    #[test]
    fn test_unmapped_names_pass_through_cleaned() {
        let normalizer = NameNormalizer::builtin();

        assert_eq!(normalizer.normalize("France", SourceTag::Population), "France");
        assert_eq!(
            normalizer.normalize("  South   Korea ", SourceTag::Population),
            "South Korea"
        );
        assert_eq!(normalizer.normalize("", SourceTag::Cases), "");
    }

    #[test]
    fn test_whitespace_variants_hit_the_alias() {
        let normalizer = NameNormalizer::builtin();
        assert_eq!(
            normalizer.normalize(" Bosnia  And Herzegovina", SourceTag::Capitals),
            "Bosnia and Herzegovina"
        );
    }

    #[test]
    fn test_added_alias_overrides_builtin() {
        let mut normalizer = NameNormalizer::builtin();
        normalizer.add_alias(SourceTag::Capitals, "Burma", "Burma/Myanmar");

        assert_eq!(
            normalizer.normalize("Burma", SourceTag::Capitals),
            "Burma/Myanmar"
        );
    }

    #[test]
    fn test_exclusions() {
        let normalizer = NameNormalizer::builtin();

        assert!(normalizer.is_excluded("MS Zaandam", SourceTag::Cases));
        assert!(normalizer.is_excluded(" Diamond Princess ", SourceTag::Cases));
        assert!(!normalizer.is_excluded("MS Zaandam", SourceTag::Population));
        assert!(!normalizer.is_excluded("Japan", SourceTag::Cases));
    }
}
