//! Sentiment CSV loading and country resolution
//!
//! Reads the sentiment CSV (local file or HTTP), extracts the distinct
//! country names from the first column, and resolves each against the
//! country table. Only fully resolvable countries reach the map; the rest
//! are collected so the caller can decide whether to report them.

use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::time::Duration;

use crate::countries::{self, Continent};

/// What to do with CSV rows whose country name is not in the table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnmappedPolicy {
    /// Exclude quietly
    Drop,
    /// Exclude, but print a warning per dropped name
    Report,
}

/// Map entry for one resolved country, keyed by ISO code in the result.
#[derive(Clone, Debug, PartialEq)]
pub struct CountryEntry {
    pub continent: Continent,
    /// Drill-down map assets; the first one is used
    pub maps: Vec<String>,
}

/// Result of resolving the CSV against the country table.
#[derive(Clone, Debug, Default)]
pub struct ResolvedCountries {
    /// ISO code -> entry, one per distinct resolvable country
    pub entries: HashMap<String, CountryEntry>,
    /// Distinct names that failed resolution, in order of first appearance
    pub unmapped: Vec<String>,
}

#[derive(Debug)]
pub enum CsvError {
    Io(String),
    Network(String),
    Api(String),
}

impl std::fmt::Display for CsvError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CsvError::Io(e) => write!(f, "IO error: {}", e),
            CsvError::Network(e) => write!(f, "Network error: {}", e),
            CsvError::Api(e) => write!(f, "HTTP error: {}", e),
        }
    }
}

impl std::error::Error for CsvError {}

/// Fetch the raw CSV text from a filesystem path or an http(s) URL.
pub fn fetch_csv(source: &str) -> Result<String, CsvError> {
    if source.starts_with("http://") || source.starts_with("https://") {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| CsvError::Network(e.to_string()))?;

        let response = client
            .get(source)
            .send()
            .map_err(|e| CsvError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(CsvError::Api(format!("status {} for {}", response.status(), source)));
        }

        response.text().map_err(|e| CsvError::Network(e.to_string()))
    } else {
        fs::read_to_string(source).map_err(|e| CsvError::Io(format!("{}: {}", source, e)))
    }
}

/// Extract the distinct country names from the CSV text.
///
/// The first line is a header and is discarded. Each remaining row
/// contributes the substring before its first comma, trimmed. Rows without
/// a comma contribute the whole trimmed line; if that fails resolution
/// later it follows the unmapped path like any other unknown name.
pub fn distinct_countries(text: &str) -> Vec<String> {
    let mut seen = BTreeSet::new();
    let mut names = Vec::new();

    for row in text.trim().lines().skip(1) {
        let name = row.split(',').next().unwrap_or("").trim();
        if name.is_empty() {
            continue;
        }
        if seen.insert(name.to_string()) {
            names.push(name.to_string());
        }
    }

    names
}

/// Resolve distinct names against the country table.
pub fn resolve_countries(names: &[String]) -> ResolvedCountries {
    let mut resolved = ResolvedCountries::default();

    for name in names {
        match countries::by_name(name) {
            Some(info) => {
                resolved.entries.insert(
                    info.code.to_string(),
                    CountryEntry {
                        continent: info.continent,
                        maps: vec![info.map_asset.to_string()],
                    },
                );
            }
            None => resolved.unmapped.push(name.clone()),
        }
    }

    resolved
}

/// Load and resolve the CSV in one step, applying the unmapped policy.
pub fn load_country_data(source: &str, policy: UnmappedPolicy) -> Result<ResolvedCountries, CsvError> {
    let text = fetch_csv(source)?;
    let names = distinct_countries(&text);
    let resolved = resolve_countries(&names);

    if policy == UnmappedPolicy::Report {
        for name in &resolved.unmapped {
            eprintln!("Warning: no map data for country '{}', dropping", name);
        }
    }

    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_is_discarded() {
        let names = distinct_countries("country,score\nGermany,1\n");
        assert_eq!(names, vec!["Germany"]);
    }

    #[test]
    fn test_duplicate_rows_collapse() {
        let text = "name,score\nGermany,1\nGermany,2\nRuritania,3\n";
        let names = distinct_countries(text);
        assert_eq!(names, vec!["Germany", "Ruritania"]);

        let resolved = resolve_countries(&names);
        assert_eq!(resolved.entries.len(), 1);
        let de = &resolved.entries["DE"];
        assert_eq!(de.continent.code(), "EU");
        assert_eq!(de.maps, vec!["germanyLow".to_string()]);
        assert_eq!(resolved.unmapped, vec!["Ruritania"]);
    }

    #[test]
    fn test_first_field_is_trimmed() {
        let names = distinct_countries("country,score\n  France , 7\n");
        assert_eq!(names, vec!["France"]);
    }

    #[test]
    fn test_row_without_comma_follows_unmapped_path() {
        let text = "country,score\nnot a real row\nJapan,2\n";
        let resolved = resolve_countries(&distinct_countries(text));
        assert!(resolved.entries.contains_key("JP"));
        assert_eq!(resolved.unmapped, vec!["not a real row"]);
    }

    #[test]
    fn test_unknown_names_are_excluded() {
        let resolved = resolve_countries(&["Atlantis".to_string(), "Mu".to_string()]);
        assert!(resolved.entries.is_empty());
        assert_eq!(resolved.unmapped.len(), 2);
    }

    #[test]
    fn test_united_states_entry() {
        let resolved = resolve_countries(&["United States".to_string()]);
        let us = &resolved.entries["US"];
        assert_eq!(us.continent.code(), "NA");
        assert_eq!(us.maps, vec!["usaLow".to_string()]);
    }

    #[test]
    fn test_all_resolved_continents_are_valid() {
        let names: Vec<String> = crate::countries::COUNTRIES
            .iter()
            .map(|c| c.name.to_string())
            .collect();
        let resolved = resolve_countries(&names);
        assert_eq!(resolved.entries.len(), crate::countries::COUNTRIES.len());
        let valid = ["AF", "AN", "AS", "EU", "NA", "OC", "SA"];
        for entry in resolved.entries.values() {
            assert!(valid.contains(&entry.continent.code()));
        }
    }
}
