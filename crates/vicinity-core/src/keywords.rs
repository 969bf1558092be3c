//! Keyword catalog document model and loader.
//!
//! The catalog drives the query interpreter: category/service keyword sets,
//! meal periods with their typical hours, and the generic time/location
//! keyword lists. It is loaded once at startup and shared read-only.
//!
//! Entry order in the document is significant: category and service
//! detection is first-match-wins.

use std::collections::HashSet;
use std::path::Path;

use serde::Deserialize;

use crate::types::HourRange;
use crate::ConfigError;

#[derive(Debug, Clone, Deserialize)]
pub struct CategoryEntry {
    pub name: String,
    pub id: i64,
    #[serde(default)]
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceEntry {
    pub name: String,
    pub id: i64,
    #[serde(default)]
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MealTimeEntry {
    pub name: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    pub typical_hours: HourRange,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TimeKeywords {
    #[serde(default)]
    pub open_from: Vec<String>,
    #[serde(default)]
    pub open_until: Vec<String>,
}

/// The full keyword catalog. Every section defaults to empty, so a partial
/// document (or an empty one) loads fine and simply detects nothing for the
/// missing dimensions.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct KeywordCatalog {
    #[serde(default)]
    pub categories: Vec<CategoryEntry>,
    #[serde(default)]
    pub services: Vec<ServiceEntry>,
    #[serde(default)]
    pub meal_times: Vec<MealTimeEntry>,
    #[serde(default)]
    pub time_keywords: TimeKeywords,
    #[serde(default)]
    pub location_keywords: Vec<String>,
}

/// Load and validate the keyword catalog from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_keywords(path: &Path) -> Result<KeywordCatalog, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::KeywordsFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let catalog: KeywordCatalog =
        serde_yaml::from_str(&content).map_err(ConfigError::KeywordsFileParse)?;

    validate_keywords(&catalog)?;

    Ok(catalog)
}

fn validate_keywords(catalog: &KeywordCatalog) -> Result<(), ConfigError> {
    let mut seen_category_ids = HashSet::new();
    for category in &catalog.categories {
        if category.name.trim().is_empty() {
            return Err(ConfigError::Validation(
                "category name must be non-empty".to_string(),
            ));
        }
        if !seen_category_ids.insert(category.id) {
            return Err(ConfigError::Validation(format!(
                "duplicate category id: {} (from category '{}')",
                category.id, category.name
            )));
        }
    }

    let mut seen_service_ids = HashSet::new();
    for service in &catalog.services {
        if service.name.trim().is_empty() {
            return Err(ConfigError::Validation(
                "service name must be non-empty".to_string(),
            ));
        }
        if !seen_service_ids.insert(service.id) {
            return Err(ConfigError::Validation(format!(
                "duplicate service id: {} (from service '{}')",
                service.id, service.name
            )));
        }
    }

    for meal_time in &catalog.meal_times {
        if meal_time.name.trim().is_empty() {
            return Err(ConfigError::Validation(
                "meal time name must be non-empty".to_string(),
            ));
        }
        for bound in [&meal_time.typical_hours.from, &meal_time.typical_hours.to] {
            if !is_valid_hhmm(bound) {
                return Err(ConfigError::Validation(format!(
                    "meal time '{}' has invalid typical hour '{}'; expected HH:MM",
                    meal_time.name, bound
                )));
            }
        }
    }

    Ok(())
}

fn is_valid_hhmm(value: &str) -> bool {
    let Some((hours, minutes)) = value.split_once(':') else {
        return false;
    };
    let hours_ok = hours.len() == 2 && hours.parse::<u8>().is_ok_and(|h| h < 24);
    let minutes_ok = minutes.len() == 2 && minutes.parse::<u8>().is_ok_and(|m| m < 60);
    hours_ok && minutes_ok
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(document: &str) -> KeywordCatalog {
        serde_yaml::from_str(document).expect("parse catalog")
    }

    #[test]
    fn empty_document_yields_empty_catalog() {
        let catalog = parse("{}");
        assert!(catalog.categories.is_empty());
        assert!(catalog.services.is_empty());
        assert!(catalog.meal_times.is_empty());
        assert!(catalog.time_keywords.open_from.is_empty());
        assert!(catalog.location_keywords.is_empty());
    }

    #[test]
    fn missing_sections_default_to_empty() {
        let catalog = parse("categories:\n  - name: cafe\n    id: 1\n    keywords: [coffee]\n");
        assert_eq!(catalog.categories.len(), 1);
        assert!(catalog.services.is_empty());
        assert!(catalog.time_keywords.open_until.is_empty());
    }

    #[test]
    fn category_order_is_preserved() {
        let catalog = parse(
            "categories:\n  - name: pizzeria\n    id: 2\n  - name: restaurant\n    id: 1\n",
        );
        assert_eq!(catalog.categories[0].name, "pizzeria");
        assert_eq!(catalog.categories[1].name, "restaurant");
    }

    #[test]
    fn validate_rejects_duplicate_category_id() {
        let catalog = parse("categories:\n  - name: cafe\n    id: 1\n  - name: bar\n    id: 1\n");
        let err = validate_keywords(&catalog).unwrap_err();
        assert!(err.to_string().contains("duplicate category id"));
    }

    #[test]
    fn validate_rejects_malformed_typical_hours() {
        let catalog = parse(
            "meal_times:\n  - name: lunch\n    keywords: [lunch]\n    typical_hours: { from: \"12\", to: \"16:00\" }\n",
        );
        let err = validate_keywords(&catalog).unwrap_err();
        assert!(err.to_string().contains("invalid typical hour"));
    }

    #[test]
    fn validate_accepts_well_formed_catalog() {
        let catalog = parse(
            "categories:\n  - name: cafe\n    id: 1\n    keywords: [coffee]\nmeal_times:\n  - name: dinner\n    keywords: [dinner]\n    typical_hours: { from: \"19:00\", to: \"23:00\" }\n",
        );
        assert!(validate_keywords(&catalog).is_ok());
    }

    #[test]
    fn hhmm_validation() {
        assert!(is_valid_hhmm("00:00"));
        assert!(is_valid_hhmm("23:59"));
        assert!(!is_valid_hhmm("24:00"));
        assert!(!is_valid_hhmm("7:00"));
        assert!(!is_valid_hhmm("07:60"));
        assert!(!is_valid_hhmm("0700"));
    }

    #[test]
    fn load_keywords_from_real_file() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("..")
            .join("..")
            .join("config")
            .join("keywords.yaml");
        assert!(
            path.exists(),
            "keywords.yaml missing at {path:?} — required for this test"
        );
        let catalog = load_keywords(&path).expect("load keywords.yaml");
        assert!(!catalog.categories.is_empty());
        assert!(!catalog.time_keywords.open_from.is_empty());
    }
}
