//! Compiled, stem-ready view of the keyword catalog.
//!
//! The raw [`KeywordCatalog`] document is compiled once at startup: keywords
//! are stemmed ahead of time so per-query matching is pure set/substring
//! work. Entry order is preserved — category and service detection is
//! first-match-wins over the compiled lists.

use std::collections::HashSet;

use vicinity_core::{HourRange, KeywordCatalog, MealTimeFilter};

use crate::text::{stem, GENERIC_SEARCH_VERBS};

#[derive(Debug, Clone)]
pub struct CompiledCategory {
    pub name: String,
    pub id: i64,
    pub stems: HashSet<String>,
}

#[derive(Debug, Clone)]
pub struct CompiledService {
    pub name: String,
    pub id: i64,
    /// Each keyword as its stemmed word sequence.
    pub keywords: Vec<Vec<String>>,
}

#[derive(Debug, Clone)]
pub struct CompiledMealTime {
    pub name: String,
    pub keywords: Vec<String>,
    pub typical_hours: HourRange,
}

#[derive(Debug, Clone, Default)]
pub struct CompiledCatalog {
    pub categories: Vec<CompiledCategory>,
    pub services: Vec<CompiledService>,
    pub meal_times: Vec<CompiledMealTime>,
    pub open_from_keywords: Vec<String>,
    pub open_until_keywords: Vec<String>,
    pub location_keywords: Vec<String>,
    /// Stems of every catalog category/service/location keyword word plus the
    /// generic search verbs; removed from the residual query text.
    removal_stems: HashSet<String>,
}

impl CompiledCatalog {
    #[must_use]
    pub fn compile(catalog: &KeywordCatalog) -> Self {
        let mut removal_stems: HashSet<String> = HashSet::new();

        let categories = catalog
            .categories
            .iter()
            .map(|entry| {
                let stems: HashSet<String> = entry
                    .keywords
                    .iter()
                    .flat_map(|k| k.split_whitespace())
                    .map(stem)
                    .collect();
                removal_stems.extend(stems.iter().cloned());
                CompiledCategory {
                    name: entry.name.clone(),
                    id: entry.id,
                    stems,
                }
            })
            .collect();

        let services = catalog
            .services
            .iter()
            .map(|entry| {
                let keywords: Vec<Vec<String>> = entry
                    .keywords
                    .iter()
                    .map(|k| k.split_whitespace().map(stem).collect::<Vec<_>>())
                    .collect();
                removal_stems.extend(keywords.iter().flatten().cloned());
                CompiledService {
                    name: entry.name.clone(),
                    id: entry.id,
                    keywords,
                }
            })
            .collect();

        let meal_times = catalog
            .meal_times
            .iter()
            .map(|entry| CompiledMealTime {
                name: entry.name.clone(),
                keywords: entry.keywords.iter().map(|k| k.to_lowercase()).collect(),
                typical_hours: entry.typical_hours.clone(),
            })
            .collect();

        removal_stems.extend(
            catalog
                .location_keywords
                .iter()
                .flat_map(|k| k.split_whitespace())
                .map(stem),
        );
        removal_stems.extend(GENERIC_SEARCH_VERBS.iter().map(|v| stem(v)));

        Self {
            categories,
            services,
            meal_times,
            open_from_keywords: lowercase_all(&catalog.time_keywords.open_from),
            open_until_keywords: lowercase_all(&catalog.time_keywords.open_until),
            location_keywords: lowercase_all(&catalog.location_keywords),
            removal_stems,
        }
    }

    /// First category whose stem set intersects the stemmed tokens.
    #[must_use]
    pub fn match_category(&self, stemmed_tokens: &[String]) -> Option<i64> {
        self.categories
            .iter()
            .find(|category| stemmed_tokens.iter().any(|t| category.stems.contains(t)))
            .map(|category| category.id)
    }

    /// First service with a full-phrase match over the stem-joined text, or a
    /// compound match (every word of a multi-word keyword present among the
    /// stemmed tokens).
    #[must_use]
    pub fn match_service(&self, stemmed_tokens: &[String]) -> Option<i64> {
        let joined = stemmed_tokens.join(" ");
        self.services
            .iter()
            .find(|service| {
                service.keywords.iter().any(|words| {
                    joined.contains(&words.join(" "))
                        || words.iter().all(|w| stemmed_tokens.contains(w))
                })
            })
            .map(|service| service.id)
    }

    /// First meal period with a keyword appearing in the joined raw tokens.
    #[must_use]
    pub fn match_meal_time(&self, raw_tokens: &[String]) -> Option<MealTimeFilter> {
        let joined = raw_tokens.join(" ");
        self.meal_times
            .iter()
            .find(|meal| meal.keywords.iter().any(|k| joined.contains(k)))
            .map(|meal| MealTimeFilter {
                name: meal.name.clone(),
                typical_hours: meal.typical_hours.clone(),
            })
    }

    #[must_use]
    pub fn is_removal_stem(&self, candidate: &str) -> bool {
        self.removal_stems.contains(candidate)
    }
}

fn lowercase_all(values: &[String]) -> Vec<String> {
    values.iter().map(|v| v.to_lowercase()).collect()
}

#[cfg(test)]
mod tests {
    use vicinity_core::{CategoryEntry, ServiceEntry};

    use super::*;
    use crate::text::{stem, tokenize};

    fn stems_of(text: &str) -> Vec<String> {
        tokenize(text).iter().map(|t| stem(t)).collect()
    }

    fn catalog_with_categories(entries: Vec<(&str, i64, Vec<&str>)>) -> CompiledCatalog {
        let raw = KeywordCatalog {
            categories: entries
                .into_iter()
                .map(|(name, id, keywords)| CategoryEntry {
                    name: name.to_string(),
                    id,
                    keywords: keywords.into_iter().map(ToString::to_string).collect(),
                })
                .collect(),
            ..KeywordCatalog::default()
        };
        CompiledCatalog::compile(&raw)
    }

    #[test]
    fn category_matching_uses_stems() {
        let catalog = catalog_with_categories(vec![("pizzeria", 2, vec!["pizzeria", "pizza"])]);
        assert_eq!(catalog.match_category(&stems_of("two pizzas to go")), Some(2));
        assert_eq!(catalog.match_category(&stems_of("sushi place")), None);
    }

    #[test]
    fn category_matching_is_first_match_wins_in_document_order() {
        let catalog = catalog_with_categories(vec![
            ("pizzeria", 2, vec!["pizza"]),
            ("restaurant", 1, vec!["restaurant", "pizza"]),
        ]);
        // Both entries match "pizza"; document order decides.
        assert_eq!(catalog.match_category(&stems_of("pizza restaurant")), Some(2));
    }

    #[test]
    fn service_matching_accepts_single_word_keyword() {
        let raw = KeywordCatalog {
            services: vec![ServiceEntry {
                name: "takeaway".to_string(),
                id: 1,
                keywords: vec!["takeaway".to_string(), "take away".to_string()],
            }],
            ..KeywordCatalog::default()
        };
        let catalog = CompiledCatalog::compile(&raw);
        assert_eq!(catalog.match_service(&stems_of("pizza takeaway tonight")), Some(1));
    }

    #[test]
    fn service_matching_accepts_compound_keyword_with_words_apart() {
        let raw = KeywordCatalog {
            services: vec![ServiceEntry {
                name: "takeaway".to_string(),
                id: 1,
                keywords: vec!["take away".to_string()],
            }],
            ..KeywordCatalog::default()
        };
        let catalog = CompiledCatalog::compile(&raw);
        // "take" and "away" both present, though not adjacent.
        assert_eq!(
            catalog.match_service(&stems_of("take the food away")),
            Some(1)
        );
        assert_eq!(catalog.match_service(&stems_of("take the food home")), None);
    }

    #[test]
    fn meal_time_matching_attaches_typical_hours() {
        let raw: KeywordCatalog = serde_yaml::from_str(
            "meal_times:\n  - name: dinner\n    keywords: [dinner, supper]\n    typical_hours: { from: \"19:00\", to: \"23:00\" }\n",
        )
        .expect("parse");
        let catalog = CompiledCatalog::compile(&raw);
        let meal = catalog
            .match_meal_time(&tokenize("somewhere for dinner"))
            .expect("meal time detected");
        assert_eq!(meal.name, "dinner");
        assert_eq!(meal.typical_hours.from, "19:00");
        assert!(catalog.match_meal_time(&tokenize("morning coffee")).is_none());
    }

    #[test]
    fn removal_stems_cover_keywords_and_search_verbs() {
        let catalog = catalog_with_categories(vec![("pizzeria", 2, vec!["pizza"])]);
        assert!(catalog.is_removal_stem("pizza"));
        assert!(catalog.is_removal_stem(&stem("looking")));
        assert!(!catalog.is_removal_stem("italian"));
    }

    #[test]
    fn empty_catalog_matches_nothing() {
        let catalog = CompiledCatalog::compile(&KeywordCatalog::default());
        assert_eq!(catalog.match_category(&stems_of("pizza")), None);
        assert_eq!(catalog.match_service(&stems_of("delivery")), None);
        assert!(catalog.match_meal_time(&tokenize("dinner")).is_none());
    }
}
