//! Location mention extraction and store verification.
//!
//! Candidate extraction is pure: an ordered grammar of preposition-anchored
//! patterns over the lowercased text, an exclusion set, suffix stripping and
//! spelling-variant generation, each testable on its own. Verification
//! against the store's known city values is the only interpretation step
//! that touches the database.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use sqlx::PgPool;

/// Preposition patterns in match-priority order. Each captures the following
/// run of letters/spaces; punctuation, digits or end of text delimit it.
static PATTERNS: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    ["in", "at", "near", "around", "by"]
        .into_iter()
        .map(|prep| {
            let pattern =
                format!(r"(?:^|[\s,]){prep}\s+(\p{{L}}[\p{{L}}']*(?:\s+\p{{L}}[\p{{L}}']*)*)");
            (prep, Regex::new(&pattern).expect("valid location pattern"))
        })
        .collect()
});

/// Tokens that disqualify a candidate outright: pronouns, articles and the
/// generic food/ordering nouns that follow the same prepositions.
const EXCLUDED_TOKENS: &[&str] = &[
    "me", "my", "you", "your", "us", "our", "them", "him", "her", "it", "here", "there", "the",
    "a", "an", "this", "that", "these", "those", "food", "pizza", "restaurant", "restaurants",
    "cafe", "bar", "breakfast", "lunch", "dinner", "coffee", "menu", "order", "delivery",
    "takeaway", "home", "work", "front", "person", "phone", "least", "moment",
];

/// Generic trailing suffixes stripped before verification.
const GENERIC_SUFFIXES: &[&str] = &[
    "city",
    "town",
    "area",
    "downtown",
    "center",
    "centre",
    "district",
    "neighborhood",
];

/// A syntactically-accepted location mention, before store verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationCandidate {
    pub preposition: &'static str,
    /// Matched phrase including the preposition, e.g. "in springfield".
    pub original_match: String,
    /// The captured text as detected.
    pub detected: String,
    /// After suffix stripping; this is what gets verified.
    pub cleaned: String,
}

/// A resolved location mention. `city_name` is the store's canonical
/// spelling when verified, otherwise the cleaned detected text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocationMatch {
    pub city_name: String,
    pub detected_name: String,
    pub original_match: String,
    pub city_not_found_in_db: bool,
}

/// Run the pattern grammar over the text and return every candidate that
/// survives the exclusion and length checks, in pattern order then match
/// order.
#[must_use]
pub fn extract_candidates(text: &str) -> Vec<LocationCandidate> {
    let lowered = text.to_lowercase();
    let mut candidates = Vec::new();

    for (preposition, pattern) in PATTERNS.iter() {
        for caps in pattern.captures_iter(&lowered) {
            let Some(detected) = caps.get(1).map(|m| m.as_str().trim()) else {
                continue;
            };
            if detected.chars().count() < 2 {
                continue;
            }
            if detected
                .split_whitespace()
                .any(|t| EXCLUDED_TOKENS.contains(&t))
            {
                continue;
            }

            let cleaned = strip_suffixes(detected);
            if cleaned.chars().count() < 2 {
                continue;
            }

            candidates.push(LocationCandidate {
                preposition,
                original_match: format!("{preposition} {detected}"),
                detected: detected.to_string(),
                cleaned,
            });
        }
    }

    candidates
}

fn strip_suffixes(candidate: &str) -> String {
    let mut words: Vec<&str> = candidate.split_whitespace().collect();
    while let Some(last) = words.last() {
        if words.len() > 1 && GENERIC_SUFFIXES.contains(last) {
            words.pop();
        } else if words.len() == 1 && GENERIC_SUFFIXES.contains(last) {
            // "downtown" alone is not a place name.
            words.pop();
        } else {
            break;
        }
    }
    words.join(" ")
}

/// Normalized spelling variants tried against the store: the cleaned name
/// itself, an accent-stripped form, and saint/st prefix swaps.
#[must_use]
pub fn spelling_variants(name: &str) -> Vec<String> {
    let mut variants = vec![name.to_string()];

    let folded = fold_accents(name);
    if !variants.contains(&folded) {
        variants.push(folded);
    }

    for variant in variants.clone() {
        if let Some(rest) = variant.strip_prefix("st ") {
            let expanded = format!("saint {rest}");
            if !variants.contains(&expanded) {
                variants.push(expanded);
            }
        } else if let Some(rest) = variant.strip_prefix("saint ") {
            let shortened = format!("st {rest}");
            if !variants.contains(&shortened) {
                variants.push(shortened);
            }
        }
    }

    variants
}

fn fold_accents(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            'á' | 'à' | 'â' | 'ä' | 'ã' | 'å' => 'a',
            'é' | 'è' | 'ê' | 'ë' => 'e',
            'í' | 'ì' | 'î' | 'ï' => 'i',
            'ó' | 'ò' | 'ô' | 'ö' | 'õ' => 'o',
            'ú' | 'ù' | 'û' | 'ü' => 'u',
            'ñ' => 'n',
            'ç' => 'c',
            other => other,
        })
        .collect()
}

/// Extract a location mention from the text and verify it against the known
/// city values. Returns the first accepted candidate: store-verified with
/// canonical spelling, or marked `city_not_found_in_db` when no exact or
/// partial lookup hits across any spelling variant.
///
/// Store errors during verification degrade to the unverified form — a
/// search must never fail because city verification was unavailable.
pub async fn resolve_location(pool: &PgPool, text: &str) -> Option<LocationMatch> {
    let candidate = extract_candidates(text).into_iter().next()?;
    let variants = spelling_variants(&candidate.cleaned);

    for variant in &variants {
        match vicinity_db::find_city_exact(pool, variant).await {
            Ok(Some(city)) => {
                return Some(LocationMatch {
                    city_name: city,
                    detected_name: candidate.detected,
                    original_match: candidate.original_match,
                    city_not_found_in_db: false,
                });
            }
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(error = %e, variant, "city verification failed, continuing unverified");
            }
        }
    }

    for variant in &variants {
        match vicinity_db::find_city_partial(pool, variant).await {
            Ok(Some(city)) => {
                return Some(LocationMatch {
                    city_name: city,
                    detected_name: candidate.detected,
                    original_match: candidate.original_match,
                    city_not_found_in_db: false,
                });
            }
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(error = %e, variant, "city verification failed, continuing unverified");
            }
        }
    }

    Some(LocationMatch {
        city_name: candidate.cleaned,
        detected_name: candidate.detected,
        original_match: candidate.original_match,
        city_not_found_in_db: true,
    })
}
