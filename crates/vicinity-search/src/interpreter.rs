//! Query interpreter: raw utterance text to structured search intent.
//!
//! [`interpret`] is the full contract including store-backed location
//! verification; [`interpret_with_location`] is the pure remainder and is
//! what the unit tests exercise. Malformed input never fails — a text with
//! no detectable signal produces an unconstrained [`ParsedQuery`].

use serde::Serialize;
use sqlx::PgPool;

use vicinity_core::{Coordinates, SearchFilters};

use crate::catalog::CompiledCatalog;
use crate::location::{self, LocationMatch};
use crate::text::{is_stopword, stem, tokenize};
use crate::time::extract_time_window;

/// How the geographic scope of the search was decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationSource {
    None,
    TextSpecified,
    UserLocation,
    DefaultCoordinates,
}

/// Structured search intent extracted from one utterance.
#[derive(Debug, Clone, Serialize)]
pub struct ParsedQuery {
    pub cleaned_query_text: String,
    pub filters: SearchFilters,
    pub coordinates: Option<Coordinates>,
    pub location_source: LocationSource,
    pub specific_location: Option<LocationMatch>,
    pub original_text: String,
}

/// Fixed phrases meaning "around the caller's position". A named place always
/// wins over these; see [`interpret_with_location`].
const PROXIMITY_PHRASES: &[&str] = &[
    "near me",
    "nearby",
    "here",
    "around",
    "close",
    "close by",
    "walking distance",
    "my location",
    "current location",
];

/// Interpret an utterance, verifying any location mention against the store.
pub async fn interpret(
    pool: &PgPool,
    catalog: &CompiledCatalog,
    text: &str,
    coordinates: Option<Coordinates>,
) -> ParsedQuery {
    let location = location::resolve_location(pool, text).await;
    interpret_with_location(catalog, text, coordinates, location)
}

/// Pure interpretation given an already-resolved location mention.
#[must_use]
pub fn interpret_with_location(
    catalog: &CompiledCatalog,
    text: &str,
    coordinates: Option<Coordinates>,
    location: Option<LocationMatch>,
) -> ParsedQuery {
    let mut tokens = tokenize(text);

    if let Some(loc) = &location {
        strip_phrase(&mut tokens, &loc.original_match);
    }

    // A named place is mutually exclusive with proximity phrasing and takes
    // priority over it.
    let wants_proximity = location.is_none() && mentions_proximity(catalog, &tokens);

    let (location_source, coordinates) = if location.is_some() {
        (LocationSource::TextSpecified, None)
    } else if wants_proximity && coordinates.is_some() {
        (LocationSource::UserLocation, coordinates)
    } else if coordinates.is_some() {
        (LocationSource::DefaultCoordinates, coordinates)
    } else {
        (LocationSource::None, None)
    };

    let meal_time = catalog.match_meal_time(&tokens);
    let time = extract_time_window(catalog, &tokens);

    let stemmed: Vec<String> = tokens
        .iter()
        .filter(|t| !is_stopword(t))
        .map(|t| stem(t))
        .collect();
    let category_id = catalog.match_category(&stemmed);
    let service_id = catalog.match_service(&stemmed);

    let mut filters = SearchFilters {
        category_id,
        service_id,
        time,
        meal_time,
        ..SearchFilters::default()
    };
    if let Some(loc) = &location {
        filters.city_name = Some(loc.city_name.clone());
        filters.city_not_found_in_db = loc.city_not_found_in_db;
    }

    let cleaned_query_text = cleaned_text(catalog, &tokens);

    ParsedQuery {
        cleaned_query_text,
        filters,
        coordinates,
        location_source,
        specific_location: location,
        original_text: text.to_string(),
    }
}

/// True when any proximity phrase or catalog location keyword appears.
/// Single-word phrases match whole tokens; multi-word phrases match as
/// substrings of the joined token text.
fn mentions_proximity(catalog: &CompiledCatalog, tokens: &[String]) -> bool {
    let joined = tokens.join(" ");
    let phrase_present = |phrase: &str| {
        if phrase.contains(' ') {
            joined.contains(phrase)
        } else {
            tokens.iter().any(|t| t == phrase)
        }
    };

    PROXIMITY_PHRASES.iter().any(|p| phrase_present(p))
        || catalog
            .location_keywords
            .iter()
            .any(|k| phrase_present(k.as_str()))
}

/// Remove the first occurrence of `phrase`'s token sequence from `tokens`.
fn strip_phrase(tokens: &mut Vec<String>, phrase: &str) {
    let phrase_tokens = tokenize(phrase);
    if phrase_tokens.is_empty() || phrase_tokens.len() > tokens.len() {
        return;
    }
    let window = phrase_tokens.len();
    if let Some(start) = (0..=tokens.len() - window).find(|&i| tokens[i..i + window] == phrase_tokens[..])
    {
        tokens.drain(start..start + window);
    }
}

/// Residual free-text query: original surface forms in original order, minus
/// catalog keyword stems, generic search verbs and stopwords.
fn cleaned_text(catalog: &CompiledCatalog, tokens: &[String]) -> String {
    tokens
        .iter()
        .filter(|t| !is_stopword(t) && !catalog.is_removal_stem(&stem(t)))
        .cloned()
        .collect::<Vec<_>>()
        .join(" ")
}
