//! Voice search orchestration: interpretation composed with execution.

use serde::Serialize;
use sqlx::PgPool;

use vicinity_core::{Coordinates, SearchRequest, DEFAULT_RADIUS_KM};
use vicinity_db::SearchResult;

use crate::catalog::CompiledCatalog;
use crate::interpreter::{interpret, LocationSource, ParsedQuery};

/// Radius when the caller explicitly asked for results near their position.
const USER_LOCATION_RADIUS_KM: f64 = 5.0;
/// Wider radius when coordinates were supplied without an explicit wish.
const DEFAULT_COORDINATES_RADIUS_KM: f64 = 10.0;

/// The search result together with the interpretation trace that produced
/// it; the trace is returned for diagnostics and testing.
#[derive(Debug, Serialize)]
pub struct VoiceSearchOutcome {
    pub results: SearchResult,
    pub search_params: ParsedQuery,
}

/// Interpret an utterance and run the resulting search.
pub async fn process_voice_search(
    pool: &PgPool,
    catalog: &CompiledCatalog,
    text: &str,
    coordinates: Option<Coordinates>,
) -> VoiceSearchOutcome {
    let parsed = interpret(pool, catalog, text, coordinates).await;

    tracing::info!(
        location_source = ?parsed.location_source,
        city = parsed.filters.city_name.as_deref().unwrap_or(""),
        cleaned_query = %parsed.cleaned_query_text,
        "interpreted voice query"
    );

    let request = search_request_for(&parsed);
    let results = vicinity_db::execute_search(pool, &request).await;

    VoiceSearchOutcome {
        results,
        search_params: parsed,
    }
}

/// Map an interpretation onto an executable request. A resolved city filter
/// makes the radius irrelevant and drops coordinates; otherwise the location
/// strategy decides radius and scope.
#[must_use]
pub fn search_request_for(parsed: &ParsedQuery) -> SearchRequest {
    let (coordinates, radius_km) = if parsed.filters.city_name.is_some() {
        (None, DEFAULT_RADIUS_KM)
    } else {
        match parsed.location_source {
            LocationSource::UserLocation => (parsed.coordinates, USER_LOCATION_RADIUS_KM),
            LocationSource::DefaultCoordinates => {
                (parsed.coordinates, DEFAULT_COORDINATES_RADIUS_KM)
            }
            LocationSource::None | LocationSource::TextSpecified => (None, DEFAULT_RADIUS_KM),
        }
    };

    SearchRequest {
        query_text: parsed.cleaned_query_text.clone(),
        filters: parsed.filters.clone(),
        coordinates,
        radius_km,
        ..SearchRequest::default()
    }
}
