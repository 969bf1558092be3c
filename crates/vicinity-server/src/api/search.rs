//! Search endpoints: structured GET search and voice POST search with
//! response shaping (services, opening hours, menus, cover images attached).

use std::collections::BTreeMap;

use axum::{
    extract::{Query, State},
    Extension, Json,
};
use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use vicinity_core::{Coordinates, SearchFilters, SearchRequest, DEFAULT_PER_PAGE};
use vicinity_db::{BusinessHit, BusinessHoursRow, SearchResult, SearchStats};
use vicinity_search::ParsedQuery;

use crate::middleware::RequestId;

use super::{ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Deserialize)]
pub(super) struct StructuredSearchQuery {
    pub q: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub radius: Option<f64>,
    pub category_id: Option<i64>,
    pub service_id: Option<i64>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

/// GET /api/v1/search — structured search over explicit parameters.
/// Store failures surface inside `stats.error`, never as an HTTP error.
pub(super) async fn structured_search(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<StructuredSearchQuery>,
) -> Json<ApiResponse<SearchResult>> {
    let request = SearchRequest {
        query_text: query.q.unwrap_or_default(),
        filters: SearchFilters {
            category_id: query.category_id,
            service_id: query.service_id,
            ..SearchFilters::default()
        },
        coordinates: coordinates_from(query.latitude, query.longitude),
        radius_km: query.radius.unwrap_or(state.default_radius_km),
        page: query.page.unwrap_or(1),
        per_page: query.per_page.unwrap_or(DEFAULT_PER_PAGE),
    };

    let result = vicinity_db::execute_search(&state.pool, &request).await;

    Json(ApiResponse {
        data: result,
        meta: ResponseMeta::new(req_id.0),
    })
}

#[derive(Debug, Deserialize)]
pub(super) struct VoiceSearchBody {
    pub voice_text: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub radius: Option<f64>,
}

#[derive(Debug, Serialize)]
pub(super) struct VoiceSearchData {
    pub businesses: Vec<BusinessPayload>,
    pub stats: SearchStats,
    /// Interpretation trace, present only for voice queries.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interpretation: Option<ParsedQuery>,
}

/// POST /api/v1/search — voice search when `voice_text` is present, plain
/// radius search otherwise. Results come back shaped with enrichment data.
pub(super) async fn voice_search(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<VoiceSearchBody>,
) -> Json<ApiResponse<VoiceSearchData>> {
    let coordinates = coordinates_from(body.latitude, body.longitude);
    let voice_text = body
        .voice_text
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty());

    let (result, interpretation) = if let Some(text) = voice_text {
        let outcome =
            vicinity_search::process_voice_search(&state.pool, &state.catalog, text, coordinates)
                .await;
        (outcome.results, Some(outcome.search_params))
    } else {
        let request = SearchRequest {
            coordinates,
            radius_km: body.radius.unwrap_or(state.default_radius_km),
            ..SearchRequest::default()
        };
        (
            vicinity_db::execute_search(&state.pool, &request).await,
            None,
        )
    };

    let mut businesses = Vec::with_capacity(result.records.len());
    for hit in result.records {
        businesses.push(shape_business(&state.pool, hit).await);
    }

    Json(ApiResponse {
        data: VoiceSearchData {
            businesses,
            stats: result.stats,
            interpretation,
        },
        meta: ResponseMeta::new(req_id.0),
    })
}

fn coordinates_from(latitude: Option<f64>, longitude: Option<f64>) -> Option<Coordinates> {
    match (latitude, longitude) {
        (Some(latitude), Some(longitude)) => Some(Coordinates {
            latitude,
            longitude,
        }),
        _ => None,
    }
}

#[derive(Debug, Serialize)]
pub(super) struct ServicePayload {
    pub id: i64,
    pub service_uuid: Uuid,
    pub service_name: String,
}

#[derive(Debug, Serialize)]
pub(super) struct CategoryPayload {
    pub id: i64,
    pub category_uuid: Uuid,
    pub category_name: String,
}

#[derive(Debug, Serialize)]
pub(super) struct MenuPayload {
    pub id: i64,
    pub uuid: Uuid,
    pub business_uuid: Uuid,
}

#[derive(Debug, Serialize)]
pub(super) struct CoverImagePayload {
    pub id: i64,
    pub image_uuid: Uuid,
    pub image_path: String,
}

#[derive(Debug, Default, Serialize)]
pub(super) struct DayHoursPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub open_a: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub close_a: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub open_b: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub close_b: Option<String>,
}

#[derive(Debug, Serialize)]
pub(super) struct BusinessPayload {
    pub id: i64,
    pub business_uuid: Uuid,
    pub business_name: String,
    pub business_about_us: Option<String>,
    pub business_address: Option<String>,
    pub business_email: Option<String>,
    pub business_phone: Option<String>,
    pub business_latitude: Option<f64>,
    pub business_longitude: Option<f64>,
    pub business_city: Option<String>,
    pub business_country: Option<String>,
    pub business_zipcode: Option<String>,
    pub business_website: Option<String>,
    pub business_logo: Option<String>,
    pub business_additional_info: Option<String>,
    pub category_id: Option<i64>,
    pub category: Option<CategoryPayload>,
    pub business_services: Vec<ServicePayload>,
    pub business_opening_hours: BTreeMap<String, DayHoursPayload>,
    pub business_menus: Vec<MenuPayload>,
    pub cover_images: Vec<CoverImagePayload>,
    pub distance: f64,
    pub score: f64,
}

/// Attach enrichment data to one hit. Every lookup degrades to an empty
/// collection on failure; shaping never fails the request.
async fn shape_business(pool: &PgPool, hit: BusinessHit) -> BusinessPayload {
    let service_ids = parse_service_ids(hit.service_ids.as_deref());
    let services = vicinity_db::list_services_by_ids(pool, &service_ids)
        .await
        .unwrap_or_else(|e| {
            tracing::warn!(error = %e, business_id = hit.id, "service enrichment failed");
            Vec::new()
        });
    let hours = vicinity_db::list_hours_for_business(pool, hit.id)
        .await
        .unwrap_or_else(|e| {
            tracing::warn!(error = %e, business_id = hit.id, "hours enrichment failed");
            Vec::new()
        });
    let menus = vicinity_db::list_menus_for_business(pool, hit.id)
        .await
        .unwrap_or_else(|e| {
            tracing::warn!(error = %e, business_id = hit.id, "menu enrichment failed");
            Vec::new()
        });
    let cover_images = vicinity_db::list_cover_images_for_business(pool, hit.id)
        .await
        .unwrap_or_else(|e| {
            tracing::warn!(error = %e, business_id = hit.id, "cover image enrichment failed");
            Vec::new()
        });

    let category = match hit.category_id {
        Some(category_id) => vicinity_db::get_category(pool, category_id)
            .await
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, business_id = hit.id, "category enrichment failed");
                None
            }),
        None => None,
    };

    BusinessPayload {
        id: hit.id,
        business_uuid: hit.public_id,
        business_name: hit.name,
        business_about_us: hit.about_us,
        business_address: hit.address,
        business_email: hit.email,
        business_phone: hit.phone,
        business_latitude: hit.latitude,
        business_longitude: hit.longitude,
        business_city: hit.city,
        business_country: hit.country,
        business_zipcode: hit.zipcode,
        business_website: hit.website,
        business_logo: hit.logo_url,
        business_additional_info: hit.additional_info,
        category_id: hit.category_id,
        category: category.map(|c| CategoryPayload {
            id: c.id,
            category_uuid: c.public_id,
            category_name: c.name,
        }),
        business_services: services
            .into_iter()
            .map(|s| ServicePayload {
                id: s.id,
                service_uuid: s.public_id,
                service_name: s.name,
            })
            .collect(),
        business_opening_hours: hours_by_day(&hours),
        business_menus: menus
            .into_iter()
            .map(|m| MenuPayload {
                id: m.id,
                uuid: m.public_id,
                business_uuid: hit.public_id,
            })
            .collect(),
        cover_images: cover_images
            .into_iter()
            .map(|img| CoverImagePayload {
                id: img.id,
                image_uuid: img.public_id,
                image_path: img.image_path,
            })
            .collect(),
        distance: hit.distance_km.map_or(0.0, round2),
        score: f64::from(hit.relevance),
    }
}

fn parse_service_ids(raw: Option<&str>) -> Vec<i64> {
    raw.map(|joined| {
        joined
            .split(',')
            .filter_map(|part| part.trim().parse::<i64>().ok())
            .collect()
    })
    .unwrap_or_default()
}

/// All seven weekdays keyed `day_0`..`day_6`; days without hours stay empty.
fn hours_by_day(rows: &[BusinessHoursRow]) -> BTreeMap<String, DayHoursPayload> {
    let mut days: BTreeMap<String, DayHoursPayload> = (0..7)
        .map(|d| (format!("day_{d}"), DayHoursPayload::default()))
        .collect();
    for row in rows {
        days.insert(
            format!("day_{}", row.day),
            DayHoursPayload {
                open_a: row.open_a.map(format_time),
                close_a: row.close_a.map(format_time),
                open_b: row.open_b.map(format_time),
                close_b: row.close_b.map(format_time),
            },
        );
    }
    days
}

fn format_time(time: NaiveTime) -> String {
    time.format("%H:%M").to_string()
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
