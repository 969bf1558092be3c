//! Search statistics endpoint over the usage log.

use axum::{
    extract::{Query, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;

use super::{map_db_error, ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Deserialize)]
pub(super) struct StatsQuery {
    pub days: Option<i32>,
    pub user_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub(super) struct TopSearchItem {
    pub query: String,
    pub frequency: i64,
    pub average_results: f64,
}

#[derive(Debug, Serialize)]
pub(super) struct HourlyItem {
    pub hour: i32,
    pub searches: i64,
}

#[derive(Debug, Serialize)]
pub(super) struct SearchStatsData {
    pub period_days: i32,
    pub total_searches: i64,
    pub unique_users: i64,
    pub average_results: f64,
    pub average_execution_time_ms: f64,
    pub min_execution_time_ms: i32,
    pub max_execution_time_ms: i32,
    pub zero_results_percentage: f64,
    pub top_searches: Vec<TopSearchItem>,
    pub hourly_distribution: Vec<HourlyItem>,
}

/// GET /api/v1/search/stats — aggregates over the trailing window.
pub(super) async fn search_stats(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<StatsQuery>,
) -> Result<Json<ApiResponse<SearchStatsData>>, ApiError> {
    let days = normalize_days(query.days);

    let totals = vicinity_db::search_totals(&state.pool, days, query.user_id.as_deref())
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;
    let top = vicinity_db::top_searches(&state.pool, days)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;
    let hourly = vicinity_db::hourly_distribution(&state.pool, days)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let data = SearchStatsData {
        period_days: days,
        total_searches: totals.total_searches,
        unique_users: totals.unique_users,
        average_results: round2(totals.avg_results),
        average_execution_time_ms: round2(totals.avg_execution_time_ms),
        min_execution_time_ms: totals.min_execution_time_ms,
        max_execution_time_ms: totals.max_execution_time_ms,
        zero_results_percentage: zero_results_percentage(
            totals.zero_result_searches,
            totals.total_searches,
        ),
        top_searches: top
            .into_iter()
            .map(|row| TopSearchItem {
                query: row.query,
                frequency: row.frequency,
                average_results: round2(row.avg_results),
            })
            .collect(),
        hourly_distribution: hourly
            .into_iter()
            .map(|row| HourlyItem {
                hour: row.hour,
                searches: row.searches,
            })
            .collect(),
    };

    Ok(Json(ApiResponse {
        data,
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) fn normalize_days(days: Option<i32>) -> i32 {
    days.unwrap_or(7).clamp(1, 365)
}

#[allow(clippy::cast_precision_loss)]
fn zero_results_percentage(zero_results: i64, total: i64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    round2(zero_results as f64 / total as f64 * 100.0)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_days_applies_default_and_bounds() {
        assert_eq!(normalize_days(None), 7);
        assert_eq!(normalize_days(Some(0)), 1);
        assert_eq!(normalize_days(Some(-3)), 1);
        assert_eq!(normalize_days(Some(30)), 30);
        assert_eq!(normalize_days(Some(10_000)), 365);
    }

    #[test]
    fn zero_results_percentage_handles_empty_window() {
        assert!((zero_results_percentage(0, 0)).abs() < f64::EPSILON);
        assert!((zero_results_percentage(1, 2) - 50.0).abs() < f64::EPSILON);
        assert!((zero_results_percentage(1, 3) - 33.33).abs() < f64::EPSILON);
    }
}
