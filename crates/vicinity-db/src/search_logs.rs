//! Best-effort usage logging and the search statistics read models.

use sqlx::PgPool;

use vicinity_core::SearchFilters;

use crate::DbError;

/// Append one usage-log row. The executor calls this best-effort and only
/// warns on failure; callers must not treat an `Err` here as a search failure.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn record_search(
    pool: &PgPool,
    query: &str,
    filters: &SearchFilters,
    results_count: i64,
    execution_time_ms: u64,
    user_id: Option<&str>,
) -> Result<(), DbError> {
    let filters_json = serde_json::to_value(filters)
        .ok()
        .filter(|v| v != &serde_json::json!({}));

    sqlx::query(
        "INSERT INTO search_logs (query, filters, results_count, execution_time_ms, user_id) \
         VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(query)
    .bind(filters_json)
    .bind(i32::try_from(results_count).unwrap_or(i32::MAX))
    .bind(i32::try_from(execution_time_ms).unwrap_or(i32::MAX))
    .bind(user_id)
    .execute(pool)
    .await?;
    Ok(())
}

/// Aggregate totals over the trailing window.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SearchTotalsRow {
    pub total_searches: i64,
    pub unique_users: i64,
    pub avg_results: f64,
    pub avg_execution_time_ms: f64,
    pub min_execution_time_ms: i32,
    pub max_execution_time_ms: i32,
    pub zero_result_searches: i64,
}

/// A frequent query over the trailing window.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TopSearchRow {
    pub query: String,
    pub frequency: i64,
    pub avg_results: f64,
}

/// Search volume for one hour of the day over the trailing window.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct HourlySearchesRow {
    pub hour: i32,
    pub searches: i64,
}

/// Aggregate search totals over the last `days` days, optionally restricted
/// to a single user.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn search_totals(
    pool: &PgPool,
    days: i32,
    user_id: Option<&str>,
) -> Result<SearchTotalsRow, DbError> {
    let row = if let Some(user) = user_id {
        sqlx::query_as::<_, SearchTotalsRow>(
            "SELECT COUNT(*) AS total_searches, \
                    COUNT(DISTINCT user_id) AS unique_users, \
                    COALESCE(AVG(results_count), 0)::DOUBLE PRECISION AS avg_results, \
                    COALESCE(AVG(execution_time_ms), 0)::DOUBLE PRECISION AS avg_execution_time_ms, \
                    COALESCE(MIN(execution_time_ms), 0) AS min_execution_time_ms, \
                    COALESCE(MAX(execution_time_ms), 0) AS max_execution_time_ms, \
                    COUNT(*) FILTER (WHERE results_count = 0) AS zero_result_searches \
             FROM search_logs \
             WHERE created_at >= NOW() - MAKE_INTERVAL(days => $1) \
               AND user_id = $2",
        )
        .bind(days)
        .bind(user)
        .fetch_one(pool)
        .await?
    } else {
        sqlx::query_as::<_, SearchTotalsRow>(
            "SELECT COUNT(*) AS total_searches, \
                    COUNT(DISTINCT user_id) AS unique_users, \
                    COALESCE(AVG(results_count), 0)::DOUBLE PRECISION AS avg_results, \
                    COALESCE(AVG(execution_time_ms), 0)::DOUBLE PRECISION AS avg_execution_time_ms, \
                    COALESCE(MIN(execution_time_ms), 0) AS min_execution_time_ms, \
                    COALESCE(MAX(execution_time_ms), 0) AS max_execution_time_ms, \
                    COUNT(*) FILTER (WHERE results_count = 0) AS zero_result_searches \
             FROM search_logs \
             WHERE created_at >= NOW() - MAKE_INTERVAL(days => $1)",
        )
        .bind(days)
        .fetch_one(pool)
        .await?
    };
    Ok(row)
}

/// Top 10 queries by frequency over the last `days` days.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn top_searches(pool: &PgPool, days: i32) -> Result<Vec<TopSearchRow>, DbError> {
    let rows = sqlx::query_as::<_, TopSearchRow>(
        "SELECT query, \
                COUNT(*) AS frequency, \
                COALESCE(AVG(results_count), 0)::DOUBLE PRECISION AS avg_results \
         FROM search_logs \
         WHERE created_at >= NOW() - MAKE_INTERVAL(days => $1) \
         GROUP BY query \
         ORDER BY frequency DESC, query ASC \
         LIMIT 10",
    )
    .bind(days)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Per-hour search counts over the last `days` days.
///
/// Hours with no searches are absent from the result.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn hourly_distribution(
    pool: &PgPool,
    days: i32,
) -> Result<Vec<HourlySearchesRow>, DbError> {
    let rows = sqlx::query_as::<_, HourlySearchesRow>(
        "SELECT EXTRACT(HOUR FROM created_at)::INT AS hour, \
                COUNT(*) AS searches \
         FROM search_logs \
         WHERE created_at >= NOW() - MAKE_INTERVAL(days => $1) \
         GROUP BY 1 \
         ORDER BY 1",
    )
    .bind(days)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use vicinity_core::SearchFilters;

    use super::*;

    #[sqlx::test(migrations = "../../migrations")]
    async fn record_and_aggregate_search_logs(pool: PgPool) {
        record_search(&pool, "pizza", &SearchFilters::default(), 4, 12, Some("u1"))
            .await
            .expect("record");
        record_search(&pool, "pizza", &SearchFilters::default(), 0, 30, Some("u2"))
            .await
            .expect("record");
        record_search(&pool, "sushi", &SearchFilters::default(), 2, 18, None)
            .await
            .expect("record");

        let totals = search_totals(&pool, 7, None).await.expect("totals");
        assert_eq!(totals.total_searches, 3);
        assert_eq!(totals.unique_users, 2);
        assert_eq!(totals.zero_result_searches, 1);
        assert_eq!(totals.min_execution_time_ms, 12);
        assert_eq!(totals.max_execution_time_ms, 30);

        let top = top_searches(&pool, 7).await.expect("top");
        assert_eq!(top[0].query, "pizza");
        assert_eq!(top[0].frequency, 2);

        let hourly = hourly_distribution(&pool, 7).await.expect("hourly");
        assert_eq!(hourly.iter().map(|h| h.searches).sum::<i64>(), 3);
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn totals_can_be_restricted_to_one_user(pool: PgPool) {
        record_search(&pool, "pizza", &SearchFilters::default(), 4, 12, Some("u1"))
            .await
            .expect("record");
        record_search(&pool, "sushi", &SearchFilters::default(), 2, 18, Some("u2"))
            .await
            .expect("record");

        let totals = search_totals(&pool, 7, Some("u1")).await.expect("totals");
        assert_eq!(totals.total_searches, 1);
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn detected_filters_are_stored_as_json(pool: PgPool) {
        let filters = SearchFilters {
            category_id: Some(2),
            ..SearchFilters::default()
        };
        record_search(&pool, "pizza", &filters, 1, 5, None)
            .await
            .expect("record");

        let stored: serde_json::Value =
            sqlx::query_scalar("SELECT filters FROM search_logs LIMIT 1")
                .fetch_one(&pool)
                .await
                .expect("fetch filters");
        assert_eq!(stored["category_id"], serde_json::json!(2));
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn empty_filters_are_stored_as_null(pool: PgPool) {
        record_search(&pool, "pizza", &SearchFilters::default(), 1, 5, None)
            .await
            .expect("record");

        let stored: Option<serde_json::Value> =
            sqlx::query_scalar("SELECT filters FROM search_logs LIMIT 1")
                .fetch_one(&pool)
                .await
                .expect("fetch filters");
        assert!(stored.is_none());
    }
}
