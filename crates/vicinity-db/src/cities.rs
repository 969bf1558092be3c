//! Distinct-city lookups backing the location resolver.
//!
//! The resolver probes these with each generated spelling variant: exact
//! first, then substring. Both return the store's canonical spelling.

use sqlx::PgPool;

use crate::DbError;

/// Case-insensitive exact match against the known city values.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn find_city_exact(pool: &PgPool, name: &str) -> Result<Option<String>, DbError> {
    let row: Option<(String,)> = sqlx::query_as(
        "SELECT city FROM businesses \
         WHERE deleted_at IS NULL AND city IS NOT NULL AND LOWER(city) = $1 \
         ORDER BY city ASC LIMIT 1",
    )
    .bind(name.to_lowercase())
    .fetch_optional(pool)
    .await?;
    Ok(row.map(|(city,)| city))
}

/// Bidirectional substring match: the stored city contains the candidate, or
/// the candidate contains the stored city (covers captures with trailing
/// words, e.g. "springfield tonight").
///
/// Shorter city values win ties so the tightest match is returned.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn find_city_partial(pool: &PgPool, name: &str) -> Result<Option<String>, DbError> {
    let row: Option<(String,)> = sqlx::query_as(
        "SELECT city FROM businesses \
         WHERE deleted_at IS NULL AND city IS NOT NULL \
           AND (LOWER(city) LIKE '%' || $1 || '%' OR $1 LIKE '%' || LOWER(city) || '%') \
         ORDER BY LENGTH(city) ASC, city ASC LIMIT 1",
    )
    .bind(name.to_lowercase())
    .fetch_optional(pool)
    .await?;
    Ok(row.map(|(city,)| city))
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn seed_city(pool: &PgPool, name: &str, city: &str) {
        sqlx::query("INSERT INTO businesses (name, city, country) VALUES ($1, $2, 'US')")
            .bind(name)
            .bind(city)
            .execute(pool)
            .await
            .expect("seed business");
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn exact_match_returns_canonical_spelling(pool: PgPool) {
        seed_city(&pool, "Moe's", "Springfield").await;

        let found = find_city_exact(&pool, "springfield").await.expect("query");
        assert_eq!(found.as_deref(), Some("Springfield"));
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn exact_match_misses_unknown_city(pool: PgPool) {
        seed_city(&pool, "Moe's", "Springfield").await;

        let found = find_city_exact(&pool, "shelbyville").await.expect("query");
        assert!(found.is_none());
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn partial_match_accepts_candidate_with_trailing_words(pool: PgPool) {
        seed_city(&pool, "Moe's", "Springfield").await;

        let found = find_city_partial(&pool, "springfield tonight")
            .await
            .expect("query");
        assert_eq!(found.as_deref(), Some("Springfield"));
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn partial_match_ignores_soft_deleted_rows(pool: PgPool) {
        seed_city(&pool, "Moe's", "Springfield").await;
        sqlx::query("UPDATE businesses SET deleted_at = NOW()")
            .execute(&pool)
            .await
            .expect("soft delete");

        let found = find_city_partial(&pool, "springfield").await.expect("query");
        assert!(found.is_none());
    }
}
