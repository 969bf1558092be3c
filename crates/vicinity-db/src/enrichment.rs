//! Simple keyed fetches used by response shaping.
//!
//! None of these participate in search ranking; the server attaches them to
//! already-selected hits and degrades to empty collections on failure.

use chrono::NaiveTime;
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ServiceRow {
    pub id: i64,
    pub public_id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CategoryRow {
    pub id: i64,
    pub public_id: Uuid,
    pub name: String,
}

/// Opening hours for one weekday; the a/b pairs model split shifts.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct BusinessHoursRow {
    pub day: i16,
    pub open_a: Option<NaiveTime>,
    pub close_a: Option<NaiveTime>,
    pub open_b: Option<NaiveTime>,
    pub close_b: Option<NaiveTime>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct MenuRow {
    pub id: i64,
    pub public_id: Uuid,
    pub business_id: i64,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CoverImageRow {
    pub id: i64,
    pub public_id: Uuid,
    pub image_path: String,
}

/// Fetch service details for a set of ids. Unknown ids are silently absent.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_services_by_ids(pool: &PgPool, ids: &[i64]) -> Result<Vec<ServiceRow>, DbError> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let rows = sqlx::query_as::<_, ServiceRow>(
        "SELECT id, public_id, name FROM services WHERE id = ANY($1) ORDER BY id ASC",
    )
    .bind(ids)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Fetch a category by id.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_category(pool: &PgPool, id: i64) -> Result<Option<CategoryRow>, DbError> {
    let row = sqlx::query_as::<_, CategoryRow>(
        "SELECT id, public_id, name FROM categories WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// Fetch all opening-hours rows for a business, ordered by weekday.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_hours_for_business(
    pool: &PgPool,
    business_id: i64,
) -> Result<Vec<BusinessHoursRow>, DbError> {
    let rows = sqlx::query_as::<_, BusinessHoursRow>(
        "SELECT day, open_a, close_a, open_b, close_b \
         FROM business_hours WHERE business_id = $1 ORDER BY day ASC",
    )
    .bind(business_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Fetch the menus attached to a business.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_menus_for_business(
    pool: &PgPool,
    business_id: i64,
) -> Result<Vec<MenuRow>, DbError> {
    let rows = sqlx::query_as::<_, MenuRow>(
        "SELECT id, public_id, business_id \
         FROM business_menus WHERE business_id = $1 ORDER BY id ASC",
    )
    .bind(business_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Fetch the cover images attached to a business.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_cover_images_for_business(
    pool: &PgPool,
    business_id: i64,
) -> Result<Vec<CoverImageRow>, DbError> {
    let rows = sqlx::query_as::<_, CoverImageRow>(
        "SELECT id, public_id, image_path \
         FROM business_cover_images WHERE business_id = $1 ORDER BY id ASC",
    )
    .bind(business_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}
