//! Shared search domain types used across the interpreter, planner and server.

use serde::{Deserialize, Serialize};

/// Hard cap on the geo-search radius; caller-supplied values are clamped here.
pub const MAX_RADIUS_KM: f64 = 50.0;
/// Radius applied when the caller supplies coordinates but no radius.
pub const DEFAULT_RADIUS_KM: f64 = 5.0;
pub const DEFAULT_PER_PAGE: i64 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// Opening-hours constraint extracted from query text, 24h "HH:MM" strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub open_from: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub open_until: Option<String>,
}

impl TimeWindow {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.open_from.is_none() && self.open_until.is_none()
    }
}

/// An inclusive hour range, 24h "HH:MM" strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HourRange {
    pub from: String,
    pub to: String,
}

/// A detected meal period together with its configured typical hours.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MealTimeFilter {
    pub name: String,
    pub typical_hours: HourRange,
}

/// Structured constraints for a business search.
///
/// A field is `Some`/`true` only when the corresponding signal was detected;
/// absence means "unconstrained", not "false".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchFilters {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<TimeWindow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meal_time: Option<MealTimeFilter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city_name: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub city_not_found_in_db: bool,
}

impl SearchFilters {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.category_id.is_none()
            && self.service_id.is_none()
            && self.time.is_none()
            && self.meal_time.is_none()
            && self.city_name.is_none()
    }
}

/// A fully-specified search invocation for the planner/executor.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
    pub query_text: String,
    pub filters: SearchFilters,
    pub coordinates: Option<Coordinates>,
    pub radius_km: f64,
    pub page: i64,
    pub per_page: i64,
}

impl Default for SearchRequest {
    fn default() -> Self {
        Self {
            query_text: String::new(),
            filters: SearchFilters::default(),
            coordinates: None,
            radius_km: DEFAULT_RADIUS_KM,
            page: 1,
            per_page: DEFAULT_PER_PAGE,
        }
    }
}

impl SearchRequest {
    /// Radius actually used by the planner: caller value clamped to
    /// `[0, MAX_RADIUS_KM]`; non-finite input falls back to the default.
    #[must_use]
    pub fn effective_radius_km(&self) -> f64 {
        if self.radius_km.is_finite() {
            self.radius_km.clamp(0.0, MAX_RADIUS_KM)
        } else {
            DEFAULT_RADIUS_KM
        }
    }

    #[must_use]
    pub fn normalized_page(&self) -> i64 {
        self.page.max(1)
    }

    #[must_use]
    pub fn normalized_per_page(&self) -> i64 {
        self.per_page.max(1)
    }

    #[must_use]
    pub fn offset(&self) -> i64 {
        (self.normalized_page() - 1) * self.normalized_per_page()
    }
}
