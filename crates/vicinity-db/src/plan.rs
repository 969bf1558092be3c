//! Search plan compiler.
//!
//! A [`SearchRequest`] is lowered to a single parameterized Postgres query.
//! Every piece of caller input travels as a typed [`SqlParam`] bound
//! positionally; no user text is ever interpolated into the SQL string.
//!
//! Clause precedence:
//! 1. soft-deleted records are always excluded;
//! 2. a city filter (exact, or broadened to city/name/address substring when
//!    the city was not verified in the store) suppresses distance filtering
//!    entirely;
//! 3. otherwise coordinates constrain by great-circle distance within the
//!    clamped radius;
//! 4. query text requires a name substring match and drives the relevance
//!    score (3 exact, 2 prefix, 1 substring);
//! 5. category/service/time-window/meal-time filters apply conjunctively;
//! 6. ordering depends on which of city/coordinates/query are active, with a
//!    deterministic `b.id ASC` tie-break;
//! 7. pagination is `LIMIT per_page OFFSET (page-1)*per_page`.

use vicinity_core::SearchRequest;

/// A typed positional parameter for the compiled query.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlParam {
    Text(String),
    Float(f64),
    Int(i64),
}

/// A ready-to-execute SQL string plus its positional parameters.
#[derive(Debug, Clone)]
pub struct CompiledQuery {
    pub sql: String,
    pub params: Vec<SqlParam>,
}

#[derive(Debug, Default)]
struct Params(Vec<SqlParam>);

impl Params {
    /// Register a parameter and return its `$n` placeholder. Placeholders may
    /// be referenced multiple times in the SQL text.
    fn push(&mut self, param: SqlParam) -> String {
        self.0.push(param);
        format!("${}", self.0.len())
    }
}

/// Escape LIKE metacharacters so caller text matches literally.
/// Postgres defaults the escape character to backslash.
fn escape_like(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

fn haversine_expr(lat: &str, lon: &str) -> String {
    // Great-circle distance in km. LEAST/GREATEST guard ACOS against
    // floating-point drift outside [-1, 1].
    format!(
        "(6371.0 * ACOS(LEAST(1.0, GREATEST(-1.0, \
         COS(RADIANS({lat})) * COS(RADIANS(b.latitude)) * \
         COS(RADIANS(b.longitude) - RADIANS({lon})) + \
         SIN(RADIANS({lat})) * SIN(RADIANS(b.latitude))))))"
    )
}

/// Lower a search request to SQL plus positional parameters.
#[must_use]
pub fn compile(request: &SearchRequest) -> CompiledQuery {
    let query_text = request.query_text.trim().to_lowercase();
    let has_query = !query_text.is_empty();

    let city_filter = request
        .filters
        .city_name
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty());
    // A resolved city always wins over coordinates.
    let coordinates = if city_filter.is_some() {
        None
    } else {
        request.coordinates
    };

    let mut params = Params::default();

    let mut select = String::from(
        "SELECT b.id, b.public_id, b.name, b.about_us, b.address, b.email, b.phone, \
                b.latitude, b.longitude, b.city, b.country, b.zipcode, b.website, \
                b.logo_url, b.additional_info, b.category_id, c.name AS category_name, \
                (SELECT STRING_AGG(DISTINCT bs.service_id::TEXT, ',') \
                 FROM business_services bs WHERE bs.business_id = b.id) AS service_ids",
    );

    let distance_expr = coordinates.map(|c| {
        let lat = params.push(SqlParam::Float(c.latitude));
        let lon = params.push(SqlParam::Float(c.longitude));
        haversine_expr(&lat, &lon)
    });
    match &distance_expr {
        Some(expr) => {
            select.push_str(", ");
            select.push_str(expr);
            select.push_str(" AS distance_km");
        }
        None => select.push_str(", NULL::DOUBLE PRECISION AS distance_km"),
    }

    if has_query {
        let exact = params.push(SqlParam::Text(query_text.clone()));
        let prefix = params.push(SqlParam::Text(format!("{}%", escape_like(&query_text))));
        select.push_str(&format!(
            ", CASE WHEN LOWER(b.name) = {exact} THEN 3 \
                    WHEN LOWER(b.name) LIKE {prefix} THEN 2 \
                    ELSE 1 END AS relevance"
        ));
    } else {
        select.push_str(", 1 AS relevance");
    }

    let mut where_clauses = vec!["b.deleted_at IS NULL".to_string()];

    if let Some(city) = city_filter {
        let city_lc = city.to_lowercase();
        if request.filters.city_not_found_in_db {
            let contains = params.push(SqlParam::Text(format!("%{}%", escape_like(&city_lc))));
            where_clauses.push(format!(
                "(LOWER(b.city) LIKE {contains} OR LOWER(b.name) LIKE {contains} \
                 OR LOWER(b.address) LIKE {contains})"
            ));
        } else {
            let exact = params.push(SqlParam::Text(city_lc.clone()));
            let contains = params.push(SqlParam::Text(format!("%{}%", escape_like(&city_lc))));
            where_clauses.push(format!(
                "(LOWER(b.city) = {exact} OR LOWER(b.city) LIKE {contains})"
            ));
        }
    } else if let Some(expr) = &distance_expr {
        let radius = params.push(SqlParam::Float(request.effective_radius_km()));
        where_clauses.push(format!("{expr} <= {radius}"));
    }

    if has_query {
        let contains = params.push(SqlParam::Text(format!("%{}%", escape_like(&query_text))));
        where_clauses.push(format!("LOWER(b.name) LIKE {contains}"));
    }

    if let Some(category_id) = request.filters.category_id {
        let p = params.push(SqlParam::Int(category_id));
        where_clauses.push(format!("b.category_id = {p}"));
    }

    if let Some(service_id) = request.filters.service_id {
        let p = params.push(SqlParam::Int(service_id));
        where_clauses.push(format!(
            "b.id IN (SELECT business_id FROM business_services WHERE service_id = {p})"
        ));
    }

    if let Some(time) = &request.filters.time {
        if let Some(open_from) = &time.open_from {
            let p = params.push(SqlParam::Text(open_from.clone()));
            where_clauses.push(format!(
                "b.id IN (SELECT business_id FROM business_hours WHERE open_a <= {p}::TIME)"
            ));
        }
        if let Some(open_until) = &time.open_until {
            let p = params.push(SqlParam::Text(open_until.clone()));
            where_clauses.push(format!(
                "b.id IN (SELECT business_id FROM business_hours WHERE close_a >= {p}::TIME)"
            ));
        }
    }

    if let Some(meal_time) = &request.filters.meal_time {
        let to = params.push(SqlParam::Text(meal_time.typical_hours.to.clone()));
        let from = params.push(SqlParam::Text(meal_time.typical_hours.from.clone()));
        where_clauses.push(format!(
            "b.id IN (SELECT business_id FROM business_hours \
             WHERE open_a <= {to}::TIME AND close_a >= {from}::TIME)"
        ));
    }

    let order_by = if city_filter.is_some() {
        if has_query {
            "relevance DESC, b.name ASC"
        } else {
            "b.name ASC"
        }
    } else if distance_expr.is_some() && !has_query {
        "distance_km ASC"
    } else if distance_expr.is_some() {
        "relevance DESC, distance_km ASC"
    } else if has_query {
        "relevance DESC"
    } else {
        "b.name ASC"
    };

    let limit = params.push(SqlParam::Int(request.normalized_per_page()));
    let offset = params.push(SqlParam::Int(request.offset()));

    let sql = format!(
        "{select} \
         FROM businesses b \
         LEFT JOIN categories c ON c.id = b.category_id \
         WHERE {conditions} \
         ORDER BY {order_by}, b.id ASC \
         LIMIT {limit} OFFSET {offset}",
        conditions = where_clauses.join(" AND "),
    );

    CompiledQuery {
        sql,
        params: params.0,
    }
}
