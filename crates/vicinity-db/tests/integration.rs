//! Offline unit tests for vicinity-db pool configuration and row types.
//! These tests do not require a live database connection.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use uuid::Uuid;
use vicinity_core::{AppConfig, Environment};
use vicinity_db::{BusinessHit, PoolConfig};

#[test]
fn pool_config_from_app_config_uses_core_values() {
    let app_config = AppConfig {
        database_url: "postgres://example".to_string(),
        env: Environment::Test,
        bind_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 3000),
        log_level: "info".to_string(),
        keywords_path: PathBuf::from("./config/keywords.yaml"),
        db_max_connections: 42,
        db_min_connections: 7,
        db_acquire_timeout_secs: 9,
        default_radius_km: 5.0,
    };

    let pool_config = PoolConfig::from_app_config(&app_config);
    assert_eq!(pool_config.max_connections, 42);
    assert_eq!(pool_config.min_connections, 7);
    assert_eq!(pool_config.acquire_timeout_secs, 9);
}

/// Compile-time smoke test: confirm that [`BusinessHit`] has all expected
/// fields with the correct types and serializes cleanly. No database required.
#[test]
fn business_hit_serializes_with_optional_distance() {
    let hit = BusinessHit {
        id: 1,
        public_id: Uuid::new_v4(),
        name: "Pizza Palace".to_string(),
        about_us: None,
        address: Some("742 Evergreen Terrace".to_string()),
        email: None,
        phone: None,
        latitude: Some(40.4168),
        longitude: Some(-3.7038),
        city: Some("Springfield".to_string()),
        country: Some("US".to_string()),
        zipcode: None,
        website: None,
        logo_url: None,
        additional_info: None,
        category_id: Some(2),
        category_name: Some("pizzeria".to_string()),
        service_ids: Some("1,2".to_string()),
        distance_km: None,
        relevance: 2,
    };

    let json = serde_json::to_value(&hit).expect("serialize");
    assert_eq!(json["name"], "Pizza Palace");
    assert_eq!(json["relevance"], 2);
    assert!(json["distance_km"].is_null());
}
