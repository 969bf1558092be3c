use thiserror::Error;

pub mod app_config;
pub mod config;
pub mod keywords;
pub mod types;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use keywords::{
    load_keywords, CategoryEntry, KeywordCatalog, MealTimeEntry, ServiceEntry, TimeKeywords,
};
pub use types::{
    Coordinates, HourRange, MealTimeFilter, SearchFilters, SearchRequest, TimeWindow,
    DEFAULT_PER_PAGE, DEFAULT_RADIUS_KM, MAX_RADIUS_KM,
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
    #[error("failed to read keyword catalog at {path}")]
    KeywordsFileIo {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to parse keyword catalog")]
    KeywordsFileParse(#[from] serde_yaml::Error),
    #[error("{0}")]
    Validation(String),
}
