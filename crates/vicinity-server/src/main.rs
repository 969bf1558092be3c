mod api;
mod middleware;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use crate::{
    api::{build_app, default_rate_limit_state, AppState},
    middleware::AuthState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = vicinity_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let raw_catalog = vicinity_core::load_keywords(&config.keywords_path)?;
    let catalog = Arc::new(vicinity_search::CompiledCatalog::compile(&raw_catalog));
    tracing::info!(
        categories = catalog.categories.len(),
        services = catalog.services.len(),
        meal_times = catalog.meal_times.len(),
        "keyword catalog loaded"
    );

    let pool_config = vicinity_db::PoolConfig::from_app_config(&config);
    let pool = vicinity_db::connect_pool(&config.database_url, pool_config).await?;
    vicinity_db::run_migrations(&pool).await?;

    let auth = AuthState::from_env(matches!(
        config.env,
        vicinity_core::Environment::Development
    ))?;
    let state = AppState {
        pool,
        catalog,
        default_radius_km: config.default_radius_km,
    };
    let app = build_app(state, auth, default_rate_limit_state());

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, "vicinity-server listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to listen for ctrl-c");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
