use energy_analysis_api::api::{self, AppState};
use energy_analysis_api::config::{Config, LogFormat, LoggingConfig};
use energy_analysis_api::context::SystemClock;
use energy_analysis_api::db;
use energy_analysis_api::repositories::{DocumentStore, MemoryDocumentStore, PgDocumentStore};
use energy_analysis_api::services::AnalysisService;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn init_logging(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);

    match logging.format {
        LogFormat::Compact => builder.compact().init(),
        LogFormat::Json => builder.json().init(),
    }
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let cfg_path = std::env::var("APP_CONFIG").unwrap_or_else(|_| "config/config.yaml".into());
    let cfg = Config::load(&cfg_path)?;

    init_logging(&cfg.logging);
    info!("Starting energy-analysis-api");
    info!("Configuration loaded from {}", cfg_path);

    let store: Arc<dyn DocumentStore> = match &cfg.database {
        Some(database) => {
            let pool = db::connect(&database.url, database.max_connections).await?;
            sqlx::query("SELECT 1").execute(&pool).await?;
            info!("Connected to database");

            let store = PgDocumentStore::new(pool);
            store.ensure_schema().await?;
            Arc::new(store)
        }
        None => {
            warn!("No database configured; documents are kept in memory and lost on restart");
            Arc::new(MemoryDocumentStore::new())
        }
    };

    let state = AppState::new(AnalysisService::new(store), Arc::new(SystemClock));
    let router = api::create_router(state, &cfg.api);
    let addr = format!("{}:{}", cfg.api.host, cfg.api.port);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind to {}: {}", addr, e))?;

    info!("API server listening on {}", addr);

    let serve = axum::serve(listener, router);
    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install CTRL+C signal handler");
            std::future::pending::<()>().await;
        }
        info!("Shutdown signal received");
    };

    if let Err(e) = serve.with_graceful_shutdown(shutdown).await {
        tracing::error!(error = %e, "API server error");
    }

    info!("Application shutdown complete");
    Ok(())
}
