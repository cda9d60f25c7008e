use actix_web::{web, App, HttpServer};
use anyhow::{Context, Result};
use matching_service::config::Config;
use matching_service::repository::{MatchStore, PostgresMatchStore, PostgresUserDirectory, UserDirectory};
use matching_service::routes;
use matching_service::services::{
    CompatibilityScorer, InMemoryScoreCache, InferenceProvider, OpenAiProvider, RedisScoreCache,
    ScoreCache,
};
use matching_service::state::AppState;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = terminate.recv() => {},
                }
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler, waiting for Ctrl+C only");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

async fn build_score_cache(config: &Config) -> Result<Arc<dyn ScoreCache>> {
    match config.redis.url.as_deref() {
        Some(url) => {
            let client = redis::Client::open(url).context("Failed to create Redis client")?;
            let conn = redis::aio::ConnectionManager::new(client)
                .await
                .context("Failed to connect to Redis")?;
            info!("✅ Redis compatibility cache connected");
            Ok(Arc::new(RedisScoreCache::new(conn)))
        }
        None => {
            info!("REDIS_URL not set, compatibility cache is in-process");
            Ok(Arc::new(InMemoryScoreCache::new()))
        }
    }
}

fn build_inference_provider(config: &Config) -> Result<Option<Arc<dyn InferenceProvider>>> {
    if !config.inference.is_active() {
        info!("Compatibility inference disabled, heuristic scoring only");
        return Ok(None);
    }

    let provider = OpenAiProvider::from_config(&config.inference)?;
    info!(
        model = %config.inference.model,
        timeout_ms = config.inference.timeout_ms,
        "✅ Compatibility inference enabled"
    );
    Ok(Some(Arc::new(provider)))
}

#[actix_web::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("matching_service=info,actix_web=info")),
        )
        .init();

    info!("🔧 Starting matching-service");

    // Load configuration
    let config = Config::from_env().context("Failed to load configuration")?;
    info!(
        "✅ Configuration loaded: env={}, http_port={}",
        config.app.env, config.app.http_port
    );

    // Initialize database pool with prepared statement caching disabled for PgBouncer compatibility
    let connect_options = PgConnectOptions::from_str(&config.database.url)
        .context("Failed to parse DATABASE_URL")?
        .statement_cache_capacity(0);

    let pg_pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .acquire_timeout(Duration::from_secs(10))
        .idle_timeout(Duration::from_secs(600))
        .max_lifetime(Duration::from_secs(1800))
        .connect_with(connect_options)
        .await
        .context("Failed to connect to database")?;
    info!("✅ Database pool created");

    // Run database migrations
    sqlx::migrate!("./migrations")
        .run(&pg_pool)
        .await
        .context("Failed to run database migrations")?;
    info!("✅ Database migrations completed");

    let cache = build_score_cache(&config).await?;
    let provider = build_inference_provider(&config)?;
    let scorer = CompatibilityScorer::new(provider, cache, config.inference.timeout());

    let match_store: Arc<dyn MatchStore> = Arc::new(PostgresMatchStore::new(pg_pool.clone()));
    let directory: Arc<dyn UserDirectory> = Arc::new(PostgresUserDirectory::new(pg_pool));
    let state = AppState::new(match_store, directory, scorer, config.matching.clone());
    info!("✅ AppState created");

    let http_addr = format!("{}:{}", config.app.host, config.app.http_port);
    info!("🚀 HTTP server listening on http://{}", http_addr);

    let server = HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(state.clone()))
            .wrap(tracing_actix_web::TracingLogger::default())
            .configure(routes::configure)
    })
    .bind(&http_addr)
    .context("Failed to bind HTTP server")?
    .disable_signals()
    .run();

    let handle = server.handle();
    tokio::select! {
        result = server => {
            result.context("HTTP server error")?;
        }
        _ = shutdown_signal() => {
            info!("🛑 matching-service shutting down");
            handle.stop(true).await;
        }
    }

    Ok(())
}
