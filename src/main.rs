use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use yt_search_api::cache::QueryCache;
use yt_search_api::config::Config;
use yt_search_api::search::SearchHandler;
use yt_search_api::server::{self, rate_limit::RateLimiter, AppState, RouterOptions};
use yt_search_api::sources;

#[tokio::main]
async fn main() -> Result<()> {
    // Inicializar logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("yt_search_api=debug".parse()?)
                .add_directive("tower_http=info".parse()?),
        )
        .init();

    info!("🎵 Iniciando YouTube Search API v{}", env!("CARGO_PKG_VERSION"));

    // Cargar configuración
    let config = Config::load()?;

    // Manejar health check si es necesario
    if std::env::args().any(|arg| arg == "--health-check") {
        return health_check(&config).await;
    }

    info!("{}", config.summary());

    let shutdown = CancellationToken::new();

    // Inicializar caché
    let cache = QueryCache::new(config.cache_capacity);
    if let Some(period) = config.cache_check_period() {
        cache.start_cleanup_task(period, shutdown.clone());
    }

    let provider = sources::build_provider(&config)?;
    let handler = Arc::new(SearchHandler::new(
        provider,
        cache,
        config.search_limits(),
        config.cache_ttl(),
    ));

    let limiter = Arc::new(RateLimiter::new(config.rate_limit_max, config.rate_limit_window()));
    start_limiter_pruning(limiter.clone(), config.rate_limit_window(), shutdown.clone());

    let router = server::build_router(
        AppState { handler, limiter },
        RouterOptions {
            request_timeout: config.request_timeout(),
            enable_cors: config.enable_cors,
        },
    );

    let listener = tokio::net::TcpListener::bind(config.bind_address())
        .await
        .with_context(|| format!("No se pudo escuchar en {}", config.bind_address()))?;

    info!("🚀 Server listening on {}", listener.local_addr()?);

    let signal = shutdown.clone();
    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async move {
        // Manejar shutdown graceful
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Error al registrar Ctrl+C: {}", e);
        }
        info!("⚠️ Señal de shutdown recibida, cerrando...");
        signal.cancel();
    })
    .await?;

    shutdown.cancel();
    info!("👋 Servidor detenido");
    Ok(())
}

/// Elimina periódicamente las ventanas cerradas del rate limiter
fn start_limiter_pruning(limiter: Arc<RateLimiter>, period: Duration, shutdown: CancellationToken) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => {
                    limiter.prune();
                }
            }
        }
    });
}

async fn health_check(config: &Config) -> Result<()> {
    let url = format!("http://127.0.0.1:{}/health", config.port);

    let response = reqwest::Client::builder()
        .timeout(Duration::from_secs(5))
        .build()?
        .get(&url)
        .send()
        .await
        .with_context(|| format!("No se pudo conectar a {}", url))?;

    if response.status().is_success() {
        println!("OK");
        Ok(())
    } else {
        anyhow::bail!("Health check falló: {}", response.status());
    }
}
