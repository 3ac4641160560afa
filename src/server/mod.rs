//! Capa HTTP: rutas, rate limiting, CORS y cabeceras de seguridad.

pub mod error;
pub mod extract;
pub mod rate_limit;
pub mod routes;

use axum::{
    http::{header, HeaderName, HeaderValue},
    middleware,
    routing::get,
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer,
    set_header::SetResponseHeaderLayer,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::search::SearchHandler;
use rate_limit::RateLimiter;

pub use error::ApiError;

/// Estado compartido por todos los handlers
#[derive(Clone)]
pub struct AppState {
    pub handler: Arc<SearchHandler>,
    pub limiter: Arc<RateLimiter>,
}

/// Opciones de la capa HTTP
#[derive(Debug, Clone, Copy)]
pub struct RouterOptions {
    pub request_timeout: Duration,
    pub enable_cors: bool,
}

impl Default for RouterOptions {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
            enable_cors: true,
        }
    }
}

/// Construye el router con todas las capas.
///
/// Orden de fuera hacia dentro: CORS, trazas, timeout, cabeceras de
/// seguridad, rate limit, rutas.
pub fn build_router(state: AppState, options: RouterOptions) -> Router {
    let security_headers = ServiceBuilder::new()
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("SAMEORIGIN"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::REFERRER_POLICY,
            HeaderValue::from_static("no-referrer"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_DNS_PREFETCH_CONTROL,
            HeaderValue::from_static("off"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::STRICT_TRANSPORT_SECURITY,
            HeaderValue::from_static("max-age=31536000; includeSubDomains"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            HeaderName::from_static("cross-origin-opener-policy"),
            HeaderValue::from_static("same-origin"),
        ));

    let router = Router::new()
        .route("/", get(routes::root))
        .route("/health", get(routes::health))
        .route("/search", get(routes::search_get).post(routes::search_post))
        .layer(middleware::from_fn_with_state(
            state.limiter.clone(),
            rate_limit::enforce,
        ))
        .layer(security_headers)
        .layer(TimeoutLayer::new(options.request_timeout))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    if options.enable_cors {
        router.layer(CorsLayer::permissive())
    } else {
        router
    }
}
