use axum::{
    extract::{ConnectInfo, Request, State},
    http::{HeaderMap, HeaderName, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use dashmap::DashMap;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

use super::error::ApiError;

const RATELIMIT_LIMIT: HeaderName = HeaderName::from_static("ratelimit-limit");
const RATELIMIT_REMAINING: HeaderName = HeaderName::from_static("ratelimit-remaining");
const RATELIMIT_RESET: HeaderName = HeaderName::from_static("ratelimit-reset");

/// Cliente sin dirección conocida; todos comparten un mismo contador
const UNKNOWN_CLIENT: IpAddr = IpAddr::V4(Ipv4Addr::UNSPECIFIED);

#[derive(Debug, Clone, Copy)]
struct Window {
    started: Instant,
    count: u32,
}

/// Resultado de contabilizar una petición
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    pub allowed: bool,
    pub limit: u32,
    pub remaining: u32,
    pub reset_after: Duration,
}

impl Decision {
    fn reset_secs(&self) -> u64 {
        // Redondeo hacia arriba para no invitar a reintentar antes de tiempo
        let secs = self.reset_after.as_secs();
        if self.reset_after.subsec_nanos() > 0 {
            secs + 1
        } else {
            secs
        }
    }

    pub fn apply_headers(&self, headers: &mut HeaderMap) {
        headers.insert(RATELIMIT_LIMIT, HeaderValue::from(self.limit));
        headers.insert(RATELIMIT_REMAINING, HeaderValue::from(self.remaining));
        headers.insert(RATELIMIT_RESET, HeaderValue::from(self.reset_secs()));
    }
}

/// Rate limiter de ventana fija por dirección IP
#[derive(Debug)]
pub struct RateLimiter {
    max_requests: u32,
    window: Duration,
    clients: DashMap<IpAddr, Window>,
}

impl RateLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            clients: DashMap::new(),
        }
    }

    /// Cuenta una petición de `client` y decide si se atiende
    pub fn check(&self, client: IpAddr) -> Decision {
        let now = Instant::now();

        let mut window = self.clients.entry(client).or_insert(Window {
            started: now,
            count: 0,
        });

        if now.duration_since(window.started) >= self.window {
            window.started = now;
            window.count = 0;
        }

        let allowed = window.count < self.max_requests;
        if allowed {
            window.count += 1;
        }

        Decision {
            allowed,
            limit: self.max_requests,
            remaining: self.max_requests.saturating_sub(window.count),
            reset_after: self.window.saturating_sub(now.duration_since(window.started)),
        }
    }

    /// Olvida las ventanas ya cerradas y retorna cuántas se eliminaron
    pub fn prune(&self) -> usize {
        let now = Instant::now();
        let before = self.clients.len();
        self.clients
            .retain(|_, window| now.duration_since(window.started) < self.window);
        let removed = before.saturating_sub(self.clients.len());
        if removed > 0 {
            debug!("Rate limiter: {} ventanas expiradas eliminadas", removed);
        }
        removed
    }

    pub fn tracked_clients(&self) -> usize {
        self.clients.len()
    }
}

/// Middleware que aplica el límite y agrega las cabeceras `RateLimit-*`
pub async fn enforce(
    State(limiter): State<Arc<RateLimiter>>,
    request: Request,
    next: Next,
) -> Response {
    let client = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip())
        .unwrap_or(UNKNOWN_CLIENT);

    let decision = limiter.check(client);

    let mut response = if decision.allowed {
        next.run(request).await
    } else {
        warn!("⛔ Rate limit excedido para {}", client);
        ApiError::RateLimited {
            retry_after: decision.reset_secs(),
        }
        .into_response()
    };

    decision.apply_headers(response.headers_mut());
    response
}
