use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::timeout;
use tracing::{error, info, warn};

use super::{RawResult, SearchProvider};

/// Cadena jerárquica de proveedores.
///
/// Se prueba cada proveedor en orden; gana el primero que devuelve
/// resultados. Cada intento está acotado por `timeout_per_provider`.
pub struct FallbackProvider {
    providers: Vec<Arc<dyn SearchProvider>>,
    timeout_per_provider: Duration,
}

impl FallbackProvider {
    pub fn new(providers: Vec<Arc<dyn SearchProvider>>, timeout_per_provider: Duration) -> Self {
        Self {
            providers,
            timeout_per_provider,
        }
    }
}

#[async_trait]
impl SearchProvider for FallbackProvider {
    async fn search(&self, query: &str) -> Result<Vec<RawResult>> {
        let start_time = Instant::now();
        let mut last_error = None;
        let mut answered = false;

        for provider in &self.providers {
            match timeout(self.timeout_per_provider, provider.search(query)).await {
                Ok(Ok(results)) if !results.is_empty() => {
                    info!(
                        "✅ Éxito en {}: {} resultados en {:?}",
                        provider.name(),
                        results.len(),
                        start_time.elapsed()
                    );
                    return Ok(results);
                }
                Ok(Ok(_)) => {
                    warn!("⚠️ {} devolvió 0 resultados", provider.name());
                    answered = true;
                }
                Ok(Err(e)) => {
                    warn!("❌ {} falló: {:#}", provider.name(), e);
                    last_error = Some(format!("{}: {:#}", provider.name(), e));
                }
                Err(_) => {
                    warn!("⏰ Timeout en {} tras {:?}", provider.name(), self.timeout_per_provider);
                    last_error = Some(format!(
                        "{}: timeout after {:?}",
                        provider.name(),
                        self.timeout_per_provider
                    ));
                }
            }
        }

        if answered {
            return Ok(Vec::new());
        }

        error!("❌ Todas las fuentes fallaron después de {:?}", start_time.elapsed());
        anyhow::bail!(
            "No se encontraron resultados en ninguna fuente. Último error: {}",
            last_error.unwrap_or_else(|| "sin proveedores configurados".to_string())
        )
    }

    fn name(&self) -> &'static str {
        "fallback"
    }
}
