use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info};

use super::format::{format_items, Envelope};
use super::mapper::map_result;
use super::query::{ParamSource, QueryKey, SearchLimits, SearchParams, SearchRequest};
use crate::cache::{QueryCache, SharedItems};
use crate::error::SearchError;
use crate::sources::SearchProvider;

/// Orquesta validación → caché → proveedor → mapeo → formato
pub struct SearchHandler {
    provider: Arc<dyn SearchProvider>,
    cache: QueryCache,
    limits: SearchLimits,
    cache_ttl: Duration,
}

impl SearchHandler {
    pub fn new(
        provider: Arc<dyn SearchProvider>,
        cache: QueryCache,
        limits: SearchLimits,
        cache_ttl: Duration,
    ) -> Self {
        Self {
            provider,
            cache,
            limits,
            cache_ttl,
        }
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    /// Valida los parámetros y ejecuta la búsqueda
    pub async fn handle(
        &self,
        params: &SearchParams,
        source: ParamSource,
    ) -> Result<Envelope, SearchError> {
        let request = params.normalize(source, &self.limits)?;
        self.execute(&request).await
    }

    pub async fn execute(&self, request: &SearchRequest) -> Result<Envelope, SearchError> {
        let items = self.lookup(&request.key).await?;
        Ok(format_items(&items, request.format))
    }

    /// Items mapeados para la clave, desde caché o desde el proveedor
    pub async fn lookup(&self, key: &QueryKey) -> Result<SharedItems, SearchError> {
        if let Some(items) = self.cache.get(key) {
            debug!("✅ Cache hit para: '{}' ({} items)", key.query(), items.len());
            return Ok(items);
        }
        debug!("❌ Cache miss para: '{}'", key.query());

        let search_text = key.search_text();
        let start_time = Instant::now();

        // Ningún lock se mantiene durante la llamada al proveedor
        let raw_results = self.provider.search(&search_text).await.map_err(|e| {
            error!("❌ Error en búsqueda para '{}': {:#}", search_text, e);
            SearchError::from(e)
        })?;

        let items: SharedItems = Arc::new(
            raw_results
                .into_iter()
                .take(key.max_results())
                .map(map_result)
                .collect(),
        );

        info!(
            "🔍 '{}': {} resultados en {:?}",
            search_text,
            items.len(),
            start_time.elapsed()
        );

        self.cache.put(key.clone(), items.clone(), self.cache_ttl);
        Ok(items)
    }
}
