//! # Cache Module
//!
//! Caché de resultados de búsqueda indexada por consulta normalizada.
//!
//! Guarda secuencias de [`Item`] ya mapeadas, nunca la salida cruda del
//! proveedor ni envelopes formateados: una sola entrada responde a cualquier
//! `format` pedido.
//!
//! ## Features
//!
//! - **TTL Support**: expiración perezosa por entrada, comprobada en `get`
//! - **Thread Safety**: mapa concurrente por shards, `get`/`put` atómicos por clave
//! - **Optional Bound**: capacidad máxima con desalojo LRU (`0` = sin límite)
//! - **Background Sweep**: tarea periódica que libera entradas vencidas
//! - **Metrics**: contadores de hits, misses, desalojos y expiraciones
//!
//! ## Configuration
//!
//! ```env
//! CACHE_TTL=60              # Time-to-live en segundos
//! CACHE_CHECK_PERIOD=120    # Periodo del barrido (0 lo desactiva)
//! CACHE_CAPACITY=0          # Máximo de consultas en caché (0 = sin límite)
//! ```
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use yt_search_api::cache::QueryCache;
//! use yt_search_api::search::{QueryKey, SearchLimits};
//!
//! # fn example() {
//! let cache = QueryCache::new(0);
//! let key = QueryKey::new("lofi", 10, "", &SearchLimits::default());
//!
//! cache.put(key.clone(), Arc::new(Vec::new()), Duration::from_secs(60));
//!
//! if let Some(items) = cache.get(&key) {
//!     println!("{} items en caché", items.len());
//! }
//! # }
//! ```
//!
//! Dos misses concurrentes para la misma clave pueden consultar ambos al
//! proveedor; gana la última escritura.

pub mod lru_cache;

use lru_cache::LRUCache;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::search::{Item, QueryKey};

pub use lru_cache::CacheMetrics;

/// Secuencia de items compartida entre todas las lecturas de una entrada
pub type SharedItems = Arc<Vec<Item>>;

/// Caché principal de resultados de búsqueda
pub type QueryCache = LRUCache<QueryKey, SharedItems>;

impl QueryCache {
    /// Performs cache maintenance by removing expired entries.
    ///
    /// Lookups already treat stale entries as misses, so this only reclaims
    /// memory held by keys nobody asks for again.
    pub fn cleanup_old_entries(&self) -> usize {
        let removed = self.cleanup_expired();
        let metrics = self.metrics();

        info!(
            "🧹 Cache cleanup: {} expiradas, {} entradas{}, hit rate {:.1}%, {} desalojos",
            removed,
            metrics.entries,
            self.capacity()
                .map(|max| format!(" de {}", max))
                .unwrap_or_default(),
            metrics.hit_rate() * 100.0,
            metrics.evictions
        );
        removed
    }

    /// Inicia la tarea de limpieza periódica.
    ///
    /// La tarea termina cuando se cancela `shutdown`.
    pub fn start_cleanup_task(&self, period: Duration, shutdown: CancellationToken) -> JoinHandle<()> {
        let cache = self.clone();

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            // El primer tick es inmediato
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => {
                        debug!("Tarea de limpieza de caché detenida");
                        break;
                    }
                    _ = ticker.tick() => {
                        cache.cleanup_old_entries();
                    }
                }
            }
        })
    }
}
