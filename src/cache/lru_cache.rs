use dashmap::DashMap;
use std::{
    hash::Hash,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::Duration,
};
use tokio::time::Instant;
use tracing::debug;

/// Cache entry con TTL propio
#[derive(Debug)]
struct CacheEntry<V> {
    value: V,
    inserted_at: Instant,
    ttl: Duration,
    // Tick del último acceso, para desalojo LRU
    last_access: AtomicU64,
}

impl<V> CacheEntry<V> {
    fn new(value: V, ttl: Duration, tick: u64) -> Self {
        Self {
            value,
            inserted_at: Instant::now(),
            ttl,
            last_access: AtomicU64::new(tick),
        }
    }

    fn is_expired(&self, now: Instant) -> bool {
        now.duration_since(self.inserted_at) >= self.ttl
    }
}

#[derive(Debug, Default)]
struct CacheStats {
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
    expired_removals: AtomicU64,
}

/// Cache concurrente con TTL por entrada y capacidad opcional.
///
/// La expiración es perezosa: una entrada vencida se trata como ausente en
/// `get` y se elimina ahí mismo. Con `capacity > 0`, al superar el límite se
/// desaloja la entrada usada hace más tiempo.
#[derive(Debug)]
pub struct LRUCache<K: Clone + Eq + Hash, V> {
    data: Arc<DashMap<K, CacheEntry<V>>>,
    stats: Arc<CacheStats>,
    clock: Arc<AtomicU64>,
    capacity: usize,
}

impl<K, V> LRUCache<K, V>
where
    K: Clone + Eq + Hash + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    /// `capacity == 0` significa sin límite
    pub fn new(capacity: usize) -> Self {
        Self {
            data: Arc::new(DashMap::new()),
            stats: Arc::new(CacheStats::default()),
            clock: Arc::new(AtomicU64::new(0)),
            capacity,
        }
    }

    fn tick(&self) -> u64 {
        self.clock.fetch_add(1, Ordering::Relaxed)
    }

    /// Inserta o reemplaza la entrada de `key`
    pub fn put(&self, key: K, value: V, ttl: Duration) -> Option<V> {
        let entry = CacheEntry::new(value, ttl, self.tick());
        let previous = self.data.insert(key, entry).map(|old| old.value);

        if self.capacity > 0 && self.data.len() > self.capacity {
            self.evict_to_capacity();
        }

        previous
    }

    pub fn get(&self, key: &K) -> Option<V> {
        let now = Instant::now();

        if let Some(entry) = self.data.get(key) {
            if !entry.is_expired(now) {
                entry.last_access.store(self.tick(), Ordering::Relaxed);
                self.stats.hits.fetch_add(1, Ordering::Relaxed);
                return Some(entry.value.clone());
            }
            drop(entry);

            // Sólo se borra si sigue vencida: otra tarea pudo reemplazarla
            if self.data.remove_if(key, |_, e| e.is_expired(now)).is_some() {
                self.stats.expired_removals.fetch_add(1, Ordering::Relaxed);
            }
        }

        self.stats.misses.fetch_add(1, Ordering::Relaxed);
        None
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// `None` cuando la caché no tiene límite
    pub fn capacity(&self) -> Option<usize> {
        (self.capacity > 0).then_some(self.capacity)
    }

    /// Limpia entradas expiradas y retorna el número de elementos removidos
    pub fn cleanup_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.data.len();
        self.data.retain(|_, entry| !entry.is_expired(now));
        let removed = before.saturating_sub(self.data.len());

        if removed > 0 {
            self.stats
                .expired_removals
                .fetch_add(removed as u64, Ordering::Relaxed);
            debug!("Limpiadas {} entradas expiradas del cache", removed);
        }

        removed
    }

    fn evict_to_capacity(&self) {
        // Primero lo vencido, que no cuenta como desalojo
        self.cleanup_expired();

        while self.data.len() > self.capacity {
            let oldest = self
                .data
                .iter()
                .min_by_key(|entry| entry.value().last_access.load(Ordering::Relaxed))
                .map(|entry| entry.key().clone());

            let Some(key) = oldest else { break };
            if self.data.remove(&key).is_some() {
                self.stats.evictions.fetch_add(1, Ordering::Relaxed);
                debug!("Entrada desalojada por capacidad ({} máx.)", self.capacity);
            }
        }
    }

    pub fn metrics(&self) -> CacheMetrics {
        CacheMetrics {
            hits: self.stats.hits.load(Ordering::Relaxed),
            misses: self.stats.misses.load(Ordering::Relaxed),
            evictions: self.stats.evictions.load(Ordering::Relaxed),
            expired_removals: self.stats.expired_removals.load(Ordering::Relaxed),
            entries: self.data.len(),
        }
    }
}

impl<K, V> Clone for LRUCache<K, V>
where
    K: Clone + Eq + Hash,
    V: Clone,
{
    fn clone(&self) -> Self {
        Self {
            data: self.data.clone(),
            stats: self.stats.clone(),
            clock: self.clock.clone(),
            capacity: self.capacity,
        }
    }
}

/// Métricas básicas del cache
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheMetrics {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub expired_removals: u64,
    pub entries: usize,
}

impl CacheMetrics {
    pub fn hit_rate(&self) -> f64 {
        if self.hits + self.misses == 0 {
            0.0
        } else {
            self.hits as f64 / (self.hits + self.misses) as f64
        }
    }

    pub fn miss_rate(&self) -> f64 {
        1.0 - self.hit_rate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TTL: Duration = Duration::from_secs(60);

    #[tokio::test(start_paused = true)]
    async fn test_get_within_ttl_hits() {
        let cache: LRUCache<String, u32> = LRUCache::new(0);
        cache.put("a".into(), 1, TTL);

        tokio::time::advance(Duration::from_secs(59)).await;
        assert_eq!(cache.get(&"a".to_string()), Some(1));
        assert_eq!(cache.metrics().hits, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_entry_behaves_like_miss() {
        let cache: LRUCache<String, u32> = LRUCache::new(0);
        cache.put("a".into(), 1, TTL);

        tokio::time::advance(TTL).await;
        assert_eq!(cache.get(&"a".to_string()), None);
        assert!(cache.is_empty());

        let metrics = cache.metrics();
        assert_eq!(metrics.misses, 1);
        assert_eq!(metrics.expired_removals, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_put_overwrites_and_restarts_ttl() {
        let cache: LRUCache<String, u32> = LRUCache::new(0);
        cache.put("a".into(), 1, TTL);
        tokio::time::advance(Duration::from_secs(50)).await;

        assert_eq!(cache.put("a".into(), 2, TTL), Some(1));
        assert_eq!(cache.len(), 1);

        tokio::time::advance(Duration::from_secs(50)).await;
        assert_eq!(cache.get(&"a".to_string()), Some(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cleanup_expired() {
        let cache: LRUCache<u32, u32> = LRUCache::new(0);
        cache.put(1, 1, Duration::from_secs(10));
        cache.put(2, 2, Duration::from_secs(100));

        tokio::time::advance(Duration::from_secs(20)).await;
        assert_eq!(cache.cleanup_expired(), 1);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(&2), Some(2));
    }

    #[tokio::test]
    async fn test_capacity_evicts_least_recently_used() {
        let cache: LRUCache<u32, u32> = LRUCache::new(2);
        cache.put(1, 1, TTL);
        cache.put(2, 2, TTL);

        // 1 pasa a ser el más reciente
        assert_eq!(cache.get(&1), Some(1));
        cache.put(3, 3, TTL);

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get(&2), None);
        assert_eq!(cache.get(&1), Some(1));
        assert_eq!(cache.get(&3), Some(3));
        assert_eq!(cache.metrics().evictions, 1);
        assert_eq!(cache.capacity(), Some(2));
    }

    #[test]
    fn test_hit_rate() {
        let metrics = CacheMetrics {
            hits: 3,
            misses: 1,
            evictions: 0,
            expired_removals: 0,
            entries: 0,
        };
        assert!((metrics.hit_rate() - 0.75).abs() < f64::EPSILON);
        assert!((metrics.miss_rate() - 0.25).abs() < f64::EPSILON);
    }
}
