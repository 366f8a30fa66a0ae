//! Read-through cache in front of the lifecycle manager.
//!
//! Reads by payment id or by order id are cached; any successful mutation
//! (create, status update, process, sweep) clears the cache wholesale. The
//! lifecycle manager never depends on it.

use super::lifecycle::PaymentService;
use crate::domain::payment::{OrderId, Payment, PaymentId, PaymentRequest, PaymentStatus};
use crate::error::Result;
use lru::LruCache;
use parking_lot::Mutex;
use std::num::NonZeroUsize;
use std::sync::Arc;
use tracing::debug;

/// Default cache capacity.
pub const DEFAULT_CACHE_CAPACITY: usize = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum CacheKey {
    Id(PaymentId),
    Order(OrderId),
}

/// Cache statistics for monitoring.
#[derive(Debug, Default, Clone)]
pub struct CacheStats {
    /// Number of cache hits.
    pub hits: u64,
    /// Number of cache misses.
    pub misses: u64,
    /// Number of times the cache was cleared.
    pub invalidations: u64,
}

/// Shared LRU cache of payment reads.
///
/// `Clone` shares the underlying cache, so the sweeper and the request path
/// can hold the same instance. A cache built with `disabled()` never stores
/// anything.
///
/// Every `invalidate_all` starts a new generation. A read that began in an
/// older generation is not stored.
#[derive(Clone)]
pub struct PaymentCache {
    inner: Option<Arc<Mutex<Entries>>>,
    stats: Arc<Mutex<CacheStats>>,
}

struct Entries {
    lru: LruCache<CacheKey, Payment>,
    generation: u64,
}

impl PaymentCache {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CACHE_CAPACITY)
    }

    /// A capacity of zero yields a disabled cache.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: NonZeroUsize::new(capacity).map(|cap| {
                Arc::new(Mutex::new(Entries {
                    lru: LruCache::new(cap),
                    generation: 0,
                }))
            }),
            stats: Arc::new(Mutex::new(CacheStats::default())),
        }
    }

    pub fn disabled() -> Self {
        Self::with_capacity(0)
    }

    pub fn is_enabled(&self) -> bool {
        self.inner.is_some()
    }

    /// Number of times the cache has been cleared so far.
    pub fn generation(&self) -> u64 {
        self.inner.as_ref().map_or(0, |inner| inner.lock().generation)
    }

    fn get(&self, key: &CacheKey) -> Option<Payment> {
        let inner = self.inner.as_ref()?;
        let found = inner.lock().lru.get(key).cloned();

        let mut stats = self.stats.lock();
        if found.is_some() {
            stats.hits += 1;
        } else {
            stats.misses += 1;
        }
        found
    }

    /// Stores `payment` unless the cache was cleared since `generation`.
    fn put(&self, key: CacheKey, payment: Payment, generation: u64) -> bool {
        let Some(inner) = &self.inner else {
            return false;
        };
        let mut entries = inner.lock();
        if entries.generation != generation {
            debug!("Dropping payment read from before the last cache clear");
            return false;
        }
        entries.lru.put(key, payment);
        true
    }

    /// Drops every cached entry.
    pub fn invalidate_all(&self) {
        if let Some(inner) = &self.inner {
            {
                let mut entries = inner.lock();
                entries.lru.clear();
                entries.generation += 1;
            }
            self.stats.lock().invalidations += 1;
            debug!("Payment cache cleared");
        }
    }

    pub fn len(&self) -> usize {
        self.inner.as_ref().map_or(0, |inner| inner.lock().lru.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        self.stats.lock().clone()
    }
}

impl Default for PaymentCache {
    fn default() -> Self {
        Self::new()
    }
}

/// `PaymentService` with cached reads and cache eviction on every write.
#[derive(Clone)]
pub struct CachedPaymentService {
    service: Arc<PaymentService>,
    cache: PaymentCache,
}

impl CachedPaymentService {
    pub fn new(service: Arc<PaymentService>, cache: PaymentCache) -> Self {
        Self { service, cache }
    }

    pub fn cache(&self) -> &PaymentCache {
        &self.cache
    }

    pub fn service(&self) -> &Arc<PaymentService> {
        &self.service
    }

    pub async fn create(&self, request: PaymentRequest) -> Result<Payment> {
        let payment = self.service.create(request).await?;
        self.cache.invalidate_all();
        Ok(payment)
    }

    pub async fn get(&self, id: PaymentId) -> Result<Payment> {
        let key = CacheKey::Id(id);
        let generation = self.cache.generation();
        if let Some(hit) = self.cache.get(&key) {
            return Ok(hit);
        }
        let payment = self.service.get(id).await?;
        self.cache.put(key, payment.clone(), generation);
        Ok(payment)
    }

    pub async fn get_by_order_id(&self, order_id: OrderId) -> Result<Payment> {
        let key = CacheKey::Order(order_id);
        let generation = self.cache.generation();
        if let Some(hit) = self.cache.get(&key) {
            return Ok(hit);
        }
        let payment = self.service.get_by_order_id(order_id).await?;
        self.cache.put(key, payment.clone(), generation);
        Ok(payment)
    }

    pub async fn update_status(&self, id: PaymentId, status: PaymentStatus) -> Result<Payment> {
        let payment = self.service.update_status(id, status).await?;
        self.cache.invalidate_all();
        Ok(payment)
    }

    pub async fn process(&self, id: PaymentId) -> Result<Payment> {
        let payment = self.service.process(id).await?;
        self.cache.invalidate_all();
        Ok(payment)
    }
}
