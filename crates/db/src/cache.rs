//! Get-or-populate cache for category recommendation listings.
//!
//! The cache is the only state shared across request handlers. Hits are
//! served as stored, with no re-validation against the live catalog;
//! staleness is bounded only by the configured TTL. Catalog writes never
//! invalidate entries.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use futures::future::BoxFuture;
use thiserror::Error;
use tokio::sync::Mutex;

use storefront_core::domain::product::Product;

use crate::repositories::RepositoryError;

/// Deferred catalog lookup, polled only on a miss.
pub type ComputeProducts<'a> = BoxFuture<'a, Result<Vec<Product>, RepositoryError>>;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache backend failure: {0}")]
    Backend(String),
    #[error(transparent)]
    Source(#[from] RepositoryError),
}

/// Keyed get-or-populate store.
///
/// Whether concurrent misses for the same key coalesce into one compute is
/// implementation-defined; callers must tolerate redundant computes and
/// must not rely on single-flight behavior.
#[async_trait]
pub trait RecommendationCache: Send + Sync {
    /// Returns the entry under `key`, computing and storing it first if
    /// absent. A failed compute is propagated and nothing is stored.
    async fn get_or_compute<'a>(
        &self,
        key: &str,
        compute: ComputeProducts<'a>,
    ) -> Result<Vec<Product>, CacheError>;
}

struct Entry {
    products: Vec<Product>,
    stored_at: Instant,
}

/// Process-local cache with optional TTL expiry.
///
/// The map lock is held across the compute future, so this implementation
/// happens to serialize concurrent misses; that is an artifact, not part
/// of the [`RecommendationCache`] contract.
pub struct InMemoryRecommendationCache {
    entries: Mutex<HashMap<String, Entry>>,
    ttl: Option<Duration>,
}

impl InMemoryRecommendationCache {
    pub fn new(ttl: Option<Duration>) -> Self {
        Self { entries: Mutex::new(HashMap::new()), ttl }
    }

    /// TTL from config; zero seconds means entries never expire.
    pub fn from_ttl_secs(ttl_secs: u64) -> Self {
        let ttl = (ttl_secs > 0).then(|| Duration::from_secs(ttl_secs));
        Self::new(ttl)
    }

    fn is_fresh(&self, entry: &Entry) -> bool {
        match self.ttl {
            Some(ttl) => entry.stored_at.elapsed() < ttl,
            None => true,
        }
    }
}

#[async_trait]
impl RecommendationCache for InMemoryRecommendationCache {
    async fn get_or_compute<'a>(
        &self,
        key: &str,
        compute: ComputeProducts<'a>,
    ) -> Result<Vec<Product>, CacheError> {
        let mut entries = self.entries.lock().await;

        if let Some(entry) = entries.get(key) {
            if self.is_fresh(entry) {
                return Ok(entry.products.clone());
            }
        }

        let products = compute.await?;
        entries
            .insert(key.to_string(), Entry { products: products.clone(), stored_at: Instant::now() });
        Ok(products)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use rust_decimal::Decimal;

    use storefront_core::domain::category::CategoryId;
    use storefront_core::domain::product::{Product, ProductId};

    use super::{CacheError, InMemoryRecommendationCache, RecommendationCache};
    use crate::repositories::RepositoryError;

    fn product(id: i64) -> Product {
        Product {
            id: ProductId(id),
            name: format!("Product {id}"),
            description: None,
            price: Decimal::new(999, 2),
            brand: "Acme".to_string(),
            size: None,
            color: None,
            category_id: CategoryId(1),
        }
    }

    #[tokio::test]
    async fn miss_computes_and_stores() {
        let cache = InMemoryRecommendationCache::new(None);

        let first = cache
            .get_or_compute("k", Box::pin(async { Ok(vec![product(1)]) }))
            .await
            .expect("first compute");
        assert_eq!(first, vec![product(1)]);

        // A second call must serve the stored value; the compute closure
        // would produce something different if it ran.
        let second = cache
            .get_or_compute("k", Box::pin(async { Ok(vec![product(2)]) }))
            .await
            .expect("cached read");
        assert_eq!(second, vec![product(1)]);
    }

    #[tokio::test]
    async fn keys_are_independent() {
        let cache = InMemoryRecommendationCache::new(None);

        cache
            .get_or_compute("a", Box::pin(async { Ok(vec![product(1)]) }))
            .await
            .expect("compute a");
        let other = cache
            .get_or_compute("b", Box::pin(async { Ok(vec![product(2)]) }))
            .await
            .expect("compute b");

        assert_eq!(other, vec![product(2)]);
    }

    #[tokio::test]
    async fn expired_entries_are_recomputed() {
        let cache = InMemoryRecommendationCache::new(Some(Duration::from_millis(10)));

        cache
            .get_or_compute("k", Box::pin(async { Ok(vec![product(1)]) }))
            .await
            .expect("first compute");

        tokio::time::sleep(Duration::from_millis(25)).await;

        let refreshed = cache
            .get_or_compute("k", Box::pin(async { Ok(vec![product(2)]) }))
            .await
            .expect("recompute");
        assert_eq!(refreshed, vec![product(2)]);
    }

    #[tokio::test]
    async fn failed_compute_is_not_cached() {
        let cache = InMemoryRecommendationCache::new(None);

        let failed = cache
            .get_or_compute(
                "k",
                Box::pin(async { Err(RepositoryError::Decode("boom".to_string())) }),
            )
            .await;
        assert!(matches!(failed, Err(CacheError::Source(_))));

        let recovered = cache
            .get_or_compute("k", Box::pin(async { Ok(vec![product(3)]) }))
            .await
            .expect("retry after failure");
        assert_eq!(recovered, vec![product(3)]);
    }
}
