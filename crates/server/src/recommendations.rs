//! Recommendation orchestration.
//!
//! Two entry points: ranked products from a user's purchase history, and
//! cached same-category listings for a product. Both read the catalog
//! through injected repository handles; the category path goes through the
//! shared recommendation cache.

use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use storefront_core::domain::product::{Product, ProductId};
use storefront_core::domain::user::UserId;
use storefront_core::recommend::FrequencyMap;
use storefront_db::cache::{CacheError, RecommendationCache};
use storefront_db::repositories::{
    ProductRepository, PurchaseRepository, RepositoryError, UserRepository,
};

#[derive(Debug, Error)]
pub enum RecommendationError {
    #[error("user {0} not found")]
    UserNotFound(UserId),
    #[error("product {0} not found")]
    ProductNotFound(ProductId),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Cache(#[from] CacheError),
}

/// Cache key for a product's same-category listing; unique per product.
fn category_cache_key(product_id: &ProductId) -> String {
    format!("product_recommendations_{product_id}")
}

pub struct RecommendationService {
    users: Arc<dyn UserRepository>,
    products: Arc<dyn ProductRepository>,
    purchases: Arc<dyn PurchaseRepository>,
    cache: Arc<dyn RecommendationCache>,
}

impl RecommendationService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        products: Arc<dyn ProductRepository>,
        purchases: Arc<dyn PurchaseRepository>,
        cache: Arc<dyn RecommendationCache>,
    ) -> Self {
        Self { users, products, purchases, cache }
    }

    /// Products the user buys most, in descending cumulative-quantity
    /// order. An empty history yields an empty list; an unknown user is an
    /// error.
    pub async fn recommendations_for_user(
        &self,
        user_id: UserId,
    ) -> Result<Vec<Product>, RecommendationError> {
        if self.users.find_by_id(&user_id).await?.is_none() {
            return Err(RecommendationError::UserNotFound(user_id));
        }

        let purchases = self.purchases.find_by_user(&user_id).await?;
        let frequencies = FrequencyMap::from_purchases(&purchases);
        self.resolve(frequencies.ranked_product_ids()).await
    }

    /// Other products in the queried product's category, served from the
    /// cache when warm. The listing is whatever the catalog returned when
    /// the entry was populated, and it includes the queried product
    /// itself.
    pub async fn recommendations_for_product(
        &self,
        product: &Product,
    ) -> Result<Vec<Product>, RecommendationError> {
        let key = category_cache_key(&product.id);
        let products = Arc::clone(&self.products);
        let category_id = product.category_id;

        let listing = self
            .cache
            .get_or_compute(
                &key,
                Box::pin(async move { products.list_by_category(&category_id).await }),
            )
            .await?;

        Ok(listing)
    }

    /// Resolve a product by id and pair it with its category
    /// recommendations, as served by the product detail endpoint.
    pub async fn product_with_recommendations(
        &self,
        product_id: ProductId,
    ) -> Result<(Product, Vec<Product>), RecommendationError> {
        let product = self
            .products
            .find_by_id(&product_id)
            .await?
            .ok_or(RecommendationError::ProductNotFound(product_id))?;

        let recommendations = self.recommendations_for_product(&product).await?;
        Ok((product, recommendations))
    }

    /// Map ranked ids back to products, keeping rank order. Ids that no
    /// longer resolve are dropped rather than failing the whole listing.
    async fn resolve(&self, ids: Vec<ProductId>) -> Result<Vec<Product>, RecommendationError> {
        let mut resolved = Vec::with_capacity(ids.len());
        for id in ids {
            match self.products.find_by_id(&id).await? {
                Some(product) => resolved.push(product),
                None => {
                    debug!(product_id = %id, "ranked product no longer in catalog, skipping");
                }
            }
        }
        Ok(resolved)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use chrono::Utc;
    use rust_decimal::Decimal;

    use storefront_core::domain::category::CategoryId;
    use storefront_core::domain::product::{NewProduct, Product, ProductId};
    use storefront_core::domain::purchase::NewPurchase;
    use storefront_core::domain::user::{NewUser, User, UserId};
    use storefront_db::cache::InMemoryRecommendationCache;
    use storefront_db::repositories::{
        InMemoryProductRepository, InMemoryPurchaseRepository, InMemoryUserRepository,
        ProductRepository, PurchaseRepository, RepositoryError, UserRepository,
    };

    use super::{RecommendationError, RecommendationService};

    /// Delegates to an in-memory store while counting category listings,
    /// so tests can assert whether a call was served from the cache.
    struct CountingProductRepository {
        inner: InMemoryProductRepository,
        category_queries: AtomicUsize,
    }

    impl CountingProductRepository {
        fn new() -> Self {
            Self { inner: InMemoryProductRepository::default(), category_queries: AtomicUsize::new(0) }
        }

        fn category_query_count(&self) -> usize {
            self.category_queries.load(Ordering::SeqCst)
        }
    }

    #[async_trait::async_trait]
    impl ProductRepository for CountingProductRepository {
        async fn find_by_id(&self, id: &ProductId) -> Result<Option<Product>, RepositoryError> {
            self.inner.find_by_id(id).await
        }

        async fn list(&self) -> Result<Vec<Product>, RepositoryError> {
            self.inner.list().await
        }

        async fn list_by_category(
            &self,
            id: &CategoryId,
        ) -> Result<Vec<Product>, RepositoryError> {
            self.category_queries.fetch_add(1, Ordering::SeqCst);
            self.inner.list_by_category(id).await
        }

        async fn create(&self, product: NewProduct) -> Result<Product, RepositoryError> {
            self.inner.create(product).await
        }

        async fn update(&self, product: &Product) -> Result<(), RepositoryError> {
            self.inner.update(product).await
        }

        async fn delete(&self, id: &ProductId) -> Result<(), RepositoryError> {
            self.inner.delete(id).await
        }
    }

    struct Fixture {
        users: Arc<InMemoryUserRepository>,
        products: Arc<CountingProductRepository>,
        purchases: Arc<InMemoryPurchaseRepository>,
        service: RecommendationService,
    }

    fn fixture() -> Fixture {
        let users = Arc::new(InMemoryUserRepository::default());
        let products = Arc::new(CountingProductRepository::new());
        let purchases = Arc::new(InMemoryPurchaseRepository::default());
        let cache = Arc::new(InMemoryRecommendationCache::new(None));

        let service = RecommendationService::new(
            users.clone(),
            products.clone(),
            purchases.clone(),
            cache,
        );

        Fixture { users, products, purchases, service }
    }

    async fn seed_user(fixture: &Fixture) -> User {
        fixture
            .users
            .create(NewUser { email: "ada@example.com".to_string(), name: "Ada".to_string() })
            .await
            .expect("create user")
    }

    async fn seed_product(fixture: &Fixture, name: &str, category: i64) -> Product {
        fixture
            .products
            .create(NewProduct {
                name: name.to_string(),
                description: None,
                price: Decimal::new(2500, 2),
                brand: "Acme".to_string(),
                size: None,
                color: None,
                category_id: CategoryId(category),
            })
            .await
            .expect("create product")
    }

    async fn seed_purchase(fixture: &Fixture, user: &User, product: &Product, quantity: i64) {
        fixture
            .purchases
            .create(NewPurchase {
                user_id: user.id,
                product_id: product.id,
                quantity,
                purchased_at: Utc::now(),
            })
            .await
            .expect("create purchase");
    }

    #[tokio::test]
    async fn empty_history_yields_empty_recommendations() {
        let fx = fixture();
        let user = seed_user(&fx).await;

        let recommended =
            fx.service.recommendations_for_user(user.id).await.expect("recommendations");

        assert!(recommended.is_empty());
    }

    #[tokio::test]
    async fn unknown_user_is_an_error() {
        let fx = fixture();

        let result = fx.service.recommendations_for_user(UserId(42)).await;

        assert!(matches!(result, Err(RecommendationError::UserNotFound(UserId(42)))));
    }

    #[tokio::test]
    async fn recommendations_rank_by_cumulative_quantity() {
        let fx = fixture();
        let user = seed_user(&fx).await;
        let lamp = seed_product(&fx, "Desk Lamp", 1).await;
        let mug = seed_product(&fx, "Ceramic Mug", 2).await;

        seed_purchase(&fx, &user, &lamp, 2).await;
        seed_purchase(&fx, &user, &mug, 5).await;
        seed_purchase(&fx, &user, &lamp, 1).await;

        let recommended =
            fx.service.recommendations_for_user(user.id).await.expect("recommendations");
        let ids: Vec<ProductId> = recommended.iter().map(|product| product.id).collect();

        assert_eq!(ids, vec![mug.id, lamp.id]);
    }

    #[tokio::test]
    async fn deleted_products_are_omitted_and_order_is_kept() {
        let fx = fixture();
        let user = seed_user(&fx).await;
        let lamp = seed_product(&fx, "Desk Lamp", 1).await;
        let mug = seed_product(&fx, "Ceramic Mug", 2).await;
        let knife = seed_product(&fx, "Chef Knife", 2).await;

        seed_purchase(&fx, &user, &mug, 5).await;
        seed_purchase(&fx, &user, &lamp, 3).await;
        seed_purchase(&fx, &user, &knife, 1).await;

        fx.products.delete(&lamp.id).await.expect("delete product");

        let recommended =
            fx.service.recommendations_for_user(user.id).await.expect("recommendations");
        let ids: Vec<ProductId> = recommended.iter().map(|product| product.id).collect();

        assert_eq!(ids, vec![mug.id, knife.id]);
    }

    #[tokio::test]
    async fn category_listing_is_served_from_cache_on_second_call() {
        let fx = fixture();
        let lamp = seed_product(&fx, "Desk Lamp", 1).await;
        seed_product(&fx, "Floor Lamp", 1).await;

        let first =
            fx.service.recommendations_for_product(&lamp).await.expect("first listing");
        assert_eq!(fx.products.category_query_count(), 1);

        let second =
            fx.service.recommendations_for_product(&lamp).await.expect("second listing");

        assert_eq!(fx.products.category_query_count(), 1, "second call must not hit the store");
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn category_listing_includes_the_queried_product() {
        let fx = fixture();
        let lamp = seed_product(&fx, "Desk Lamp", 1).await;
        let floor = seed_product(&fx, "Floor Lamp", 1).await;
        let lantern = seed_product(&fx, "Camping Lantern", 1).await;
        seed_product(&fx, "Ceramic Mug", 2).await;

        let listing =
            fx.service.recommendations_for_product(&lamp).await.expect("listing");
        let ids: Vec<ProductId> = listing.iter().map(|product| product.id).collect();

        assert_eq!(ids, vec![lamp.id, floor.id, lantern.id]);
    }

    #[tokio::test]
    async fn cached_listing_survives_catalog_changes() {
        let fx = fixture();
        let lamp = seed_product(&fx, "Desk Lamp", 1).await;
        let floor = seed_product(&fx, "Floor Lamp", 1).await;

        let before = fx.service.recommendations_for_product(&lamp).await.expect("warm cache");
        assert_eq!(before.len(), 2);

        // The cache never sees this deletion; the stale listing stands.
        fx.products.delete(&floor.id).await.expect("delete product");

        let after = fx.service.recommendations_for_product(&lamp).await.expect("cached listing");
        assert_eq!(after, before);
    }

    #[tokio::test]
    async fn unknown_product_detail_is_an_error() {
        let fx = fixture();

        let result = fx.service.product_with_recommendations(ProductId(9)).await;

        assert!(matches!(result, Err(RecommendationError::ProductNotFound(ProductId(9)))));
    }
}
