//! In-memory repositories for tests and repository-free composition.
//! Each store hands out sequential ids the way the SQLite rowid does.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};

use tokio::sync::RwLock;

use storefront_core::domain::cart::{Cart, CartId, CartItem, CartItemId, NewCartItem};
use storefront_core::domain::category::{Category, CategoryId, NewCategory};
use storefront_core::domain::product::{NewProduct, Product, ProductId};
use storefront_core::domain::purchase::{NewPurchase, Purchase, PurchaseId};
use storefront_core::domain::user::{NewUser, User, UserId};

use super::{
    CartRepository, CategoryRepository, ProductRepository, PurchaseRepository, RepositoryError,
    UserRepository,
};

#[derive(Default)]
pub struct InMemoryUserRepository {
    users: RwLock<HashMap<i64, User>>,
    next_id: AtomicI64,
}

impl InMemoryUserRepository {
    fn next_id(&self) -> i64 {
        self.next_id.fetch_add(1, Ordering::SeqCst) + 1
    }
}

#[async_trait::async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, RepositoryError> {
        let users = self.users.read().await;
        Ok(users.get(&id.0).cloned())
    }

    async fn create(&self, user: NewUser) -> Result<User, RepositoryError> {
        let user = User { id: UserId(self.next_id()), email: user.email, name: user.name };
        let mut users = self.users.write().await;
        users.insert(user.id.0, user.clone());
        Ok(user)
    }
}

#[derive(Default)]
pub struct InMemoryCategoryRepository {
    categories: RwLock<HashMap<i64, Category>>,
    next_id: AtomicI64,
}

impl InMemoryCategoryRepository {
    fn next_id(&self) -> i64 {
        self.next_id.fetch_add(1, Ordering::SeqCst) + 1
    }
}

#[async_trait::async_trait]
impl CategoryRepository for InMemoryCategoryRepository {
    async fn find_by_id(&self, id: &CategoryId) -> Result<Option<Category>, RepositoryError> {
        let categories = self.categories.read().await;
        Ok(categories.get(&id.0).cloned())
    }

    async fn list(&self) -> Result<Vec<Category>, RepositoryError> {
        let categories = self.categories.read().await;
        let mut all: Vec<Category> = categories.values().cloned().collect();
        all.sort_by_key(|category| category.id.0);
        Ok(all)
    }

    async fn create(&self, category: NewCategory) -> Result<Category, RepositoryError> {
        let category = Category {
            id: CategoryId(self.next_id()),
            name: category.name,
            description: category.description,
        };
        let mut categories = self.categories.write().await;
        categories.insert(category.id.0, category.clone());
        Ok(category)
    }
}

#[derive(Default)]
pub struct InMemoryProductRepository {
    products: RwLock<HashMap<i64, Product>>,
    next_id: AtomicI64,
}

impl InMemoryProductRepository {
    fn next_id(&self) -> i64 {
        self.next_id.fetch_add(1, Ordering::SeqCst) + 1
    }
}

#[async_trait::async_trait]
impl ProductRepository for InMemoryProductRepository {
    async fn find_by_id(&self, id: &ProductId) -> Result<Option<Product>, RepositoryError> {
        let products = self.products.read().await;
        Ok(products.get(&id.0).cloned())
    }

    async fn list(&self) -> Result<Vec<Product>, RepositoryError> {
        let products = self.products.read().await;
        let mut all: Vec<Product> = products.values().cloned().collect();
        all.sort_by_key(|product| product.id.0);
        Ok(all)
    }

    async fn list_by_category(&self, id: &CategoryId) -> Result<Vec<Product>, RepositoryError> {
        let products = self.products.read().await;
        let mut matching: Vec<Product> =
            products.values().filter(|product| product.category_id == *id).cloned().collect();
        matching.sort_by_key(|product| product.id.0);
        Ok(matching)
    }

    async fn create(&self, product: NewProduct) -> Result<Product, RepositoryError> {
        let product = Product {
            id: ProductId(self.next_id()),
            name: product.name,
            description: product.description,
            price: product.price,
            brand: product.brand,
            size: product.size,
            color: product.color,
            category_id: product.category_id,
        };
        let mut products = self.products.write().await;
        products.insert(product.id.0, product.clone());
        Ok(product)
    }

    async fn update(&self, product: &Product) -> Result<(), RepositoryError> {
        let mut products = self.products.write().await;
        products.insert(product.id.0, product.clone());
        Ok(())
    }

    async fn delete(&self, id: &ProductId) -> Result<(), RepositoryError> {
        let mut products = self.products.write().await;
        products.remove(&id.0);
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryPurchaseRepository {
    // Vec keeps insertion order, which doubles as the rowid order the SQL
    // store returns for a user's history.
    purchases: RwLock<Vec<Purchase>>,
    next_id: AtomicI64,
}

impl InMemoryPurchaseRepository {
    fn next_id(&self) -> i64 {
        self.next_id.fetch_add(1, Ordering::SeqCst) + 1
    }
}

#[async_trait::async_trait]
impl PurchaseRepository for InMemoryPurchaseRepository {
    async fn find_by_user(&self, id: &UserId) -> Result<Vec<Purchase>, RepositoryError> {
        let purchases = self.purchases.read().await;
        Ok(purchases.iter().filter(|purchase| purchase.user_id == *id).cloned().collect())
    }

    async fn create(&self, purchase: NewPurchase) -> Result<Purchase, RepositoryError> {
        let purchase = Purchase {
            id: PurchaseId(self.next_id()),
            user_id: purchase.user_id,
            product_id: purchase.product_id,
            quantity: purchase.quantity,
            purchased_at: purchase.purchased_at,
        };
        let mut purchases = self.purchases.write().await;
        purchases.push(purchase.clone());
        Ok(purchase)
    }
}

#[derive(Default)]
pub struct InMemoryCartRepository {
    carts: RwLock<HashMap<i64, Cart>>,
    items: RwLock<HashMap<i64, CartItem>>,
    next_id: AtomicI64,
}

impl InMemoryCartRepository {
    fn next_id(&self) -> i64 {
        self.next_id.fetch_add(1, Ordering::SeqCst) + 1
    }
}

#[async_trait::async_trait]
impl CartRepository for InMemoryCartRepository {
    async fn find_by_user(&self, id: &UserId) -> Result<Option<Cart>, RepositoryError> {
        let carts = self.carts.read().await;
        Ok(carts.values().find(|cart| cart.user_id == *id).cloned())
    }

    async fn create_for_user(&self, id: &UserId) -> Result<Cart, RepositoryError> {
        let cart = Cart { id: CartId(self.next_id()), user_id: *id };
        let mut carts = self.carts.write().await;
        carts.insert(cart.id.0, cart.clone());
        Ok(cart)
    }

    async fn add_item(&self, item: NewCartItem) -> Result<CartItem, RepositoryError> {
        let item = CartItem {
            id: CartItemId(self.next_id()),
            cart_id: item.cart_id,
            product_id: item.product_id,
            quantity: item.quantity,
        };
        let mut items = self.items.write().await;
        items.insert(item.id.0, item.clone());
        Ok(item)
    }

    async fn list_items(&self, id: &CartId) -> Result<Vec<CartItem>, RepositoryError> {
        let items = self.items.read().await;
        let mut matching: Vec<CartItem> =
            items.values().filter(|item| item.cart_id == *id).cloned().collect();
        matching.sort_by_key(|item| item.id.0);
        Ok(matching)
    }

    async fn delete(&self, id: &CartId) -> Result<(), RepositoryError> {
        let mut carts = self.carts.write().await;
        let mut items = self.items.write().await;
        carts.remove(&id.0);
        items.retain(|_, item| item.cart_id != *id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use rust_decimal::Decimal;

    use storefront_core::domain::cart::NewCartItem;
    use storefront_core::domain::category::CategoryId;
    use storefront_core::domain::product::{NewProduct, ProductId};
    use storefront_core::domain::purchase::NewPurchase;
    use storefront_core::domain::user::{NewUser, UserId};

    use crate::repositories::{
        CartRepository, InMemoryCartRepository, InMemoryProductRepository,
        InMemoryPurchaseRepository, InMemoryUserRepository, ProductRepository,
        PurchaseRepository, UserRepository,
    };

    fn new_product(name: &str, category: i64) -> NewProduct {
        NewProduct {
            name: name.to_string(),
            description: None,
            price: Decimal::new(1999, 2),
            brand: "Acme".to_string(),
            size: Some("M".to_string()),
            color: None,
            category_id: CategoryId(category),
        }
    }

    #[tokio::test]
    async fn in_memory_user_repo_round_trip() {
        let repo = InMemoryUserRepository::default();

        let user = repo
            .create(NewUser { email: "ada@example.com".to_string(), name: "Ada".to_string() })
            .await
            .expect("create user");
        let found = repo.find_by_id(&user.id).await.expect("find user");

        assert_eq!(found, Some(user));
    }

    #[tokio::test]
    async fn in_memory_product_repo_assigns_sequential_ids() {
        let repo = InMemoryProductRepository::default();

        let first = repo.create(new_product("Desk Lamp", 1)).await.expect("create product");
        let second = repo.create(new_product("Floor Lamp", 1)).await.expect("create product");

        assert_eq!(first.id, ProductId(1));
        assert_eq!(second.id, ProductId(2));
    }

    #[tokio::test]
    async fn in_memory_product_repo_lists_category_in_id_order() {
        let repo = InMemoryProductRepository::default();

        repo.create(new_product("Desk Lamp", 1)).await.expect("create product");
        repo.create(new_product("Mug", 2)).await.expect("create product");
        repo.create(new_product("Floor Lamp", 1)).await.expect("create product");

        let lamps = repo.list_by_category(&CategoryId(1)).await.expect("list category");
        let ids: Vec<i64> = lamps.iter().map(|product| product.id.0).collect();

        assert_eq!(ids, vec![1, 3]);
    }

    #[tokio::test]
    async fn in_memory_purchase_repo_keeps_history_order_per_user() {
        let repo = InMemoryPurchaseRepository::default();

        for (user, product) in [(1, 10), (2, 99), (1, 20), (1, 10)] {
            repo.create(NewPurchase {
                user_id: UserId(user),
                product_id: ProductId(product),
                quantity: 1,
                purchased_at: Utc::now(),
            })
            .await
            .expect("create purchase");
        }

        let history = repo.find_by_user(&UserId(1)).await.expect("find purchases");
        let products: Vec<i64> = history.iter().map(|purchase| purchase.product_id.0).collect();

        assert_eq!(products, vec![10, 20, 10]);
        assert!(repo.find_by_user(&UserId(3)).await.expect("find purchases").is_empty());
    }

    #[tokio::test]
    async fn in_memory_cart_repo_delete_removes_items_too() {
        let repo = InMemoryCartRepository::default();

        let cart = repo.create_for_user(&UserId(1)).await.expect("create cart");
        repo.add_item(NewCartItem { cart_id: cart.id, product_id: ProductId(5), quantity: 2 })
            .await
            .expect("add item");

        repo.delete(&cart.id).await.expect("delete cart");

        assert_eq!(repo.find_by_user(&UserId(1)).await.expect("find cart"), None);
        assert!(repo.list_items(&cart.id).await.expect("list items").is_empty());
    }
}
