use async_trait::async_trait;
use thiserror::Error;

use storefront_core::domain::cart::{Cart, CartId, CartItem, NewCartItem};
use storefront_core::domain::category::{Category, CategoryId, NewCategory};
use storefront_core::domain::product::{NewProduct, Product, ProductId};
use storefront_core::domain::purchase::{NewPurchase, Purchase};
use storefront_core::domain::user::{NewUser, User, UserId};

pub mod cart;
pub mod category;
pub mod memory;
pub mod product;
pub mod purchase;
pub mod user;

pub use cart::SqlCartRepository;
pub use category::SqlCategoryRepository;
pub use memory::{
    InMemoryCartRepository, InMemoryCategoryRepository, InMemoryProductRepository,
    InMemoryPurchaseRepository, InMemoryUserRepository,
};
pub use product::SqlProductRepository;
pub use purchase::SqlPurchaseRepository;
pub use user::SqlUserRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, RepositoryError>;
    async fn create(&self, user: NewUser) -> Result<User, RepositoryError>;
}

#[async_trait]
pub trait CategoryRepository: Send + Sync {
    async fn find_by_id(&self, id: &CategoryId) -> Result<Option<Category>, RepositoryError>;
    async fn list(&self) -> Result<Vec<Category>, RepositoryError>;
    async fn create(&self, category: NewCategory) -> Result<Category, RepositoryError>;
}

#[async_trait]
pub trait ProductRepository: Send + Sync {
    async fn find_by_id(&self, id: &ProductId) -> Result<Option<Product>, RepositoryError>;
    async fn list(&self) -> Result<Vec<Product>, RepositoryError>;

    /// All products in a category, in the store's natural enumeration
    /// order (ascending id for the SQL store).
    async fn list_by_category(&self, id: &CategoryId) -> Result<Vec<Product>, RepositoryError>;

    async fn create(&self, product: NewProduct) -> Result<Product, RepositoryError>;
    async fn update(&self, product: &Product) -> Result<(), RepositoryError>;
    async fn delete(&self, id: &ProductId) -> Result<(), RepositoryError>;
}

#[async_trait]
pub trait PurchaseRepository: Send + Sync {
    /// A user's full purchase history, oldest first. Empty when the user
    /// has never checked out; absence of the user itself is the caller's
    /// concern.
    async fn find_by_user(&self, id: &UserId) -> Result<Vec<Purchase>, RepositoryError>;

    async fn create(&self, purchase: NewPurchase) -> Result<Purchase, RepositoryError>;
}

#[async_trait]
pub trait CartRepository: Send + Sync {
    async fn find_by_user(&self, id: &UserId) -> Result<Option<Cart>, RepositoryError>;
    async fn create_for_user(&self, id: &UserId) -> Result<Cart, RepositoryError>;
    async fn add_item(&self, item: NewCartItem) -> Result<CartItem, RepositoryError>;
    async fn list_items(&self, id: &CartId) -> Result<Vec<CartItem>, RepositoryError>;

    /// Removes the cart and everything in it.
    async fn delete(&self, id: &CartId) -> Result<(), RepositoryError>;
}
