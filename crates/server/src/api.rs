//! JSON API routes for the catalog, carts, purchases, and recommendations.
//!
//! Endpoints:
//! - `GET    /api/recommendations/{user_id}` — most-purchased products for a user
//! - `POST   /api/products`                  — create a product
//! - `GET    /api/products`                  — list all products
//! - `GET    /api/products/{id}`             — product detail plus category recommendations
//! - `PUT    /api/products/{id}`             — partial update
//! - `DELETE /api/products/{id}`             — delete a product
//! - `POST   /api/categories`                — create a category
//! - `GET    /api/categories`                — list all categories
//! - `POST   /api/purchases`                 — record a purchase
//! - `GET    /api/purchases/{user_id}`       — a user's purchase history
//! - `POST   /api/cart/add`                  — add an item to the user's cart
//! - `GET    /api/cart/{user_id}`            — view the user's cart
//! - `POST   /api/cart/checkout`             — convert the cart into purchases

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::error;

use storefront_core::domain::cart::{Cart, CartItem, NewCartItem};
use storefront_core::domain::category::{Category, CategoryId, NewCategory};
use storefront_core::domain::product::{NewProduct, Product, ProductId};
use storefront_core::domain::purchase::{NewPurchase, Purchase};
use storefront_core::domain::user::UserId;
use storefront_db::cache::{CacheError, RecommendationCache};
use storefront_db::repositories::{
    CartRepository, CategoryRepository, ProductRepository, PurchaseRepository, UserRepository,
};

use crate::recommendations::{RecommendationError, RecommendationService};

#[derive(Clone)]
pub struct AppState {
    users: Arc<dyn UserRepository>,
    categories: Arc<dyn CategoryRepository>,
    products: Arc<dyn ProductRepository>,
    purchases: Arc<dyn PurchaseRepository>,
    carts: Arc<dyn CartRepository>,
    recommendations: Arc<RecommendationService>,
}

impl AppState {
    pub fn new(
        users: Arc<dyn UserRepository>,
        categories: Arc<dyn CategoryRepository>,
        products: Arc<dyn ProductRepository>,
        purchases: Arc<dyn PurchaseRepository>,
        carts: Arc<dyn CartRepository>,
        cache: Arc<dyn RecommendationCache>,
    ) -> Self {
        let recommendations = Arc::new(RecommendationService::new(
            users.clone(),
            products.clone(),
            purchases.clone(),
            cache,
        ));

        Self { users, categories, products, purchases, carts, recommendations }
    }
}

// ---------------------------------------------------------------------------
// Request / Response types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

#[derive(Debug, Serialize)]
pub struct MessageBody {
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateProductRequest {
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub brand: String,
    pub size: Option<String>,
    pub color: Option<String>,
    pub category_id: i64,
}

#[derive(Debug, Deserialize)]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub brand: Option<String>,
    pub size: Option<String>,
    pub color: Option<String>,
    pub category_id: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct ProductDetailResponse {
    pub product: Product,
    pub recommendations: Vec<Product>,
}

#[derive(Debug, Deserialize)]
pub struct CreateCategoryRequest {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreatePurchaseRequest {
    pub user_id: i64,
    pub product_id: i64,
    pub quantity: i64,
    pub purchase_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct AddToCartRequest {
    pub user_id: i64,
    pub product_id: i64,
    pub quantity: i64,
}

#[derive(Debug, Deserialize)]
pub struct CheckoutRequest {
    pub user_id: i64,
}

#[derive(Debug, Serialize)]
pub struct CartResponse {
    pub cart: Cart,
    pub items: Vec<CartItem>,
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/recommendations/{user_id}", get(get_recommendations))
        .route("/api/products", post(create_product).get(list_products))
        .route("/api/products/{id}", get(get_product).put(update_product).delete(delete_product))
        .route("/api/categories", post(create_category).get(list_categories))
        .route("/api/purchases", post(create_purchase))
        .route("/api/purchases/{user_id}", get(list_purchases))
        .route("/api/cart/add", post(add_to_cart))
        .route("/api/cart/checkout", post(checkout))
        .route("/api/cart/{user_id}", get(get_cart))
        .with_state(state)
}

type ApiError = (StatusCode, Json<ErrorBody>);

fn not_found(message: &str) -> ApiError {
    (StatusCode::NOT_FOUND, Json(ErrorBody { error: message.to_string() }))
}

fn bad_request(message: &str) -> ApiError {
    (StatusCode::BAD_REQUEST, Json(ErrorBody { error: message.to_string() }))
}

fn internal_error(context: &str, err: impl std::fmt::Display) -> ApiError {
    error!(error = %err, "{context}");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorBody { error: "Internal server error".to_string() }),
    )
}

fn recommendation_error(err: RecommendationError) -> ApiError {
    match err {
        RecommendationError::UserNotFound(_) => not_found("User not found"),
        RecommendationError::ProductNotFound(_) => not_found("Product not found"),
        RecommendationError::Cache(CacheError::Backend(message)) => {
            error!(error = %message, "recommendation cache backend failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ErrorBody { error: "Recommendations are temporarily unavailable".to_string() }),
            )
        }
        RecommendationError::Cache(CacheError::Source(err)) => {
            internal_error("recommendation source lookup failed", err)
        }
        RecommendationError::Repository(err) => {
            internal_error("recommendation catalog lookup failed", err)
        }
    }
}

// ---------------------------------------------------------------------------
// Recommendation handlers
// ---------------------------------------------------------------------------

pub async fn get_recommendations(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<Json<Vec<Product>>, ApiError> {
    let recommended = state
        .recommendations
        .recommendations_for_user(UserId(user_id))
        .await
        .map_err(recommendation_error)?;

    Ok(Json(recommended))
}

// ---------------------------------------------------------------------------
// Product handlers
// ---------------------------------------------------------------------------

pub async fn create_product(
    State(state): State<AppState>,
    Json(body): Json<CreateProductRequest>,
) -> Result<(StatusCode, Json<MessageBody>), ApiError> {
    let category_id = CategoryId(body.category_id);
    let category = state
        .categories
        .find_by_id(&category_id)
        .await
        .map_err(|err| internal_error("category lookup failed", err))?;
    if category.is_none() {
        return Err(bad_request("Invalid category ID"));
    }

    state
        .products
        .create(NewProduct {
            name: body.name,
            description: body.description,
            price: body.price,
            brand: body.brand,
            size: body.size,
            color: body.color,
            category_id,
        })
        .await
        .map_err(|err| internal_error("product insert failed", err))?;

    Ok((StatusCode::CREATED, Json(MessageBody { message: "Product created successfully".to_string() })))
}

pub async fn list_products(
    State(state): State<AppState>,
) -> Result<Json<Vec<Product>>, ApiError> {
    let products =
        state.products.list().await.map_err(|err| internal_error("product list failed", err))?;

    Ok(Json(products))
}

pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ProductDetailResponse>, ApiError> {
    let (product, recommendations) = state
        .recommendations
        .product_with_recommendations(ProductId(id))
        .await
        .map_err(recommendation_error)?;

    Ok(Json(ProductDetailResponse { product, recommendations }))
}

pub async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<UpdateProductRequest>,
) -> Result<Json<MessageBody>, ApiError> {
    let mut product = state
        .products
        .find_by_id(&ProductId(id))
        .await
        .map_err(|err| internal_error("product lookup failed", err))?
        .ok_or_else(|| not_found("Product not found"))?;

    if let Some(name) = body.name {
        product.name = name;
    }
    if let Some(description) = body.description {
        product.description = Some(description);
    }
    if let Some(price) = body.price {
        product.price = price;
    }
    if let Some(brand) = body.brand {
        product.brand = brand;
    }
    if let Some(size) = body.size {
        product.size = Some(size);
    }
    if let Some(color) = body.color {
        product.color = Some(color);
    }
    if let Some(category_id) = body.category_id {
        let category_id = CategoryId(category_id);
        let category = state
            .categories
            .find_by_id(&category_id)
            .await
            .map_err(|err| internal_error("category lookup failed", err))?;
        if category.is_none() {
            return Err(bad_request("Invalid category ID"));
        }
        product.category_id = category_id;
    }

    state
        .products
        .update(&product)
        .await
        .map_err(|err| internal_error("product update failed", err))?;

    Ok(Json(MessageBody { message: "Product updated successfully".to_string() }))
}

pub async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<MessageBody>, ApiError> {
    let product_id = ProductId(id);
    let product = state
        .products
        .find_by_id(&product_id)
        .await
        .map_err(|err| internal_error("product lookup failed", err))?;
    if product.is_none() {
        return Err(not_found("Product not found"));
    }

    state
        .products
        .delete(&product_id)
        .await
        .map_err(|err| internal_error("product delete failed", err))?;

    Ok(Json(MessageBody { message: "Product deleted successfully".to_string() }))
}

// ---------------------------------------------------------------------------
// Category handlers
// ---------------------------------------------------------------------------

pub async fn create_category(
    State(state): State<AppState>,
    Json(body): Json<CreateCategoryRequest>,
) -> Result<(StatusCode, Json<MessageBody>), ApiError> {
    state
        .categories
        .create(NewCategory { name: body.name, description: body.description })
        .await
        .map_err(|err| internal_error("category insert failed", err))?;

    Ok((
        StatusCode::CREATED,
        Json(MessageBody { message: "Category created successfully".to_string() }),
    ))
}

pub async fn list_categories(
    State(state): State<AppState>,
) -> Result<Json<Vec<Category>>, ApiError> {
    let categories =
        state.categories.list().await.map_err(|err| internal_error("category list failed", err))?;

    Ok(Json(categories))
}

// ---------------------------------------------------------------------------
// Purchase handlers
// ---------------------------------------------------------------------------

pub async fn create_purchase(
    State(state): State<AppState>,
    Json(body): Json<CreatePurchaseRequest>,
) -> Result<(StatusCode, Json<MessageBody>), ApiError> {
    let user = state
        .users
        .find_by_id(&UserId(body.user_id))
        .await
        .map_err(|err| internal_error("user lookup failed", err))?;
    if user.is_none() {
        return Err(bad_request("Invalid user ID"));
    }

    let product = state
        .products
        .find_by_id(&ProductId(body.product_id))
        .await
        .map_err(|err| internal_error("product lookup failed", err))?;
    if product.is_none() {
        return Err(bad_request("Invalid product ID"));
    }

    if body.quantity < 1 {
        return Err(bad_request("Quantity must be a positive integer"));
    }

    state
        .purchases
        .create(NewPurchase {
            user_id: UserId(body.user_id),
            product_id: ProductId(body.product_id),
            quantity: body.quantity,
            purchased_at: body.purchase_date.unwrap_or_else(Utc::now),
        })
        .await
        .map_err(|err| internal_error("purchase insert failed", err))?;

    Ok((
        StatusCode::CREATED,
        Json(MessageBody { message: "Purchase created successfully".to_string() }),
    ))
}

pub async fn list_purchases(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<Json<Vec<Purchase>>, ApiError> {
    let user = state
        .users
        .find_by_id(&UserId(user_id))
        .await
        .map_err(|err| internal_error("user lookup failed", err))?;
    if user.is_none() {
        return Err(not_found("User not found"));
    }

    let purchases = state
        .purchases
        .find_by_user(&UserId(user_id))
        .await
        .map_err(|err| internal_error("purchase list failed", err))?;

    Ok(Json(purchases))
}

// ---------------------------------------------------------------------------
// Cart handlers
// ---------------------------------------------------------------------------

pub async fn add_to_cart(
    State(state): State<AppState>,
    Json(body): Json<AddToCartRequest>,
) -> Result<(StatusCode, Json<MessageBody>), ApiError> {
    let user = state
        .users
        .find_by_id(&UserId(body.user_id))
        .await
        .map_err(|err| internal_error("user lookup failed", err))?;
    let product = state
        .products
        .find_by_id(&ProductId(body.product_id))
        .await
        .map_err(|err| internal_error("product lookup failed", err))?;
    if user.is_none() || product.is_none() {
        return Err(bad_request("Invalid user or product ID"));
    }

    if body.quantity < 1 {
        return Err(bad_request("Quantity must be a positive integer"));
    }

    let user_id = UserId(body.user_id);
    let cart = match state
        .carts
        .find_by_user(&user_id)
        .await
        .map_err(|err| internal_error("cart lookup failed", err))?
    {
        Some(cart) => cart,
        None => state
            .carts
            .create_for_user(&user_id)
            .await
            .map_err(|err| internal_error("cart insert failed", err))?,
    };

    state
        .carts
        .add_item(NewCartItem {
            cart_id: cart.id,
            product_id: ProductId(body.product_id),
            quantity: body.quantity,
        })
        .await
        .map_err(|err| internal_error("cart item insert failed", err))?;

    Ok((
        StatusCode::CREATED,
        Json(MessageBody { message: "Item added to cart successfully".to_string() }),
    ))
}

pub async fn get_cart(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<Json<CartResponse>, ApiError> {
    let user = state
        .users
        .find_by_id(&UserId(user_id))
        .await
        .map_err(|err| internal_error("user lookup failed", err))?;
    if user.is_none() {
        return Err(not_found("User not found"));
    }

    let cart = state
        .carts
        .find_by_user(&UserId(user_id))
        .await
        .map_err(|err| internal_error("cart lookup failed", err))?
        .ok_or_else(|| not_found("Cart not found"))?;

    let items = state
        .carts
        .list_items(&cart.id)
        .await
        .map_err(|err| internal_error("cart item list failed", err))?;

    Ok(Json(CartResponse { cart, items }))
}

pub async fn checkout(
    State(state): State<AppState>,
    Json(body): Json<CheckoutRequest>,
) -> Result<Json<MessageBody>, ApiError> {
    let user_id = UserId(body.user_id);
    let user = state
        .users
        .find_by_id(&user_id)
        .await
        .map_err(|err| internal_error("user lookup failed", err))?;
    if user.is_none() {
        return Err(bad_request("Invalid user ID"));
    }

    let cart = state
        .carts
        .find_by_user(&user_id)
        .await
        .map_err(|err| internal_error("cart lookup failed", err))?
        .ok_or_else(|| not_found("Cart not found"))?;

    let items = state
        .carts
        .list_items(&cart.id)
        .await
        .map_err(|err| internal_error("cart item list failed", err))?;

    let purchased_at = Utc::now();
    for item in items {
        state
            .purchases
            .create(NewPurchase {
                user_id,
                product_id: item.product_id,
                quantity: item.quantity,
                purchased_at,
            })
            .await
            .map_err(|err| internal_error("purchase insert failed", err))?;
    }

    state.carts.delete(&cart.id).await.map_err(|err| internal_error("cart delete failed", err))?;

    Ok(Json(MessageBody { message: "Checkout successful".to_string() }))
}
