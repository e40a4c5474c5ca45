use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use storefront_core::domain::cart::{Cart, CartId, CartItem, CartItemId, NewCartItem};
use storefront_core::domain::product::ProductId;
use storefront_core::domain::user::UserId;

use super::{CartRepository, RepositoryError};
use crate::DbPool;

pub struct SqlCartRepository {
    pool: DbPool,
}

impl SqlCartRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn cart_from_row(row: &SqliteRow) -> Result<Cart, RepositoryError> {
    Ok(Cart { id: CartId(row.try_get("id")?), user_id: UserId(row.try_get("user_id")?) })
}

fn cart_item_from_row(row: &SqliteRow) -> Result<CartItem, RepositoryError> {
    Ok(CartItem {
        id: CartItemId(row.try_get("id")?),
        cart_id: CartId(row.try_get("cart_id")?),
        product_id: ProductId(row.try_get("product_id")?),
        quantity: row.try_get("quantity")?,
    })
}

#[async_trait::async_trait]
impl CartRepository for SqlCartRepository {
    async fn find_by_user(&self, id: &UserId) -> Result<Option<Cart>, RepositoryError> {
        let row = sqlx::query("SELECT id, user_id FROM carts WHERE user_id = ?")
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(cart_from_row).transpose()
    }

    async fn create_for_user(&self, id: &UserId) -> Result<Cart, RepositoryError> {
        let result =
            sqlx::query("INSERT INTO carts (user_id) VALUES (?)").bind(id.0).execute(&self.pool).await?;

        Ok(Cart { id: CartId(result.last_insert_rowid()), user_id: *id })
    }

    async fn add_item(&self, item: NewCartItem) -> Result<CartItem, RepositoryError> {
        let result =
            sqlx::query("INSERT INTO cart_items (cart_id, product_id, quantity) VALUES (?, ?, ?)")
                .bind(item.cart_id.0)
                .bind(item.product_id.0)
                .bind(item.quantity)
                .execute(&self.pool)
                .await?;

        Ok(CartItem {
            id: CartItemId(result.last_insert_rowid()),
            cart_id: item.cart_id,
            product_id: item.product_id,
            quantity: item.quantity,
        })
    }

    async fn list_items(&self, id: &CartId) -> Result<Vec<CartItem>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT id, cart_id, product_id, quantity FROM cart_items
             WHERE cart_id = ? ORDER BY id",
        )
        .bind(id.0)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(cart_item_from_row).collect()
    }

    async fn delete(&self, id: &CartId) -> Result<(), RepositoryError> {
        // cart_items cascade on the cart foreign key.
        sqlx::query("DELETE FROM carts WHERE id = ?").bind(id.0).execute(&self.pool).await?;

        Ok(())
    }
}
