use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use storefront_core::domain::product::ProductId;
use storefront_core::domain::purchase::{NewPurchase, Purchase, PurchaseId};
use storefront_core::domain::user::UserId;

use super::{PurchaseRepository, RepositoryError};
use crate::DbPool;

pub struct SqlPurchaseRepository {
    pool: DbPool,
}

impl SqlPurchaseRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn purchase_from_row(row: &SqliteRow) -> Result<Purchase, RepositoryError> {
    Ok(Purchase {
        id: PurchaseId(row.try_get("id")?),
        user_id: UserId(row.try_get("user_id")?),
        product_id: ProductId(row.try_get("product_id")?),
        quantity: row.try_get("quantity")?,
        purchased_at: row.try_get::<DateTime<Utc>, _>("purchased_at")?,
    })
}

#[async_trait::async_trait]
impl PurchaseRepository for SqlPurchaseRepository {
    async fn find_by_user(&self, id: &UserId) -> Result<Vec<Purchase>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT id, user_id, product_id, quantity, purchased_at
             FROM purchases WHERE user_id = ? ORDER BY id",
        )
        .bind(id.0)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(purchase_from_row).collect()
    }

    async fn create(&self, purchase: NewPurchase) -> Result<Purchase, RepositoryError> {
        let result = sqlx::query(
            "INSERT INTO purchases (user_id, product_id, quantity, purchased_at)
             VALUES (?, ?, ?, ?)",
        )
        .bind(purchase.user_id.0)
        .bind(purchase.product_id.0)
        .bind(purchase.quantity)
        .bind(purchase.purchased_at)
        .execute(&self.pool)
        .await?;

        Ok(Purchase {
            id: PurchaseId(result.last_insert_rowid()),
            user_id: purchase.user_id,
            product_id: purchase.product_id,
            quantity: purchase.quantity,
            purchased_at: purchase.purchased_at,
        })
    }
}
