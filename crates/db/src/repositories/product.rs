use rust_decimal::Decimal;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use storefront_core::domain::category::CategoryId;
use storefront_core::domain::product::{NewProduct, Product, ProductId};

use super::{ProductRepository, RepositoryError};
use crate::DbPool;

pub struct SqlProductRepository {
    pool: DbPool,
}

impl SqlProductRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

const PRODUCT_COLUMNS: &str = "id, name, description, price, brand, size, color, category_id";

fn product_from_row(row: &SqliteRow) -> Result<Product, RepositoryError> {
    let id: i64 = row.try_get("id")?;
    let price_raw: String = row.try_get("price")?;
    let price = Decimal::from_str_exact(price_raw.trim()).map_err(|err| {
        RepositoryError::Decode(format!("invalid price `{price_raw}` for product {id}: {err}"))
    })?;

    Ok(Product {
        id: ProductId(id),
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        price,
        brand: row.try_get("brand")?,
        size: row.try_get("size")?,
        color: row.try_get("color")?,
        category_id: CategoryId(row.try_get("category_id")?),
    })
}

#[async_trait::async_trait]
impl ProductRepository for SqlProductRepository {
    async fn find_by_id(&self, id: &ProductId) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query(&format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?"))
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(product_from_row).transpose()
    }

    async fn list(&self) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query(&format!("SELECT {PRODUCT_COLUMNS} FROM products ORDER BY id"))
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(product_from_row).collect()
    }

    async fn list_by_category(&self, id: &CategoryId) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE category_id = ? ORDER BY id"
        ))
        .bind(id.0)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(product_from_row).collect()
    }

    async fn create(&self, product: NewProduct) -> Result<Product, RepositoryError> {
        let result = sqlx::query(
            "INSERT INTO products (name, description, price, brand, size, color, category_id)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price.to_string())
        .bind(&product.brand)
        .bind(&product.size)
        .bind(&product.color)
        .bind(product.category_id.0)
        .execute(&self.pool)
        .await?;

        Ok(Product {
            id: ProductId(result.last_insert_rowid()),
            name: product.name,
            description: product.description,
            price: product.price,
            brand: product.brand,
            size: product.size,
            color: product.color,
            category_id: product.category_id,
        })
    }

    async fn update(&self, product: &Product) -> Result<(), RepositoryError> {
        sqlx::query(
            "UPDATE products
             SET name = ?, description = ?, price = ?, brand = ?, size = ?, color = ?,
                 category_id = ?
             WHERE id = ?",
        )
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price.to_string())
        .bind(&product.brand)
        .bind(&product.size)
        .bind(&product.color)
        .bind(product.category_id.0)
        .bind(product.id.0)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delete(&self, id: &ProductId) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM products WHERE id = ?").bind(id.0).execute(&self.pool).await?;

        Ok(())
    }
}
