//! Deterministic seed dataset for the catalog tables.

use sqlx::Executor;
use sqlx::Row;

use crate::connection::DbPool;
use crate::repositories::RepositoryError;

const SEED_USER_COUNT: i64 = 3;
const SEED_CATEGORY_COUNT: i64 = 3;
const SEED_PRODUCT_COUNT: i64 = 6;
const SEED_PURCHASE_COUNT: i64 = 5;

/// Fixed users, categories, products, purchases, and one open cart.
/// Expects empty catalog tables; ids are assigned explicitly so tests can
/// reference them.
pub struct CatalogSeedDataset;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SeedResult {
    pub users: i64,
    pub categories: i64,
    pub products: i64,
    pub purchases: i64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VerificationResult {
    pub consistent: bool,
    pub issues: Vec<String>,
}

impl CatalogSeedDataset {
    /// SQL fixture content for the catalog seed.
    pub const SQL: &str = include_str!("../../../config/fixtures/catalog_seed_data.sql");

    /// Load the seed dataset into the database.
    pub async fn load(pool: &DbPool) -> Result<SeedResult, RepositoryError> {
        let mut tx = pool.begin().await?;

        tx.execute(sqlx::query(Self::SQL)).await?;

        let users = count(&mut tx, "users").await?;
        let categories = count(&mut tx, "categories").await?;
        let products = count(&mut tx, "products").await?;
        let purchases = count(&mut tx, "purchases").await?;

        tx.commit().await?;

        Ok(SeedResult { users, categories, products, purchases })
    }

    /// Check the loaded dataset for referential consistency and the
    /// expected row counts.
    pub async fn verify(pool: &DbPool) -> Result<VerificationResult, RepositoryError> {
        let mut issues = Vec::new();

        let mut conn = pool.acquire().await?;

        let expectations = [
            ("users", SEED_USER_COUNT),
            ("categories", SEED_CATEGORY_COUNT),
            ("products", SEED_PRODUCT_COUNT),
            ("purchases", SEED_PURCHASE_COUNT),
        ];
        for (table, expected) in expectations {
            let actual = count(&mut conn, table).await?;
            if actual != expected {
                issues.push(format!("table `{table}` has {actual} rows, expected {expected}"));
            }
        }

        let orphan_products = sqlx::query(
            "SELECT COUNT(*) AS count FROM products p
             LEFT JOIN categories c ON c.id = p.category_id
             WHERE c.id IS NULL",
        )
        .fetch_one(&mut *conn)
        .await?
        .get::<i64, _>("count");
        if orphan_products > 0 {
            issues.push(format!("{orphan_products} products reference a missing category"));
        }

        let orphan_purchases = sqlx::query(
            "SELECT COUNT(*) AS count FROM purchases pu
             LEFT JOIN users u ON u.id = pu.user_id
             WHERE u.id IS NULL",
        )
        .fetch_one(&mut *conn)
        .await?
        .get::<i64, _>("count");
        if orphan_purchases > 0 {
            issues.push(format!("{orphan_purchases} purchases reference a missing user"));
        }

        Ok(VerificationResult { consistent: issues.is_empty(), issues })
    }
}

async fn count(conn: &mut sqlx::SqliteConnection, table: &str) -> Result<i64, RepositoryError> {
    let row = sqlx::query(&format!("SELECT COUNT(*) AS count FROM {table}"))
        .fetch_one(&mut *conn)
        .await?;
    Ok(row.get::<i64, _>("count"))
}
