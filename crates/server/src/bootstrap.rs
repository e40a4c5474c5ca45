use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use storefront_core::config::{AppConfig, ConfigError, LoadOptions};
use storefront_db::cache::InMemoryRecommendationCache;
use storefront_db::repositories::{
    SqlCartRepository, SqlCategoryRepository, SqlProductRepository, SqlPurchaseRepository,
    SqlUserRepository,
};
use storefront_db::{connect_with_settings, migrations, DbPool};

use crate::api::AppState;

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
    pub state: AppState,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(event_name = "system.bootstrap.start", "starting application bootstrap");

    let db_pool = connect_with_settings(
        &config.database.url,
        config.database.max_connections,
        config.database.timeout_secs,
    )
    .await
    .map_err(BootstrapError::DatabaseConnect)?;
    info!(event_name = "system.bootstrap.database_connected", "database connection established");

    migrations::run_pending(&db_pool).await.map_err(BootstrapError::Migration)?;
    info!(event_name = "system.bootstrap.migrations_applied", "database migrations applied");

    let state = AppState::new(
        Arc::new(SqlUserRepository::new(db_pool.clone())),
        Arc::new(SqlCategoryRepository::new(db_pool.clone())),
        Arc::new(SqlProductRepository::new(db_pool.clone())),
        Arc::new(SqlPurchaseRepository::new(db_pool.clone())),
        Arc::new(SqlCartRepository::new(db_pool.clone())),
        Arc::new(InMemoryRecommendationCache::from_ttl_secs(config.cache.ttl_secs)),
    );

    Ok(Application { config, db_pool, state })
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::Value;
    use tower::util::ServiceExt;

    use storefront_core::config::AppConfig;
    use storefront_db::CatalogSeedDataset;

    use crate::api::router;
    use crate::bootstrap::bootstrap_with_config;

    fn memory_config() -> AppConfig {
        let mut config = AppConfig::default();
        config.database.url = "sqlite::memory:".to_string();
        config.database.max_connections = 1;
        config
    }

    async fn get_json(
        app: &crate::bootstrap::Application,
        path: &str,
    ) -> (StatusCode, Value) {
        let response = router(app.state.clone())
            .oneshot(Request::builder().uri(path).body(Body::empty()).expect("build request"))
            .await
            .expect("send request");

        let status = response.status();
        let bytes =
            axum::body::to_bytes(response.into_body(), usize::MAX).await.expect("read body");
        (status, serde_json::from_slice(&bytes).expect("parse body"))
    }

    #[tokio::test]
    async fn bootstrap_applies_migrations() {
        let app = bootstrap_with_config(memory_config()).await.expect("bootstrap");

        let (table_count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM sqlite_master
             WHERE type = 'table'
               AND name IN ('users', 'categories', 'products', 'purchases', 'carts', 'cart_items')",
        )
        .fetch_one(&app.db_pool)
        .await
        .expect("expected catalog tables to be available after bootstrap");
        assert_eq!(table_count, 6, "bootstrap should expose all catalog tables");

        app.db_pool.close().await;
    }

    #[tokio::test]
    async fn seeded_database_serves_recommendations_end_to_end() {
        let app = bootstrap_with_config(memory_config()).await.expect("bootstrap");
        CatalogSeedDataset::load(&app.db_pool).await.expect("load seed");

        // Seeded user 1 bought product 2 (qty 5) and product 1 (qty 3).
        let (status, body) = get_json(&app, "/api/recommendations/1").await;
        assert_eq!(status, StatusCode::OK);
        let names: Vec<&str> =
            body.as_array().expect("array").iter().map(|p| p["name"].as_str().unwrap()).collect();
        assert_eq!(names, vec!["Floor Lamp", "Desk Lamp"]);

        // Seeded user 3 has no history.
        let (status, body) = get_json(&app, "/api/recommendations/3").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.as_array().expect("array").is_empty());

        // Product detail lists its whole category, itself included.
        let (status, body) = get_json(&app, "/api/products/1").await;
        assert_eq!(status, StatusCode::OK);
        let recommended: Vec<&str> = body["recommendations"]
            .as_array()
            .expect("array")
            .iter()
            .map(|p| p["name"].as_str().unwrap())
            .collect();
        assert_eq!(recommended, vec!["Desk Lamp", "Floor Lamp"]);

        app.db_pool.close().await;
    }
}
