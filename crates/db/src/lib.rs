pub mod cache;
pub mod connection;
pub mod fixtures;
pub mod migrations;
pub mod repositories;

pub use cache::{CacheError, InMemoryRecommendationCache, RecommendationCache};
pub use connection::{connect, connect_with_settings, DbPool};
pub use fixtures::{CatalogSeedDataset, SeedResult, VerificationResult};
