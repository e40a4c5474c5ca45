use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::category::CategoryId;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProductId(pub i64);

impl std::fmt::Display for ProductId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A catalog product. Holds a one-directional reference to its category;
/// the category side is resolved through the store, never held in memory.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub brand: String,
    pub size: Option<String>,
    pub color: Option<String>,
    pub category_id: CategoryId,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewProduct {
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub brand: String,
    pub size: Option<String>,
    pub color: Option<String>,
    pub category_id: CategoryId,
}
