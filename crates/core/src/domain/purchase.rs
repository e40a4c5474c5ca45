use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::product::ProductId;
use super::user::UserId;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PurchaseId(pub i64);

impl std::fmt::Display for PurchaseId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One checkout line: a user bought `quantity` units of a product.
/// Written once at checkout time and immutable afterwards. Quantity
/// positivity is enforced at the write path; readers take it as stored.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Purchase {
    pub id: PurchaseId,
    pub user_id: UserId,
    pub product_id: ProductId,
    pub quantity: i64,
    pub purchased_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewPurchase {
    pub user_id: UserId,
    pub product_id: ProductId,
    pub quantity: i64,
    pub purchased_at: DateTime<Utc>,
}
