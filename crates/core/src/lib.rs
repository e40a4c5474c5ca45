pub mod config;
pub mod domain;
pub mod recommend;

pub use domain::cart::{Cart, CartId, CartItem, CartItemId};
pub use domain::category::{Category, CategoryId};
pub use domain::product::{Product, ProductId};
pub use domain::purchase::{Purchase, PurchaseId};
pub use domain::user::{User, UserId};
pub use recommend::FrequencyMap;
