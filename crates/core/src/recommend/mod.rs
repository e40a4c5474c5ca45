//! Purchase-frequency recommendation primitives.
//!
//! Pure functions over a user's purchase history: tally cumulative
//! quantities per product, then rank products by how much of them the user
//! has bought. No storage access happens here; resolving ranked ids back
//! to products is the caller's concern.

mod frequency;

pub use frequency::FrequencyMap;
