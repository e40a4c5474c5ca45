use std::collections::HashMap;

use crate::domain::product::ProductId;
use crate::domain::purchase::Purchase;

/// Cumulative purchased quantity per product, scoped to one user's history.
///
/// Remembers the order in which products were first seen so that ranking
/// can break quantity ties deterministically. Quantities are accumulated
/// exactly as stored; validation belongs to the purchase write path.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FrequencyMap {
    // (product, total) in first-occurrence order; index maps id -> position.
    entries: Vec<(ProductId, i64)>,
    index: HashMap<ProductId, usize>,
}

impl FrequencyMap {
    /// Tally a purchase history. Order of the input does not matter for the
    /// totals, but it fixes the first-occurrence order used for tie-breaks.
    pub fn from_purchases(purchases: &[Purchase]) -> Self {
        let mut map = Self::default();
        for purchase in purchases {
            map.add(purchase.product_id, purchase.quantity);
        }
        map
    }

    fn add(&mut self, product_id: ProductId, quantity: i64) {
        match self.index.get(&product_id) {
            Some(&position) => self.entries[position].1 += quantity,
            None => {
                self.index.insert(product_id, self.entries.len());
                self.entries.push((product_id, quantity));
            }
        }
    }

    /// Product ids in descending order of cumulative quantity.
    ///
    /// Equal totals keep their first-occurrence order; the sort must stay
    /// stable for ranked output to be reproducible across runs.
    pub fn ranked_product_ids(&self) -> Vec<ProductId> {
        let mut ranked = self.entries.clone();
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        ranked.into_iter().map(|(product_id, _)| product_id).collect()
    }

    /// Cumulative quantity for a product, if it occurs in the history.
    pub fn quantity(&self, product_id: &ProductId) -> Option<i64> {
        self.index.get(product_id).map(|&position| self.entries[position].1)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use crate::domain::product::ProductId;
    use crate::domain::purchase::{Purchase, PurchaseId};
    use crate::domain::user::UserId;

    use super::FrequencyMap;

    fn purchase(id: i64, product: i64, quantity: i64) -> Purchase {
        Purchase {
            id: PurchaseId(id),
            user_id: UserId(1),
            product_id: ProductId(product),
            quantity,
            purchased_at: Utc::now(),
        }
    }

    #[test]
    fn empty_history_yields_empty_map() {
        let map = FrequencyMap::from_purchases(&[]);

        assert!(map.is_empty());
        assert_eq!(map.ranked_product_ids(), Vec::<ProductId>::new());
    }

    #[test]
    fn quantities_accumulate_per_product() {
        let map = FrequencyMap::from_purchases(&[
            purchase(1, 1, 2),
            purchase(2, 2, 5),
            purchase(3, 1, 1),
        ]);

        assert_eq!(map.len(), 2);
        assert_eq!(map.quantity(&ProductId(1)), Some(3));
        assert_eq!(map.quantity(&ProductId(2)), Some(5));
        assert_eq!(map.quantity(&ProductId(9)), None);
    }

    #[test]
    fn ranking_is_descending_by_total_quantity() {
        let map = FrequencyMap::from_purchases(&[
            purchase(1, 1, 2),
            purchase(2, 2, 5),
            purchase(3, 1, 1),
        ]);

        assert_eq!(map.ranked_product_ids(), vec![ProductId(2), ProductId(1)]);
    }

    #[test]
    fn equal_totals_keep_first_occurrence_order() {
        let map = FrequencyMap::from_purchases(&[purchase(1, 3, 2), purchase(2, 7, 2)]);

        assert_eq!(map.ranked_product_ids(), vec![ProductId(3), ProductId(7)]);
    }

    #[test]
    fn tie_break_survives_interleaved_purchases() {
        // 5 first reaches total 3, then 8 and 2 tie with it; first-seen
        // order among the tied products is 5, 8, 2.
        let map = FrequencyMap::from_purchases(&[
            purchase(1, 5, 1),
            purchase(2, 8, 3),
            purchase(3, 2, 3),
            purchase(4, 5, 2),
        ]);

        assert_eq!(
            map.ranked_product_ids(),
            vec![ProductId(5), ProductId(8), ProductId(2)]
        );
    }

    #[test]
    fn key_set_matches_history_products_exactly() {
        let map = FrequencyMap::from_purchases(&[purchase(1, 4, 1)]);

        assert_eq!(map.len(), 1);
        assert_eq!(map.quantity(&ProductId(4)), Some(1));
        // No zero entries are synthesized for products never purchased.
        assert_eq!(map.quantity(&ProductId(5)), None);
    }
}
