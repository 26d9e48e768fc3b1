//! Price distribution summary over the stored collection.

use super::model::{AnalyticsSnapshot, Item};

/// Summarize `items` (expected in code order).
///
/// Lowest/highest ties resolve to the first item seen. Above/below counts are
/// strict comparisons with the mean.
#[must_use]
#[allow(clippy::cast_precision_loss)] // counts are bounded by the store capacity
pub fn compute(items: &[Item]) -> AnalyticsSnapshot {
    let Some(first) = items.first() else {
        return AnalyticsSnapshot::default();
    };

    let mut price_sum = 0.0;
    let mut total_value = 0.0;
    let mut total_quantity: u64 = 0;
    let mut lowest = first;
    let mut highest = first;

    for item in items {
        price_sum += item.price;
        total_value += item.value();
        total_quantity += u64::from(item.quantity);
        if item.price < lowest.price {
            lowest = item;
        }
        if item.price > highest.price {
            highest = item;
        }
    }

    let count = items.len();
    let average_price = price_sum / count as f64;

    let mut prices: Vec<f64> = items.iter().map(|item| item.price).collect();
    prices.sort_by(f64::total_cmp);
    let mid = count / 2;
    let median_price = if count % 2 == 0 {
        (prices[mid - 1] + prices[mid]) / 2.0
    } else {
        prices[mid]
    };
    let price_range = prices[count - 1] - prices[0];

    let above_average_count = items.iter().filter(|i| i.price > average_price).count();
    let below_average_count = items.iter().filter(|i| i.price < average_price).count();

    AnalyticsSnapshot {
        total_items: count,
        total_quantity,
        total_value,
        average_price,
        median_price,
        price_range,
        above_average_count,
        below_average_count,
        lowest_priced_item: Some(lowest.clone()),
        highest_priced_item: Some(highest.clone()),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;

    fn priced(code: &str, price: f64, quantity: u32) -> Item {
        Item {
            code: code.to_owned(),
            description: format!("item {code}"),
            price,
            quantity,
        }
    }

    #[test]
    fn empty_collection_is_all_zeros() {
        let snapshot = compute(&[]);
        assert_eq!(snapshot, AnalyticsSnapshot::default());
        assert!(snapshot.lowest_priced_item.is_none());
        assert!(snapshot.highest_priced_item.is_none());
    }

    #[test]
    fn odd_count_statistics() {
        let items = [priced("A", 10.0, 1), priced("B", 20.0, 2), priced("C", 30.0, 3)];
        let snapshot = compute(&items);
        assert_eq!(snapshot.total_items, 3);
        assert_eq!(snapshot.total_quantity, 6);
        assert_eq!(snapshot.total_value, 140.0);
        assert_eq!(snapshot.average_price, 20.0);
        assert_eq!(snapshot.median_price, 20.0);
        assert_eq!(snapshot.price_range, 20.0);
        assert_eq!(snapshot.above_average_count, 1);
        assert_eq!(snapshot.below_average_count, 1);
        assert_eq!(snapshot.lowest_priced_item.unwrap().code, "A");
        assert_eq!(snapshot.highest_priced_item.unwrap().code, "C");
    }

    #[test]
    fn even_count_median_averages_middle_pair() {
        let snapshot = compute(&[priced("A", 10.0, 0), priced("B", 20.0, 0)]);
        assert_eq!(snapshot.median_price, 15.0);
        assert_eq!(snapshot.price_range, 10.0);
        assert_eq!(snapshot.total_value, 0.0);
    }

    #[test]
    fn median_uses_sorted_prices_not_code_order() {
        let items = [priced("A", 30.0, 1), priced("B", 10.0, 1), priced("C", 20.0, 1)];
        assert_eq!(compute(&items).median_price, 20.0);
    }

    #[test]
    fn ties_resolve_to_first_seen() {
        let items = [
            priced("A", 5.0, 1),
            priced("B", 5.0, 1),
            priced("C", 9.0, 1),
            priced("D", 9.0, 1),
        ];
        let snapshot = compute(&items);
        assert_eq!(snapshot.lowest_priced_item.unwrap().code, "A");
        assert_eq!(snapshot.highest_priced_item.unwrap().code, "C");
    }

    #[test]
    fn equal_prices_are_neither_above_nor_below() {
        let items = [priced("A", 4.0, 1), priced("B", 4.0, 1)];
        let snapshot = compute(&items);
        assert_eq!(snapshot.above_average_count, 0);
        assert_eq!(snapshot.below_average_count, 0);
        assert_eq!(snapshot.price_range, 0.0);
    }
}
