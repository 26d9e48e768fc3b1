//! Inventory domain models.

/// Normalize an item code to its key form: surrounding whitespace trimmed, uppercased.
#[must_use]
pub fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}

/// Round a price to the two decimals the backing file keeps.
#[must_use]
pub fn round_price(price: f64) -> f64 {
    let rounded = (price * 100.0).round() / 100.0;
    if rounded.is_finite() { rounded } else { price }
}

/// One stock-keeping record. `code` is always normalized.
#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    pub code: String,
    pub description: String,
    pub price: f64,
    pub quantity: u32,
}

impl Item {
    /// Stock value of this record (`price * quantity`).
    #[must_use]
    pub fn value(&self) -> f64 {
        self.price * f64::from(self.quantity)
    }
}

/// Input for creating an item. The store normalizes `code` and trims `description`.
#[derive(Debug, Clone, PartialEq)]
pub struct NewItem {
    pub code: String,
    pub description: String,
    pub price: f64,
    pub quantity: u32,
}

impl NewItem {
    pub(crate) fn into_item(self) -> Item {
        Item {
            code: normalize_code(&self.code),
            description: self.description.trim().to_owned(),
            price: round_price(self.price),
            quantity: self.quantity,
        }
    }
}

/// Full replacement of the mutable fields of the item identified by `code`.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemUpdate {
    pub code: String,
    pub description: String,
    pub price: f64,
    pub quantity: u32,
}

/// Derived summary of the current collection. Recomputed on every request.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AnalyticsSnapshot {
    pub total_items: usize,
    pub total_quantity: u64,
    pub total_value: f64,
    pub average_price: f64,
    pub median_price: f64,
    pub price_range: f64,
    pub above_average_count: usize,
    pub below_average_count: usize,
    pub lowest_priced_item: Option<Item>,
    pub highest_priced_item: Option<Item>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_trims_and_uppercases() {
        assert_eq!(normalize_code("  ab1 "), "AB1");
        assert_eq!(normalize_code("AB1"), "AB1");
        assert_eq!(normalize_code("\tx-9\n"), "X-9");
    }

    #[test]
    fn prices_round_to_cents() {
        assert_eq!(round_price(2.004).to_bits(), 2.0_f64.to_bits());
        assert_eq!(round_price(0.125).to_bits(), 0.13_f64.to_bits());
        assert_eq!(round_price(12.5).to_bits(), 12.5_f64.to_bits());
        assert_eq!(round_price(f64::MAX).to_bits(), f64::MAX.to_bits());
    }

    #[test]
    fn new_item_is_normalized() {
        let item = NewItem {
            code: " bolt7 ".to_owned(),
            description: "  Hex bolt ".to_owned(),
            price: 0.25,
            quantity: 400,
        }
        .into_item();
        assert_eq!(item.code, "BOLT7");
        assert_eq!(item.description, "Hex bolt");
        assert!((item.value() - 100.0).abs() < f64::EPSILON);
    }
}
