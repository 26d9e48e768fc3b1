//! REST DTOs for the inventory module.

use serde::{Deserialize, Serialize};
use stockroom_http::ValidationViolation;
use utoipa::{IntoParams, ToSchema};

use crate::domain::model::{AnalyticsSnapshot, Item, ItemUpdate, NewItem, normalize_code};

/// One inventory item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ItemDto {
    /// Normalized (trimmed, uppercase) unique code.
    pub code: String,
    pub description: String,
    pub price: f64,
    pub quantity: u32,
}

impl From<Item> for ItemDto {
    fn from(item: Item) -> Self {
        Self {
            code: item.code,
            description: item.description,
            price: item.price,
            quantity: item.quantity,
        }
    }
}

/// Body of `POST /items` and `PUT /items/{code}`.
///
/// Every field is optional at the wire level so that missing fields are
/// reported together with other violations.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ItemInput {
    /// Required on create. On update it must match the path code if given.
    pub code: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    /// Whole number; defaults to 0.
    pub quantity: Option<f64>,
}

fn check_text(field: &str, value: Option<&str>, errors: &mut Vec<ValidationViolation>) {
    match value.map(str::trim) {
        None | Some("") => errors.push(ValidationViolation::new(field, "is required")),
        Some(text) if text.contains([',', '\n', '\r']) => errors.push(ValidationViolation::new(
            field,
            "must not contain commas or line breaks",
        )),
        Some(_) => {}
    }
}

fn check_price(value: Option<f64>, errors: &mut Vec<ValidationViolation>) -> f64 {
    match value {
        None => {
            errors.push(ValidationViolation::new("price", "is required"));
            0.0
        }
        Some(price) if !price.is_finite() || price < 0.0 => {
            errors.push(ValidationViolation::new(
                "price",
                "must be a non-negative number",
            ));
            0.0
        }
        Some(price) => price,
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)] // range checked above
fn check_quantity(value: Option<f64>, errors: &mut Vec<ValidationViolation>) -> u32 {
    match value {
        None => 0,
        Some(qty)
            if qty.is_finite() && qty >= 0.0 && qty.fract() == 0.0 && qty <= f64::from(u32::MAX) =>
        {
            qty as u32
        }
        Some(_) => {
            errors.push(ValidationViolation::new(
                "quantity",
                "must be a non-negative whole number",
            ));
            0
        }
    }
}

impl ItemInput {
    /// # Errors
    /// Returns every violated field.
    pub fn into_new_item(self) -> Result<NewItem, Vec<ValidationViolation>> {
        let mut errors = Vec::new();
        check_text("code", self.code.as_deref(), &mut errors);
        check_text("description", self.description.as_deref(), &mut errors);
        let price = check_price(self.price, &mut errors);
        let quantity = check_quantity(self.quantity, &mut errors);

        if !errors.is_empty() {
            return Err(errors);
        }
        Ok(NewItem {
            code: self.code.unwrap_or_default(),
            description: self.description.unwrap_or_default(),
            price,
            quantity,
        })
    }

    /// Validate as a full update of the item at `path_code`.
    ///
    /// # Errors
    /// Returns every violated field, including a body code that names a
    /// different item than the path.
    pub fn into_update(self, path_code: &str) -> Result<ItemUpdate, Vec<ValidationViolation>> {
        let mut errors = Vec::new();
        if let Some(body_code) = &self.code
            && normalize_code(body_code) != normalize_code(path_code)
        {
            errors.push(ValidationViolation::new(
                "code",
                "must match the code in the request path",
            ));
        }
        check_text("description", self.description.as_deref(), &mut errors);
        let price = check_price(self.price, &mut errors);
        let quantity = check_quantity(self.quantity, &mut errors);

        if !errors.is_empty() {
            return Err(errors);
        }
        Ok(ItemUpdate {
            code: path_code.to_owned(),
            description: self.description.unwrap_or_default(),
            price,
            quantity,
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SortField {
    #[default]
    Code,
    Description,
    Price,
    Quantity,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

/// Query parameters for `GET /items`.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListItemsQuery {
    /// Case-insensitive substring matched against code and description.
    pub q: Option<String>,
    /// Sort field. Default: `code`
    pub sort: Option<SortField>,
    /// Sort direction. Default: `asc`
    pub order: Option<SortOrder>,
}

impl ListItemsQuery {
    /// Filter and order `items` (given in code order).
    #[must_use]
    pub fn apply(&self, mut items: Vec<Item>) -> Vec<Item> {
        if let Some(needle) = self.q.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
            let needle = needle.to_lowercase();
            items.retain(|item| {
                item.code.to_lowercase().contains(&needle)
                    || item.description.to_lowercase().contains(&needle)
            });
        }

        match self.sort.unwrap_or_default() {
            SortField::Code => {}
            SortField::Description => items.sort_by(|a, b| {
                a.description
                    .to_lowercase()
                    .cmp(&b.description.to_lowercase())
            }),
            SortField::Price => items.sort_by(|a, b| a.price.total_cmp(&b.price)),
            SortField::Quantity => items.sort_by_key(|item| item.quantity),
        }
        if self.order.unwrap_or_default() == SortOrder::Desc {
            items.reverse();
        }
        items
    }
}

/// Aggregate statistics over the current inventory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsDto {
    pub total_items: usize,
    pub total_quantity: u64,
    /// Sum of price times quantity.
    pub total_value: f64,
    pub average_price: f64,
    pub median_price: f64,
    /// Highest minus lowest price.
    pub price_range: f64,
    /// Items priced strictly above the average.
    pub above_average_count: usize,
    /// Items priced strictly below the average.
    pub below_average_count: usize,
    pub lowest_priced_item: Option<ItemDto>,
    pub highest_priced_item: Option<ItemDto>,
}

impl From<AnalyticsSnapshot> for AnalyticsDto {
    fn from(s: AnalyticsSnapshot) -> Self {
        Self {
            total_items: s.total_items,
            total_quantity: s.total_quantity,
            total_value: s.total_value,
            average_price: s.average_price,
            median_price: s.median_price,
            price_range: s.price_range,
            above_average_count: s.above_average_count,
            below_average_count: s.below_average_count,
            lowest_priced_item: s.lowest_priced_item.map(Into::into),
            highest_priced_item: s.highest_priced_item.map(Into::into),
        }
    }
}

/// Multipart form accepted by `POST /import`.
#[derive(Debug, ToSchema)]
pub struct ImportForm {
    /// Inventory file in the export format.
    #[schema(value_type = String, format = Binary)]
    pub file: Vec<u8>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct InsightRequest {
    /// Free-text question about the inventory.
    pub prompt: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct InsightResponse {
    pub reply: String,
}
