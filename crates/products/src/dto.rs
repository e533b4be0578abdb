use serde::{Deserialize, Serialize};

use crate::product::ProductId;

/// Transfer representation of a product.
///
/// Every field is optional so the same shape serves create, full update and
/// partial update payloads. `None` means "not provided".
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDto {
    pub id: Option<ProductId>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub price: Option<f64>,
    pub quantity: Option<i64>,
    pub image_url: Option<String>,
}
