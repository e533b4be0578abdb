use serde::Deserialize;

use catalog_core::{DomainResult, PageRequest, Sort};
use catalog_products::FilterCriteria;

// -------------------------
// Query DTOs
// -------------------------

/// `GET /api/products/search` query string.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchParams {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub min_quantity: Option<i64>,
    pub max_quantity: Option<i64>,
    pub page: Option<u32>,
    pub size: Option<u32>,
    /// `field[,asc|desc]`, e.g. `price,desc`.
    pub sort: Option<String>,
}

impl SearchParams {
    pub fn criteria(&self) -> FilterCriteria {
        FilterCriteria {
            name: self.name.clone(),
            description: self.description.clone(),
            category: self.category.clone(),
            min_price: self.min_price,
            max_price: self.max_price,
            min_quantity: self.min_quantity,
            max_quantity: self.max_quantity,
        }
    }

    pub fn page_request(&self, max_page_size: u32) -> DomainResult<PageRequest> {
        let request = PageRequest::new(self.page, self.size, max_page_size);
        match self.sort.as_deref().filter(|s| !s.trim().is_empty()) {
            Some(raw) => Ok(request.with_sort(raw.parse::<Sort>()?)),
            None => Ok(request),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct NameQuery {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct DescriptionQuery {
    pub description: String,
}

#[derive(Debug, Deserialize)]
pub struct CategoryQuery {
    pub category: String,
}

#[derive(Debug, Deserialize)]
pub struct PriceRangeQuery {
    pub min: f64,
    pub max: f64,
}
