//! Filter criteria and the predicate builder.

use serde::{Deserialize, Serialize};

use catalog_core::{DomainError, DomainResult};

use crate::predicate::{Clause, Predicate, TextField};

/// A partially-specified product filter. Every field is optional.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterCriteria {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub min_quantity: Option<i64>,
    pub max_quantity: Option<i64>,
}

impl FilterCriteria {
    pub fn by_name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn by_description(description: impl Into<String>) -> Self {
        Self {
            description: Some(description.into()),
            ..Self::default()
        }
    }

    pub fn by_category(category: impl Into<String>) -> Self {
        Self {
            category: Some(category.into()),
            ..Self::default()
        }
    }

    pub fn by_price_between(min: f64, max: f64) -> Self {
        Self {
            min_price: Some(min),
            max_price: Some(max),
            ..Self::default()
        }
    }

    /// Check range consistency. Must pass before [`build_predicate`] runs.
    ///
    /// Inconsistent pairs are rejected, never swapped or clamped.
    pub fn validate(&self) -> DomainResult<()> {
        for (label, bound) in [("minPrice", self.min_price), ("maxPrice", self.max_price)] {
            if let Some(v) = bound {
                if !v.is_finite() {
                    return Err(DomainError::validation(format!("{label} must be a finite number")));
                }
                if v < 0.0 {
                    return Err(DomainError::validation(format!("{label} must be >= 0")));
                }
            }
        }

        for (label, bound) in [("minQuantity", self.min_quantity), ("maxQuantity", self.max_quantity)] {
            if bound.is_some_and(|v| v < 0) {
                return Err(DomainError::validation(format!("{label} must be >= 0")));
            }
        }

        if let (Some(min), Some(max)) = (self.min_price, self.max_price) {
            if min > max {
                return Err(DomainError::validation("minPrice must be <= maxPrice"));
            }
        }

        if let (Some(min), Some(max)) = (self.min_quantity, self.max_quantity) {
            if min > max {
                return Err(DomainError::validation("minQuantity must be <= maxQuantity"));
            }
        }

        Ok(())
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.trim().is_empty())
}

/// Compose a single predicate from `criteria`.
///
/// Absent or blank text fields add no clause. Clauses are emitted in a fixed
/// field order (name, description, category, price bounds, quantity bounds).
pub fn build_predicate(criteria: &FilterCriteria) -> Predicate {
    let mut predicate = Predicate::always();

    if let Some(name) = non_blank(&criteria.name) {
        predicate = predicate.and_clause(Clause::contains(TextField::Name, name));
    }
    if let Some(description) = non_blank(&criteria.description) {
        predicate = predicate.and_clause(Clause::contains(TextField::Description, description));
    }
    if let Some(category) = non_blank(&criteria.category) {
        predicate = predicate.and_clause(Clause::equals_ignore_case(TextField::Category, category));
    }
    if let Some(min) = criteria.min_price {
        predicate = predicate.and_clause(Clause::PriceAtLeast(min));
    }
    if let Some(max) = criteria.max_price {
        predicate = predicate.and_clause(Clause::PriceAtMost(max));
    }
    if let Some(min) = criteria.min_quantity {
        predicate = predicate.and_clause(Clause::QuantityAtLeast(min));
    }
    if let Some(max) = criteria.max_quantity {
        predicate = predicate.and_clause(Clause::QuantityAtMost(max));
    }

    predicate
}
