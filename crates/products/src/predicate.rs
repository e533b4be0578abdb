//! Composable query predicate over products.
//!
//! A [`Predicate`] is a conjunction of [`Clause`]s. It is opaque to callers that
//! only build and combine it, and inspectable by stores that need to translate it
//! into their own query language (SQL backends walk [`Predicate::clauses`]; the
//! in-memory store calls [`Predicate::matches`]).

use crate::product::Product;

/// Text column a clause applies to.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum TextField {
    Name,
    Description,
    Category,
}

impl TextField {
    /// Column name in relational backends.
    pub fn column(&self) -> &'static str {
        match self {
            TextField::Name => "name",
            TextField::Description => "description",
            TextField::Category => "category",
        }
    }

    fn value<'a>(&self, product: &'a Product) -> Option<&'a str> {
        match self {
            TextField::Name => Some(product.name.as_str()),
            TextField::Description => product.description.as_deref(),
            TextField::Category => product.category.as_deref(),
        }
    }
}

/// A single filter condition. Text operands are stored lowercased.
#[derive(Debug, Clone, PartialEq)]
pub enum Clause {
    /// Case-insensitive substring match.
    Contains { field: TextField, needle: String },
    /// Case-insensitive exact match.
    EqualsIgnoreCase { field: TextField, value: String },
    PriceAtLeast(f64),
    PriceAtMost(f64),
    QuantityAtLeast(i64),
    QuantityAtMost(i64),
}

impl Clause {
    pub fn contains(field: TextField, needle: &str) -> Self {
        Clause::Contains {
            field,
            needle: needle.to_lowercase(),
        }
    }

    pub fn equals_ignore_case(field: TextField, value: &str) -> Self {
        Clause::EqualsIgnoreCase {
            field,
            value: value.to_lowercase(),
        }
    }

    pub fn matches(&self, product: &Product) -> bool {
        match self {
            Clause::Contains { field, needle } => field
                .value(product)
                .is_some_and(|v| v.to_lowercase().contains(needle.as_str())),
            Clause::EqualsIgnoreCase { field, value } => field
                .value(product)
                .is_some_and(|v| v.to_lowercase() == *value),
            Clause::PriceAtLeast(min) => product.price >= *min,
            Clause::PriceAtMost(max) => product.price <= *max,
            Clause::QuantityAtLeast(min) => product.quantity >= *min,
            Clause::QuantityAtMost(max) => product.quantity <= *max,
        }
    }
}

/// Conjunction of clauses. The empty conjunction matches every product.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Predicate {
    clauses: Vec<Clause>,
}

impl Predicate {
    /// Predicate matching every row.
    pub fn always() -> Self {
        Self::default()
    }

    pub fn from_clause(clause: Clause) -> Self {
        Self {
            clauses: vec![clause],
        }
    }

    /// Logical AND. Clauses keep insertion order so translation is reproducible.
    pub fn and(mut self, other: Predicate) -> Self {
        self.clauses.extend(other.clauses);
        self
    }

    pub fn and_clause(mut self, clause: Clause) -> Self {
        self.clauses.push(clause);
        self
    }

    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    pub fn is_always(&self) -> bool {
        self.clauses.is_empty()
    }

    pub fn matches(&self, product: &Product) -> bool {
        self.clauses.iter().all(|c| c.matches(product))
    }
}
