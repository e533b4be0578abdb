//! Products domain module.
//!
//! This crate contains the catalog's entity model, the filter criteria and the
//! predicate builder, plus the transfer-object mapping. Pure domain logic: no IO,
//! no HTTP, no storage.

pub mod criteria;
pub mod dto;
pub mod mapper;
pub mod predicate;
pub mod product;

pub use criteria::{FilterCriteria, build_predicate};
pub use dto::ProductDto;
pub use mapper::{DefaultProductMapper, ProductMapper};
pub use predicate::{Clause, Predicate, TextField};
pub use product::{NewProduct, Product, ProductId};
