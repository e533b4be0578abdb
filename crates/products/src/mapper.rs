//! Mapping between persisted products and their transfer representation.

use catalog_core::{DomainError, DomainResult};

use crate::dto::ProductDto;
use crate::product::{NewProduct, Product};

/// Product ⇄ transfer-object mapping.
pub trait ProductMapper: Send + Sync {
    fn to_transfer(&self, product: &Product) -> ProductDto;

    /// Full field copy into a new product. Any client-provided id is ignored.
    fn to_entity(&self, dto: ProductDto) -> DomainResult<NewProduct>;

    /// Validate the fields a partial update provides, without a target product.
    fn check_patch(&self, dto: &ProductDto) -> DomainResult<()>;

    /// Overwrite only the fields `dto` provides. On error `into` is untouched.
    fn merge_non_null(&self, dto: ProductDto, into: &mut Product) -> DomainResult<()>;
}

/// Field-by-field mapper used by the catalog service.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultProductMapper;

fn check_name(name: &str) -> DomainResult<()> {
    if name.trim().is_empty() {
        return Err(DomainError::validation("name must not be blank"));
    }
    Ok(())
}

fn check_price(price: f64) -> DomainResult<()> {
    if !price.is_finite() || price < 0.0 {
        return Err(DomainError::validation("price must be a finite number >= 0"));
    }
    Ok(())
}

impl ProductMapper for DefaultProductMapper {
    fn to_transfer(&self, product: &Product) -> ProductDto {
        ProductDto {
            id: Some(product.id),
            name: Some(product.name.clone()),
            description: product.description.clone(),
            category: product.category.clone(),
            price: Some(product.price),
            quantity: Some(product.quantity),
            image_url: product.image_url.clone(),
        }
    }

    fn to_entity(&self, dto: ProductDto) -> DomainResult<NewProduct> {
        let name = dto
            .name
            .ok_or_else(|| DomainError::validation("name is required"))?;
        check_name(&name)?;

        let price = dto
            .price
            .ok_or_else(|| DomainError::validation("price is required"))?;
        check_price(price)?;

        Ok(NewProduct {
            name,
            description: dto.description,
            category: dto.category,
            price,
            quantity: dto.quantity.unwrap_or(0),
            image_url: dto.image_url,
        })
    }

    fn check_patch(&self, dto: &ProductDto) -> DomainResult<()> {
        if let Some(name) = dto.name.as_deref() {
            check_name(name)?;
        }
        if let Some(price) = dto.price {
            check_price(price)?;
        }
        Ok(())
    }

    fn merge_non_null(&self, dto: ProductDto, into: &mut Product) -> DomainResult<()> {
        self.check_patch(&dto)?;

        if let Some(name) = dto.name {
            into.name = name;
        }
        if let Some(description) = dto.description {
            into.description = Some(description);
        }
        if let Some(category) = dto.category {
            into.category = Some(category);
        }
        if let Some(price) = dto.price {
            into.price = price;
        }
        if let Some(quantity) = dto.quantity {
            into.quantity = quantity;
        }
        if let Some(image_url) = dto.image_url {
            into.image_url = Some(image_url);
        }
        Ok(())
    }
}
