//! Postgres-backed product store.
//!
//! ## Error Mapping
//!
//! | SQLx Error | StoreError |
//! |------------|------------|
//! | PoolTimedOut | `Timeout` |
//! | Database / Io / Tls / PoolClosed / other | `Backend` |
//!
//! Missing rows on `update`/`delete` are reported as `NotFound`, never as a SQLx
//! error.
//!
//! ## Predicate Translation
//!
//! Each predicate clause becomes one `AND` term. Text clauses compare against
//! `lower(column)`; substring needles are wrapped in `%...%` with LIKE wildcards
//! escaped, so user input never acts as a pattern.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use tracing::instrument;

use catalog_core::{Page, PageRequest, Sort, SortDirection, SortField};
use catalog_products::{Clause, NewProduct, Predicate, Product, ProductId};

use super::r#trait::{ProductStore, StoreError};

const SELECT_COLUMNS: &str = "SELECT id, name, description, category, price, quantity, image_url FROM products";

#[derive(Debug, FromRow)]
struct ProductRow {
    id: i64,
    name: String,
    description: Option<String>,
    category: Option<String>,
    price: f64,
    quantity: i64,
    image_url: Option<String>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Product {
            id: ProductId::new(row.id),
            name: row.name,
            description: row.description,
            category: row.category,
            price: row.price,
            quantity: row.quantity,
            image_url: row.image_url,
        }
    }
}

/// Postgres-backed product store.
///
/// Uses the SQLx connection pool, which is `Send + Sync`; single-row statements
/// give the per-row atomicity the catalog relies on.
#[derive(Debug, Clone)]
pub struct PostgresProductStore {
    pool: Arc<PgPool>,
}

impl PostgresProductStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool: Arc::new(pool) }
    }

    /// Connect with a bounded pool acquire time.
    pub async fn connect(database_url: &str, acquire_timeout: Duration) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .acquire_timeout(acquire_timeout)
            .connect(database_url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;
        Ok(Self::new(pool))
    }

    /// Create the `products` table if it does not exist yet.
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS products (
                id          BIGSERIAL PRIMARY KEY,
                name        TEXT NOT NULL,
                description TEXT NULL,
                category    TEXT NULL,
                price       DOUBLE PRECISION NOT NULL CHECK (price >= 0),
                quantity    BIGINT NOT NULL DEFAULT 0,
                image_url   TEXT NULL
            )
            "#,
        )
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("ensure_schema", e))?;
        Ok(())
    }
}

/// Escape LIKE metacharacters so the needle matches literally.
fn escape_like(needle: &str) -> String {
    let mut escaped = String::with_capacity(needle.len());
    for ch in needle.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

fn push_where(qb: &mut QueryBuilder<'_, Postgres>, predicate: &Predicate) {
    qb.push(" WHERE TRUE");
    for clause in predicate.clauses() {
        match clause {
            Clause::Contains { field, needle } => {
                qb.push(" AND lower(")
                    .push(field.column())
                    .push(") LIKE ")
                    .push_bind(format!("%{}%", escape_like(needle)))
                    .push(" ESCAPE '\\'");
            }
            Clause::EqualsIgnoreCase { field, value } => {
                qb.push(" AND lower(")
                    .push(field.column())
                    .push(") = ")
                    .push_bind(value.clone());
            }
            Clause::PriceAtLeast(min) => {
                qb.push(" AND price >= ").push_bind(*min);
            }
            Clause::PriceAtMost(max) => {
                qb.push(" AND price <= ").push_bind(*max);
            }
            Clause::QuantityAtLeast(min) => {
                qb.push(" AND quantity >= ").push_bind(*min);
            }
            Clause::QuantityAtMost(max) => {
                qb.push(" AND quantity <= ").push_bind(*max);
            }
        }
    }
}

fn order_by(sort: Sort) -> &'static str {
    match (sort.field, sort.direction) {
        (SortField::Id, SortDirection::Asc) => " ORDER BY id ASC",
        (SortField::Id, SortDirection::Desc) => " ORDER BY id DESC",
        (SortField::Name, SortDirection::Asc) => " ORDER BY name ASC, id ASC",
        (SortField::Name, SortDirection::Desc) => " ORDER BY name DESC, id ASC",
        (SortField::Price, SortDirection::Asc) => " ORDER BY price ASC, id ASC",
        (SortField::Price, SortDirection::Desc) => " ORDER BY price DESC, id ASC",
        (SortField::Quantity, SortDirection::Asc) => " ORDER BY quantity ASC, id ASC",
        (SortField::Quantity, SortDirection::Desc) => " ORDER BY quantity DESC, id ASC",
    }
}

#[async_trait]
impl ProductStore for PostgresProductStore {
    #[instrument(skip(self, product), err)]
    async fn insert(&self, product: NewProduct) -> Result<ProductId, StoreError> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO products (name, description, category, price, quantity, image_url)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            "#,
        )
        .bind(&product.name)
        .bind(&product.description)
        .bind(&product.category)
        .bind(product.price)
        .bind(product.quantity)
        .bind(&product.image_url)
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert", e))?;

        Ok(ProductId::new(id))
    }

    #[instrument(skip(self), fields(id = %id), err)]
    async fn find_by_id(&self, id: ProductId) -> Result<Option<Product>, StoreError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!("{SELECT_COLUMNS} WHERE id = $1"))
            .bind(id.get())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_by_id", e))?;

        Ok(row.map(Product::from))
    }

    #[instrument(skip(self, product), fields(id = %id), err)]
    async fn update(&self, id: ProductId, product: NewProduct) -> Result<Product, StoreError> {
        let row = sqlx::query_as::<_, ProductRow>(
            r#"
            UPDATE products
            SET name = $2,
                description = $3,
                category = $4,
                price = $5,
                quantity = $6,
                image_url = $7
            WHERE id = $1
            RETURNING id, name, description, category, price, quantity, image_url
            "#,
        )
        .bind(id.get())
        .bind(&product.name)
        .bind(&product.description)
        .bind(&product.category)
        .bind(product.price)
        .bind(product.quantity)
        .bind(&product.image_url)
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("update", e))?;

        row.map(Product::from).ok_or(StoreError::NotFound(id))
    }

    #[instrument(skip(self), fields(id = %id), err)]
    async fn delete(&self, id: ProductId) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id.get())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(id));
        }
        Ok(())
    }

    #[instrument(skip(self), err)]
    async fn find_all(&self) -> Result<Vec<Product>, StoreError> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!("{SELECT_COLUMNS} ORDER BY id ASC"))
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_all", e))?;

        Ok(rows.into_iter().map(Product::from).collect())
    }

    #[instrument(skip(self, predicate), fields(clauses = predicate.clauses().len(), page = page.page, size = page.size), err)]
    async fn find_page(&self, predicate: &Predicate, page: &PageRequest) -> Result<Page<Product>, StoreError> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM products");
        push_where(&mut count, predicate);
        let total: i64 = count
            .build_query_scalar::<i64>()
            .fetch_one(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("count_page", e))?;

        let mut select = QueryBuilder::<Postgres>::new(SELECT_COLUMNS);
        push_where(&mut select, predicate);
        select
            .push(order_by(page.sort))
            .push(" LIMIT ")
            .push_bind(i64::from(page.size))
            .push(" OFFSET ")
            .push_bind(i64::try_from(page.offset()).unwrap_or(i64::MAX));

        let rows = select
            .build_query_as::<ProductRow>()
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_page", e))?;

        let content = rows.into_iter().map(Product::from).collect();
        Ok(Page::new(content, page, u64::try_from(total).unwrap_or(0)))
    }

    #[instrument(skip(self, predicate), fields(clauses = predicate.clauses().len()), err)]
    async fn find_matching(&self, predicate: &Predicate) -> Result<Vec<Product>, StoreError> {
        let mut select = QueryBuilder::<Postgres>::new(SELECT_COLUMNS);
        push_where(&mut select, predicate);
        select.push(" ORDER BY id ASC");

        let rows = select
            .build_query_as::<ProductRow>()
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_matching", e))?;

        Ok(rows.into_iter().map(Product::from).collect())
    }
}

fn map_sqlx_error(operation: &'static str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::PoolTimedOut => StoreError::Timeout(operation),
        sqlx::Error::Database(db_err) => {
            StoreError::Backend(format!("database error in {operation}: {}", db_err.message()))
        }
        sqlx::Error::PoolClosed => StoreError::Backend(format!("connection pool closed in {operation}")),
        other => StoreError::Backend(format!("{operation}: {other}")),
    }
}
