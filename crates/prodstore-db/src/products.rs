//! Database operations for the `product` table.

use prodstore_core::{Product, ProductBody, Stores};
use sqlx::{types::Json, PgExecutor, PgPool};

use crate::DbError;

// ---------------------------------------------------------------------------
// Row type
// ---------------------------------------------------------------------------

/// A row from the `product` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProductRow {
    pub id: i64,
    pub name: Option<String>,
    pub quantity: Option<f64>,
    pub unit: Option<String>,
    /// JSONB object of store name to price.
    pub stores: Option<Json<Stores>>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            quantity: row.quantity,
            unit: row.unit,
            stores: row.stores.map(|Json(stores)| stores),
        }
    }
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Returns every product, ordered by id.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_products(pool: &PgPool) -> Result<Vec<Product>, DbError> {
    let rows = sqlx::query_as::<_, ProductRow>(
        "SELECT id, name, quantity, unit, stores FROM product ORDER BY id",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(Product::from).collect())
}

/// Reads a single product through any executor, including an open transaction.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if the query or row decode fails.
pub async fn fetch_product<'e, E>(executor: E, id: i64) -> Result<Option<Product>, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    let row = sqlx::query_as::<_, ProductRow>(
        "SELECT id, name, quantity, unit, stores FROM product WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(executor)
    .await?;

    Ok(row.map(Product::from))
}

/// Returns a single product by id.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no row has this id, or [`DbError::Sqlx`]
/// if the query fails.
pub async fn get_product(pool: &PgPool, id: i64) -> Result<Product, DbError> {
    fetch_product(pool, id).await?.ok_or(DbError::NotFound(id))
}

/// Inserts a product and returns the generated id.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert or commit fails.
pub async fn insert_product(pool: &PgPool, body: &ProductBody) -> Result<i64, DbError> {
    let mut tx = pool.begin().await?;

    let id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO product (name, quantity, unit, stores) \
         VALUES ($1, $2, $3, $4) \
         RETURNING id",
    )
    .bind(&body.name)
    .bind(body.quantity)
    .bind(&body.unit)
    .bind(body.stores.as_ref().map(Json))
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(id)
}

/// Overwrites every mutable column of an existing product.
///
/// Fields that are `None` in `body` are written as NULL.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no row has this id, or [`DbError::Sqlx`]
/// if the update or commit fails.
pub async fn replace_product(
    pool: &PgPool,
    id: i64,
    body: &ProductBody,
) -> Result<Product, DbError> {
    let mut tx = pool.begin().await?;

    let row = sqlx::query_as::<_, ProductRow>(
        "UPDATE product \
         SET name = $1, quantity = $2, unit = $3, stores = $4 \
         WHERE id = $5 \
         RETURNING id, name, quantity, unit, stores",
    )
    .bind(&body.name)
    .bind(body.quantity)
    .bind(&body.unit)
    .bind(body.stores.as_ref().map(Json))
    .bind(id)
    .fetch_optional(&mut *tx)
    .await?;

    // Dropping `tx` on the not-found path rolls it back.
    let row = row.ok_or(DbError::NotFound(id))?;
    tx.commit().await?;
    Ok(row.into())
}

/// Deletes a product by id.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no row was deleted, or [`DbError::Sqlx`]
/// if the delete or commit fails.
pub async fn delete_product(pool: &PgPool, id: i64) -> Result<(), DbError> {
    let mut tx = pool.begin().await?;

    let rows_affected = sqlx::query("DELETE FROM product WHERE id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

    if rows_affected == 0 {
        return Err(DbError::NotFound(id));
    }

    tx.commit().await?;
    Ok(())
}
