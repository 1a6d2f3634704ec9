//! Partial-update executors: projected column patches and the `stores` merge.
//!
//! Both run the write and the read-back inside one transaction, so the
//! returned product is exactly the row this call committed.

use prodstore_core::{ColumnValue, Product, Projection, Stores};
use sqlx::{types::Json, PgPool, Postgres, QueryBuilder};

use crate::{products::fetch_product, DbError};

/// Shallow JSONB merge; a NULL map is treated as empty so the patch still lands.
/// An empty patch leaves the column as it was, NULL included.
const MERGE_STORES_SQL: &str = "UPDATE product \
     SET stores = CASE WHEN $1::jsonb = '{}'::jsonb THEN stores \
                       ELSE COALESCE(stores, '{}'::jsonb) || $1::jsonb END \
     WHERE id = $2";

/// Builds `UPDATE product SET "c1" = $1, ... WHERE id = $n` for a projection.
///
/// Parameters are bound in projection order with `id` last.
#[must_use]
pub fn build_patch_query(id: i64, projection: &Projection) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::new("UPDATE product SET ");

    let mut set = builder.separated(", ");
    for assignment in projection.assignments() {
        set.push(format_args!("\"{}\" = ", assignment.column));
        match &assignment.value {
            ColumnValue::Text(v) => set.push_bind_unseparated(v.clone()),
            ColumnValue::Float(v) => set.push_bind_unseparated(*v),
            ColumnValue::Int(v) => set.push_bind_unseparated(*v),
            ColumnValue::Json(v) => set.push_bind_unseparated(v.clone()),
        };
    }

    builder.push(" WHERE id = ");
    builder.push_bind(id);
    builder
}

/// Applies a projected partial update and returns the updated product.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no row has this id, or [`DbError::Sqlx`]
/// if the update, read-back, or commit fails. The transaction is rolled back
/// on every error path.
pub async fn apply_patch(
    pool: &PgPool,
    id: i64,
    projection: &Projection,
) -> Result<Product, DbError> {
    let columns: Vec<&str> = projection.columns().collect();
    tracing::debug!(product_id = id, ?columns, "applying partial update");

    let mut tx = pool.begin().await?;

    let rows_affected = build_patch_query(id, projection)
        .build()
        .execute(&mut *tx)
        .await?
        .rows_affected();
    if rows_affected == 0 {
        return Err(DbError::NotFound(id));
    }

    let product = fetch_product(&mut *tx, id)
        .await?
        .ok_or(DbError::NotFound(id))?;

    tx.commit().await?;
    Ok(product)
}

/// Merges `stores` into the stored price map and returns the updated product.
///
/// Keys in `stores` overwrite, keys absent from it are preserved. The merge
/// happens in a single statement at the database. An empty `stores` changes
/// nothing but still reports [`DbError::NotFound`] for an unknown id.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no row has this id, or [`DbError::Sqlx`]
/// if the merge, read-back, or commit fails.
pub async fn apply_merge_patch(
    pool: &PgPool,
    id: i64,
    stores: &Stores,
) -> Result<Product, DbError> {
    tracing::debug!(product_id = id, keys = stores.len(), "merging store prices");

    let mut tx = pool.begin().await?;

    let rows_affected = sqlx::query(MERGE_STORES_SQL)
        .bind(Json(stores))
        .bind(id)
        .execute(&mut *tx)
        .await?
        .rows_affected();
    if rows_affected == 0 {
        return Err(DbError::NotFound(id));
    }

    let product = fetch_product(&mut *tx, id)
        .await?
        .ok_or(DbError::NotFound(id))?;

    tx.commit().await?;
    Ok(product)
}
