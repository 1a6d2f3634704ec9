//! The entity store seam handed to the HTTP layer.

use async_trait::async_trait;
use mockall::automock;
use prodstore_core::{project_fields, Product, ProductBody, ProductPatch, Stores};
use sqlx::PgPool;

use crate::{products, DbError};

/// Postgres-backed [`ProductStore`]. Cloning shares the underlying pool.
#[derive(Debug, Clone)]
pub struct PgProductStore {
    pool: PgPool,
}

impl PgProductStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProductStore for PgProductStore {
    async fn list_products(&self) -> Result<Vec<Product>, DbError> {
        products::list_products(&self.pool).await
    }

    async fn get_product(&self, id: i64) -> Result<Product, DbError> {
        products::get_product(&self.pool, id).await
    }

    async fn create_product(&self, body: ProductBody) -> Result<i64, DbError> {
        let id = products::insert_product(&self.pool, &body).await?;
        tracing::info!(product_id = id, "product created");
        Ok(id)
    }

    async fn replace_product(&self, id: i64, body: ProductBody) -> Result<Product, DbError> {
        products::replace_product(&self.pool, id, &body).await
    }

    async fn delete_product(&self, id: i64) -> Result<(), DbError> {
        products::delete_product(&self.pool, id).await?;
        tracing::info!(product_id = id, "product deleted");
        Ok(())
    }

    async fn patch_product(&self, id: i64, patch: ProductPatch) -> Result<Product, DbError> {
        let projection = project_fields(&patch)?;
        crate::patch::apply_patch(&self.pool, id, &projection).await
    }

    async fn patch_stores(&self, id: i64, stores: Stores) -> Result<Product, DbError> {
        crate::patch::apply_merge_patch(&self.pool, id, &stores).await
    }

    async fn ping(&self) -> Result<(), DbError> {
        crate::health_check(&self.pool).await
    }
}

#[automock]
#[async_trait]
pub trait ProductStore: Send + Sync {
    /// Returns every product.
    async fn list_products(&self) -> Result<Vec<Product>, DbError>;

    /// Returns one product, or [`DbError::NotFound`].
    async fn get_product(&self, id: i64) -> Result<Product, DbError>;

    /// Inserts a product and returns its generated id.
    async fn create_product(&self, body: ProductBody) -> Result<i64, DbError>;

    /// Overwrites all mutable fields; `None` clears a field.
    async fn replace_product(&self, id: i64, body: ProductBody) -> Result<Product, DbError>;

    async fn delete_product(&self, id: i64) -> Result<(), DbError>;

    /// Updates only the fields present in `patch`.
    ///
    /// Fails with [`DbError::Projection`] before touching the database when
    /// nothing was supplied.
    async fn patch_product(&self, id: i64, patch: ProductPatch) -> Result<Product, DbError>;

    /// Shallow-merges `stores` into the stored price map.
    async fn patch_stores(&self, id: i64, stores: Stores) -> Result<Product, DbError>;

    async fn ping(&self) -> Result<(), DbError>;
}
