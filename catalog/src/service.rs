//! Product service: the layer between HTTP handlers and the record store.
//!
//! Every call acquires a pooled connection and delegates to the [`Products`] repository. The
//! only translation is in [`ProductService::get_product`], which reports an absent row as
//! `None` so callers can branch on presence.

use crate::db::{
    errors::Result,
    handlers::{Products, Repository},
    models::products::{Product, ProductCreateDBRequest, ProductUpdateDBRequest},
};
use crate::types::ProductId;
use sqlx::SqlitePool;
use tracing::instrument;

#[derive(Debug, Clone)]
pub struct ProductService {
    db: SqlitePool,
}

impl ProductService {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    #[instrument(skip(self), err)]
    pub async fn get_all_products(&self) -> Result<Vec<Product>> {
        let mut conn = self.db.acquire().await?;
        Products::new(&mut conn).list().await
    }

    #[instrument(skip(self), err)]
    pub async fn get_product(&self, id: ProductId) -> Result<Option<Product>> {
        let mut conn = self.db.acquire().await?;
        Products::new(&mut conn).get_by_id(id).await
    }

    #[instrument(skip(self, request), err)]
    pub async fn create_product(&self, request: &ProductCreateDBRequest) -> Result<Product> {
        let mut conn = self.db.acquire().await?;
        Products::new(&mut conn).create(request).await
    }

    #[instrument(skip(self, request), err)]
    pub async fn update_product(&self, id: ProductId, request: &ProductUpdateDBRequest) -> Result<Product> {
        let mut conn = self.db.acquire().await?;
        Products::new(&mut conn).update(id, request).await
    }

    #[instrument(skip(self), err)]
    pub async fn delete_product(&self, id: ProductId) -> Result<bool> {
        let mut conn = self.db.acquire().await?;
        Products::new(&mut conn).delete(id).await
    }
}
