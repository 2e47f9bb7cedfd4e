//! Database repository for products.

use crate::{
    db::{
        errors::{DbError, Result},
        handlers::repository::Repository,
        models::products::{Product, ProductCreateDBRequest, ProductDBResponse, ProductUpdateDBRequest},
    },
    types::ProductId,
};
use sqlx::SqliteConnection;
use tracing::instrument;

pub struct Products<'c> {
    db: &'c mut SqliteConnection,
}

impl<'c> Products<'c> {
    /// Create a new Products repository instance
    pub fn new(db: &'c mut SqliteConnection) -> Self {
        Self { db }
    }
}

#[async_trait::async_trait]
impl<'c> Repository for Products<'c> {
    type CreateRequest = ProductCreateDBRequest;
    type UpdateRequest = ProductUpdateDBRequest;
    type Response = ProductDBResponse;
    type Id = ProductId;

    #[instrument(skip(self, request), fields(model = request.model, has_image = request.image_url.is_some()), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let product = sqlx::query_as::<_, Product>(
            r#"
            INSERT INTO products (description, model, quantity, price, image_url)
            VALUES (?1, ?2, ?3, ?4, ?5)
            RETURNING id, description, model, quantity, price, image_url
            "#,
        )
        .bind(&request.description)
        .bind(request.model)
        .bind(request.quantity)
        .bind(request.price.to_string())
        .bind(&request.image_url)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(product)
    }

    #[instrument(skip(self), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let product = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, description, model, quantity, price, image_url
            FROM products
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *self.db)
        .await?;

        Ok(product)
    }

    #[instrument(skip(self), err)]
    async fn list(&mut self) -> Result<Vec<Self::Response>> {
        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, description, model, quantity, price, image_url
            FROM products
            ORDER BY id ASC
            "#,
        )
        .fetch_all(&mut *self.db)
        .await?;

        Ok(products)
    }

    #[instrument(skip(self), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM products WHERE id = ?1")
            .bind(id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, request), fields(has_image = request.image_url.is_some()), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        // image_url only moves forward: NULL in the request keeps whatever is stored
        let product = sqlx::query_as::<_, Product>(
            r#"
            UPDATE products SET
                description = ?2,
                model = ?3,
                quantity = ?4,
                price = ?5,
                image_url = COALESCE(?6, image_url)
            WHERE id = ?1
            RETURNING id, description, model, quantity, price, image_url
            "#,
        )
        .bind(id)
        .bind(&request.description)
        .bind(request.model)
        .bind(request.quantity)
        .bind(request.price.to_string())
        .bind(&request.image_url)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(product)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::create_test_pool;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn widget() -> ProductCreateDBRequest {
        ProductCreateDBRequest {
            description: "Widget".to_string(),
            model: 7,
            quantity: 10,
            price: Decimal::from_str("19.99").unwrap(),
            image_url: None,
        }
    }

    #[test_log::test(tokio::test)]
    async fn test_create_assigns_id() {
        let pool = create_test_pool().await;
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Products::new(&mut conn);

        let first = repo.create(&widget()).await.unwrap();
        let second = repo.create(&widget()).await.unwrap();

        assert!(first.id >= 1);
        assert_ne!(first.id, second.id);
        assert_eq!(first.description, "Widget");
        assert_eq!(first.model, 7);
        assert_eq!(first.quantity, 10);
        assert_eq!(first.price, Decimal::from_str("19.99").unwrap());
        assert_eq!(first.image_url, None);
    }

    #[test_log::test(tokio::test)]
    async fn test_get_by_id_round_trips_price_exactly() {
        let pool = create_test_pool().await;
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Products::new(&mut conn);

        let mut request = widget();
        request.price = Decimal::from_str("12345678901234.0000000001").unwrap();
        let created = repo.create(&request).await.unwrap();

        let fetched = repo.get_by_id(created.id).await.unwrap().expect("product should exist");
        assert_eq!(fetched, created);
        assert_eq!(fetched.price.to_string(), "12345678901234.0000000001");
    }

    #[test_log::test(tokio::test)]
    async fn test_get_by_id_missing_returns_none() {
        let pool = create_test_pool().await;
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Products::new(&mut conn);

        assert!(repo.get_by_id(9999).await.unwrap().is_none());
    }

    #[test_log::test(tokio::test)]
    async fn test_list_returns_all_in_id_order() {
        let pool = create_test_pool().await;
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Products::new(&mut conn);

        assert!(repo.list().await.unwrap().is_empty());

        let a = repo.create(&widget()).await.unwrap();
        let mut gadget = widget();
        gadget.description = "Gadget".to_string();
        let b = repo.create(&gadget).await.unwrap();

        let all = repo.list().await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, a.id);
        assert_eq!(all[1].id, b.id);
        assert_eq!(all[1].description, "Gadget");
    }

    #[test_log::test(tokio::test)]
    async fn test_update_without_image_keeps_existing_image() {
        let pool = create_test_pool().await;
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Products::new(&mut conn);

        let mut request = widget();
        request.image_url = Some("/uploads/original.png".to_string());
        let created = repo.create(&request).await.unwrap();

        let updated = repo
            .update(
                created.id,
                &ProductUpdateDBRequest {
                    description: "Widget v2".to_string(),
                    model: 8,
                    quantity: 5,
                    price: Decimal::from_str("21.50").unwrap(),
                    image_url: None,
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.id, created.id);
        assert_eq!(updated.description, "Widget v2");
        assert_eq!(updated.model, 8);
        assert_eq!(updated.quantity, 5);
        assert_eq!(updated.price, Decimal::from_str("21.50").unwrap());
        assert_eq!(updated.image_url.as_deref(), Some("/uploads/original.png"));
    }

    #[test_log::test(tokio::test)]
    async fn test_update_with_image_replaces_it() {
        let pool = create_test_pool().await;
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Products::new(&mut conn);

        let mut request = widget();
        request.image_url = Some("/uploads/original.png".to_string());
        let created = repo.create(&request).await.unwrap();

        let updated = repo
            .update(
                created.id,
                &ProductUpdateDBRequest {
                    description: created.description.clone(),
                    model: created.model,
                    quantity: created.quantity,
                    price: created.price,
                    image_url: Some("/uploads/replacement.jpg".to_string()),
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.image_url.as_deref(), Some("/uploads/replacement.jpg"));
    }

    #[test_log::test(tokio::test)]
    async fn test_update_missing_is_not_found() {
        let pool = create_test_pool().await;
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Products::new(&mut conn);

        let result = repo
            .update(
                42,
                &ProductUpdateDBRequest {
                    description: "Ghost".to_string(),
                    model: 1,
                    quantity: 1,
                    price: Decimal::ONE,
                    image_url: None,
                },
            )
            .await;

        assert!(matches!(result, Err(DbError::NotFound)));
    }

    #[test_log::test(tokio::test)]
    async fn test_delete() {
        let pool = create_test_pool().await;
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Products::new(&mut conn);

        let created = repo.create(&widget()).await.unwrap();

        assert!(repo.delete(created.id).await.unwrap());
        assert!(repo.get_by_id(created.id).await.unwrap().is_none());
        // Second delete is a no-op
        assert!(!repo.delete(created.id).await.unwrap());
    }

    #[test_log::test(tokio::test)]
    async fn test_negative_quantity_violates_check_constraint() {
        let pool = create_test_pool().await;
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Products::new(&mut conn);

        let mut request = widget();
        request.quantity = -1;

        let result = repo.create(&request).await;
        assert!(matches!(result, Err(DbError::CheckViolation { .. })), "got {result:?}");
    }
}
