//! Database models for products.

use crate::types::ProductId;
use rust_decimal::Decimal;
use sqlx::{FromRow, Row, sqlite::SqliteRow};
use std::str::FromStr;

/// Database representation of a product row.
///
/// `price` lives in a TEXT column and is decoded back into a [`Decimal`] here, so the
/// exact value written is the exact value read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Product {
    pub id: ProductId,
    pub description: String,
    pub model: i32,
    pub quantity: i32,
    pub price: Decimal,
    pub image_url: Option<String>,
}

impl<'r> FromRow<'r, SqliteRow> for Product {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let raw_price: String = row.try_get("price")?;
        let price = Decimal::from_str(&raw_price).map_err(|e| sqlx::Error::ColumnDecode {
            index: "price".to_string(),
            source: Box::new(e),
        })?;

        Ok(Self {
            id: row.try_get("id")?,
            description: row.try_get("description")?,
            model: row.try_get("model")?,
            quantity: row.try_get("quantity")?,
            price,
            image_url: row.try_get("image_url")?,
        })
    }
}

/// Request to insert a new product. The id is assigned by the store.
#[derive(Debug, Clone)]
pub struct ProductCreateDBRequest {
    pub description: String,
    pub model: i32,
    pub quantity: i32,
    pub price: Decimal,
    pub image_url: Option<String>,
}

/// Request to overwrite an existing product.
///
/// Every scalar field is replaced. `image_url` is only replaced when `Some`: a stored image
/// is never cleared by an update.
#[derive(Debug, Clone)]
pub struct ProductUpdateDBRequest {
    pub description: String,
    pub model: i32,
    pub quantity: i32,
    pub price: Decimal,
    pub image_url: Option<String>,
}

/// Response from database after creating or updating a product
pub type ProductDBResponse = Product;
