//! API request/response models for products.

use crate::db::models::products::{Product, ProductCreateDBRequest, ProductUpdateDBRequest};
use crate::errors::Error;
use crate::types::ProductId;
use axum::{
    extract::{FromRequest, Multipart, Request, multipart::MultipartError},
    http::StatusCode,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use utoipa::ToSchema;

/// Product details returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProductResponse {
    /// Identifier assigned on creation
    #[schema(value_type = i64, example = 1)]
    pub id: ProductId,
    #[schema(example = "Widget")]
    pub description: String,
    /// Model number
    #[schema(example = 7)]
    pub model: i32,
    /// Units in stock
    #[schema(example = 10)]
    pub quantity: i32,
    /// Exact decimal price, serialized as a JSON number with its scale kept
    #[schema(value_type = f64, example = 19.99)]
    #[serde(with = "rust_decimal::serde::arbitrary_precision")]
    pub price: Decimal,
    /// Where the product image is served from, if one was uploaded
    #[schema(example = "/uploads/0b7f6a52-6f0c-4bb2-9f0e-6f1f6d1f2f8e.png")]
    pub image_url: Option<String>,
}

impl From<Product> for ProductResponse {
    fn from(product: Product) -> Self {
        Self {
            id: product.id,
            description: product.description,
            model: product.model,
            quantity: product.quantity,
            price: product.price,
            image_url: product.image_url,
        }
    }
}

/// An image file received in a product form
#[derive(Debug, Clone)]
pub struct ImageUpload {
    /// Filename as sent by the client. Only its extension is kept.
    pub file_name: String,
    pub content: Vec<u8>,
}

/// Validated multipart body of a product create or update request.
///
/// Fields: `description` (text), `model` and `quantity` (integers), `price` (decimal) and an
/// optional `image` file part. An image part with no bytes counts as no image.
#[derive(Debug, Clone)]
pub struct ProductForm {
    pub description: String,
    pub model: i32,
    pub quantity: i32,
    pub price: Decimal,
    pub image: Option<ImageUpload>,
}

impl ProductForm {
    pub fn into_create_request(self, image_url: Option<String>) -> ProductCreateDBRequest {
        ProductCreateDBRequest {
            description: self.description,
            model: self.model,
            quantity: self.quantity,
            price: self.price,
            image_url,
        }
    }

    pub fn into_update_request(self, image_url: Option<String>) -> ProductUpdateDBRequest {
        ProductUpdateDBRequest {
            description: self.description,
            model: self.model,
            quantity: self.quantity,
            price: self.price,
            image_url,
        }
    }
}

impl<S> FromRequest<S> for ProductForm
where
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let mut multipart = Multipart::from_request(req, state).await.map_err(|e| Error::BadRequest {
            message: format!("Expected a multipart form: {}", e.body_text()),
        })?;

        let mut description = None;
        let mut model = None;
        let mut quantity = None;
        let mut price = None;
        let mut image = None;

        while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
            let field_name = field.name().unwrap_or("").to_string();

            match field_name.as_str() {
                "description" => description = Some(field.text().await.map_err(multipart_error)?),
                "model" => model = Some(field.text().await.map_err(multipart_error)?),
                "quantity" => quantity = Some(field.text().await.map_err(multipart_error)?),
                "price" => price = Some(field.text().await.map_err(multipart_error)?),
                "image" => {
                    let file_name = field.file_name().unwrap_or("").to_string();
                    let content = field.bytes().await.map_err(multipart_error)?;
                    image = (!content.is_empty()).then(|| ImageUpload {
                        file_name,
                        content: content.to_vec(),
                    });
                }
                other => {
                    tracing::debug!(field = other, "Ignoring unknown product form field");
                }
            }
        }

        let description = required("description", description)?;
        let model: i32 = parse_field("model", required("model", model)?)?;
        let quantity: i32 = parse_field("quantity", required("quantity", quantity)?)?;
        let price = Decimal::from_str(required("price", price)?.trim()).map_err(|_| Error::BadRequest {
            message: "Field 'price' must be a decimal number".to_string(),
        })?;

        if quantity < 0 {
            return Err(Error::BadRequest {
                message: "Field 'quantity' cannot be negative".to_string(),
            });
        }
        if price.is_sign_negative() && !price.is_zero() {
            return Err(Error::BadRequest {
                message: "Field 'price' cannot be negative".to_string(),
            });
        }

        Ok(Self {
            description,
            model,
            quantity,
            price,
            image,
        })
    }
}

fn multipart_error(e: MultipartError) -> Error {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        Error::PayloadTooLarge {
            message: "Upload exceeds the maximum allowed size".to_string(),
        }
    } else {
        Error::BadRequest {
            message: format!("Failed to parse multipart data: {}", e.body_text()),
        }
    }
}

fn required(name: &str, value: Option<String>) -> Result<String, Error> {
    value.ok_or_else(|| Error::BadRequest {
        message: format!("Missing required field '{name}'"),
    })
}

fn parse_field(name: &str, value: String) -> Result<i32, Error> {
    value.trim().parse().map_err(|_| Error::BadRequest {
        message: format!("Field '{name}' must be an integer"),
    })
}
