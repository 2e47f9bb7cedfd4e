use crate::AppState;
use crate::api::models::products::{ProductForm, ProductResponse};
use crate::db::errors::DbError;
use crate::errors::{Error, Result};
use crate::types::ProductId;
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use tracing::{info, warn};

fn not_found(id: ProductId) -> Error {
    Error::NotFound {
        resource: "Product".to_string(),
        id: id.to_string(),
    }
}

/// Best-effort removal of an image that no product references any more
async fn remove_orphan(state: &AppState, image_url: &str) {
    if !state.config.uploads.remove_orphaned_images {
        return;
    }
    if let Err(e) = state.storage.remove_file(image_url).await {
        warn!(image_url, error = %e, "Failed to remove orphaned image");
    }
}

/// Passes a write result through, removing the image stored for it if the write failed
async fn discard_image_on_error<T>(
    state: &AppState,
    image_url: Option<&str>,
    result: std::result::Result<T, DbError>,
) -> Result<T> {
    match result {
        Ok(value) => Ok(value),
        Err(e) => {
            if let Some(image_url) = image_url {
                remove_orphan(state, image_url).await;
            }
            Err(e.into())
        }
    }
}

#[utoipa::path(
    get,
    path = "/products",
    tag = "products",
    summary = "List products",
    responses(
        (status = 200, description = "All products", body = [ProductResponse]),
        (status = 500, description = "Internal server error")
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_products(State(state): State<AppState>) -> Result<Json<Vec<ProductResponse>>> {
    let products = state.products.get_all_products().await?;
    Ok(Json(products.into_iter().map(ProductResponse::from).collect()))
}

#[utoipa::path(
    get,
    path = "/products/{id}",
    tag = "products",
    summary = "Get product",
    responses(
        (status = 200, description = "Product found", body = ProductResponse),
        (status = 400, description = "Invalid product id"),
        (status = 404, description = "Product not found"),
        (status = 500, description = "Internal server error")
    ),
    params(
        ("id" = i64, Path, description = "Product ID")
    )
)]
#[tracing::instrument(skip_all, fields(product_id = id))]
pub async fn get_product(State(state): State<AppState>, Path(id): Path<ProductId>) -> Result<Json<ProductResponse>> {
    match state.products.get_product(id).await? {
        Some(product) => Ok(Json(product.into())),
        None => Err(not_found(id)),
    }
}

#[utoipa::path(
    post,
    path = "/products",
    tag = "products",
    summary = "Create product",
    description = "Create a product from a multipart form with `description`, `model`, `quantity`, `price` and an optional `image` file.",
    request_body(
        content_type = "multipart/form-data",
        description = "Product fields with an optional image upload"
    ),
    responses(
        (status = 201, description = "Product created", body = ProductResponse),
        (status = 400, description = "Missing or invalid form fields"),
        (status = 413, description = "Payload too large"),
        (status = 500, description = "Internal server error")
    )
)]
#[tracing::instrument(skip_all)]
pub async fn create_product(State(state): State<AppState>, mut form: ProductForm) -> Result<(StatusCode, Json<ProductResponse>)> {
    let image_url = match form.image.take() {
        Some(image) => Some(state.storage.store_file(&image.file_name, &image.content).await?),
        None => None,
    };

    let result = state.products.create_product(&form.into_create_request(image_url.clone())).await;
    let product = discard_image_on_error(&state, image_url.as_deref(), result).await?;
    info!(product_id = product.id, "Created product");

    Ok((StatusCode::CREATED, Json(product.into())))
}

#[utoipa::path(
    put,
    path = "/products/{id}",
    tag = "products",
    summary = "Update product",
    description = "Overwrite a product's fields. A new `image` replaces the current one; without it the current image is kept.",
    request_body(
        content_type = "multipart/form-data",
        description = "Product fields with an optional replacement image"
    ),
    responses(
        (status = 200, description = "Product updated", body = ProductResponse),
        (status = 400, description = "Missing or invalid form fields"),
        (status = 404, description = "Product not found"),
        (status = 413, description = "Payload too large"),
        (status = 500, description = "Internal server error")
    ),
    params(
        ("id" = i64, Path, description = "Product ID")
    )
)]
#[tracing::instrument(skip_all, fields(product_id = id))]
pub async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
    mut form: ProductForm,
) -> Result<Json<ProductResponse>> {
    let existing = state.products.get_product(id).await?.ok_or_else(|| not_found(id))?;

    let image_url = match form.image.take() {
        Some(image) => Some(state.storage.store_file(&image.file_name, &image.content).await?),
        None => None,
    };
    let result = state.products.update_product(id, &form.into_update_request(image_url.clone())).await;
    let product = discard_image_on_error(&state, image_url.as_deref(), result).await?;

    if image_url.is_some() {
        if let Some(previous) = existing.image_url.as_deref() {
            remove_orphan(&state, previous).await;
        }
    }

    Ok(Json(product.into()))
}

#[utoipa::path(
    delete,
    path = "/products/{id}",
    tag = "products",
    summary = "Delete product",
    responses(
        (status = 204, description = "Product deleted"),
        (status = 400, description = "Invalid product id"),
        (status = 404, description = "Product not found"),
        (status = 500, description = "Internal server error")
    ),
    params(
        ("id" = i64, Path, description = "Product ID")
    )
)]
#[tracing::instrument(skip_all, fields(product_id = id))]
pub async fn delete_product(State(state): State<AppState>, Path(id): Path<ProductId>) -> Result<StatusCode> {
    let existing = state.products.get_product(id).await?.ok_or_else(|| not_found(id))?;

    if !state.products.delete_product(id).await? {
        return Err(not_found(id));
    }
    info!(product_id = id, "Deleted product");

    if let Some(image_url) = existing.image_url.as_deref() {
        remove_orphan(&state, image_url).await;
    }

    Ok(StatusCode::NO_CONTENT)
}
