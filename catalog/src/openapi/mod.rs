//! OpenAPI documentation for the product API.

use utoipa::OpenApi;

use crate::api;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Product Catalog API",
        description = "Create, list, update and delete products. Product images are uploaded as multipart form parts and served from `/uploads`."
    ),
    servers(
        (url = "/api", description = "Product API")
    ),
    paths(
        api::handlers::products::list_products,
        api::handlers::products::get_product,
        api::handlers::products::create_product,
        api::handlers::products::update_product,
        api::handlers::products::delete_product,
    ),
    components(
        schemas(api::models::products::ProductResponse)
    ),
    tags(
        (name = "products", description = "Product catalog management")
    )
)]
pub struct ApiDoc;
