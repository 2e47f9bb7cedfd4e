//! API layer for HTTP request handling and data models.
//!
//! - **[`handlers`]**: Axum route handlers
//! - **[`models`]**: Request/response data structures
//!
//! Product endpoints are nested under `/api`. Their OpenAPI document is served at
//! `/api-docs/openapi.json` and browsable at `/docs`.

pub mod handlers;
pub mod models;
