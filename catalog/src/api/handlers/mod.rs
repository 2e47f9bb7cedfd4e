//! HTTP handlers.
//!
//! - [`products`]: Product CRUD with multipart image upload
//! - [`static_assets`]: Frontend asset serving and SPA routing
//!
//! Handlers return [`crate::errors::Error`], which converts into the matching HTTP status.

pub mod products;
pub mod static_assets;
