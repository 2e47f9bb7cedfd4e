//! Database layer for product persistence.
//!
//! - **[`handlers`]**: Repository implementations over a single SQLite connection
//! - **[`models`]**: Row types and create/update request structs
//! - **[`errors`]**: [`errors::DbError`], mapped from `sqlx::Error`
//!
//! Schema migrations live in `migrations/` and are embedded with [`crate::migrator`].

pub mod errors;
pub mod handlers;
pub mod models;
