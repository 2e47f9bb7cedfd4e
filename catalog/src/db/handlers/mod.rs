//! Repository implementations for database access.
//!
//! Each repository wraps a SQLx connection (or transaction), provides strongly-typed CRUD
//! operations and returns models from [`crate::db::models`].
//!
//! ```ignore
//! use catalog::db::handlers::{Products, Repository};
//!
//! async fn example(pool: &sqlx::SqlitePool) -> Result<(), Box<dyn std::error::Error>> {
//!     let mut conn = pool.acquire().await?;
//!     let mut repo = Products::new(&mut conn);
//!
//!     let products = repo.list().await?;
//!     Ok(())
//! }
//! ```

pub mod products;
pub mod repository;

pub use products::Products;
pub use repository::Repository;
