//! Database record models matching table schemas.
//!
//! Models derive or implement `sqlx::FromRow` so repositories can return query results
//! directly. They are kept separate from the API models in [`crate::api::models`] so the
//! storage and wire representations can evolve independently.

pub mod products;
