//! API request and response data models.
//!
//! These are kept apart from the database models in [`crate::db::models`] so the wire format
//! (camelCase keys, string prices) can evolve independently of storage.

pub mod products;
