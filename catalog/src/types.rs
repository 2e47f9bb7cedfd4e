//! Common type definitions.
//!
//! Product ids are plain integers assigned by SQLite's `AUTOINCREMENT` column, wrapped in a
//! type alias so signatures read in terms of the entity they refer to.

/// Product identifier, assigned by the record store on insert.
pub type ProductId = i64;
