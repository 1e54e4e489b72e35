//! Repository layer: data access contracts and their SQLite implementations.
//!
//! # Invariants
//! - Repository writes validate the model before touching SQL.
//! - Repository APIs return semantic errors (`NotFound`,
//!   `ConstraintViolation`) in addition to DB transport errors.

pub mod book_repo;
