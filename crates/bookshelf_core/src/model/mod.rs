//! Catalog domain model.
//!
//! # Invariants
//! - A `Book` is identified by a storage-assigned `BookId`.
//! - Deletion is a hard delete; there are no tombstones.

pub mod book;
