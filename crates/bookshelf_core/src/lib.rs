//! Core domain logic for the Bookshelf catalog.
//! This crate owns storage, validation and the book use-cases; the web
//! crate only routes and renders.

pub mod db;
pub mod form;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use form::{CreateBookForm, EditRatingForm, FieldErrors, FormState};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::book::{Book, BookId, BookValidationError, NewBook};
pub use repo::book_repo::{BookRepository, RepoError, RepoResult, SqliteBookRepository};
pub use service::book_service::BookService;
pub use service::book_store::{BookStore, StoreError, StoreResult};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
