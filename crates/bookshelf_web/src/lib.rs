//! Web front-end for the Bookshelf catalog.
//!
//! # Responsibility
//! - Map the catalog routes onto `bookshelf_core` use-cases.
//! - Render HTML pages and carry one-shot flashes across redirects.
//!
//! # Invariants
//! - No global state: everything a handler needs arrives via `AppState`.

use axum::middleware::from_fn;
use axum::routing::get;
use axum::Router;
use bookshelf_core::BookStore;
use std::sync::Arc;

pub mod config;
pub mod flash;
mod http;
pub mod views;

pub use config::ServerConfig;
pub use flash::{Flash, FlashLevel, FlashStore};

/// Shared per-process handles injected into every handler.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<BookStore>,
    pub flash: Arc<FlashStore>,
}

impl AppState {
    pub fn new(store: Arc<BookStore>) -> Self {
        Self {
            store,
            flash: Arc::new(FlashStore::default()),
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(http::handlers::list_books))
        .route(
            "/add",
            get(http::handlers::add_book_form).post(http::handlers::add_book),
        )
        .route(
            "/delete/:id",
            get(http::handlers::delete_book).post(http::handlers::delete_book),
        )
        .route(
            "/edit_rating/:id",
            get(http::handlers::edit_rating_form).post(http::handlers::edit_rating),
        )
        .fallback(http::handlers::not_found)
        .layer(from_fn(http::request_log::request_log_middleware))
        .with_state(state)
}
