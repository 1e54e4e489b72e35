//! Route handlers for the catalog pages.
//!
//! # Invariants
//! - Validation failures re-render the form with status 200, no redirect.
//! - A missing book id answers 404 before any mutation is attempted.
//! - A body that is not a urlencoded form is read as an empty form.
//! - Mutation failures never produce an error page: they become an error
//!   flash on the redirect back to `/`.

use crate::flash::{self, Flash};
use crate::views;
use crate::AppState;
use axum::extract::rejection::FormRejection;
use axum::extract::{Path, State};
use axum::http::header::SET_COOKIE;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::Form;
use bookshelf_core::{
    BookId, BookService, CreateBookForm, EditRatingForm, FormState, RepoResult,
    SqliteBookRepository, StoreError,
};
use log::error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use tokio::task::JoinError;

/// Failure of one storage call issued from a handler.
#[derive(Debug)]
pub(crate) enum CallError {
    Store(StoreError),
    Task(JoinError),
}

impl CallError {
    fn is_not_found(&self) -> bool {
        matches!(self, Self::Store(err) if err.is_not_found())
    }
}

impl Display for CallError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Store(err) => write!(f, "{err}"),
            Self::Task(err) => write!(f, "storage task failed: {err}"),
        }
    }
}

/// Runs `f` on the blocking pool against the shared store.
async fn with_books<T, F>(state: &AppState, f: F) -> Result<T, CallError>
where
    T: Send + 'static,
    F: for<'a> FnOnce(&BookService<SqliteBookRepository<'a>>) -> RepoResult<T> + Send + 'static,
{
    let store = Arc::clone(&state.store);
    match tokio::task::spawn_blocking(move || store.with_service(f)).await {
        Ok(result) => result.map_err(CallError::Store),
        Err(err) => Err(CallError::Task(err)),
    }
}

pub(crate) async fn list_books(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let books = match with_books(&state, |service| service.list_books()).await {
        Ok(books) => books,
        Err(err) => return read_failure("list_books", &err),
    };

    match flash::token_from_headers(&headers) {
        Some(token) => {
            let pending = state.flash.take(&token);
            (
                [(SET_COOKIE, flash::clear_cookie())],
                Html(views::index_page(&books, pending.as_ref())),
            )
                .into_response()
        }
        None => Html(views::index_page(&books, None)).into_response(),
    }
}

pub(crate) async fn add_book_form() -> Html<String> {
    Html(views::add_page(&FormState::default()))
}

pub(crate) async fn add_book(
    State(state): State<AppState>,
    body: Result<Form<CreateBookForm>, FormRejection>,
) -> Response {
    let form = form_or_empty(body);
    let book = match form.validate() {
        Ok(book) => book,
        Err(errors) => return Html(views::add_page(&form.state(errors))).into_response(),
    };

    match with_books(&state, move |service| service.add_book(book)).await {
        Ok(_) => redirect_home(&state, Flash::success("Book added successfully")),
        Err(err) => redirect_home(&state, Flash::error(format!("Error adding book: {err}"))),
    }
}

pub(crate) async fn delete_book(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Response {
    let Some(id) = parse_book_id(&raw_id) else {
        return not_found().await.into_response();
    };
    if let Err(err) = with_books(&state, move |service| service.get_book(id)).await {
        return read_failure("delete_book", &err);
    }

    match with_books(&state, move |service| service.delete_book(id)).await {
        Ok(()) => redirect_home(&state, Flash::success("Book deleted successfully")),
        Err(_) => redirect_home(&state, Flash::error("Error deleting book")),
    }
}

pub(crate) async fn edit_rating_form(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Response {
    let Some(id) = parse_book_id(&raw_id) else {
        return not_found().await.into_response();
    };
    match with_books(&state, move |service| service.get_book(id)).await {
        Ok(book) => {
            let form = EditRatingForm::from_rating(book.rating);
            Html(views::edit_rating_page(&book, &form.state(Default::default()))).into_response()
        }
        Err(err) => read_failure("edit_rating_form", &err),
    }
}

pub(crate) async fn edit_rating(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    body: Result<Form<EditRatingForm>, FormRejection>,
) -> Response {
    let Some(id) = parse_book_id(&raw_id) else {
        return not_found().await.into_response();
    };
    let book = match with_books(&state, move |service| service.get_book(id)).await {
        Ok(book) => book,
        Err(err) => return read_failure("edit_rating", &err),
    };

    let form = form_or_empty(body);
    let rating = match form.validate() {
        Ok(rating) => rating,
        Err(errors) => {
            return Html(views::edit_rating_page(&book, &form.state(errors))).into_response()
        }
    };

    match with_books(&state, move |service| service.edit_rating(id, rating)).await {
        Ok(_) => redirect_home(&state, Flash::success("Book rating edited successfully")),
        Err(err) => redirect_home(
            &state,
            Flash::error(format!("Error editing book rating: {err}")),
        ),
    }
}

pub(crate) async fn not_found() -> (StatusCode, Html<String>) {
    (StatusCode::NOT_FOUND, Html(views::not_found_page()))
}

fn parse_book_id(raw: &str) -> Option<BookId> {
    raw.parse::<BookId>().ok()
}

fn form_or_empty<T: Default>(body: Result<Form<T>, FormRejection>) -> T {
    body.map(|Form(form)| form).unwrap_or_default()
}

fn redirect_home(state: &AppState, flash: Flash) -> Response {
    let token = state.flash.put(flash);
    ([(SET_COOKIE, flash::set_cookie(&token))], Redirect::to("/")).into_response()
}

/// NotFound becomes a 404 page; anything else is a logged 500.
fn read_failure(route: &'static str, err: &CallError) -> Response {
    if err.is_not_found() {
        return (StatusCode::NOT_FOUND, Html(views::not_found_page())).into_response();
    }
    error!("event=http_request module=http status=error route={route} error={err}");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Html(views::error_page("The catalog could not be read.")),
    )
        .into_response()
}
