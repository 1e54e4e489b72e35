//! Book use-case service.
//!
//! # Responsibility
//! - Provide list/get/add/edit-rating/delete entry points for callers.
//! - Emit metadata-only logging events for every mutation.
//!
//! # Invariants
//! - Service APIs never bypass repository validation or transactions.
//! - Service layer remains storage-agnostic.
//! - Log lines never carry book names or authors.

use crate::model::book::{Book, BookId, NewBook};
use crate::repo::book_repo::{BookRepository, RepoError, RepoResult};
use log::{info, warn};

/// Use-case service wrapper for book CRUD operations.
pub struct BookService<R: BookRepository> {
    repo: R,
}

impl<R: BookRepository> BookService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Lists every book in insertion order.
    pub fn list_books(&self) -> RepoResult<Vec<Book>> {
        self.repo.list_books()
    }

    /// Loads one book, mapping an absent row to `RepoError::NotFound`.
    pub fn get_book(&self, id: BookId) -> RepoResult<Book> {
        self.repo.get_book(id)?.ok_or(RepoError::NotFound(id))
    }

    pub fn count_books(&self) -> RepoResult<u64> {
        self.repo.count_books()
    }

    /// Inserts a validated book and returns the stored record.
    pub fn add_book(&self, book: NewBook) -> RepoResult<Book> {
        match self.repo.create_book(&book) {
            Ok(id) => {
                info!("event=book_create module=service status=ok book_id={id}");
                Ok(book.into_book(id))
            }
            Err(err) => {
                warn!(
                    "event=book_create module=service status=error error_code={} error={}",
                    error_code(&err),
                    err
                );
                Err(err)
            }
        }
    }

    /// Replaces the rating of an existing book; name and author are untouched.
    ///
    /// The returned record is the pre-update row with the new rating, so a
    /// committed update is never reported as a failure.
    pub fn edit_rating(&self, id: BookId, rating: f64) -> RepoResult<Book> {
        let edited = self.get_book(id).and_then(|book| {
            self.repo.update_rating(id, rating)?;
            Ok(Book { rating, ..book })
        });
        match edited {
            Ok(book) => {
                info!("event=book_update_rating module=service status=ok book_id={id}");
                Ok(book)
            }
            Err(err) => {
                warn!(
                    "event=book_update_rating module=service status=error book_id={id} error_code={} error={}",
                    error_code(&err),
                    err
                );
                Err(err)
            }
        }
    }

    /// Hard-deletes one book.
    pub fn delete_book(&self, id: BookId) -> RepoResult<()> {
        match self.repo.delete_book(id) {
            Ok(()) => {
                info!("event=book_delete module=service status=ok book_id={id}");
                Ok(())
            }
            Err(err) => {
                warn!(
                    "event=book_delete module=service status=error book_id={id} error_code={} error={}",
                    error_code(&err),
                    err
                );
                Err(err)
            }
        }
    }
}

fn error_code(err: &RepoError) -> &'static str {
    match err {
        RepoError::Validation(_) => "validation_failed",
        RepoError::Db(_) => "db_error",
        RepoError::NotFound(_) => "not_found",
        RepoError::ConstraintViolation { .. } => "constraint_violation",
        RepoError::UninitializedConnection { .. }
        | RepoError::MissingRequiredTable(_)
        | RepoError::MissingRequiredColumn { .. } => "schema_mismatch",
        RepoError::InvalidData(_) => "invalid_data",
    }
}
