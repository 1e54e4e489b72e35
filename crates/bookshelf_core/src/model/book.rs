//! Book domain model.
//!
//! # Responsibility
//! - Define the catalog entry persisted in the `books` table.
//! - Own field constraints shared by forms and repositories.
//!
//! # Invariants
//! - `id` is assigned by storage on insert and never changes afterwards.
//! - `name` and `author` are non-empty and at most `MAX_TEXT_CHARS` long.
//! - `rating` is a finite number; no range is imposed.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Storage-generated row identifier.
pub type BookId = i64;

/// Upper bound for `name` and `author`, mirroring the `VARCHAR(250)` columns.
pub const MAX_TEXT_CHARS: usize = 250;

/// Persisted catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Book {
    pub id: BookId,
    /// Unique across all books.
    pub name: String,
    /// Unique across all books, see `books.author` UNIQUE constraint.
    pub author: String,
    pub rating: f64,
}

/// Insert model for a book that has no id yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewBook {
    pub name: String,
    pub author: String,
    pub rating: f64,
}

/// Field constraint failures for book records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookValidationError {
    EmptyName,
    EmptyAuthor,
    NameTooLong { max: usize },
    AuthorTooLong { max: usize },
    NonFiniteRating,
}

impl Display for BookValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyName => write!(f, "book name cannot be empty"),
            Self::EmptyAuthor => write!(f, "book author cannot be empty"),
            Self::NameTooLong { max } => write!(f, "book name exceeds {max} characters"),
            Self::AuthorTooLong { max } => write!(f, "book author exceeds {max} characters"),
            Self::NonFiniteRating => write!(f, "book rating must be a finite number"),
        }
    }
}

impl Error for BookValidationError {}

impl NewBook {
    pub fn new(name: impl Into<String>, author: impl Into<String>, rating: f64) -> Self {
        Self {
            name: name.into(),
            author: author.into(),
            rating,
        }
    }

    /// Checks field constraints before persistence.
    pub fn validate(&self) -> Result<(), BookValidationError> {
        validate_text(&self.name, BookValidationError::EmptyName, |max| {
            BookValidationError::NameTooLong { max }
        })?;
        validate_text(&self.author, BookValidationError::EmptyAuthor, |max| {
            BookValidationError::AuthorTooLong { max }
        })?;
        validate_rating(self.rating)
    }

    /// Attaches the storage-assigned id.
    pub fn into_book(self, id: BookId) -> Book {
        Book {
            id,
            name: self.name,
            author: self.author,
            rating: self.rating,
        }
    }
}

impl Book {
    /// Re-checks persisted values; used on read paths so corrupt rows surface.
    pub fn validate(&self) -> Result<(), BookValidationError> {
        validate_text(&self.name, BookValidationError::EmptyName, |max| {
            BookValidationError::NameTooLong { max }
        })?;
        validate_text(&self.author, BookValidationError::EmptyAuthor, |max| {
            BookValidationError::AuthorTooLong { max }
        })?;
        validate_rating(self.rating)
    }
}

/// Ratings carry no range constraint, only finiteness.
pub fn validate_rating(rating: f64) -> Result<(), BookValidationError> {
    if rating.is_finite() {
        Ok(())
    } else {
        Err(BookValidationError::NonFiniteRating)
    }
}

fn validate_text(
    value: &str,
    empty: BookValidationError,
    too_long: impl FnOnce(usize) -> BookValidationError,
) -> Result<(), BookValidationError> {
    if value.trim().is_empty() {
        return Err(empty);
    }
    if value.chars().count() > MAX_TEXT_CHARS {
        return Err(too_long(MAX_TEXT_CHARS));
    }
    Ok(())
}
