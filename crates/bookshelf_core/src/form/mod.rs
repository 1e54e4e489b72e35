//! Submission forms and their validation schemas.
//!
//! # Responsibility
//! - Describe the fields each HTML form submits.
//! - Turn raw submitted text into typed values or per-field messages.
//!
//! # Invariants
//! - Validation is all-or-nothing: any failing field fails the whole form.
//! - Entered values are kept verbatim in `FormState` for re-rendering.

use std::collections::BTreeMap;

pub mod book_forms;

pub use book_forms::{CreateBookForm, EditRatingForm};

/// Field name -> human-readable failure reason.
pub type FieldErrors = BTreeMap<&'static str, String>;

pub const REQUIRED_MESSAGE: &str = "This field is required.";
pub const INVALID_FLOAT_MESSAGE: &str = "Not a valid float value.";

/// Snapshot a view needs to render a form: current values plus errors.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormState {
    pub values: BTreeMap<&'static str, String>,
    pub errors: FieldErrors,
}

impl FormState {
    pub fn value(&self, field: &str) -> &str {
        self.values.get(field).map_or("", String::as_str)
    }

    pub fn error(&self, field: &str) -> Option<&str> {
        self.errors.get(field).map(String::as_str)
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}
