//! Create-book and edit-rating forms.

use super::{FieldErrors, FormState, INVALID_FLOAT_MESSAGE, REQUIRED_MESSAGE};
use crate::model::book::{NewBook, MAX_TEXT_CHARS};
use serde::Deserialize;

/// Raw `POST /add` body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CreateBookForm {
    pub name: String,
    pub author: String,
    pub rating: String,
}

impl CreateBookForm {
    /// Validates every field and builds the insert model.
    ///
    /// Text fields are trimmed before they are accepted.
    pub fn validate(&self) -> Result<NewBook, FieldErrors> {
        let mut errors = FieldErrors::new();
        let name = required_text(&self.name, "name", &mut errors);
        let author = required_text(&self.author, "author", &mut errors);
        let rating = required_float(&self.rating, "rating", &mut errors);

        match (name, author, rating) {
            (Some(name), Some(author), Some(rating)) if errors.is_empty() => {
                Ok(NewBook::new(name, author, rating))
            }
            _ => Err(errors),
        }
    }

    pub fn state(&self, errors: FieldErrors) -> FormState {
        FormState {
            values: [
                ("name", self.name.clone()),
                ("author", self.author.clone()),
                ("rating", self.rating.clone()),
            ]
            .into_iter()
            .collect(),
            errors,
        }
    }
}

/// Raw `POST /edit_rating/{id}` body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EditRatingForm {
    pub rating: String,
}

impl EditRatingForm {
    /// Pre-populates the form with a stored rating for initial display.
    pub fn from_rating(rating: f64) -> Self {
        Self {
            rating: rating.to_string(),
        }
    }

    pub fn validate(&self) -> Result<f64, FieldErrors> {
        let mut errors = FieldErrors::new();
        match required_float(&self.rating, "rating", &mut errors) {
            Some(rating) => Ok(rating),
            None => Err(errors),
        }
    }

    pub fn state(&self, errors: FieldErrors) -> FormState {
        FormState {
            values: [("rating", self.rating.clone())].into_iter().collect(),
            errors,
        }
    }
}

fn required_text(raw: &str, field: &'static str, errors: &mut FieldErrors) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        errors.insert(field, REQUIRED_MESSAGE.to_string());
        return None;
    }
    if trimmed.chars().count() > MAX_TEXT_CHARS {
        errors.insert(
            field,
            format!("Field cannot be longer than {MAX_TEXT_CHARS} characters."),
        );
        return None;
    }
    Some(trimmed.to_string())
}

fn required_float(raw: &str, field: &'static str, errors: &mut FieldErrors) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        errors.insert(field, REQUIRED_MESSAGE.to_string());
        return None;
    }
    match trimmed.parse::<f64>() {
        Ok(value) if value.is_finite() => Some(value),
        _ => {
            errors.insert(field, INVALID_FLOAT_MESSAGE.to_string());
            None
        }
    }
}
