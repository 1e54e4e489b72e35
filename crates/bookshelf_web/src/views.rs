//! Server-side HTML rendering.
//!
//! Every interpolated value goes through `escape_html`.

use crate::flash::Flash;
use bookshelf_core::{Book, FormState};
use std::fmt::Write;

const BOOTSTRAP_CSS: &str =
    "https://cdn.jsdelivr.net/npm/bootstrap@5.3.3/dist/css/bootstrap.min.css";

pub fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            other => escaped.push(other),
        }
    }
    escaped
}

fn layout(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n\
<title>{}</title>\n<link rel=\"stylesheet\" href=\"{BOOTSTRAP_CSS}\">\n</head>\n\
<body>\n<div class=\"container py-4\">\n{body}</div>\n</body>\n</html>\n",
        escape_html(title)
    )
}

/// Book list page, optionally topped by a pending flash.
pub fn index_page(books: &[Book], flash: Option<&Flash>) -> String {
    let mut body = String::from("<h1>My Library</h1>\n");
    if let Some(flash) = flash {
        let _ = writeln!(
            body,
            "<div class=\"alert alert-{}\" role=\"alert\">{}</div>",
            flash.level.css_class(),
            escape_html(&flash.message)
        );
    }

    if books.is_empty() {
        body.push_str("<p>Library is empty.</p>\n");
    } else {
        body.push_str("<ul class=\"list-group mb-3\">\n");
        for book in books {
            let _ = writeln!(
                body,
                "<li class=\"list-group-item\">\
<a class=\"btn btn-sm btn-outline-danger me-2\" href=\"/delete/{id}\">Delete</a>\
{name} - {author} - {rating}/10 \
<a class=\"ms-2\" href=\"/edit_rating/{id}\">Edit Rating</a></li>",
                id = book.id,
                name = escape_html(&book.name),
                author = escape_html(&book.author),
                rating = book.rating,
            );
        }
        body.push_str("</ul>\n");
    }

    body.push_str("<a class=\"btn btn-primary\" href=\"/add\">Add New Book</a>\n");
    layout("My Library", &body)
}

/// Add-book form; `form` carries entered values and errors on re-render.
pub fn add_page(form: &FormState) -> String {
    let mut body =
        String::from("<h1>Add Book</h1>\n<form method=\"POST\" action=\"/add\" novalidate>\n");
    text_field(&mut body, form, "name", "Book Name");
    text_field(&mut body, form, "author", "Book Author");
    text_field(&mut body, form, "rating", "Rating");
    body.push_str("<button type=\"submit\" class=\"btn btn-primary\">Submit</button>\n</form>\n");
    layout("Add Book", &body)
}

/// Edit-rating form for `book`.
pub fn edit_rating_page(book: &Book, form: &FormState) -> String {
    let mut body = String::new();
    let _ = writeln!(body, "<h1>Edit Rating</h1>");
    let _ = writeln!(
        body,
        "<p>Book Name: {}</p>\n<p>Current Rating: {}</p>",
        escape_html(&book.name),
        book.rating
    );
    let _ = writeln!(
        body,
        "<form method=\"POST\" action=\"/edit_rating/{}\" novalidate>",
        book.id
    );
    text_field(&mut body, form, "rating", "Rating");
    body.push_str(
        "<button type=\"submit\" class=\"btn btn-primary\">Update Rating</button>\n</form>\n",
    );
    layout("Edit Rating", &body)
}

pub fn not_found_page() -> String {
    layout(
        "404 Not Found",
        "<h1>Not Found</h1>\n<p>The requested URL was not found on the server.</p>\n\
<a href=\"/\">Back to library</a>\n",
    )
}

pub fn error_page(message: &str) -> String {
    layout(
        "500 Internal Server Error",
        &format!(
            "<h1>Internal Server Error</h1>\n<p>{}</p>\n<a href=\"/\">Back to library</a>\n",
            escape_html(message)
        ),
    )
}

fn text_field(body: &mut String, form: &FormState, field: &str, label: &str) {
    let error = form.error(field);
    let invalid = if error.is_some() { " is-invalid" } else { "" };
    let _ = writeln!(
        body,
        "<div class=\"mb-3\">\n<label class=\"form-label\" for=\"{field}\">{label}</label>\n\
<input class=\"form-control{invalid}\" type=\"text\" id=\"{field}\" name=\"{field}\" value=\"{}\">",
        escape_html(form.value(field))
    );
    if let Some(error) = error {
        let _ = writeln!(
            body,
            "<div class=\"invalid-feedback\">{}</div>",
            escape_html(error)
        );
    }
    body.push_str("</div>\n");
}
