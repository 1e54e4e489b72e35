//! Book repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD APIs over the `books` table.
//! - Translate SQLite failures into semantic repository errors.
//!
//! # Invariants
//! - Every mutation runs in its own IMMEDIATE transaction; on error the
//!   transaction is dropped and rolled back, leaving prior state intact.
//! - Uniqueness of `name`/`author` is enforced by the schema, never by a
//!   read-then-write check here.
//! - Read paths reject invalid persisted rows instead of masking them.

use crate::db::migrations::{current_user_version, latest_version};
use crate::db::DbError;
use crate::model::book::{validate_rating, Book, BookId, BookValidationError, NewBook};
use once_cell::sync::Lazy;
use regex::Regex;
use rusqlite::{
    params, Connection, ErrorCode, OptionalExtension, Row, Transaction, TransactionBehavior,
};
use std::error::Error;
use std::fmt::{Display, Formatter};

const BOOK_SELECT_SQL: &str = "SELECT id, name, author, rating FROM books";
const BOOK_COLUMNS: [&str; 4] = ["id", "name", "author", "rating"];

static UNIQUE_FAILURE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"UNIQUE constraint failed: books\.(\w+)").expect("valid unique failure regex")
});

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for book persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(BookValidationError),
    Db(DbError),
    NotFound(BookId),
    /// A schema constraint rejected the write. `field` names the offending
    /// column when SQLite reports one.
    ConstraintViolation {
        field: Option<String>,
        message: String,
    },
    /// Connection schema version does not match this binary.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "book not found: {id}"),
            Self::ConstraintViolation {
                field: Some(field),
                ..
            } => write!(f, "a book with this {field} already exists"),
            Self::ConstraintViolation {
                field: None,
                message,
            } => write!(f, "constraint violation: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "book repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "book repository requires table `{table}`")
            }
            Self::MissingRequiredColumn { table, column } => write!(
                f,
                "book repository requires column `{column}` in table `{table}`"
            ),
            Self::InvalidData(message) => write!(f, "invalid persisted book data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<BookValidationError> for RepoError {
    fn from(value: BookValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        match value {
            DbError::Sqlite(err) => Self::from(err),
            other => Self::Db(other),
        }
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        match &value {
            rusqlite::Error::SqliteFailure(failure, message)
                if failure.code == ErrorCode::ConstraintViolation =>
            {
                let message = message.clone().unwrap_or_else(|| failure.to_string());
                let field = UNIQUE_FAILURE_RE
                    .captures(&message)
                    .and_then(|captures| captures.get(1))
                    .map(|column| column.as_str().to_string());
                Self::ConstraintViolation { field, message }
            }
            _ => Self::Db(DbError::Sqlite(value)),
        }
    }
}

/// Repository interface for book CRUD operations.
pub trait BookRepository {
    /// Returns every book in insertion order.
    fn list_books(&self) -> RepoResult<Vec<Book>>;
    fn get_book(&self, id: BookId) -> RepoResult<Option<Book>>;
    /// Inserts one book and returns its storage-assigned id.
    fn create_book(&self, book: &NewBook) -> RepoResult<BookId>;
    fn update_rating(&self, id: BookId, rating: f64) -> RepoResult<()>;
    fn delete_book(&self, id: BookId) -> RepoResult<()>;
    fn count_books(&self) -> RepoResult<u64>;
}

/// SQLite-backed book repository.
pub struct SqliteBookRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteBookRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_book_connection_ready(conn)?;
        Ok(Self { conn })
    }

    fn begin(&self) -> RepoResult<Transaction<'conn>> {
        Ok(Transaction::new_unchecked(
            self.conn,
            TransactionBehavior::Immediate,
        )?)
    }
}

impl BookRepository for SqliteBookRepository<'_> {
    fn list_books(&self) -> RepoResult<Vec<Book>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{BOOK_SELECT_SQL} ORDER BY id ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut books = Vec::new();
        while let Some(row) = rows.next()? {
            books.push(parse_book_row(row)?);
        }
        Ok(books)
    }

    fn get_book(&self, id: BookId) -> RepoResult<Option<Book>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{BOOK_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_book_row(row)?));
        }
        Ok(None)
    }

    fn create_book(&self, book: &NewBook) -> RepoResult<BookId> {
        book.validate()?;

        let tx = self.begin()?;
        tx.execute(
            "INSERT INTO books (name, author, rating) VALUES (?1, ?2, ?3);",
            params![book.name.as_str(), book.author.as_str(), book.rating],
        )?;
        let id = tx.last_insert_rowid();
        tx.commit()?;

        Ok(id)
    }

    fn update_rating(&self, id: BookId, rating: f64) -> RepoResult<()> {
        validate_rating(rating)?;

        let tx = self.begin()?;
        let changed = tx.execute(
            "UPDATE books SET rating = ?2 WHERE id = ?1;",
            params![id, rating],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }
        tx.commit()?;

        Ok(())
    }

    fn delete_book(&self, id: BookId) -> RepoResult<()> {
        let tx = self.begin()?;
        let changed = tx.execute("DELETE FROM books WHERE id = ?1;", [id])?;
        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }
        tx.commit()?;

        Ok(())
    }

    fn count_books(&self) -> RepoResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM books;", [], |row| row.get(0))?;
        u64::try_from(count)
            .map_err(|_| RepoError::InvalidData(format!("negative row count `{count}`")))
    }
}

fn parse_book_row(row: &Row<'_>) -> RepoResult<Book> {
    let book = Book {
        id: row.get("id")?,
        name: row.get("name")?,
        author: row.get("author")?,
        rating: row.get("rating")?,
    };
    book.validate()
        .map_err(|err| RepoError::InvalidData(format!("books.id={}: {err}", book.id)))?;
    Ok(book)
}

fn ensure_book_connection_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version = current_user_version(conn)?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    if !table_exists(conn, "books")? {
        return Err(RepoError::MissingRequiredTable("books"));
    }

    for column in BOOK_COLUMNS {
        if !table_has_column(conn, "books", column)? {
            return Err(RepoError::MissingRequiredColumn {
                table: "books",
                column,
            });
        }
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let name: Option<String> = conn
        .query_row(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?1;",
            [table],
            |row| row.get(0),
        )
        .optional()?;
    Ok(name.is_some())
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> RepoResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}
