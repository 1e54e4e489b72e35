//! Shared storage handle for long-running callers.
//!
//! # Responsibility
//! - Own the single SQLite connection for the process lifetime.
//! - Hand out a `BookService` scoped to one call under the connection lock.
//!
//! # Invariants
//! - Schema exists before `open` returns.
//! - The connection is released only by `close`, never implicitly mid-call.
//! - A panic inside one call does not disable the store: the lock is
//!   recovered and the interrupted transaction has already rolled back.

use crate::db::{open_db, open_db_in_memory, DbError};
use crate::repo::book_repo::{RepoError, RepoResult, SqliteBookRepository};
use crate::service::book_service::BookService;
use log::{error, info, warn};
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug)]
pub enum StoreError {
    Db(DbError),
    Repo(RepoError),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Repo(RepoError::NotFound(_)))
    }
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Repo(err) => Some(err),
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<RepoError> for StoreError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Explicitly opened, explicitly closed book storage.
pub struct BookStore {
    conn: Mutex<Connection>,
}

impl BookStore {
    /// Opens the database file, creating the schema when absent.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        Ok(Self::from_connection(open_db(path)?))
    }

    pub fn open_in_memory() -> StoreResult<Self> {
        Ok(Self::from_connection(open_db_in_memory()?))
    }

    fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    /// Runs `f` against a service bound to the locked connection.
    ///
    /// The lock is held for the whole call, so each call observes and
    /// commits its own transaction before another caller proceeds.
    pub fn with_service<T>(
        &self,
        f: impl FnOnce(&BookService<SqliteBookRepository<'_>>) -> RepoResult<T>,
    ) -> StoreResult<T> {
        let conn = self.lock();
        let service = BookService::new(SqliteBookRepository::try_new(&conn)?);
        Ok(f(&service)?)
    }

    fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|poisoned| {
            warn!("event=db_lock module=db status=recovered reason=poisoned");
            poisoned.into_inner()
        })
    }

    /// Releases the connection, surfacing any close failure.
    pub fn close(self) -> StoreResult<()> {
        let conn = self.conn.into_inner().unwrap_or_else(PoisonError::into_inner);
        match conn.close() {
            Ok(()) => {
                info!("event=db_close module=db status=ok");
                Ok(())
            }
            Err((_, err)) => {
                error!("event=db_close module=db status=error error={err}");
                Err(StoreError::Db(err.into()))
            }
        }
    }
}
