//! One-shot notifications carried across a redirect.
//!
//! # Invariants
//! - A flash is returned by `take` at most once.
//! - At most `FLASH_CAPACITY` flashes are pending; the oldest is evicted.
//! - Tokens are random v4 UUIDs; one token reveals nothing about another.

use axum::http::header::COOKIE;
use axum::http::HeaderMap;
use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};
use uuid::Uuid;

pub const FLASH_COOKIE: &str = "bookshelf_flash";
pub const FLASH_CAPACITY: usize = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlashLevel {
    Success,
    Error,
}

impl FlashLevel {
    /// Bootstrap alert modifier.
    pub fn css_class(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "danger",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Flash {
    pub level: FlashLevel,
    pub message: String,
}

impl Flash {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: FlashLevel::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: FlashLevel::Error,
            message: message.into(),
        }
    }
}

/// Server-side queue of pending flashes keyed by an opaque cookie token.
pub struct FlashStore {
    pending: Mutex<VecDeque<(String, Flash)>>,
    capacity: usize,
}

impl Default for FlashStore {
    fn default() -> Self {
        Self::with_capacity(FLASH_CAPACITY)
    }
}

impl FlashStore {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            pending: Mutex::new(VecDeque::new()),
            capacity: capacity.max(1),
        }
    }

    /// Stores `flash` and returns the token that retrieves it.
    pub fn put(&self, flash: Flash) -> String {
        let token = Uuid::new_v4().simple().to_string();
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        while pending.len() >= self.capacity {
            pending.pop_front();
        }
        pending.push_back((token.clone(), flash));
        token
    }

    /// Removes and returns the flash stored under `token`.
    pub fn take(&self, token: &str) -> Option<Flash> {
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        let index = pending.iter().position(|(key, _)| key == token)?;
        pending.remove(index).map(|(_, flash)| flash)
    }

    pub fn len(&self) -> usize {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// `Set-Cookie` value pointing the next request at `token`.
pub fn set_cookie(token: &str) -> String {
    format!("{FLASH_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax")
}

/// `Set-Cookie` value that expires the flash cookie.
pub fn clear_cookie() -> String {
    format!("{FLASH_COOKIE}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")
}

/// Extracts the flash token from the request `Cookie` headers.
pub fn token_from_headers(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == FLASH_COOKIE)
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
