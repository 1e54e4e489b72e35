//! HTTP surface: route handlers and request middleware.

pub(crate) mod handlers;
pub(crate) mod request_log;
