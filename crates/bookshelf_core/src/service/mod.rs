//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Keep the web layer decoupled from storage details.

pub mod book_service;
pub mod book_store;
