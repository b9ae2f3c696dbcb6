//! # Lesplan Common Library
//!
//! Shared code for lesplan services including:
//! - Database models and initialization
//! - Schema capability probing
//! - Domain event types (DomainEvent enum)
//! - Configuration loading
//! - Common error type

pub mod config;
pub mod db;
pub mod error;
pub mod events;

pub use error::{Error, Result};
