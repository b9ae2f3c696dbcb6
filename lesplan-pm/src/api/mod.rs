//! HTTP API modules

pub mod health;
pub mod identity;
pub mod programs;
