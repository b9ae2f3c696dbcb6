//! Database layer: initialization, models, schema capability probing

pub mod init;
pub mod models;
pub mod schema_probe;
