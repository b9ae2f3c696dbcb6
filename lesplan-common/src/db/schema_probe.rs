//! Schema capability probing
//!
//! Some deployments run against a `programs` table that predates the
//! optional columns (`price_cents`, `registration_form_id`). Instead of
//! attempting a write and reacting to the failure, the deployed column set
//! is introspected once at startup via `PRAGMA table_info` and cached; the
//! write path consults the cached capabilities and omits fields whose
//! columns are not present.

use crate::Result;
use sqlx::{Row, SqlitePool};
use std::collections::HashSet;
use tracing::{info, warn};

/// Columns of `programs` that are allowed to be missing from a deployment
pub const OPTIONAL_PROGRAM_COLUMNS: &[&str] = &["price_cents", "registration_form_id"];

/// Actual column from database introspection (PRAGMA table_info result)
#[derive(Debug, Clone)]
pub struct ActualColumn {
    /// Column ID (position in table)
    pub cid: i32,
    pub name: String,
    pub type_name: String,
    pub not_null: bool,
    pub pk: bool,
}

/// Read actual columns from a database table using PRAGMA table_info.
///
/// Returns columns in database order (by cid).
pub async fn introspect_table(pool: &SqlitePool, table_name: &str) -> Result<Vec<ActualColumn>> {
    let query = format!("PRAGMA table_info({})", table_name);
    let rows = sqlx::query(&query).fetch_all(pool).await?;

    let mut columns: Vec<ActualColumn> = rows
        .iter()
        .map(|row| ActualColumn {
            cid: row.get("cid"),
            name: row.get("name"),
            type_name: row.get("type"),
            not_null: row.get::<i32, _>("notnull") != 0,
            pk: row.get::<i32, _>("pk") != 0,
        })
        .collect();

    columns.sort_by_key(|c| c.cid);

    Ok(columns)
}

/// Check if a table exists
pub async fn table_exists(pool: &SqlitePool, table_name: &str) -> Result<bool> {
    let exists: bool = sqlx::query_scalar(
        r#"
        SELECT EXISTS(
            SELECT 1 FROM sqlite_master
            WHERE type='table' AND name = ?
        )
        "#,
    )
    .bind(table_name)
    .fetch_one(pool)
    .await?;

    Ok(exists)
}

/// Cached view of which `programs` columns the deployed schema carries.
///
/// Probed once at startup and stored in app state; cheap to clone.
#[derive(Debug, Clone)]
pub struct SchemaCapabilities {
    program_columns: HashSet<String>,
}

impl SchemaCapabilities {
    /// Probe the deployed `programs` schema
    pub async fn probe(pool: &SqlitePool) -> Result<Self> {
        let columns = introspect_table(pool, "programs").await?;
        let program_columns: HashSet<String> = columns.into_iter().map(|c| c.name).collect();

        for optional in OPTIONAL_PROGRAM_COLUMNS {
            if !program_columns.contains(*optional) {
                warn!(
                    "programs.{} not deployed - values for this field will be dropped",
                    optional
                );
            }
        }
        info!(
            "Schema capabilities: programs has {} columns",
            program_columns.len()
        );

        Ok(Self { program_columns })
    }

    pub fn has_program_column(&self, name: &str) -> bool {
        self.program_columns.contains(name)
    }
}
