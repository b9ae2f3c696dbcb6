//! Program row operations
//!
//! Writes are capability-aware: optional columns absent from the deployed
//! schema are omitted from the generated statement, and any value supplied
//! for such a column is dropped with a warning.

use anyhow::Result;
use lesplan_common::db::models::{Program, ProgramKind};
use lesplan_common::db::schema_probe::SchemaCapabilities;
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use tracing::warn;
use uuid::Uuid;

/// Optional columns in declaration order, paired with whether the program
/// carries a value for them
fn optional_columns(program: &Program) -> [(&'static str, bool); 2] {
    [
        ("price_cents", program.price_cents.is_some()),
        ("registration_form_id", program.registration_form_id.is_some()),
    ]
}

/// Insert a program row
pub async fn insert_program(
    pool: &SqlitePool,
    caps: &SchemaCapabilities,
    program: &Program,
) -> Result<()> {
    let mut columns = vec![
        "id",
        "organization_id",
        "kind",
        "title",
        "description",
        "term_period_id",
        "capacity",
        "waitlist_enabled",
        "visible",
        "paid",
        "created_by",
    ];

    for (name, has_value) in optional_columns(program) {
        if caps.has_program_column(name) {
            columns.push(name);
        } else if has_value {
            warn!(
                "programs.{} not deployed - dropping supplied value for program {}",
                name, program.id
            );
        }
    }

    let placeholders = vec!["?"; columns.len()].join(", ");
    let sql = format!(
        "INSERT INTO programs ({}) VALUES ({})",
        columns.join(", "),
        placeholders
    );

    let mut query = sqlx::query(&sql)
        .bind(program.id.to_string())
        .bind(program.organization_id.to_string())
        .bind(program.kind.as_str())
        .bind(&program.title)
        .bind(&program.description)
        .bind(program.term_period_id.map(|id| id.to_string()))
        .bind(program.capacity)
        .bind(program.waitlist_enabled)
        .bind(program.visible)
        .bind(program.paid)
        .bind(program.created_by.to_string());

    if caps.has_program_column("price_cents") {
        query = query.bind(program.price_cents);
    }
    if caps.has_program_column("registration_form_id") {
        query = query.bind(program.registration_form_id.map(|id| id.to_string()));
    }

    query.execute(pool).await?;

    Ok(())
}

/// Update a program row in place
pub async fn update_program(
    pool: &SqlitePool,
    caps: &SchemaCapabilities,
    program: &Program,
) -> Result<()> {
    let mut assignments = vec![
        "kind = ?",
        "title = ?",
        "description = ?",
        "term_period_id = ?",
        "capacity = ?",
        "waitlist_enabled = ?",
        "visible = ?",
        "paid = ?",
        "updated_at = CURRENT_TIMESTAMP",
    ];

    for (name, has_value) in optional_columns(program) {
        if caps.has_program_column(name) {
            match name {
                "price_cents" => assignments.push("price_cents = ?"),
                _ => assignments.push("registration_form_id = ?"),
            }
        } else if has_value {
            warn!(
                "programs.{} not deployed - dropping supplied value for program {}",
                name, program.id
            );
        }
    }

    let sql = format!(
        "UPDATE programs SET {} WHERE id = ?",
        assignments.join(", ")
    );

    let mut query = sqlx::query(&sql)
        .bind(program.kind.as_str())
        .bind(&program.title)
        .bind(&program.description)
        .bind(program.term_period_id.map(|id| id.to_string()))
        .bind(program.capacity)
        .bind(program.waitlist_enabled)
        .bind(program.visible)
        .bind(program.paid);

    if caps.has_program_column("price_cents") {
        query = query.bind(program.price_cents);
    }
    if caps.has_program_column("registration_form_id") {
        query = query.bind(program.registration_form_id.map(|id| id.to_string()));
    }

    query.bind(program.id.to_string()).execute(pool).await?;

    Ok(())
}

/// Load a program by id
pub async fn load_program(pool: &SqlitePool, program_id: Uuid) -> Result<Option<Program>> {
    let row = sqlx::query("SELECT * FROM programs WHERE id = ?")
        .bind(program_id.to_string())
        .fetch_optional(pool)
        .await?;

    match row {
        Some(row) => Ok(Some(program_from_row(&row)?)),
        None => Ok(None),
    }
}

/// Delete a program row (used for compensation when a detail insert fails)
pub async fn delete_program(pool: &SqlitePool, program_id: Uuid) -> Result<()> {
    sqlx::query("DELETE FROM programs WHERE id = ?")
        .bind(program_id.to_string())
        .execute(pool)
        .await?;

    Ok(())
}

fn program_from_row(row: &SqliteRow) -> Result<Program> {
    let id: String = row.get("id");
    let organization_id: String = row.get("organization_id");
    let kind: String = row.get("kind");
    let created_by: String = row.get("created_by");
    let term_period_id: Option<String> = row.get("term_period_id");

    // Optional columns may be absent on degraded schemas
    let price_cents: Option<i64> = row.try_get("price_cents").unwrap_or(None);
    let registration_form_id: Option<String> =
        row.try_get("registration_form_id").unwrap_or(None);

    Ok(Program {
        id: Uuid::parse_str(&id)?,
        organization_id: Uuid::parse_str(&organization_id)?,
        kind: ProgramKind::parse(&kind)
            .ok_or_else(|| anyhow::anyhow!("unknown program kind '{}'", kind))?,
        title: row.get("title"),
        description: row.get("description"),
        term_period_id: term_period_id.map(|s| Uuid::parse_str(&s)).transpose()?,
        capacity: row.get("capacity"),
        waitlist_enabled: row.get::<i64, _>("waitlist_enabled") != 0,
        visible: row.get::<i64, _>("visible") != 0,
        paid: row.get::<i64, _>("paid") != 0,
        price_cents,
        registration_form_id: registration_form_id
            .map(|s| Uuid::parse_str(&s))
            .transpose()?,
        created_by: Uuid::parse_str(&created_by)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use lesplan_common::db::init::create_programs_table;

    fn sample_program() -> Program {
        Program {
            id: Uuid::new_v4(),
            organization_id: Uuid::new_v4(),
            kind: ProgramKind::Recurring,
            title: "Judo beginners".to_string(),
            description: Some("Weekly judo for beginners".to_string()),
            term_period_id: None,
            capacity: Some(20),
            waitlist_enabled: true,
            visible: true,
            paid: true,
            price_cents: Some(1500),
            registration_form_id: Some(Uuid::new_v4()),
            created_by: Uuid::new_v4(),
        }
    }

    #[tokio::test]
    async fn insert_and_load_roundtrip() {
        let pool = SqlitePool::connect("sqlite::memory:").await.unwrap();
        create_programs_table(&pool).await.unwrap();
        let caps = SchemaCapabilities::probe(&pool).await.unwrap();

        let program = sample_program();
        insert_program(&pool, &caps, &program).await.unwrap();

        let loaded = load_program(&pool, program.id).await.unwrap().unwrap();
        assert_eq!(loaded.title, program.title);
        assert_eq!(loaded.kind, ProgramKind::Recurring);
        assert_eq!(loaded.price_cents, Some(1500));
        assert_eq!(loaded.registration_form_id, program.registration_form_id);
        assert!(loaded.waitlist_enabled);
    }

    #[tokio::test]
    async fn insert_against_degraded_schema_drops_optional_fields() {
        let pool = SqlitePool::connect("sqlite::memory:").await.unwrap();
        sqlx::query(
            r#"
            CREATE TABLE programs (
                id TEXT PRIMARY KEY,
                organization_id TEXT NOT NULL,
                kind TEXT NOT NULL,
                title TEXT NOT NULL,
                description TEXT,
                term_period_id TEXT,
                capacity INTEGER,
                waitlist_enabled INTEGER NOT NULL DEFAULT 0,
                visible INTEGER NOT NULL DEFAULT 1,
                paid INTEGER NOT NULL DEFAULT 0,
                created_by TEXT NOT NULL,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            "#,
        )
        .execute(&pool)
        .await
        .unwrap();
        let caps = SchemaCapabilities::probe(&pool).await.unwrap();

        // A program carrying values for the missing columns still inserts
        let program = sample_program();
        insert_program(&pool, &caps, &program).await.unwrap();

        let loaded = load_program(&pool, program.id).await.unwrap().unwrap();
        assert_eq!(loaded.title, program.title);
        assert_eq!(loaded.price_cents, None);
        assert_eq!(loaded.registration_form_id, None);
    }

    #[tokio::test]
    async fn update_replaces_fields_in_place() {
        let pool = SqlitePool::connect("sqlite::memory:").await.unwrap();
        create_programs_table(&pool).await.unwrap();
        let caps = SchemaCapabilities::probe(&pool).await.unwrap();

        let mut program = sample_program();
        insert_program(&pool, &caps, &program).await.unwrap();

        program.title = "Judo advanced".to_string();
        program.capacity = Some(12);
        program.price_cents = Some(2000);
        update_program(&pool, &caps, &program).await.unwrap();

        let loaded = load_program(&pool, program.id).await.unwrap().unwrap();
        assert_eq!(loaded.title, "Judo advanced");
        assert_eq!(loaded.capacity, Some(12));
        assert_eq!(loaded.price_cents, Some(2000));
    }

    #[tokio::test]
    async fn delete_removes_row() {
        let pool = SqlitePool::connect("sqlite::memory:").await.unwrap();
        create_programs_table(&pool).await.unwrap();
        let caps = SchemaCapabilities::probe(&pool).await.unwrap();

        let program = sample_program();
        insert_program(&pool, &caps, &program).await.unwrap();
        delete_program(&pool, program.id).await.unwrap();

        assert!(load_program(&pool, program.id).await.unwrap().is_none());
    }
}
