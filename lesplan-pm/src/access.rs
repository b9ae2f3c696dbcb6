//! Access policy for program management
//!
//! A principal may manage an organization's programs when any one of three
//! signals holds. The signals are checked in a fixed order and the first
//! match wins; callers never need to know which one fired, but the signal is
//! returned for logging.

use anyhow::Result;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

/// Membership roles that grant program management
pub const MEMBER_ROLE_ALLOW_LIST: &[&str] = &["admin", "manager"];

/// Which authorization signal matched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessSignal {
    /// Platform-level admin role scoped to the organization
    AdminRole,
    /// Principal owns the organization
    OrgOwner,
    /// Organization membership with an allow-listed role
    Membership,
}

/// Evaluate whether `principal` may manage programs of `organization_id`.
///
/// Returns the first matching signal, or `None` when no signal holds.
pub async fn evaluate(
    pool: &SqlitePool,
    principal: Uuid,
    organization_id: Uuid,
) -> Result<Option<AccessSignal>> {
    let principal_str = principal.to_string();
    let org_str = organization_id.to_string();

    let admin: Option<i64> = sqlx::query_scalar(
        "SELECT 1 FROM admin_roles WHERE user_id = ? AND organization_id = ?",
    )
    .bind(&principal_str)
    .bind(&org_str)
    .fetch_optional(pool)
    .await?;
    if admin.is_some() {
        debug!(%principal, %organization_id, "access granted via admin role");
        return Ok(Some(AccessSignal::AdminRole));
    }

    let owner: Option<i64> =
        sqlx::query_scalar("SELECT 1 FROM organizations WHERE id = ? AND owner_id = ?")
            .bind(&org_str)
            .bind(&principal_str)
            .fetch_optional(pool)
            .await?;
    if owner.is_some() {
        debug!(%principal, %organization_id, "access granted via ownership");
        return Ok(Some(AccessSignal::OrgOwner));
    }

    let member: Option<i64> = sqlx::query_scalar(
        r#"
        SELECT 1 FROM organization_members
        WHERE organization_id = ? AND user_id = ? AND role IN (?, ?)
        "#,
    )
    .bind(&org_str)
    .bind(&principal_str)
    .bind(MEMBER_ROLE_ALLOW_LIST[0])
    .bind(MEMBER_ROLE_ALLOW_LIST[1])
    .fetch_optional(pool)
    .await?;
    if member.is_some() {
        debug!(%principal, %organization_id, "access granted via membership role");
        return Ok(Some(AccessSignal::Membership));
    }

    Ok(None)
}
