/// First-run admin account
///
/// A fresh database has roles and actions from the seed migration but no
/// users. When `ADMIN_USERNAME` and `ADMIN_PASSWORD` are set and the users
/// table is empty, startup creates that user with the `admin` role.

use anyhow::Context;
use serde_json::json;
use sqlx::PgPool;
use xfinance_shared::{
    auth::{authorization::ADMIN_ROLE, password},
    models::{
        log::{AuditLog, NewLog},
        role::Role,
        user::{CreateUser, User},
    },
};

use crate::config::AdminConfig;

/// What `ensure_admin` did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BootstrapOutcome {
    /// No admin configured
    NotConfigured,

    /// Users already exist
    Skipped,

    Created { username: String },
}

/// Creates the configured admin if there are no users yet
pub async fn ensure_admin(pool: &PgPool, admin: Option<&AdminConfig>) -> anyhow::Result<BootstrapOutcome> {
    let Some(admin) = admin else {
        return Ok(BootstrapOutcome::NotConfigured);
    };

    if User::count(pool).await? > 0 {
        return Ok(BootstrapOutcome::Skipped);
    }

    password::validate_password_strength(&admin.password).context("ADMIN_PASSWORD is too weak")?;
    let password_hash = password::hash_password(&admin.password)?;

    let user = User::create(
        pool,
        CreateUser {
            username: admin.username.clone(),
            email: admin.email.clone(),
            password_hash,
            full_name: Some("Administrator".to_string()),
        },
    )
    .await
    .context("Failed to create admin user")?;

    let role = Role::find_by_name(pool, ADMIN_ROLE)
        .await?
        .context("Admin role is missing; were the migrations run?")?;
    User::set_roles(pool, user.id, &[role.id]).await?;

    AuditLog::record_quietly(
        pool,
        NewLog::info("system.bootstrap_admin", format!("Created admin user {}", user.username))
            .with_metadata(json!({ "user_id": user.id })),
    )
    .await;

    Ok(BootstrapOutcome::Created {
        username: user.username,
    })
}
