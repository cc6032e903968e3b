use anyhow::{Context, Result};
use contracts::domain::a001_warehouse::aggregate::WarehouseId;
use contracts::domain::a002_client::aggregate::ClientId;
use contracts::domain::common::AggregateId;
use contracts::system::auth::RoleTag;
use contracts::system::users::User;
use sea_orm::{ConnectionTrait, DatabaseBackend, DatabaseConnection, QueryResult, Statement};

const USER_COLUMNS: &str = "id, username, email, full_name, is_active, warehouse_id, client_id, \
                            created_at, updated_at, last_login_at, created_by";

fn user_from_row(row: &QueryResult) -> Result<User> {
    let warehouse_id: Option<String> = row.try_get("", "warehouse_id")?;
    let client_id: Option<String> = row.try_get("", "client_id")?;
    Ok(User {
        id: row.try_get("", "id")?,
        username: row.try_get("", "username")?,
        email: row.try_get("", "email")?,
        full_name: row.try_get("", "full_name")?,
        is_active: row.try_get::<i32>("", "is_active")? != 0,
        roles: Vec::new(),
        warehouse_id: warehouse_id
            .map(|s| WarehouseId::from_string(&s))
            .transpose()
            .map_err(anyhow::Error::msg)?,
        client_id: client_id
            .map(|s| ClientId::from_string(&s))
            .transpose()
            .map_err(anyhow::Error::msg)?,
        created_at: row.try_get("", "created_at")?,
        updated_at: row.try_get("", "updated_at")?,
        last_login_at: row.try_get("", "last_login_at")?,
        created_by: row.try_get("", "created_by")?,
    })
}

/// Load one user row and its roles
async fn fetch_one(db: &DatabaseConnection, filter: &str, value: &str) -> Result<Option<User>> {
    let result = db
        .query_one(Statement::from_sql_and_values(
            DatabaseBackend::Sqlite,
            &format!("SELECT {} FROM sys_users WHERE {} = ?", USER_COLUMNS, filter),
            [value.into()],
        ))
        .await?;

    match result {
        Some(row) => {
            let mut user = user_from_row(&row)?;
            user.roles = get_roles(db, &user.id).await?;
            Ok(Some(user))
        }
        None => Ok(None),
    }
}

/// Create user with password hash
pub async fn create_with_password(db: &DatabaseConnection, user: &User, password_hash: &str) -> Result<()> {
    db.execute(Statement::from_sql_and_values(
        DatabaseBackend::Sqlite,
        "INSERT INTO sys_users (id, username, email, password_hash, full_name, is_active, warehouse_id, client_id, created_at, updated_at, last_login_at, created_by)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        [
            user.id.clone().into(),
            user.username.clone().into(),
            user.email.clone().into(),
            password_hash.to_string().into(),
            user.full_name.clone().into(),
            (if user.is_active { 1 } else { 0 }).into(),
            user.warehouse_id.map(|w| w.as_string()).into(),
            user.client_id.map(|c| c.as_string()).into(),
            user.created_at.clone().into(),
            user.updated_at.clone().into(),
            user.last_login_at.clone().into(),
            user.created_by.clone().into(),
        ],
    ))
    .await
    .context("Failed to insert user")?;

    Ok(())
}

/// Get user by ID
pub async fn get_by_id(db: &DatabaseConnection, id: &str) -> Result<Option<User>> {
    fetch_one(db, "id", id).await
}

/// Get user by username
pub async fn get_by_username(db: &DatabaseConnection, username: &str) -> Result<Option<User>> {
    fetch_one(db, "username", username).await
}

/// Get password hash for user
pub async fn get_password_hash(db: &DatabaseConnection, user_id: &str) -> Result<Option<String>> {
    let result = db
        .query_one(Statement::from_sql_and_values(
            DatabaseBackend::Sqlite,
            "SELECT password_hash FROM sys_users WHERE id = ?",
            [user_id.into()],
        ))
        .await?;

    match result {
        Some(row) => {
            let hash: String = row.try_get("", "password_hash")?;
            Ok(Some(hash))
        }
        None => Ok(None),
    }
}

/// List all users
pub async fn list_all(db: &DatabaseConnection) -> Result<Vec<User>> {
    let rows = db
        .query_all(Statement::from_string(
            DatabaseBackend::Sqlite,
            format!("SELECT {} FROM sys_users ORDER BY created_at DESC", USER_COLUMNS),
        ))
        .await?;

    let mut users = Vec::new();
    for row in rows {
        let mut user = user_from_row(&row)?;
        user.roles = get_roles(db, &user.id).await?;
        users.push(user);
    }

    Ok(users)
}

/// Update profile fields
pub async fn update(db: &DatabaseConnection, user: &User) -> Result<()> {
    db.execute(Statement::from_sql_and_values(
        DatabaseBackend::Sqlite,
        "UPDATE sys_users
         SET email = ?, full_name = ?, is_active = ?, updated_at = ?
         WHERE id = ?",
        [
            user.email.clone().into(),
            user.full_name.clone().into(),
            (if user.is_active { 1 } else { 0 }).into(),
            user.updated_at.clone().into(),
            user.id.clone().into(),
        ],
    ))
    .await
    .context("Failed to update user")?;

    Ok(())
}

/// Delete user and its role rows (hard delete)
pub async fn delete(db: &DatabaseConnection, id: &str) -> Result<bool> {
    db.execute(Statement::from_sql_and_values(
        DatabaseBackend::Sqlite,
        "DELETE FROM sys_user_roles WHERE user_id = ?",
        [id.into()],
    ))
    .await
    .context("Failed to delete user roles")?;

    let result = db
        .execute(Statement::from_sql_and_values(
            DatabaseBackend::Sqlite,
            "DELETE FROM sys_users WHERE id = ?",
            [id.into()],
        ))
        .await
        .context("Failed to delete user")?;

    Ok(result.rows_affected() > 0)
}

/// Update last login timestamp
pub async fn update_last_login(db: &DatabaseConnection, id: &str) -> Result<()> {
    let now = chrono::Utc::now().to_rfc3339();

    db.execute(Statement::from_sql_and_values(
        DatabaseBackend::Sqlite,
        "UPDATE sys_users SET last_login_at = ? WHERE id = ?",
        [now.into(), id.to_string().into()],
    ))
    .await
    .context("Failed to update last login")?;

    Ok(())
}

/// Count total users
pub async fn count_users(db: &DatabaseConnection) -> Result<usize> {
    let result = db
        .query_one(Statement::from_string(
            DatabaseBackend::Sqlite,
            "SELECT COUNT(*) as count FROM sys_users".to_string(),
        ))
        .await?;

    match result {
        Some(row) => {
            let count: i64 = row.try_get("", "count")?;
            Ok(count as usize)
        }
        None => Ok(0),
    }
}

/// Count accounts holding the admin role
pub async fn count_admins(db: &DatabaseConnection) -> Result<usize> {
    let result = db
        .query_one(Statement::from_sql_and_values(
            DatabaseBackend::Sqlite,
            "SELECT COUNT(*) as count FROM sys_user_roles WHERE role = ?",
            [RoleTag::Admin.as_str().into()],
        ))
        .await?;

    match result {
        Some(row) => {
            let count: i64 = row.try_get("", "count")?;
            Ok(count as usize)
        }
        None => Ok(0),
    }
}

/// Update user password
pub async fn update_password(db: &DatabaseConnection, id: &str, password_hash: &str) -> Result<()> {
    db.execute(Statement::from_sql_and_values(
        DatabaseBackend::Sqlite,
        "UPDATE sys_users SET password_hash = ?, updated_at = ? WHERE id = ?",
        [
            password_hash.to_string().into(),
            chrono::Utc::now().to_rfc3339().into(),
            id.to_string().into(),
        ],
    ))
    .await
    .context("Failed to update password")?;

    Ok(())
}

/// Roles held by an account; unknown tags in the table are skipped
pub async fn get_roles(db: &DatabaseConnection, user_id: &str) -> Result<Vec<RoleTag>> {
    let rows = db
        .query_all(Statement::from_sql_and_values(
            DatabaseBackend::Sqlite,
            "SELECT role FROM sys_user_roles WHERE user_id = ? ORDER BY role",
            [user_id.into()],
        ))
        .await?;

    let mut roles = Vec::new();
    for row in rows {
        let tag: String = row.try_get("", "role")?;
        match RoleTag::parse(&tag) {
            Some(role) => roles.push(role),
            None => tracing::warn!("Ignoring unknown role '{}' of user {}", tag, user_id),
        }
    }
    Ok(roles)
}

pub async fn assign_role(db: &DatabaseConnection, user_id: &str, role: RoleTag) -> Result<()> {
    db.execute(Statement::from_sql_and_values(
        DatabaseBackend::Sqlite,
        "INSERT OR IGNORE INTO sys_user_roles (user_id, role, created_at) VALUES (?, ?, ?)",
        [
            user_id.into(),
            role.as_str().into(),
            chrono::Utc::now().to_rfc3339().into(),
        ],
    ))
    .await
    .context("Failed to assign role")?;

    Ok(())
}
