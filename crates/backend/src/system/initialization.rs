use anyhow::Result;
use chrono::Utc;
use contracts::system::auth::RoleTag;
use contracts::system::users::User;
use sea_orm::DatabaseConnection;

use crate::system::auth::password;
use crate::system::permissions;
use crate::system::users::repository;

const DEFAULT_ADMIN_USERNAME: &str = "admin";
const DEFAULT_ADMIN_PASSWORD: &str = "admin";

/// Seed the role permission table with the defaults of every role
pub async fn seed_permissions(db: &DatabaseConnection) -> Result<()> {
    let inserted = permissions::repository::seed_defaults(db).await?;
    if inserted > 0 {
        tracing::info!("Seeded {} role permission rows", inserted);
    }
    Ok(())
}

/// Ensure admin user exists (create if table is empty).
///
/// The default password is shorter than the provisioning rules allow; it is
/// written straight through the repository and must be changed after the
/// first login.
pub async fn ensure_admin_user_exists(db: &DatabaseConnection) -> Result<Option<String>> {
    if repository::count_users(db).await? > 0 {
        return Ok(None);
    }

    tracing::info!("No users found. Creating default admin user...");

    let now = Utc::now().to_rfc3339();
    let admin = User {
        id: uuid::Uuid::new_v4().to_string(),
        username: DEFAULT_ADMIN_USERNAME.to_string(),
        email: None,
        full_name: Some("Administrator".to_string()),
        is_active: true,
        roles: Vec::new(),
        warehouse_id: None,
        client_id: None,
        created_at: now.clone(),
        updated_at: now,
        last_login_at: None,
        created_by: None,
    };
    let hash = password::hash_password(DEFAULT_ADMIN_PASSWORD)?;
    repository::create_with_password(db, &admin, &hash).await?;
    repository::assign_role(db, &admin.id, RoleTag::Admin).await?;

    tracing::warn!("Default admin user created");
    tracing::warn!("  Username: {}", DEFAULT_ADMIN_USERNAME);
    tracing::warn!("  Password: {}", DEFAULT_ADMIN_PASSWORD);
    tracing::warn!("  User ID: {}", admin.id);
    tracing::warn!("  PLEASE CHANGE THE PASSWORD IMMEDIATELY!");

    Ok(Some(admin.id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::data::db::open_in_memory;

    #[tokio::test]
    async fn test_default_admin_created_once() {
        let db = open_in_memory().await;
        let id = ensure_admin_user_exists(&db).await.unwrap().unwrap();
        assert!(ensure_admin_user_exists(&db).await.unwrap().is_none());

        let admin = repository::get_by_id(&db, &id).await.unwrap().unwrap();
        assert_eq!(admin.roles, vec![RoleTag::Admin]);
        assert_eq!(repository::count_admins(&db).await.unwrap(), 1);
    }
}
