use anyhow::{Context, Result};
use contracts::system::auth::RoleTag;
use contracts::system::permissions::{default_permissions, Permission, PermissionSet, Resource};
use sea_orm::{ConnectionTrait, DatabaseBackend, DatabaseConnection, Statement};

fn flag(value: bool) -> i32 {
    if value {
        1
    } else {
        0
    }
}

/// Insert the default rows of every role; rows already present are kept so
/// edits made by an administrator survive restarts
pub async fn seed_defaults(db: &DatabaseConnection) -> Result<usize> {
    let mut inserted = 0;
    for role in RoleTag::ALL {
        for (resource, permission) in default_permissions(role) {
            let result = db
                .execute(Statement::from_sql_and_values(
                    DatabaseBackend::Sqlite,
                    "INSERT OR IGNORE INTO role_permissions
                     (role, resource, can_create, can_read, can_update, can_delete)
                     VALUES (?, ?, ?, ?, ?, ?)",
                    [
                        role.as_str().into(),
                        resource.as_str().into(),
                        flag(permission.can_create).into(),
                        flag(permission.can_read).into(),
                        flag(permission.can_update).into(),
                        flag(permission.can_delete).into(),
                    ],
                ))
                .await
                .with_context(|| format!("Failed to seed permissions of {}", role))?;
            inserted += result.rows_affected() as usize;
        }
    }
    Ok(inserted)
}

/// Union of the permission rows of all given roles
pub async fn load_for_roles(db: &DatabaseConnection, roles: &[RoleTag]) -> Result<PermissionSet> {
    let mut set = PermissionSet::default();
    for role in roles {
        let rows = db
            .query_all(Statement::from_sql_and_values(
                DatabaseBackend::Sqlite,
                "SELECT resource, can_create, can_read, can_update, can_delete
                 FROM role_permissions WHERE role = ?",
                [role.as_str().into()],
            ))
            .await?;

        for row in rows {
            let resource: String = row.try_get("", "resource")?;
            let Some(resource) = Resource::parse(&resource) else {
                tracing::warn!("Ignoring unknown resource '{}' for role {}", resource, role);
                continue;
            };
            set.grant(
                resource,
                Permission {
                    can_create: row.try_get::<i32>("", "can_create")? != 0,
                    can_read: row.try_get::<i32>("", "can_read")? != 0,
                    can_update: row.try_get::<i32>("", "can_update")? != 0,
                    can_delete: row.try_get::<i32>("", "can_delete")? != 0,
                },
            );
        }
    }
    Ok(set)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::data::db::open_in_memory;
    use contracts::system::permissions::Action;

    #[tokio::test]
    async fn test_seeding_is_idempotent() {
        let db = open_in_memory().await;
        let first = seed_defaults(&db).await.unwrap();
        assert!(first > 0);
        assert_eq!(seed_defaults(&db).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_loaded_set_matches_role_defaults() {
        let db = open_in_memory().await;
        seed_defaults(&db).await.unwrap();

        let warehouse = load_for_roles(&db, &[RoleTag::Warehouse]).await.unwrap();
        assert!(warehouse.can_access(Resource::Loads, Action::Update));
        assert!(!warehouse.can_access(Resource::Users, Action::Read));

        let admin = load_for_roles(&db, &[RoleTag::Admin]).await.unwrap();
        assert!(admin.can_access(Resource::Users, Action::Delete));

        let nobody = load_for_roles(&db, &[]).await.unwrap();
        assert!(!nobody.can_access(Resource::Loads, Action::Read));
    }
}
