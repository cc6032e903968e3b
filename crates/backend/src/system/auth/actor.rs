use anyhow::Result;
use contracts::system::auth::ActorContext;
use sea_orm::DatabaseConnection;

use crate::system::users::repository;

/// Build the actor context of an account: its roles plus the warehouse and
/// client it is tied to. Inactive or unknown accounts resolve to `None`.
pub async fn resolve(db: &DatabaseConnection, user_id: &str) -> Result<Option<ActorContext>> {
    let Some(user) = repository::get_by_id(db, user_id).await? else {
        return Ok(None);
    };
    if !user.is_active {
        return Ok(None);
    }

    let mut actor = ActorContext::new(user.id);
    actor.roles = user.roles.into_iter().collect();
    actor.warehouse_id = user.warehouse_id;
    actor.client_id = user.client_id;
    Ok(Some(actor))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::data::db::open_in_memory;
    use contracts::domain::a001_warehouse::aggregate::WarehouseId;
    use contracts::system::auth::RoleTag;
    use contracts::system::users::User;

    fn user(id: &str, active: bool, warehouse_id: Option<WarehouseId>) -> User {
        let now = chrono::Utc::now().to_rfc3339();
        User {
            id: id.into(),
            username: format!("{}@example.com", id),
            email: None,
            full_name: None,
            is_active: active,
            roles: Vec::new(),
            warehouse_id,
            client_id: None,
            created_at: now.clone(),
            updated_at: now,
            last_login_at: None,
            created_by: None,
        }
    }

    #[tokio::test]
    async fn test_resolves_roles_and_links() {
        let db = open_in_memory().await;
        let warehouse = WarehouseId::new_v4();
        repository::create_with_password(&db, &user("w1", true, Some(warehouse)), "x")
            .await
            .unwrap();
        repository::assign_role(&db, "w1", RoleTag::Warehouse).await.unwrap();

        let actor = resolve(&db, "w1").await.unwrap().unwrap();
        assert!(actor.has_role(RoleTag::Warehouse));
        assert!(!actor.is_elevated());
        assert_eq!(actor.warehouse_id, Some(warehouse));
        assert_eq!(actor.client_id, None);
    }

    #[tokio::test]
    async fn test_inactive_and_unknown_accounts_do_not_resolve() {
        let db = open_in_memory().await;
        repository::create_with_password(&db, &user("off", false, None), "x")
            .await
            .unwrap();
        assert!(resolve(&db, "off").await.unwrap().is_none());
        assert!(resolve(&db, "ghost").await.unwrap().is_none());
    }
}
