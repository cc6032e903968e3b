pub mod a001_warehouse;
pub mod a002_client;
pub mod a003_product;
pub mod a004_stock;
pub mod a005_employee;
pub mod a006_load;

use axum::http::StatusCode;
use contracts::domain::common::AggregateId;
use contracts::system::auth::ActorContext;
use contracts::system::permissions::{Action, Resource};
use sea_orm::DatabaseConnection;

use crate::shared::data::db::get_connection;
use crate::system::permissions::repository as permissions;

/// The global connection, or 500 when the database was never initialized
pub fn db_or_500() -> Result<&'static DatabaseConnection, StatusCode> {
    get_connection().map_err(|e| {
        tracing::error!("Database unavailable: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })
}

/// Parse a path id, 400 on garbage
pub fn parse_id<T: AggregateId>(raw: &str) -> Result<T, StatusCode> {
    T::from_string(raw).map_err(|_| StatusCode::BAD_REQUEST)
}

/// 403 unless one of the actor's roles grants `action` on `resource`
pub async fn require_permission(
    db: &DatabaseConnection,
    actor: &ActorContext,
    resource: Resource,
    action: Action,
) -> Result<(), StatusCode> {
    let roles: Vec<_> = actor.roles.iter().copied().collect();
    let set = permissions::load_for_roles(db, &roles).await.map_err(|e| {
        tracing::error!("Failed to load permissions of {}: {}", actor.actor_id, e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;
    if set.can_access(resource, action) {
        Ok(())
    } else {
        tracing::warn!(
            "{} may not {:?} {}",
            actor.actor_id,
            action,
            resource.as_str()
        );
        Err(StatusCode::FORBIDDEN)
    }
}
