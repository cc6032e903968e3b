use axum::{extract::Json, http::StatusCode};
use contracts::system::permissions::PermissionSet;

use crate::handlers::db_or_500;
use crate::system::auth::extractor::CurrentActor;
use crate::system::permissions::repository;

/// GET /api/system/permissions
pub async fn my_permissions(
    CurrentActor(actor): CurrentActor,
) -> Result<Json<PermissionSet>, StatusCode> {
    let db = db_or_500()?;
    let roles: Vec<_> = actor.roles.into_iter().collect();

    repository::load_for_roles(db, &roles)
        .await
        .map(Json)
        .map_err(|e| {
            tracing::error!("Failed to load permissions of {}: {}", actor.actor_id, e);
            StatusCode::INTERNAL_SERVER_ERROR
        })
}
