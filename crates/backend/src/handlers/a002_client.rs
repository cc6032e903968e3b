use axum::{extract::Path, http::StatusCode, Json};
use contracts::domain::a002_client::aggregate::{Client, ClientDto, ClientId};
use serde_json::json;

use super::{db_or_500, parse_id};
use crate::domain::a002_client;

/// GET /api/clients
pub async fn list_all() -> Result<Json<Vec<Client>>, StatusCode> {
    let db = db_or_500()?;
    match a002_client::service::list_all(db).await {
        Ok(v) => Ok(Json(v)),
        Err(e) => {
            tracing::error!("Failed to list clients: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// GET /api/clients/:id
pub async fn get_by_id(Path(id): Path<String>) -> Result<Json<Client>, StatusCode> {
    let db = db_or_500()?;
    let id: ClientId = parse_id(&id)?;
    match a002_client::service::get_by_id(db, id).await {
        Ok(Some(v)) => Ok(Json(v)),
        Ok(None) => Err(StatusCode::NOT_FOUND),
        Err(e) => {
            tracing::error!("Failed to get client {}: {}", id, e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// POST /api/clients
pub async fn create(Json(dto): Json<ClientDto>) -> Result<Json<serde_json::Value>, StatusCode> {
    let db = db_or_500()?;
    match a002_client::service::create(db, dto).await {
        Ok(id) => Ok(Json(json!({ "id": id.to_string() }))),
        Err(e) => {
            tracing::error!("Failed to create client: {}", e);
            Err(StatusCode::BAD_REQUEST)
        }
    }
}
