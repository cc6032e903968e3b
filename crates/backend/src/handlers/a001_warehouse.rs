use axum::{extract::Path, http::StatusCode, Json};
use contracts::domain::a001_warehouse::aggregate::{Warehouse, WarehouseDto, WarehouseId};
use serde_json::json;

use super::{db_or_500, parse_id};
use crate::domain::a001_warehouse;

/// GET /api/warehouses
pub async fn list_all() -> Result<Json<Vec<Warehouse>>, StatusCode> {
    let db = db_or_500()?;
    match a001_warehouse::service::list_all(db).await {
        Ok(v) => Ok(Json(v)),
        Err(e) => {
            tracing::error!("Failed to list warehouses: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// GET /api/warehouses/:id
pub async fn get_by_id(Path(id): Path<String>) -> Result<Json<Warehouse>, StatusCode> {
    let db = db_or_500()?;
    let id: WarehouseId = parse_id(&id)?;
    match a001_warehouse::service::get_by_id(db, id).await {
        Ok(Some(v)) => Ok(Json(v)),
        Ok(None) => Err(StatusCode::NOT_FOUND),
        Err(e) => {
            tracing::error!("Failed to get warehouse {}: {}", id, e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// POST /api/warehouses
pub async fn create(Json(dto): Json<WarehouseDto>) -> Result<Json<serde_json::Value>, StatusCode> {
    let db = db_or_500()?;
    match a001_warehouse::service::create(db, dto).await {
        Ok(id) => Ok(Json(json!({ "id": id.to_string() }))),
        Err(e) => {
            tracing::error!("Failed to create warehouse: {}", e);
            Err(StatusCode::BAD_REQUEST)
        }
    }
}
