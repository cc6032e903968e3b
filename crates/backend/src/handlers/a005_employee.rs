use axum::{extract::Path, http::StatusCode, Json};
use contracts::domain::a005_employee::aggregate::{CreateEmployeeDto, Employee, EmployeeId};
use serde_json::json;

use super::{db_or_500, parse_id};
use crate::domain::a005_employee;

/// GET /api/employees
pub async fn list_all() -> Result<Json<Vec<Employee>>, StatusCode> {
    let db = db_or_500()?;
    match a005_employee::service::list_all(db).await {
        Ok(v) => Ok(Json(v)),
        Err(e) => {
            tracing::error!("Failed to list employees: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// POST /api/employees
pub async fn create(
    Json(dto): Json<CreateEmployeeDto>,
) -> Result<Json<serde_json::Value>, StatusCode> {
    let db = db_or_500()?;
    match a005_employee::service::create(db, dto).await {
        Ok(id) => Ok(Json(json!({ "id": id.to_string() }))),
        Err(e) => {
            tracing::error!("Failed to create employee: {}", e);
            Err(StatusCode::BAD_REQUEST)
        }
    }
}

/// POST /api/employees/:id/toggle-active
pub async fn toggle_active(Path(id): Path<String>) -> Result<Json<Employee>, StatusCode> {
    let db = db_or_500()?;
    let id: EmployeeId = parse_id(&id)?;
    match a005_employee::service::toggle_active(db, id).await {
        Ok(Some(v)) => Ok(Json(v)),
        Ok(None) => Err(StatusCode::NOT_FOUND),
        Err(e) => {
            tracing::error!("Failed to toggle employee {}: {}", id, e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}
