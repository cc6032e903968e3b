use axum::{
    extract::{Json, Path},
    http::StatusCode,
};
use contracts::system::users::{
    ChangePasswordDto, ProvisionErrorBody, ProvisionResponse, ProvisionUserDto, UpdateUserDto,
    User,
};

use crate::handlers::db_or_500;
use crate::system::auth::extractor::{CurrentUser, MaybeUser};
use crate::system::users::service::{self, ProvisionError};

fn provision_status(error: &ProvisionError) -> StatusCode {
    match error {
        ProvisionError::Validation(_) => StatusCode::BAD_REQUEST,
        ProvisionError::Unauthenticated => StatusCode::UNAUTHORIZED,
        ProvisionError::NotAdmin | ProvisionError::BootstrapRole => StatusCode::FORBIDDEN,
        ProvisionError::Duplicate => StatusCode::CONFLICT,
        ProvisionError::Create(_) | ProvisionError::Verify | ProvisionError::AssignRole(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

fn provision_error_body(error: &ProvisionError, request_id: String) -> ProvisionErrorBody {
    let (summary, details) = match error {
        ProvisionError::Validation(inner) => ("Invalid request".to_string(), Some(inner.to_string())),
        ProvisionError::Create(inner) | ProvisionError::AssignRole(inner) => {
            (error.to_string(), Some(format!("{:#}", inner)))
        }
        other => (other.to_string(), None),
    };
    ProvisionErrorBody {
        error: summary,
        details,
        stage: error.stage(),
        request_id,
        timestamp: chrono::Utc::now().to_rfc3339(),
    }
}

/// List all users (admin only)
pub async fn list(CurrentUser(_claims): CurrentUser) -> Result<Json<Vec<User>>, StatusCode> {
    let db = db_or_500()?;
    let users = service::list_all(db)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    Ok(Json(users))
}

/// Get user by ID (admin only)
pub async fn get_by_id(
    CurrentUser(_claims): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<User>, StatusCode> {
    let db = db_or_500()?;
    let user = service::get_by_id(db, &id)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
        .ok_or(StatusCode::NOT_FOUND)?;

    Ok(Json(user))
}

/// Provision an account. Anonymous callers are accepted only while no
/// administrator exists.
pub async fn provision(
    MaybeUser(claims): MaybeUser,
    Json(dto): Json<ProvisionUserDto>,
) -> Result<Json<ProvisionResponse>, (StatusCode, Json<ProvisionErrorBody>)> {
    let request_id = uuid::Uuid::new_v4().to_string();
    let db = db_or_500().map_err(|status| {
        let body = ProvisionErrorBody {
            error: "Database unavailable".to_string(),
            details: None,
            stage: contracts::system::users::ProvisionStage::Validation,
            request_id: request_id.clone(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        };
        (status, Json(body))
    })?;

    match service::provision(db, dto, claims.as_ref()).await {
        Ok(response) => Ok(Json(response)),
        Err(e) => {
            let status = provision_status(&e);
            if status.is_server_error() {
                tracing::error!("[{}] Provisioning failed at {:?}: {:#}", request_id, e.stage(), e);
            } else {
                tracing::warn!("[{}] Provisioning rejected at {:?}: {}", request_id, e.stage(), e);
            }
            Err((status, Json(provision_error_body(&e, request_id))))
        }
    }
}

/// Update user (admin only)
pub async fn update(
    CurrentUser(_claims): CurrentUser,
    Path(id): Path<String>,
    Json(mut dto): Json<UpdateUserDto>,
) -> Result<StatusCode, StatusCode> {
    let db = db_or_500()?;
    dto.id = id;

    service::update(db, dto).await.map_err(|e| {
        tracing::error!("Failed to update user: {}", e);
        StatusCode::BAD_REQUEST
    })?;

    Ok(StatusCode::OK)
}

/// Delete user (admin only)
pub async fn delete(
    CurrentUser(claims): CurrentUser,
    Path(id): Path<String>,
) -> Result<StatusCode, StatusCode> {
    if claims.sub == id {
        return Err(StatusCode::BAD_REQUEST);
    }
    let db = db_or_500()?;
    let deleted = service::delete(db, &id)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    if deleted {
        Ok(StatusCode::OK)
    } else {
        Err(StatusCode::NOT_FOUND)
    }
}

/// Change password
pub async fn change_password(
    CurrentUser(claims): CurrentUser,
    Path(id): Path<String>,
    Json(mut dto): Json<ChangePasswordDto>,
) -> Result<StatusCode, StatusCode> {
    let db = db_or_500()?;
    dto.user_id = id;

    service::change_password(db, dto, &claims).await.map_err(|e| {
        tracing::error!("Failed to change password: {}", e);
        StatusCode::BAD_REQUEST
    })?;

    Ok(StatusCode::OK)
}
