use axum::{
    extract::{Multipart, Path},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use contracts::domain::a006_load::aggregate::{CreateLoadDto, Load, LoadId};
use contracts::domain::a006_load::error::{AdvanceError, AdvanceErrorResponse};
use contracts::domain::a006_load::projection::{LoadView, StageDetail};
use contracts::domain::a006_load::stage::AttachmentMeta;
use serde_json::json;

use super::{db_or_500, parse_id};
use crate::domain::a006_load::service::{self, AdvanceSubmission, LoadError, UploadedFile};
use crate::shared::{config, storage};
use crate::system::auth::extractor::CurrentActor;

/// Where the list screen lives; sent to actors that may not open a load
const LIST_ROUTE: &str = "/carregamentos";

type Failure = (StatusCode, Json<serde_json::Value>);

fn load_failure(error: LoadError) -> Failure {
    match error {
        LoadError::NoAccess => (StatusCode::FORBIDDEN, Json(json!({ "redirect": LIST_ROUTE }))),
        LoadError::Database(e) => {
            tracing::error!("Load query failed: {:#}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "internal error" })),
            )
        }
        other => {
            let status = match other {
                LoadError::NotFound => StatusCode::NOT_FOUND,
                LoadError::Forbidden => StatusCode::FORBIDDEN,
                LoadError::Conflict => StatusCode::CONFLICT,
                _ => StatusCode::BAD_REQUEST,
            };
            (status, Json(json!({ "error": other.to_string() })))
        }
    }
}

fn advance_status(error: &AdvanceError) -> StatusCode {
    match error {
        AdvanceError::OutOfSequence { .. } | AdvanceError::ConcurrentModification => {
            StatusCode::CONFLICT
        }
        AdvanceError::InvalidTarget { .. }
        | AdvanceError::MissingAttachment { .. }
        | AdvanceError::WrongAttachmentType { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        AdvanceError::Forbidden { .. } => StatusCode::FORBIDDEN,
        AdvanceError::StorageFailure { .. } => StatusCode::BAD_GATEWAY,
        AdvanceError::NotFound => StatusCode::NOT_FOUND,
    }
}

fn advance_failure(error: AdvanceError) -> Response {
    (advance_status(&error), Json(AdvanceErrorResponse::from(error))).into_response()
}

fn load_id(raw: &str) -> Result<LoadId, Failure> {
    parse_id(raw).map_err(|status| (status, Json(json!({ "error": "invalid load id" }))))
}

fn db() -> Result<&'static sea_orm::DatabaseConnection, Failure> {
    db_or_500().map_err(|status| (status, Json(json!({ "error": "internal error" }))))
}

/// GET /api/loads
pub async fn list(CurrentActor(actor): CurrentActor) -> Result<Json<Vec<Load>>, StatusCode> {
    let db = db_or_500()?;
    service::list_visible(db, &config::access_policy(), &actor)
        .await
        .map(Json)
        .map_err(|e| {
            tracing::error!("Failed to list loads for {}: {}", actor.actor_id, e);
            StatusCode::INTERNAL_SERVER_ERROR
        })
}

/// POST /api/loads
pub async fn create(
    CurrentActor(actor): CurrentActor,
    Json(dto): Json<CreateLoadDto>,
) -> Result<Json<Load>, Failure> {
    let db = db()?;
    service::create(db, &actor, dto)
        .await
        .map(Json)
        .map_err(load_failure)
}

/// GET /api/loads/:id
pub async fn get_view(
    CurrentActor(actor): CurrentActor,
    Path(id): Path<String>,
) -> Result<Json<LoadView>, Failure> {
    let db = db()?;
    let id = load_id(&id)?;
    service::get_view(db, &config::access_policy(), &actor, id)
        .await
        .map(Json)
        .map_err(load_failure)
}

/// GET /api/loads/:id/stages/:stage
pub async fn get_stage(
    CurrentActor(actor): CurrentActor,
    Path((id, stage)): Path<(String, u8)>,
) -> Result<Json<StageDetail>, Failure> {
    let db = db()?;
    let id = load_id(&id)?;
    service::stage_detail(db, &config::access_policy(), &actor, id, stage)
        .await
        .map(Json)
        .map_err(load_failure)
}

/// POST /api/loads/:id/cancel
pub async fn cancel(
    CurrentActor(actor): CurrentActor,
    Path(id): Path<String>,
) -> Result<Json<Load>, Failure> {
    let db = db()?;
    let id = load_id(&id)?;
    service::cancel(db, &actor, id)
        .await
        .map(Json)
        .map_err(load_failure)
}

/// Read the edit form: `attachment`, `secondary_attachment` and
/// `observation`. File parts without a name or content count as absent.
async fn read_submission(stage: u8, multipart: &mut Multipart) -> Result<AdvanceSubmission, String> {
    let mut submission = AdvanceSubmission {
        stage,
        ..Default::default()
    };

    while let Some(field) = multipart.next_field().await.map_err(|e| e.to_string())? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "observation" => {
                submission.observation = Some(field.text().await.map_err(|e| e.to_string())?);
            }
            "attachment" | "secondary_attachment" => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let content_type = field.content_type().map(str::to_string);
                let bytes = field.bytes().await.map_err(|e| e.to_string())?;
                if file_name.is_empty() || bytes.is_empty() {
                    continue;
                }
                let file = UploadedFile {
                    meta: AttachmentMeta::new(file_name, content_type.as_deref(), bytes.len() as u64),
                    bytes: bytes.to_vec(),
                };
                if name == "attachment" {
                    submission.attachment = Some(file);
                } else {
                    submission.secondary_attachment = Some(file);
                }
            }
            other => tracing::debug!("Ignoring form field {}", other),
        }
    }
    Ok(submission)
}

/// POST /api/loads/:id/stages/:stage/advance
pub async fn advance(
    CurrentActor(actor): CurrentActor,
    Path((id, stage)): Path<(String, u8)>,
    mut multipart: Multipart,
) -> Response {
    let db = match db_or_500() {
        Ok(db) => db,
        Err(status) => return status.into_response(),
    };
    let id: LoadId = match parse_id(&id) {
        Ok(id) => id,
        Err(status) => return status.into_response(),
    };
    let submission = match read_submission(stage, &mut multipart).await {
        Ok(s) => s,
        Err(e) => {
            tracing::warn!("Malformed advance form for load {}: {}", id, e);
            return StatusCode::BAD_REQUEST.into_response();
        }
    };
    let storage = match storage::get_storage() {
        Ok(s) => s,
        Err(e) => {
            tracing::error!("Attachment storage unavailable: {}", e);
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    match service::advance_stage(
        db,
        storage.as_ref(),
        &config::access_policy(),
        &actor,
        id,
        submission,
    )
    .await
    {
        Ok(load) => Json(load).into_response(),
        Err(e) => {
            tracing::warn!(
                "Advance of load {} to stage {} by {} rejected: {}",
                id,
                stage,
                actor.actor_id,
                e.code()
            );
            advance_failure(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advance_statuses() {
        assert_eq!(
            advance_status(&AdvanceError::OutOfSequence {
                expected: 2,
                requested: 4
            }),
            StatusCode::CONFLICT
        );
        assert_eq!(
            advance_status(&AdvanceError::ConcurrentModification),
            StatusCode::CONFLICT
        );
        assert_eq!(
            advance_status(&AdvanceError::MissingAttachment { stage: 1 }),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            advance_status(&AdvanceError::Forbidden { stage: 3 }),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            advance_status(&AdvanceError::StorageFailure {
                message: "timeout".into()
            }),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(advance_status(&AdvanceError::NotFound), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_no_access_redirects_to_list() {
        let (status, Json(body)) = load_failure(LoadError::NoAccess);
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body, json!({ "redirect": "/carregamentos" }));

        let (status, _) = load_failure(LoadError::NotFound);
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = load_failure(LoadError::Invalid("unknown stage 9".into()));
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
