use chrono::Utc;
use contracts::domain::a006_load::access::StageAccessPolicy;
use contracts::domain::a006_load::advance::{check_advance, normalize_observation, AdvanceRequest};
use contracts::domain::a006_load::aggregate::{CreateLoadDto, Load, LoadId, StageCompletion};
use contracts::domain::a006_load::error::AdvanceError;
use contracts::domain::a006_load::projection::{load_view, project_view, LoadView, StageDetail};
use contracts::domain::a006_load::stage::{self, AttachmentMeta};
use contracts::domain::common::AggregateId;
use contracts::system::auth::ActorContext;
use sea_orm::DatabaseConnection;
use thiserror::Error;

use super::repository;
use crate::domain::{a001_warehouse, a002_client};
use crate::shared::storage::{destination_hint, AttachmentStorage};

/// Failures of load operations other than stage advancement
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("load not found")]
    NotFound,

    /// The actor has no relation to the load and is sent back to the list
    #[error("no access to this load")]
    NoAccess,

    #[error("operation not allowed")]
    Forbidden,

    #[error("{0}")]
    Invalid(String),

    #[error("the load was changed by someone else")]
    Conflict,

    #[error(transparent)]
    Database(#[from] anyhow::Error),
}

/// One uploaded file: what the client said it is, plus the bytes
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub meta: AttachmentMeta,
    pub bytes: Vec<u8>,
}

/// A stage completion as submitted by the edit form
#[derive(Debug, Clone, Default)]
pub struct AdvanceSubmission {
    pub stage: u8,
    pub observation: Option<String>,
    pub attachment: Option<UploadedFile>,
    pub secondary_attachment: Option<UploadedFile>,
}

impl AdvanceSubmission {
    pub fn request(&self) -> AdvanceRequest {
        AdvanceRequest {
            stage: self.stage,
            attachment: self.attachment.as_ref().map(|f| f.meta.clone()),
            secondary_attachment: self.secondary_attachment.as_ref().map(|f| f.meta.clone()),
            observation: self.observation.clone(),
        }
    }
}

/// Create a load for an existing client and warehouse (elevated actors)
pub async fn create(
    db: &DatabaseConnection,
    actor: &ActorContext,
    dto: CreateLoadDto,
) -> Result<Load, LoadError> {
    if !actor.is_elevated() {
        return Err(LoadError::Forbidden);
    }
    if a002_client::repository::get_by_id(db, dto.client_id)
        .await?
        .is_none()
    {
        return Err(LoadError::Invalid(format!("client {} does not exist", dto.client_id)));
    }
    if a001_warehouse::repository::get_by_id(db, dto.warehouse_id)
        .await?
        .is_none()
    {
        return Err(LoadError::Invalid(format!(
            "warehouse {} does not exist",
            dto.warehouse_id
        )));
    }

    let load = Load::new(dto.client_id, dto.warehouse_id);
    repository::insert(db, &load).await?;
    tracing::info!("Load {} created by {}", load.id, actor.actor_id);
    Ok(load)
}

/// Loads the actor may open, newest first
pub async fn list_visible(
    db: &DatabaseConnection,
    policy: &StageAccessPolicy,
    actor: &ActorContext,
) -> anyhow::Result<Vec<Load>> {
    Ok(repository::list_all(db)
        .await?
        .into_iter()
        .filter(|load| policy.can_open(actor, load))
        .collect())
}

async fn open(
    db: &DatabaseConnection,
    policy: &StageAccessPolicy,
    actor: &ActorContext,
    id: LoadId,
) -> Result<Load, LoadError> {
    let load = repository::get_by_id(db, id)
        .await?
        .ok_or(LoadError::NotFound)?;
    if !policy.can_open(actor, &load) {
        tracing::warn!("Actor {} has no access to load {}", actor.actor_id, id);
        return Err(LoadError::NoAccess);
    }
    Ok(load)
}

/// The detail screen of one load
pub async fn get_view(
    db: &DatabaseConnection,
    policy: &StageAccessPolicy,
    actor: &ActorContext,
    id: LoadId,
) -> Result<LoadView, LoadError> {
    let load = open(db, policy, actor, id).await?;
    Ok(load_view(policy, load, actor, Utc::now()))
}

/// One stage of a load as the actor may see it; recorded data is only
/// included when the stage is viewable
pub async fn stage_detail(
    db: &DatabaseConnection,
    policy: &StageAccessPolicy,
    actor: &ActorContext,
    id: LoadId,
    order: u8,
) -> Result<StageDetail, LoadError> {
    let def = stage::stage(order).ok_or_else(|| LoadError::Invalid(format!("unknown stage {}", order)))?;
    let load = open(db, policy, actor, id).await?;

    let record = if policy.can_view(actor, &load, order) {
        load.stage_record(order).cloned()
    } else {
        None
    };
    Ok(StageDetail {
        order,
        name: def.name.to_string(),
        view: project_view(policy, &load, actor, order),
        record,
    })
}

/// Complete the workable stage of a load.
///
/// All checks run before anything is uploaded; attachments are uploaded
/// before the record is touched, and the record is written only if nobody
/// advanced it in the meantime. Any failure leaves the stored load as it was.
pub async fn advance_stage(
    db: &DatabaseConnection,
    storage: &dyn AttachmentStorage,
    policy: &StageAccessPolicy,
    actor: &ActorContext,
    id: LoadId,
    submission: AdvanceSubmission,
) -> Result<Load, AdvanceError> {
    let load = repository::get_by_id(db, id)
        .await
        .map_err(persistence_failure)?
        .ok_or(AdvanceError::NotFound)?;

    let request = submission.request();
    let def = check_advance(policy, actor, &load, &request)?;

    let primary = submission
        .attachment
        .ok_or(AdvanceError::MissingAttachment { stage: def.order })?;
    let attachment_url = upload(storage, &load, def.key, primary).await?;
    let secondary_attachment_url = match submission.secondary_attachment {
        Some(file) => Some(upload(storage, &load, def.key, file).await?),
        None => None,
    };

    let next = load.complete_stage(StageCompletion {
        stage: def.order,
        completed_at: Utc::now(),
        observation: normalize_observation(request.observation.as_deref()),
        attachment_url,
        secondary_attachment_url,
    })?;

    let written = repository::update_if_unchanged(db, &next, &load)
        .await
        .map_err(persistence_failure)?;
    if !written {
        let still_there = repository::exists(db, id).await.map_err(persistence_failure)?;
        return Err(if still_there {
            AdvanceError::ConcurrentModification
        } else {
            AdvanceError::NotFound
        });
    }

    tracing::info!(
        "Load {} advanced to stage {} by {} ({})",
        id,
        def.order,
        actor.actor_id,
        next.status.as_str()
    );
    Ok(next)
}

async fn upload(
    storage: &dyn AttachmentStorage,
    load: &Load,
    stage_key: &str,
    file: UploadedFile,
) -> Result<String, AdvanceError> {
    let hint = destination_hint(&load.id.as_string(), stage_key, &file.meta.file_name);
    storage.upload(file.bytes, &hint).await.map_err(|e| {
        tracing::error!(
            "Upload of {} for load {} to {} failed: {}",
            file.meta.file_name,
            load.id,
            storage.storage_name(),
            e
        );
        AdvanceError::StorageFailure {
            message: e.to_string(),
        }
    })
}

fn persistence_failure(e: anyhow::Error) -> AdvanceError {
    tracing::error!("Load persistence failed: {:#}", e);
    AdvanceError::StorageFailure {
        message: format!("failed to save the load: {}", e),
    }
}

/// Cancel a load that is not finalized (elevated actors)
pub async fn cancel(
    db: &DatabaseConnection,
    actor: &ActorContext,
    id: LoadId,
) -> Result<Load, LoadError> {
    if !actor.is_elevated() {
        return Err(LoadError::Forbidden);
    }
    let load = repository::get_by_id(db, id)
        .await?
        .ok_or(LoadError::NotFound)?;

    let mut cancelled = load.clone();
    cancelled.cancel().map_err(LoadError::Invalid)?;
    if !repository::update_if_unchanged(db, &cancelled, &load).await? {
        return Err(LoadError::Conflict);
    }

    tracing::info!("Load {} cancelled by {}", id, actor.actor_id);
    Ok(cancelled)
}
