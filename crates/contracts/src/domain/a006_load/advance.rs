use serde::{Deserialize, Serialize};

use super::access::StageAccessPolicy;
use super::aggregate::Load;
use super::error::AdvanceError;
use super::stage::{self, StageDefinition, LAST_WORKABLE_STAGE};
use crate::system::auth::ActorContext;

/// Request to complete one stage, attachments described by their metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdvanceRequest {
    pub stage: u8,
    pub attachment: Option<stage::AttachmentMeta>,
    #[serde(default)]
    pub secondary_attachment: Option<stage::AttachmentMeta>,
    #[serde(default)]
    pub observation: Option<String>,
}

/// Blank observations are stored as null
pub fn normalize_observation(observation: Option<&str>) -> Option<String> {
    observation
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .map(str::to_string)
}

/// Run every precondition of a stage advancement, in order.
///
/// The first failing check decides the error: sequence, target, attachment,
/// then permission.
pub fn check_advance(
    policy: &StageAccessPolicy,
    actor: &ActorContext,
    load: &Load,
    request: &AdvanceRequest,
) -> Result<&'static StageDefinition, AdvanceError> {
    let expected = load.current_stage + 1;
    if request.stage != expected {
        return Err(AdvanceError::OutOfSequence {
            expected,
            requested: request.stage,
        });
    }

    let target = stage::stage(request.stage)
        .filter(|def| def.order <= LAST_WORKABLE_STAGE && !load.is_cancelled());
    let Some(def) = target else {
        return Err(AdvanceError::InvalidTarget {
            stage: request.stage,
        });
    };

    check_attachments(def, request)?;

    if !policy.can_edit(actor, load, def.order) {
        return Err(AdvanceError::Forbidden { stage: def.order });
    }
    Ok(def)
}

fn check_attachments(def: &StageDefinition, request: &AdvanceRequest) -> Result<(), AdvanceError> {
    let (Some(kind), Some(meta)) = (def.attachment, request.attachment.as_ref()) else {
        return Err(AdvanceError::MissingAttachment { stage: def.order });
    };
    if !kind.matches(meta) {
        return Err(AdvanceError::WrongAttachmentType {
            stage: def.order,
            expected: kind.to_string(),
            received: meta.describe(),
        });
    }

    if let Some(secondary) = &request.secondary_attachment {
        match def.secondary_attachment {
            Some(kind) if kind.matches(secondary) => {}
            Some(kind) => {
                return Err(AdvanceError::WrongAttachmentType {
                    stage: def.order,
                    expected: kind.to_string(),
                    received: secondary.describe(),
                })
            }
            None => {
                return Err(AdvanceError::WrongAttachmentType {
                    stage: def.order,
                    expected: "no secondary attachment".to_string(),
                    received: secondary.describe(),
                })
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::a002_client::aggregate::ClientId;
    use crate::domain::a006_load::aggregate::{LoadStatus, StageCompletion};
    use crate::domain::a006_load::stage::AttachmentMeta;
    use crate::system::auth::RoleTag;
    use chrono::Utc;

    fn photo() -> Option<AttachmentMeta> {
        Some(AttachmentMeta::new("truck.jpg", Some("image/jpeg"), 2048))
    }

    fn pdf() -> Option<AttachmentMeta> {
        Some(AttachmentMeta::new("nf.pdf", Some("application/pdf"), 4096))
    }

    fn xml() -> Option<AttachmentMeta> {
        Some(AttachmentMeta::new("nf.xml", Some("application/xml"), 512))
    }

    fn request(stage: u8, attachment: Option<AttachmentMeta>) -> AdvanceRequest {
        AdvanceRequest {
            stage,
            attachment,
            secondary_attachment: None,
            observation: None,
        }
    }

    fn load_at(stage: u8) -> Load {
        let mut load = Load::new_for_test();
        for s in 1..=stage {
            load = load
                .complete_stage(StageCompletion {
                    stage: s,
                    completed_at: Utc::now(),
                    observation: None,
                    attachment_url: format!("/files/{}", s),
                    secondary_attachment_url: None,
                })
                .unwrap();
        }
        load
    }

    #[test]
    fn test_owning_warehouse_may_complete_first_stage() {
        let policy = StageAccessPolicy::default();
        let load = load_at(0);
        let actor = ActorContext::new("w").with_warehouse(load.warehouse_id);
        let def = check_advance(&policy, &actor, &load, &request(1, photo())).unwrap();
        assert_eq!(def.order, 1);
    }

    #[test]
    fn test_skipping_is_rejected_before_anything_else() {
        let policy = StageAccessPolicy::default();
        let load = load_at(0);
        let stranger = ActorContext::new("x").with_client(ClientId::new_v4());
        // no attachment and no permission, sequence still wins
        assert_eq!(
            check_advance(&policy, &stranger, &load, &request(2, None)).map(|d| d.order),
            Err(AdvanceError::OutOfSequence {
                expected: 1,
                requested: 2
            })
        );
    }

    #[test]
    fn test_documentation_stage_accepts_pdf_and_xml() {
        let policy = StageAccessPolicy::default();
        let load = load_at(4);
        let actor = ActorContext::new("w").with_warehouse(load.warehouse_id);
        let mut req = request(5, pdf());
        req.secondary_attachment = xml();
        req.observation = Some("ok".into());
        assert!(check_advance(&policy, &actor, &load, &req).is_ok());
    }

    #[test]
    fn test_finalized_load_has_no_target() {
        let policy = StageAccessPolicy::default();
        let mut load = load_at(4);
        load = load
            .complete_stage(StageCompletion {
                stage: 5,
                completed_at: Utc::now(),
                observation: None,
                attachment_url: "/files/nf.pdf".into(),
                secondary_attachment_url: None,
            })
            .unwrap();
        let admin = ActorContext::new("a").with_role(RoleTag::Admin);
        assert_eq!(
            check_advance(&policy, &admin, &load, &request(7, pdf())).map(|d| d.order),
            Err(AdvanceError::InvalidTarget { stage: 7 })
        );
    }

    #[test]
    fn test_cancelled_load_has_no_target() {
        let policy = StageAccessPolicy::default();
        let mut load = load_at(1);
        load.status = LoadStatus::Cancelled;
        let admin = ActorContext::new("a").with_role(RoleTag::Admin);
        assert_eq!(
            check_advance(&policy, &admin, &load, &request(2, photo())).map(|d| d.order),
            Err(AdvanceError::InvalidTarget { stage: 2 })
        );
    }

    #[test]
    fn test_attachment_is_checked_before_permission() {
        let policy = StageAccessPolicy::default();
        let load = load_at(0);
        let client = ActorContext::new("c").with_client(load.client_id);
        assert_eq!(
            check_advance(&policy, &client, &load, &request(1, None)).map(|d| d.order),
            Err(AdvanceError::MissingAttachment { stage: 1 })
        );
        assert_eq!(
            check_advance(&policy, &client, &load, &request(1, photo())).map(|d| d.order),
            Err(AdvanceError::Forbidden { stage: 1 })
        );
    }

    #[test]
    fn test_wrong_attachment_kinds() {
        let policy = StageAccessPolicy::default();
        let admin = ActorContext::new("a").with_role(RoleTag::Admin);

        let load = load_at(0);
        let err = check_advance(&policy, &admin, &load, &request(1, pdf())).unwrap_err();
        assert_eq!(err.code(), "wrong_attachment_type");

        let mut req = request(1, photo());
        req.secondary_attachment = photo();
        let err = check_advance(&policy, &admin, &load, &req).unwrap_err();
        assert_eq!(err.code(), "wrong_attachment_type");

        let load = load_at(4);
        let err = check_advance(&policy, &admin, &load, &request(5, photo())).unwrap_err();
        assert_eq!(err.code(), "wrong_attachment_type");

        let mut req = request(5, pdf());
        req.secondary_attachment = pdf();
        assert!(matches!(
            check_advance(&policy, &admin, &load, &req),
            Err(AdvanceError::WrongAttachmentType { stage: 5, .. })
        ));
    }

    #[test]
    fn test_other_warehouse_is_forbidden() {
        let policy = StageAccessPolicy::default();
        let load = load_at(2);
        let actor = ActorContext::new("w")
            .with_warehouse(crate::domain::a001_warehouse::aggregate::WarehouseId::new_v4());
        assert_eq!(
            check_advance(&policy, &actor, &load, &request(3, photo())).map(|d| d.order),
            Err(AdvanceError::Forbidden { stage: 3 })
        );
    }

    #[test]
    fn test_normalize_observation() {
        assert_eq!(normalize_observation(None), None);
        assert_eq!(normalize_observation(Some("   ")), None);
        assert_eq!(normalize_observation(Some(" ok ")), Some("ok".to_string()));
    }
}
