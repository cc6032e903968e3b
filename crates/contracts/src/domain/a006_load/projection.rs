//! Stage view projection for the load detail screen.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::access::{relationship, Relationship, StageAccessPolicy};
use super::aggregate::Load;
use super::stage::{StageDefinition, FINAL_STAGE, STAGES};
use crate::system::auth::ActorContext;

/// What the detail panel shows for the selected stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StageView {
    Completed,
    Editable,
    LockedFuture,
    LockedNoPermission,
    Final,
}

pub fn project_view(
    policy: &StageAccessPolicy,
    load: &Load,
    actor: &ActorContext,
    selected: u8,
) -> StageView {
    if selected == FINAL_STAGE && load.current_stage == FINAL_STAGE {
        StageView::Final
    } else if selected <= load.current_stage && selected < FINAL_STAGE {
        StageView::Completed
    } else if policy.can_edit(actor, load, selected) {
        StageView::Editable
    } else if selected > load.current_stage && policy.can_view(actor, load, selected) {
        StageView::LockedFuture
    } else {
        StageView::LockedNoPermission
    }
}

/// Stage selected when the detail screen opens
pub fn initial_selected_stage(load: &Load, actor: &ActorContext) -> u8 {
    match relationship(actor, load) {
        Relationship::OwningWarehouse => (load.current_stage + 1).min(FINAL_STAGE),
        _ => load.current_stage.max(1),
    }
}

/// One tile of the flow bar
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageTile {
    pub order: u8,
    pub name: String,
    pub view: StageView,
    pub clickable: bool,
    pub completed: bool,
}

pub fn project_flow(policy: &StageAccessPolicy, load: &Load, actor: &ActorContext) -> Vec<StageTile> {
    STAGES
        .iter()
        .map(|def: &StageDefinition| StageTile {
            order: def.order,
            name: def.name.to_string(),
            view: project_view(policy, load, actor, def.order),
            clickable: policy.can_view(actor, load, def.order),
            completed: def.order <= load.current_stage,
        })
        .collect()
}

/// Body of GET /api/loads/:id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadView {
    pub load: Load,
    pub flow: Vec<StageTile>,
    pub selected_stage: u8,
    pub selected_view: StageView,
    pub elapsed_minutes: i64,
}

pub fn load_view(
    policy: &StageAccessPolicy,
    load: Load,
    actor: &ActorContext,
    now: DateTime<Utc>,
) -> LoadView {
    let flow = project_flow(policy, &load, actor);
    let selected_stage = initial_selected_stage(&load, actor);
    let selected_view = project_view(policy, &load, actor, selected_stage);
    let elapsed_minutes = load.elapsed(now).num_minutes();
    LoadView {
        load,
        flow,
        selected_stage,
        selected_view,
        elapsed_minutes,
    }
}

/// Body of GET /api/loads/:id/stages/:stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageDetail {
    pub order: u8,
    pub name: String,
    pub view: StageView,
    pub record: Option<super::aggregate::StageRecord>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::a006_load::access::AccessMode;
    use crate::domain::a006_load::aggregate::{LoadStatus, StageCompletion};
    use crate::system::auth::RoleTag;

    fn load_at(stage: u8) -> Load {
        let mut load = Load::new_for_test();
        for s in 1..=stage.min(5) {
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
    fn test_warehouse_opens_on_workable_stage() {
        let policy = StageAccessPolicy::default();
        let load = load_at(0);
        let actor = ActorContext::new("w").with_warehouse(load.warehouse_id);
        let selected = initial_selected_stage(&load, &actor);
        assert_eq!(selected, 1);
        assert_eq!(project_view(&policy, &load, &actor, selected), StageView::Editable);
        assert_eq!(project_view(&policy, &load, &actor, 2), StageView::LockedNoPermission);
    }

    #[test]
    fn test_client_opens_on_last_completed_stage() {
        let policy = StageAccessPolicy::default();
        let load = load_at(3);
        let actor = ActorContext::new("c").with_client(load.client_id);
        assert_eq!(initial_selected_stage(&load, &actor), 3);
        assert_eq!(project_view(&policy, &load, &actor, 3), StageView::Completed);
        assert_eq!(project_view(&policy, &load, &actor, 4), StageView::LockedNoPermission);

        let fresh = load_at(0);
        let actor = ActorContext::new("c").with_client(fresh.client_id);
        assert_eq!(initial_selected_stage(&fresh, &actor), 1);
        assert_eq!(project_view(&policy, &fresh, &actor, 1), StageView::LockedNoPermission);
    }

    #[test]
    fn test_admin_sees_future_stages_locked() {
        let policy = StageAccessPolicy::default();
        let load = load_at(2);
        let actor = ActorContext::new("a").with_role(RoleTag::Admin);
        assert_eq!(project_view(&policy, &load, &actor, 3), StageView::Editable);
        assert_eq!(project_view(&policy, &load, &actor, 4), StageView::LockedFuture);
        assert_eq!(project_view(&policy, &load, &actor, 6), StageView::LockedFuture);
    }

    #[test]
    fn test_finalized_load_shows_final_tile() {
        let policy = StageAccessPolicy::default();
        let load = load_at(5);
        assert_eq!(load.status, LoadStatus::Finalized);
        let actor = ActorContext::new("c").with_client(load.client_id);
        assert_eq!(initial_selected_stage(&load, &actor), 6);
        assert_eq!(project_view(&policy, &load, &actor, 6), StageView::Final);
        assert_eq!(project_view(&policy, &load, &actor, 5), StageView::Completed);

        let warehouse = ActorContext::new("w").with_warehouse(load.warehouse_id);
        assert_eq!(initial_selected_stage(&load, &warehouse), 6);
    }

    #[test]
    fn test_preview_mode_turns_hidden_stages_into_locked_future() {
        let policy = StageAccessPolicy::new(AccessMode::PreviewOnly);
        let load = load_at(1);
        let actor = ActorContext::new("c").with_client(load.client_id);
        assert_eq!(project_view(&policy, &load, &actor, 4), StageView::LockedFuture);
        assert_eq!(project_view(&policy, &load, &actor, 2), StageView::LockedFuture);
    }

    #[test]
    fn test_flow_marks_completed_and_clickable_tiles() {
        let policy = StageAccessPolicy::default();
        let load = load_at(2);
        let actor = ActorContext::new("w").with_warehouse(load.warehouse_id);
        let flow = project_flow(&policy, &load, &actor);
        assert_eq!(flow.len(), 6);
        let clickable: Vec<u8> = flow.iter().filter(|t| t.clickable).map(|t| t.order).collect();
        assert_eq!(clickable, vec![1, 2, 3]);
        let completed: Vec<u8> = flow.iter().filter(|t| t.completed).map(|t| t.order).collect();
        assert_eq!(completed, vec![1, 2]);
        assert_eq!(flow[2].view, StageView::Editable);
        assert_eq!(flow[0].name, "Chegada");
    }

    #[test]
    fn test_load_view_bundles_selection_and_elapsed_time() {
        let policy = StageAccessPolicy::default();
        let load = load_at(1);
        let actor = ActorContext::new("w").with_warehouse(load.warehouse_id);
        let now = load.created_at + chrono::Duration::minutes(90);
        let view = load_view(&policy, load, &actor, now);
        assert_eq!(view.selected_stage, 2);
        assert_eq!(view.selected_view, StageView::Editable);
        assert_eq!(view.elapsed_minutes, 90);

        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["selectedView"], "EDITABLE");
        assert_eq!(json["flow"][0]["view"], "COMPLETED");
    }
}
