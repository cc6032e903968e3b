//! Who may see and who may edit which stage of a load.
//!
//! Rules are evaluated in precedence order, first match wins:
//!
//! 1. elevated actors (admin, logistics) see every stage and may edit the
//!    workable one;
//! 2. warehouse actors of the load's warehouse see up to the workable stage
//!    and may edit it;
//! 3. client actors of the load's client see completed stages only;
//! 4. anybody else sees nothing and is sent away from the record.

use serde::{Deserialize, Serialize};

use super::aggregate::Load;
use super::stage::{FINAL_STAGE, LAST_WORKABLE_STAGE};
use crate::system::auth::{ActorContext, RoleTag};

/// How far owning actors may look ahead of their own progress
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessMode {
    /// Warehouse actors up to the workable stage, clients completed stages
    #[default]
    Strict,
    /// Owning actors may open every stage read-only
    PreviewOnly,
}

/// The actor's relation to one load, resolved by rule precedence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Relationship {
    Elevated,
    OwningWarehouse,
    OwningClient,
    Unrelated,
}

pub fn relationship(actor: &ActorContext, load: &Load) -> Relationship {
    if actor.is_elevated() {
        Relationship::Elevated
    } else if actor.has_role(RoleTag::Warehouse) && actor.warehouse_id == Some(load.warehouse_id) {
        Relationship::OwningWarehouse
    } else if actor.has_role(RoleTag::Client) && actor.client_id == Some(load.client_id) {
        Relationship::OwningClient
    } else {
        Relationship::Unrelated
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StageAccessPolicy {
    pub mode: AccessMode,
}

impl StageAccessPolicy {
    pub fn new(mode: AccessMode) -> Self {
        Self { mode }
    }

    /// Whether the actor may reach the load detail at all
    pub fn can_open(&self, actor: &ActorContext, load: &Load) -> bool {
        relationship(actor, load) != Relationship::Unrelated
    }

    pub fn can_view(&self, actor: &ActorContext, load: &Load, stage: u8) -> bool {
        if !(1..=FINAL_STAGE).contains(&stage) {
            return false;
        }
        let preview = self.mode == AccessMode::PreviewOnly;
        match relationship(actor, load) {
            Relationship::Elevated => true,
            Relationship::OwningWarehouse => {
                preview || stage <= (load.current_stage + 1).min(FINAL_STAGE)
            }
            Relationship::OwningClient => preview || stage <= load.current_stage,
            Relationship::Unrelated => false,
        }
    }

    /// Only the workable stage is ever editable; stage 6 never is
    pub fn can_edit(&self, actor: &ActorContext, load: &Load, stage: u8) -> bool {
        if load.is_cancelled() {
            return false;
        }
        let workable = stage == load.current_stage + 1 && stage <= LAST_WORKABLE_STAGE;
        match relationship(actor, load) {
            Relationship::Elevated | Relationship::OwningWarehouse => workable,
            Relationship::OwningClient | Relationship::Unrelated => false,
        }
    }
}
