use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::error::AdvanceError;
use super::stage::{self, FINAL_STAGE, LAST_WORKABLE_STAGE};
use crate::domain::a001_warehouse::aggregate::WarehouseId;
use crate::domain::a002_client::aggregate::ClientId;
use crate::domain::common::AggregateRoot;

crate::aggregate_id!(
    /// Unique load identifier
    LoadId
);

/// Overall load status, kept consistent with `current_stage`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadStatus {
    Awaiting,
    InProgress,
    Finalized,
    Cancelled,
}

impl LoadStatus {
    /// Status implied by a number of completed stages
    pub fn for_stage(current_stage: u8) -> Self {
        match current_stage {
            0 => LoadStatus::Awaiting,
            s if s >= FINAL_STAGE => LoadStatus::Finalized,
            _ => LoadStatus::InProgress,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LoadStatus::Awaiting => "awaiting",
            LoadStatus::InProgress => "in_progress",
            LoadStatus::Finalized => "finalized",
            LoadStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "awaiting" => Some(LoadStatus::Awaiting),
            "in_progress" => Some(LoadStatus::InProgress),
            "finalized" => Some(LoadStatus::Finalized),
            "cancelled" => Some(LoadStatus::Cancelled),
            _ => None,
        }
    }
}

/// Data recorded when a stage is completed
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageRecord {
    pub timestamp: Option<DateTime<Utc>>,
    pub observation: Option<String>,
    pub attachment_url: Option<String>,
    /// Only used by stage 5 (XML copy of the invoice)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secondary_attachment_url: Option<String>,
}

impl StageRecord {
    pub fn is_empty(&self) -> bool {
        self.timestamp.is_none()
            && self.observation.is_none()
            && self.attachment_url.is_none()
            && self.secondary_attachment_url.is_none()
    }

    pub fn is_complete(&self) -> bool {
        self.timestamp.is_some() && self.attachment_url.is_some()
    }
}

/// One truck-loading event ("carregamento")
///
/// `current_stage` counts completed stages: `k` means stages `1..=k` are done
/// and stage `k + 1` is the workable one; `6` means finalized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Load {
    pub id: LoadId,
    pub status: LoadStatus,
    pub current_stage: u8,
    pub client_id: ClientId,
    pub warehouse_id: WarehouseId,
    pub created_at: DateTime<Utc>,
    pub stage1: StageRecord,
    pub stage2: StageRecord,
    pub stage3: StageRecord,
    pub stage4: StageRecord,
    pub stage5: StageRecord,
}

/// Values written when one stage completes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageCompletion {
    pub stage: u8,
    pub completed_at: DateTime<Utc>,
    pub observation: Option<String>,
    pub attachment_url: String,
    pub secondary_attachment_url: Option<String>,
}

impl Load {
    pub fn new(client_id: ClientId, warehouse_id: WarehouseId) -> Self {
        Self {
            id: LoadId::new_v4(),
            status: LoadStatus::Awaiting,
            current_stage: 0,
            client_id,
            warehouse_id,
            created_at: Utc::now(),
            stage1: StageRecord::default(),
            stage2: StageRecord::default(),
            stage3: StageRecord::default(),
            stage4: StageRecord::default(),
            stage5: StageRecord::default(),
        }
    }

    pub fn is_finalized(&self) -> bool {
        self.current_stage >= FINAL_STAGE
    }

    pub fn is_cancelled(&self) -> bool {
        self.status == LoadStatus::Cancelled
    }

    /// The stage that can be worked on now, if any
    pub fn next_stage(&self) -> Option<u8> {
        let next = self.current_stage + 1;
        (!self.is_cancelled() && next <= LAST_WORKABLE_STAGE).then_some(next)
    }

    pub fn stage_record(&self, order: u8) -> Option<&StageRecord> {
        stage::stage(order).and_then(|def| def.record(self))
    }

    /// Check the stage / data invariants of a persisted record
    pub fn check_invariants(&self) -> Result<(), String> {
        if self.current_stage > FINAL_STAGE {
            return Err(format!("current stage {} out of range", self.current_stage));
        }
        if self.current_stage == LAST_WORKABLE_STAGE {
            return Err("stage 5 completed without finalizing".into());
        }
        if !self.is_cancelled() && self.status != LoadStatus::for_stage(self.current_stage) {
            return Err(format!(
                "status {} inconsistent with stage {}",
                self.status.as_str(),
                self.current_stage
            ));
        }
        for def in stage::data_stages() {
            let Some(record) = def.record(self) else {
                continue;
            };
            if def.order <= self.current_stage && !record.is_complete() {
                return Err(format!("completed stage {} is missing data", def.order));
            }
            if def.order > self.current_stage && !record.is_empty() {
                return Err(format!("future stage {} already has data", def.order));
            }
        }
        Ok(())
    }

    /// Apply a stage completion, returning the new state.
    ///
    /// Completing stage 5 also finalizes the load. Authorization and
    /// attachment checks happen before this in the advancement workflow.
    pub fn complete_stage(&self, completion: StageCompletion) -> Result<Load, AdvanceError> {
        let expected = self.current_stage + 1;
        if completion.stage != expected {
            return Err(AdvanceError::OutOfSequence {
                expected,
                requested: completion.stage,
            });
        }
        if completion.stage > LAST_WORKABLE_STAGE || self.is_cancelled() {
            return Err(AdvanceError::InvalidTarget {
                stage: completion.stage,
            });
        }

        let mut next = self.clone();
        let def = stage::stage(completion.stage).ok_or(AdvanceError::InvalidTarget {
            stage: completion.stage,
        })?;
        let record = def.record_mut(&mut next).ok_or(AdvanceError::InvalidTarget {
            stage: completion.stage,
        })?;
        record.timestamp = Some(completion.completed_at);
        record.observation = completion.observation;
        record.attachment_url = Some(completion.attachment_url);
        record.secondary_attachment_url = if def.secondary_attachment.is_some() {
            completion.secondary_attachment_url
        } else {
            None
        };

        next.current_stage = if completion.stage == LAST_WORKABLE_STAGE {
            FINAL_STAGE
        } else {
            completion.stage
        };
        next.status = LoadStatus::for_stage(next.current_stage);
        Ok(next)
    }

    pub fn cancel(&mut self) -> Result<(), String> {
        if self.is_finalized() {
            return Err("A finalized load cannot be cancelled".into());
        }
        self.status = LoadStatus::Cancelled;
        Ok(())
    }

    /// Time since creation, frozen at the documentation timestamp once
    /// the load is finalized
    pub fn elapsed(&self, now: DateTime<Utc>) -> Duration {
        let end = if self.is_finalized() {
            self.stage5.timestamp.unwrap_or(now)
        } else {
            now
        };
        end - self.created_at
    }

    /// Duration of every completed stage; stage 1 is measured from creation
    pub fn stage_durations(&self) -> Vec<(u8, Duration)> {
        let mut previous = self.created_at;
        let mut result = Vec::new();
        for def in stage::data_stages() {
            let Some(ts) = def.record(self).and_then(|r| r.timestamp) else {
                break;
            };
            result.push((def.order, ts - previous));
            previous = ts;
        }
        result
    }

    #[cfg(test)]
    pub(crate) fn new_for_test() -> Self {
        Load::new(ClientId::new_v4(), WarehouseId::new_v4())
    }
}

impl AggregateRoot for Load {
    type Id = LoadId;

    fn id(&self) -> Self::Id {
        self.id
    }

    fn aggregate_index() -> &'static str {
        "a006"
    }

    fn collection_name() -> &'static str {
        "load"
    }

    fn element_name() -> &'static str {
        "Carregamento"
    }

    fn list_name() -> &'static str {
        "Carregamentos"
    }
}

/// POST /api/loads body
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateLoadDto {
    pub client_id: ClientId,
    pub warehouse_id: WarehouseId,
}
