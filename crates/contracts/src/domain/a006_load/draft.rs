use serde::{Deserialize, Serialize};

use super::advance::{normalize_observation, AdvanceRequest};
use super::aggregate::LoadId;
use super::error::AdvanceErrorResponse;
use super::stage::AttachmentMeta;

/// Unsaved edit state of the stage panel.
///
/// Lives only on the presentation side and is turned into an
/// [`AdvanceRequest`] on submit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditSessionDraft {
    pub load_id: LoadId,
    pub stage: u8,
    pub observation: String,
    pub attachment: Option<AttachmentMeta>,
    pub secondary_attachment: Option<AttachmentMeta>,
    pub last_error: Option<String>,
    pub submitting: bool,
}

impl EditSessionDraft {
    pub fn new(load_id: LoadId, stage: u8) -> Self {
        Self {
            load_id,
            stage,
            observation: String::new(),
            attachment: None,
            secondary_attachment: None,
            last_error: None,
            submitting: false,
        }
    }

    /// Retarget the draft; anything typed for another stage is dropped
    pub fn select_stage(&mut self, stage: u8) {
        if stage != self.stage {
            *self = Self::new(self.load_id, stage);
        }
    }

    pub fn set_observation(&mut self, text: impl Into<String>) {
        self.observation = text.into();
    }

    pub fn choose_attachment(&mut self, meta: Option<AttachmentMeta>) {
        self.attachment = meta;
        self.last_error = None;
    }

    pub fn choose_secondary_attachment(&mut self, meta: Option<AttachmentMeta>) {
        self.secondary_attachment = meta;
        self.last_error = None;
    }

    pub fn can_submit(&self) -> bool {
        self.attachment.is_some() && !self.submitting
    }

    /// Build the request and mark the draft as in flight
    pub fn begin_submit(&mut self) -> Option<AdvanceRequest> {
        if !self.can_submit() {
            return None;
        }
        self.submitting = true;
        self.last_error = None;
        Some(AdvanceRequest {
            stage: self.stage,
            attachment: self.attachment.clone(),
            secondary_attachment: self.secondary_attachment.clone(),
            observation: normalize_observation(Some(&self.observation)),
        })
    }

    /// Keep what was typed and show the message
    pub fn record_failure(&mut self, error: &AdvanceErrorResponse) {
        self.submitting = false;
        self.last_error = Some(error.message.clone());
    }

    /// The stage was committed, the next one starts clean
    pub fn record_success(&mut self, next_stage: u8) {
        *self = Self::new(self.load_id, next_stage);
    }
}
