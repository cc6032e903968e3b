use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why a stage could not be advanced
///
/// Serialized with a stable `code` tag so the presentation layer can pick
/// its message without parsing text.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "code", rename_all = "snake_case")]
pub enum AdvanceError {
    #[error("stage {requested} is out of sequence, the workable stage is {expected}")]
    OutOfSequence { expected: u8, requested: u8 },

    #[error("stage {stage} cannot be advanced into")]
    InvalidTarget { stage: u8 },

    #[error("stage {stage} requires an attachment")]
    MissingAttachment { stage: u8 },

    #[error("stage {stage} expects {expected}, received {received}")]
    WrongAttachmentType {
        stage: u8,
        expected: String,
        received: String,
    },

    #[error("not allowed to edit stage {stage}")]
    Forbidden { stage: u8 },

    #[error("attachment storage failed: {message}")]
    StorageFailure { message: String },

    #[error("the load was advanced by someone else")]
    ConcurrentModification,

    #[error("load not found")]
    NotFound,
}

impl AdvanceError {
    pub fn code(&self) -> &'static str {
        match self {
            AdvanceError::OutOfSequence { .. } => "out_of_sequence",
            AdvanceError::InvalidTarget { .. } => "invalid_target",
            AdvanceError::MissingAttachment { .. } => "missing_attachment",
            AdvanceError::WrongAttachmentType { .. } => "wrong_attachment_type",
            AdvanceError::Forbidden { .. } => "forbidden",
            AdvanceError::StorageFailure { .. } => "storage_failure",
            AdvanceError::ConcurrentModification => "concurrent_modification",
            AdvanceError::NotFound => "not_found",
        }
    }

    /// The record moved on; reloading it shows the current state
    pub fn is_stale_state(&self) -> bool {
        matches!(
            self,
            AdvanceError::OutOfSequence { .. } | AdvanceError::ConcurrentModification
        )
    }
}

/// Error body of the advance endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdvanceErrorResponse {
    #[serde(flatten)]
    pub error: AdvanceError,
    pub message: String,
}

impl From<AdvanceError> for AdvanceErrorResponse {
    fn from(error: AdvanceError) -> Self {
        let message = error.to_string();
        Self { error, message }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_matches_serialized_tag() {
        let errors = vec![
            AdvanceError::OutOfSequence {
                expected: 1,
                requested: 3,
            },
            AdvanceError::InvalidTarget { stage: 6 },
            AdvanceError::MissingAttachment { stage: 2 },
            AdvanceError::WrongAttachmentType {
                stage: 5,
                expected: "document".into(),
                received: "a.png".into(),
            },
            AdvanceError::Forbidden { stage: 1 },
            AdvanceError::StorageFailure {
                message: "timeout".into(),
            },
            AdvanceError::ConcurrentModification,
            AdvanceError::NotFound,
        ];
        for error in errors {
            let json = serde_json::to_value(&error).unwrap();
            assert_eq!(json["code"], error.code());
        }
    }

    #[test]
    fn test_response_body_carries_message() {
        let body = AdvanceErrorResponse::from(AdvanceError::MissingAttachment { stage: 2 });
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["code"], "missing_attachment");
        assert_eq!(json["stage"], 2);
        assert_eq!(json["message"], "stage 2 requires an attachment");
    }
}
