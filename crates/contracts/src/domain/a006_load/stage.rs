//! Static catalog of the six loading stages.
//!
//! Stage `n` owns the `stage{n}` record of a [`Load`]; the terminal stage 6
//! ("Finalizado") owns no data. Fields are reached through a typed accessor
//! table instead of string keys.

use serde::{Deserialize, Serialize};

use super::aggregate::{Load, StageRecord};

/// Terminal stage, reached automatically when stage 5 completes
pub const FINAL_STAGE: u8 = 6;

/// Last stage that is completed by a manual action
pub const LAST_WORKABLE_STAGE: u8 = 5;

/// What kind of file a stage accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttachmentKind {
    /// Photo of the truck / load
    Photo,
    /// Invoice PDF
    Document,
    /// Machine-readable invoice copy (XML)
    StructuredData,
}

const PHOTO_EXTENSIONS: [&str; 7] = ["jpg", "jpeg", "png", "gif", "webp", "heic", "bmp"];

impl AttachmentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttachmentKind::Photo => "photo",
            AttachmentKind::Document => "document",
            AttachmentKind::StructuredData => "structured_data",
        }
    }

    /// Decide by content type when one is given, otherwise by file extension
    pub fn matches(&self, meta: &AttachmentMeta) -> bool {
        match meta.mime_essence() {
            Some(mime) if mime != "application/octet-stream" => match self {
                AttachmentKind::Photo => mime.starts_with("image/"),
                AttachmentKind::Document => mime == "application/pdf",
                AttachmentKind::StructuredData => mime == "application/xml" || mime == "text/xml",
            },
            _ => {
                let ext = meta.extension();
                match self {
                    AttachmentKind::Photo => PHOTO_EXTENSIONS.contains(&ext.as_str()),
                    AttachmentKind::Document => ext == "pdf",
                    AttachmentKind::StructuredData => ext == "xml",
                }
            }
        }
    }
}

impl std::fmt::Display for AttachmentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Description of a chosen file, without its bytes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachmentMeta {
    pub file_name: String,
    pub content_type: Option<String>,
    pub size: u64,
}

impl AttachmentMeta {
    pub fn new(file_name: impl Into<String>, content_type: Option<&str>, size: u64) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.map(str::to_string),
            size,
        }
    }

    /// Lower-cased content type without parameters
    fn mime_essence(&self) -> Option<String> {
        self.content_type
            .as_deref()
            .map(|ct| ct.split(';').next().unwrap_or("").trim().to_lowercase())
            .filter(|ct| !ct.is_empty())
    }

    pub fn extension(&self) -> String {
        std::path::Path::new(&self.file_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default()
    }

    /// Short description used in error messages
    pub fn describe(&self) -> String {
        match &self.content_type {
            Some(ct) => format!("{} ({})", self.file_name, ct),
            None => self.file_name.clone(),
        }
    }
}

/// Typed accessors for the record a stage owns
#[derive(Clone, Copy)]
pub struct StageFields {
    get: fn(&Load) -> &StageRecord,
    get_mut: fn(&mut Load) -> &mut StageRecord,
}

#[derive(Clone, Copy)]
pub struct StageDefinition {
    pub order: u8,
    pub name: &'static str,
    /// Prefix of the persisted columns and of storage keys
    pub key: &'static str,
    /// Required primary attachment; `None` only for the terminal stage
    pub attachment: Option<AttachmentKind>,
    /// Optional second attachment accepted together with the primary one
    pub secondary_attachment: Option<AttachmentKind>,
    fields: Option<StageFields>,
}

impl StageDefinition {
    pub fn requires_document(&self) -> bool {
        self.attachment == Some(AttachmentKind::Document)
    }

    pub fn is_terminal(&self) -> bool {
        self.fields.is_none()
    }

    pub fn record<'a>(&self, load: &'a Load) -> Option<&'a StageRecord> {
        self.fields.map(|f| (f.get)(load))
    }

    pub fn record_mut<'a>(&self, load: &'a mut Load) -> Option<&'a mut StageRecord> {
        self.fields.map(|f| (f.get_mut)(load))
    }
}

impl std::fmt::Debug for StageDefinition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StageDefinition")
            .field("order", &self.order)
            .field("name", &self.name)
            .field("attachment", &self.attachment)
            .finish()
    }
}

fn stage1(l: &Load) -> &StageRecord {
    &l.stage1
}
fn stage1_mut(l: &mut Load) -> &mut StageRecord {
    &mut l.stage1
}
fn stage2(l: &Load) -> &StageRecord {
    &l.stage2
}
fn stage2_mut(l: &mut Load) -> &mut StageRecord {
    &mut l.stage2
}
fn stage3(l: &Load) -> &StageRecord {
    &l.stage3
}
fn stage3_mut(l: &mut Load) -> &mut StageRecord {
    &mut l.stage3
}
fn stage4(l: &Load) -> &StageRecord {
    &l.stage4
}
fn stage4_mut(l: &mut Load) -> &mut StageRecord {
    &mut l.stage4
}
fn stage5(l: &Load) -> &StageRecord {
    &l.stage5
}
fn stage5_mut(l: &mut Load) -> &mut StageRecord {
    &mut l.stage5
}

pub static STAGES: [StageDefinition; 6] = [
    StageDefinition {
        order: 1,
        name: "Chegada",
        key: "stage1",
        attachment: Some(AttachmentKind::Photo),
        secondary_attachment: None,
        fields: Some(StageFields {
            get: stage1,
            get_mut: stage1_mut,
        }),
    },
    StageDefinition {
        order: 2,
        name: "Início Carregamento",
        key: "stage2",
        attachment: Some(AttachmentKind::Photo),
        secondary_attachment: None,
        fields: Some(StageFields {
            get: stage2,
            get_mut: stage2_mut,
        }),
    },
    StageDefinition {
        order: 3,
        name: "Carregando",
        key: "stage3",
        attachment: Some(AttachmentKind::Photo),
        secondary_attachment: None,
        fields: Some(StageFields {
            get: stage3,
            get_mut: stage3_mut,
        }),
    },
    StageDefinition {
        order: 4,
        name: "Carreg. Finalizado",
        key: "stage4",
        attachment: Some(AttachmentKind::Photo),
        secondary_attachment: None,
        fields: Some(StageFields {
            get: stage4,
            get_mut: stage4_mut,
        }),
    },
    StageDefinition {
        order: 5,
        name: "Documentação",
        key: "stage5",
        attachment: Some(AttachmentKind::Document),
        secondary_attachment: Some(AttachmentKind::StructuredData),
        fields: Some(StageFields {
            get: stage5,
            get_mut: stage5_mut,
        }),
    },
    StageDefinition {
        order: 6,
        name: "Finalizado",
        key: "stage6",
        attachment: None,
        secondary_attachment: None,
        fields: None,
    },
];

/// Look a stage up by its order (1..=6)
pub fn stage(order: u8) -> Option<&'static StageDefinition> {
    let index = order.checked_sub(1)? as usize;
    STAGES.get(index)
}

/// Stages 1..=5, the ones that carry data
pub fn data_stages() -> impl Iterator<Item = &'static StageDefinition> {
    STAGES.iter().filter(|s| !s.is_terminal())
}
