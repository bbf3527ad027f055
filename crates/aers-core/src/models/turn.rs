//! Transcript turns, attachments and the deferred report-start action.

use serde::{Deserialize, Serialize};

/// Who produced a turn.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Human,
    Agent,
}

/// One unit of the human/agent exchange.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Turn {
    /// Unique turn ID.
    pub id: String,
    pub role: Role,
    pub text: String,
    /// Display-only turns (the greeting, form-edit acknowledgements) are
    /// kept out of the collaborator context.
    pub local_only: bool,
    /// Creation timestamp, RFC 3339.
    pub created_at: String,
}

impl Turn {
    pub fn human(text: impl Into<String>) -> Self {
        Self::new(Role::Human, text, false)
    }

    pub fn agent(text: impl Into<String>) -> Self {
        Self::new(Role::Agent, text, false)
    }

    /// An agent-voiced turn shown to the user but never sent as context.
    pub fn local_agent(text: impl Into<String>) -> Self {
        Self::new(Role::Agent, text, true)
    }

    fn new(role: Role, text: impl Into<String>, local_only: bool) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            role,
            text: text.into(),
            local_only,
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Attachment descriptor that survives persistence. File content is never
/// stored, which is why attachments do not survive an identity-verification
/// interruption.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AttachmentMeta {
    pub name: String,
    pub size: u64,
    /// MIME type, e.g. "image/png".
    #[serde(rename = "type")]
    pub mime_type: String,
}

/// In-memory attachment content handed to the collaborator alongside the
/// turn that carried it.
#[derive(Debug, Clone, PartialEq)]
pub struct AttachmentPayload {
    pub meta: AttachmentMeta,
    /// Base64-encoded file content.
    pub data: String,
}

/// A report-start request deferred until identity is verified.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PendingAction {
    pub description: String,
    #[serde(default)]
    pub files: Vec<AttachmentMeta>,
}

impl PendingAction {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            files: Vec::new(),
        }
    }
}
