//! AERS Intake Core Library
//!
//! Local-first core for building adverse-event reports through an alternating
//! human/agent dialogue, with durable hand-off across identity verification.
//!
//! # Architecture
//!
//! ```text
//! User input → Transcript append → Collaborator call (host transport)
//!                                          │
//!                          ┌───────────────┴───────────────┐
//!                          │                               │
//!                   suggestions[]                    record patch
//!                          │                               │
//!                  Disambiguation                 ┌────────▼────────┐
//!                  (forced choice,                │  Reconciliation │
//!                   record untouched)             │  merge / edit   │
//!                          │                      └────────┬────────┘
//!                  confirmation turn                       │
//!                          │                      sentinel in message?
//!                          └──────────► loop ──────────────┤
//!                                                          ▼
//!                                                       Review → Export
//! ```
//!
//! # Core Principles
//!
//! - **Two writers, one record.** Generator patches merge key-wise and can
//!   never delete data; direct user edits replace whole sections and always
//!   win.
//! - **The record is always full-shape.** Every section and field key exists
//!   after every merge; partial shapes are never persisted or exported.
//! - **One outstanding collaborator call.** Input locks while a call is in
//!   flight; replies are tagged with a turn index and stale ones dropped.
//!
//! # Modules
//!
//! - [`db`]: SQLite layer (pending-action slot, resumable drafts)
//! - [`models`]: Domain types (ReportData, ReportPatch, Turn, PendingAction)
//! - [`reconcile`]: Merge engine, section edits, completion metric
//! - [`session`]: Session state machine and transcript
//! - [`suggest`]: Disambiguation candidate ranking
//! - [`export`]: Self-describing report document

pub mod db;
pub mod export;
pub mod models;
pub mod reconcile;
pub mod session;
pub mod suggest;

// Re-export commonly used types
pub use db::Database;
pub use export::{suggested_filename, ReportDocument};
pub use models::{
    AttachmentMeta, AttachmentPayload, DraftStatus, IdentityProfile, PendingAction, ReportData,
    ReportDraft, ReportPatch, Role, Turn,
};
pub use reconcile::{apply_section_edit, completion, merge, SectionEdit};
pub use session::{
    CollaboratorRequest, IdentityProvider, Session, SessionEvent, SessionSignal, Transcript,
    View, COMPLETION_PHRASE, CONFIRMATION_MARKER,
};

// UniFFI setup - using proc macros
uniffi::setup_scaffolding!();

use std::sync::{Arc, Mutex};

// =========================================================================
// FFI Error Type
// =========================================================================

#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum AersError {
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<db::DbError> for AersError {
    fn from(e: db::DbError) -> Self {
        AersError::DatabaseError(e.to_string())
    }
}

impl From<serde_json::Error> for AersError {
    fn from(e: serde_json::Error) -> Self {
        AersError::SerializationError(e.to_string())
    }
}

impl From<export::ExportError> for AersError {
    fn from(e: export::ExportError) -> Self {
        AersError::SerializationError(e.to_string())
    }
}

impl<T> From<std::sync::PoisonError<T>> for AersError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        AersError::DatabaseError(format!("Lock poisoned: {}", e))
    }
}

// =========================================================================
// Factory Functions (exported to FFI)
// =========================================================================

/// Open or create a database at the given path.
#[uniffi::export]
pub fn open_database(path: String) -> Result<Arc<AersCore>, AersError> {
    let db = Database::open(&path)?;
    Ok(Arc::new(AersCore {
        db: Arc::new(Mutex::new(db)),
    }))
}

/// Create an in-memory database (for testing).
#[uniffi::export]
pub fn open_database_in_memory() -> Result<Arc<AersCore>, AersError> {
    let db = Database::open_in_memory()?;
    Ok(Arc::new(AersCore {
        db: Arc::new(Mutex::new(db)),
    }))
}

// =========================================================================
// Stateless Helpers (exported to FFI)
// =========================================================================

/// Merge a collaborator patch (JSON) into the current record (JSON).
#[uniffi::export]
pub fn merge_report(current_json: String, patch_json: String) -> Result<String, AersError> {
    let current: ReportData = serde_json::from_str(&current_json)?;
    let patch: ReportPatch = serde_json::from_str(&patch_json)?;
    Ok(serde_json::to_string(&reconcile::merge(&current, &patch))?)
}

/// Completion percentage for a record (JSON).
#[uniffi::export]
pub fn completion_percentage(report_json: String) -> Result<u8, AersError> {
    let report: ReportData = serde_json::from_str(&report_json)?;
    Ok(reconcile::completion(&report))
}

/// Build the export document for a record (JSON in, pretty JSON out).
#[uniffi::export]
pub fn export_report(report_json: String) -> Result<String, AersError> {
    let report: ReportData = serde_json::from_str(&report_json)?;
    let doc = ReportDocument::from_report(&report)?;
    Ok(doc.to_json()?)
}

/// Form-editor contract: comma-separated free text to trimmed, non-empty,
/// order-preserving list.
#[uniffi::export]
pub fn split_delimited(text: String) -> Vec<String> {
    reconcile::split_delimited(&text)
}

/// Inverse of [`split_delimited`], for pre-filling the form editor.
#[uniffi::export]
pub fn join_delimited(items: Vec<String>) -> String {
    reconcile::join_delimited(&items)
}

// =========================================================================
// Main API Object
// =========================================================================

/// Thread-safe database wrapper for FFI.
#[derive(uniffi::Object)]
pub struct AersCore {
    db: Arc<Mutex<Database>>,
}

#[uniffi::export]
impl AersCore {
    // =========================================================================
    // Pending Action Operations
    // =========================================================================

    /// Persist the deferred report-start request, overwriting any prior one.
    pub fn store_pending_action(&self, action: FfiPendingAction) -> Result<(), AersError> {
        let db = self.db.lock()?;
        db.store_pending_action(&action.into())?;
        Ok(())
    }

    /// Read and clear the pending action in one operation.
    pub fn restore_pending_action(&self) -> Result<Option<FfiPendingAction>, AersError> {
        let mut db = self.db.lock()?;
        let action = db.restore_and_clear_pending_action()?;
        Ok(action.map(|a| a.into()))
    }

    /// Drop any pending action without returning it.
    pub fn clear_pending_action(&self) -> Result<(), AersError> {
        let db = self.db.lock()?;
        db.clear_pending_action()?;
        Ok(())
    }

    /// Whether a pending action is stored.
    pub fn has_pending_action(&self) -> Result<bool, AersError> {
        let db = self.db.lock()?;
        Ok(db.has_pending_action()?)
    }

    // =========================================================================
    // Draft Operations
    // =========================================================================

    /// Save a session snapshot; returns the draft ID.
    pub fn store_draft(
        &self,
        report_json: String,
        transcript_json: String,
        complete: bool,
    ) -> Result<String, AersError> {
        let report: ReportData = serde_json::from_str(&report_json)?;
        let transcript: Vec<Turn> = serde_json::from_str(&transcript_json)?;
        let status = if complete {
            DraftStatus::Complete
        } else {
            DraftStatus::InProgress
        };
        let draft = ReportDraft::new(report, transcript, status);

        let db = self.db.lock()?;
        db.insert_draft(&draft)?;
        Ok(draft.draft_id)
    }

    /// List saved drafts, most recently touched first.
    pub fn list_drafts(&self) -> Result<Vec<FfiDraftSummary>, AersError> {
        let db = self.db.lock()?;
        let drafts = db.list_drafts()?;
        Ok(drafts.into_iter().map(|d| d.into()).collect())
    }

    /// Full draft as JSON, if it exists.
    pub fn get_draft_json(&self, draft_id: String) -> Result<Option<String>, AersError> {
        let db = self.db.lock()?;
        let draft = db.get_draft(&draft_id)?;
        Ok(match draft {
            Some(d) => Some(serde_json::to_string(&d)?),
            None => None,
        })
    }

    /// Delete a draft; returns whether it existed.
    pub fn delete_draft(&self, draft_id: String) -> Result<bool, AersError> {
        let db = self.db.lock()?;
        Ok(db.delete_draft(&draft_id)?)
    }
}

// =========================================================================
// FFI Types
// =========================================================================

/// FFI-safe attachment metadata.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiAttachmentMeta {
    pub name: String,
    pub size: u64,
    pub mime_type: String,
}

impl From<AttachmentMeta> for FfiAttachmentMeta {
    fn from(meta: AttachmentMeta) -> Self {
        Self {
            name: meta.name,
            size: meta.size,
            mime_type: meta.mime_type,
        }
    }
}

impl From<FfiAttachmentMeta> for AttachmentMeta {
    fn from(meta: FfiAttachmentMeta) -> Self {
        AttachmentMeta {
            name: meta.name,
            size: meta.size,
            mime_type: meta.mime_type,
        }
    }
}

/// FFI-safe pending action.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiPendingAction {
    pub description: String,
    pub files: Vec<FfiAttachmentMeta>,
}

impl From<PendingAction> for FfiPendingAction {
    fn from(action: PendingAction) -> Self {
        Self {
            description: action.description,
            files: action.files.into_iter().map(|f| f.into()).collect(),
        }
    }
}

impl From<FfiPendingAction> for PendingAction {
    fn from(action: FfiPendingAction) -> Self {
        PendingAction {
            description: action.description,
            files: action.files.into_iter().map(|f| f.into()).collect(),
        }
    }
}

/// FFI-safe draft summary.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiDraftSummary {
    pub draft_id: String,
    pub complete: bool,
    pub completion_percent: u8,
    pub updated_at: String,
}

impl From<ReportDraft> for FfiDraftSummary {
    fn from(draft: ReportDraft) -> Self {
        Self {
            draft_id: draft.draft_id.clone(),
            complete: draft.status == DraftStatus::Complete,
            completion_percent: reconcile::completion(&draft.report),
            updated_at: draft.updated_at.clone(),
        }
    }
}
