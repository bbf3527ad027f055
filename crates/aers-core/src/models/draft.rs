//! Durable session snapshots.

use serde::{Deserialize, Serialize};

use super::report::ReportData;
use super::turn::Turn;

/// Draft lifecycle status.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum DraftStatus {
    /// The dialogue is still running.
    InProgress,
    /// The completion sentinel was seen; the report reached review.
    Complete,
}

/// A saved session: the record plus the transcript that produced it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReportDraft {
    pub draft_id: String,
    pub report: ReportData,
    pub transcript: Vec<Turn>,
    pub status: DraftStatus,
    pub created_at: String,
    pub updated_at: String,
}

impl ReportDraft {
    pub fn new(report: ReportData, transcript: Vec<Turn>, status: DraftStatus) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            draft_id: uuid::Uuid::new_v4().to_string(),
            report,
            transcript,
            status,
            created_at: now.clone(),
            updated_at: now,
        }
    }

    /// Touch the updated_at timestamp.
    pub fn touch(&mut self) {
        self.updated_at = chrono::Utc::now().to_rfc3339();
    }
}
