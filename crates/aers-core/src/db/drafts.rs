//! Report draft database operations.

use rusqlite::{params, OptionalExtension};

use super::{Database, DbError, DbResult};
use crate::models::{DraftStatus, ReportData, ReportDraft, Turn};

impl Database {
    /// Insert a new report draft.
    pub fn insert_draft(&self, draft: &ReportDraft) -> DbResult<()> {
        let report_json = serde_json::to_string(&draft.report)?;
        let transcript_json = serde_json::to_string(&draft.transcript)?;

        self.conn.execute(
            r#"
            INSERT INTO report_drafts (
                draft_id, report, transcript, status, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                draft.draft_id,
                report_json,
                transcript_json,
                status_to_string(&draft.status),
                draft.created_at,
                draft.updated_at,
            ],
        )?;
        Ok(())
    }

    /// Update an existing draft.
    pub fn update_draft(&self, draft: &ReportDraft) -> DbResult<bool> {
        let report_json = serde_json::to_string(&draft.report)?;
        let transcript_json = serde_json::to_string(&draft.transcript)?;

        let rows_affected = self.conn.execute(
            r#"
            UPDATE report_drafts SET
                report = ?2,
                transcript = ?3,
                status = ?4,
                updated_at = datetime('now')
            WHERE draft_id = ?1
            "#,
            params![
                draft.draft_id,
                report_json,
                transcript_json,
                status_to_string(&draft.status),
            ],
        )?;
        Ok(rows_affected > 0)
    }

    /// Get a draft by ID.
    pub fn get_draft(&self, draft_id: &str) -> DbResult<Option<ReportDraft>> {
        self.conn
            .query_row(
                r#"
                SELECT draft_id, report, transcript, status, created_at, updated_at
                FROM report_drafts
                WHERE draft_id = ?
                "#,
                [draft_id],
                |row| {
                    Ok(DraftRow {
                        draft_id: row.get(0)?,
                        report: row.get(1)?,
                        transcript: row.get(2)?,
                        status: row.get(3)?,
                        created_at: row.get(4)?,
                        updated_at: row.get(5)?,
                    })
                },
            )
            .optional()?
            .map(|row| row.try_into())
            .transpose()
    }

    /// List drafts most recently touched first.
    pub fn list_drafts(&self) -> DbResult<Vec<ReportDraft>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT draft_id, report, transcript, status, created_at, updated_at
            FROM report_drafts
            ORDER BY updated_at DESC
            "#,
        )?;

        let rows = stmt.query_map([], |row| {
            Ok(DraftRow {
                draft_id: row.get(0)?,
                report: row.get(1)?,
                transcript: row.get(2)?,
                status: row.get(3)?,
                created_at: row.get(4)?,
                updated_at: row.get(5)?,
            })
        })?;

        let mut drafts = Vec::new();
        for row in rows {
            drafts.push(row?.try_into()?);
        }
        Ok(drafts)
    }

    /// Delete a draft.
    pub fn delete_draft(&self, draft_id: &str) -> DbResult<bool> {
        let rows_affected = self
            .conn
            .execute("DELETE FROM report_drafts WHERE draft_id = ?", [draft_id])?;
        Ok(rows_affected > 0)
    }
}

/// Intermediate row struct for database mapping.
struct DraftRow {
    draft_id: String,
    report: String,
    transcript: String,
    status: String,
    created_at: String,
    updated_at: String,
}

impl TryFrom<DraftRow> for ReportDraft {
    type Error = DbError;

    fn try_from(row: DraftRow) -> Result<Self, Self::Error> {
        let report: ReportData = serde_json::from_str(&row.report)?;
        let transcript: Vec<Turn> = serde_json::from_str(&row.transcript)?;
        let status = string_to_status(&row.status)?;

        Ok(ReportDraft {
            draft_id: row.draft_id,
            report,
            transcript,
            status,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn status_to_string(status: &DraftStatus) -> &'static str {
    match status {
        DraftStatus::InProgress => "in_progress",
        DraftStatus::Complete => "complete",
    }
}

fn string_to_status(s: &str) -> Result<DraftStatus, DbError> {
    match s {
        "in_progress" => Ok(DraftStatus::InProgress),
        "complete" => Ok(DraftStatus::Complete),
        _ => Err(DbError::Constraint(format!("Unknown draft status: {}", s))),
    }
}
