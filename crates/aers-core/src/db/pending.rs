//! Pending-action store: one durable slot for a deferred report start.

use log::warn;
use rusqlite::{params, OptionalExtension};

use super::{Database, DbResult};
use crate::models::{AttachmentMeta, PendingAction};

impl Database {
    /// Persist the pending action, overwriting any prior value.
    ///
    /// Only attachment metadata is stored; file content does not survive an
    /// identity-verification interruption.
    pub fn store_pending_action(&self, action: &PendingAction) -> DbResult<()> {
        let files_json = serde_json::to_string(&action.files)?;
        self.conn.execute(
            r#"
            INSERT OR REPLACE INTO pending_action (id, description, files, created_at)
            VALUES (1, ?1, ?2, datetime('now'))
            "#,
            params![action.description, files_json],
        )?;
        Ok(())
    }

    /// Read and remove the pending action in one logical operation.
    ///
    /// The read and the delete run inside a single transaction, so two
    /// consumers can never replay the same action. An unparseable stored
    /// payload is treated as "no pending action" and dropped.
    pub fn restore_and_clear_pending_action(&mut self) -> DbResult<Option<PendingAction>> {
        let tx = self.transaction()?;

        let row: Option<(String, String)> = tx
            .query_row(
                "SELECT description, files FROM pending_action WHERE id = 1",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        tx.execute("DELETE FROM pending_action WHERE id = 1", [])?;
        tx.commit()?;

        let Some((description, files_json)) = row else {
            return Ok(None);
        };

        let files: Vec<AttachmentMeta> = match serde_json::from_str(&files_json) {
            Ok(files) => files,
            Err(e) => {
                warn!("discarding corrupt pending action payload: {}", e);
                return Ok(None);
            }
        };

        Ok(Some(PendingAction { description, files }))
    }

    /// Drop any pending action without returning it.
    pub fn clear_pending_action(&self) -> DbResult<()> {
        self.conn.execute("DELETE FROM pending_action WHERE id = 1", [])?;
        Ok(())
    }

    /// Whether a pending action is currently stored.
    pub fn has_pending_action(&self) -> DbResult<bool> {
        let count: i64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM pending_action", [], |row| row.get(0))?;
        Ok(count > 0)
    }
}
