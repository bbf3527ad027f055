//! SQLite schema definition.

/// Complete database schema for the intake core.
pub const SCHEMA: &str = r#"
-- Enable foreign keys
PRAGMA foreign_keys = ON;

-- ============================================================================
-- Pending Action (single durable slot)
-- ============================================================================

-- At most one report-start request may be outstanding: the CHECK pins the
-- table to a single row, and storing a second action overwrites the first.
CREATE TABLE IF NOT EXISTS pending_action (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    description TEXT NOT NULL,
    files TEXT NOT NULL DEFAULT '[]',            -- JSON array of {name, size, type}
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- ============================================================================
-- Report Drafts (resumable sessions - mutable)
-- ============================================================================

CREATE TABLE IF NOT EXISTS report_drafts (
    draft_id TEXT PRIMARY KEY,
    report TEXT NOT NULL,                        -- JSON ReportData, always full-shape
    transcript TEXT NOT NULL DEFAULT '[]',       -- JSON array of Turn
    status TEXT NOT NULL DEFAULT 'in_progress',  -- in_progress, complete
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_drafts_status ON report_drafts(status);
CREATE INDEX IF NOT EXISTS idx_drafts_updated ON report_drafts(updated_at);
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn test_schema_valid() {
        let conn = Connection::open_in_memory().unwrap();
        let result = conn.execute_batch(SCHEMA);
        assert!(result.is_ok(), "Schema should be valid SQL: {:?}", result);
    }

    #[test]
    fn test_pending_action_single_row() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA).unwrap();

        conn.execute(
            "INSERT INTO pending_action (id, description) VALUES (1, 'nausea')",
            [],
        )
        .unwrap();

        // A second row is rejected by the CHECK constraint
        let result = conn.execute(
            "INSERT INTO pending_action (id, description) VALUES (2, 'rash')",
            [],
        );
        assert!(result.is_err());

        // Overwriting the slot is allowed
        conn.execute(
            "INSERT OR REPLACE INTO pending_action (id, description) VALUES (1, 'rash')",
            [],
        )
        .unwrap();

        let description: String = conn
            .query_row("SELECT description FROM pending_action WHERE id = 1", [], |row| {
                row.get(0)
            })
            .unwrap();
        assert_eq!(description, "rash");
    }
}
