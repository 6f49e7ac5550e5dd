//! Additive schema migrations.
//!
//! There is no schema-version number. Each migration introspects the live
//! schema (`PRAGMA table_info`) and alters it only when the column is
//! missing, so the whole set is safe to run on every open. Migrations never
//! drop or rename columns.

use rusqlite::Connection;

/// Run all additive migrations. Called after the baseline schema is applied.
pub fn run_migrations(conn: &Connection) -> Result<(), String> {
    // Legacy databases predate the meetings title column.
    if !has_column(conn, "meetings", "title")? {
        conn.execute_batch("ALTER TABLE meetings ADD COLUMN title TEXT DEFAULT 'Meeting'")
            .map_err(|e| format!("Failed to add meetings.title: {e}"))?;
        log::info!("Migration: added meetings.title");
    }

    // Legacy databases predate note-originated actions.
    if !has_column(conn, "actions", "note_id")? {
        conn.execute_batch("ALTER TABLE actions ADD COLUMN note_id TEXT")
            .map_err(|e| format!("Failed to add actions.note_id: {e}"))?;
        log::info!("Migration: added actions.note_id");
    }

    Ok(())
}

/// Check whether `table` has a column named `column`.
fn has_column(conn: &Connection, table: &str, column: &str) -> Result<bool, String> {
    let mut stmt = conn
        .prepare(&format!("PRAGMA table_info({table})"))
        .map_err(|e| format!("Failed to introspect {table}: {e}"))?;
    let mut rows = stmt
        .query([])
        .map_err(|e| format!("Failed to introspect {table}: {e}"))?;
    while let Some(row) = rows.next().map_err(|e| e.to_string())? {
        let name: String = row.get(1).map_err(|e| e.to_string())?;
        if name == column {
            return Ok(true);
        }
    }
    Ok(false)
}
