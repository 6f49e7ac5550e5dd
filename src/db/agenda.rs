//! Agenda item CRUD.

use rusqlite::{params, OptionalExtension, Row};

use super::{datetime_col, enum_col, opt_datetime_col, Database, DbError};
use crate::models::{AgendaItem, AgendaStatus, RecurrencePattern};

fn map_agenda_row(row: &Row) -> rusqlite::Result<AgendaItem> {
    let status: String = row.get(5)?;
    let recurrence: Option<String> = row.get(9)?;
    Ok(AgendaItem {
        id: row.get(0)?,
        subject_id: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        priority: row.get(4)?,
        status: enum_col(5, AgendaStatus::parse(&status))?,
        created_at: datetime_col(6, &row.get::<_, String>(6)?)?,
        discussed_at: opt_datetime_col(7, row.get(7)?)?,
        is_recurring: row.get(8)?,
        recurrence_pattern: recurrence
            .map(|s| enum_col(9, RecurrencePattern::parse(&s)))
            .transpose()?,
    })
}

const AGENDA_COLS: &str = "id, subject_id, title, description, priority, status, created_at, \
                           discussed_at, is_recurring, recurrence_pattern";

impl Database {
    /// Insert a new agenda item. Fails with `DuplicateId` if the id exists.
    pub fn add_agenda_item(&self, item: &AgendaItem) -> Result<(), DbError> {
        self.conn_ref()
            .execute(
                "INSERT INTO agenda_items
                 (id, subject_id, title, description, priority, status, created_at,
                  discussed_at, is_recurring, recurrence_pattern)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                params![
                    item.id,
                    item.subject_id,
                    item.title,
                    item.description,
                    item.priority,
                    item.status.as_str(),
                    item.created_at.to_rfc3339(),
                    item.discussed_at.map(|dt| dt.to_rfc3339()),
                    item.is_recurring,
                    item.recurrence_pattern.map(|p| p.as_str()),
                ],
            )
            .map_err(|e| Self::insert_error(e, "agenda_items", &item.id))?;
        Ok(())
    }

    /// Fetch an agenda item by id. `Ok(None)` if absent.
    pub fn get_agenda_item(&self, item_id: &str) -> Result<Option<AgendaItem>, DbError> {
        let item = self
            .conn_ref()
            .query_row(
                &format!("SELECT {AGENDA_COLS} FROM agenda_items WHERE id = ?1"),
                params![item_id],
                map_agenda_row,
            )
            .optional()?;
        Ok(item)
    }

    /// All agenda items for a subject, highest priority first.
    pub fn get_agenda_items(&self, subject_id: &str) -> Result<Vec<AgendaItem>, DbError> {
        let mut stmt = self.conn_ref().prepare(&format!(
            "SELECT {AGENDA_COLS} FROM agenda_items WHERE subject_id = ?1 ORDER BY priority DESC"
        ))?;
        let rows = stmt.query_map(params![subject_id], map_agenda_row)?;
        let mut items = Vec::new();
        for row in rows {
            items.push(row?);
        }
        Ok(items)
    }

    /// Replace the mutable fields of an agenda item by id. Silent no-op when
    /// the id does not exist. subject_id and created_at are immutable.
    pub fn update_agenda_item(&self, item: &AgendaItem) -> Result<(), DbError> {
        self.conn_ref().execute(
            "UPDATE agenda_items
             SET title = ?1, description = ?2, priority = ?3, status = ?4,
                 discussed_at = ?5, is_recurring = ?6, recurrence_pattern = ?7
             WHERE id = ?8",
            params![
                item.title,
                item.description,
                item.priority,
                item.status.as_str(),
                item.discussed_at.map(|dt| dt.to_rfc3339()),
                item.is_recurring,
                item.recurrence_pattern.map(|p| p.as_str()),
                item.id,
            ],
        )?;
        Ok(())
    }

    /// Delete an agenda item. No-op if absent.
    pub fn delete_agenda_item(&self, item_id: &str) -> Result<(), DbError> {
        self.conn_ref()
            .execute("DELETE FROM agenda_items WHERE id = ?1", params![item_id])?;
        Ok(())
    }

    /// Transition an agenda item to discussed, stamping discussed_at.
    /// Returns false if the id does not exist.
    pub fn mark_agenda_discussed(&self, item_id: &str) -> Result<bool, DbError> {
        let changed = self.conn_ref().execute(
            "UPDATE agenda_items SET status = 'discussed', discussed_at = ?1 WHERE id = ?2",
            params![Self::now_string(), item_id],
        )?;
        Ok(changed > 0)
    }
}
