//! Note CRUD.

use rusqlite::{params, OptionalExtension, Row};

use super::{datetime_col, Database, DbError};
use crate::models::{join_list, split_list, Note};

fn map_note_row(row: &Row) -> rusqlite::Result<Note> {
    let tags: Option<String> = row.get(4)?;
    Ok(Note {
        id: row.get(0)?,
        subject_id: row.get(1)?,
        title: row.get(2)?,
        content: row.get(3)?,
        tags: split_list(tags.as_deref()),
        created_at: datetime_col(5, &row.get::<_, String>(5)?)?,
        updated_at: datetime_col(6, &row.get::<_, String>(6)?)?,
    })
}

const NOTE_COLS: &str = "id, subject_id, title, content, tags, created_at, updated_at";

impl Database {
    /// Insert a new note. Fails with `DuplicateId` if the id exists.
    pub fn add_note(&self, note: &Note) -> Result<(), DbError> {
        self.conn_ref()
            .execute(
                "INSERT INTO notes (id, subject_id, title, content, tags, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    note.id,
                    note.subject_id,
                    note.title,
                    note.content,
                    join_list(&note.tags),
                    note.created_at.to_rfc3339(),
                    note.updated_at.to_rfc3339(),
                ],
            )
            .map_err(|e| Self::insert_error(e, "notes", &note.id))?;
        Ok(())
    }

    /// Fetch a note by id. `Ok(None)` if absent.
    pub fn get_note(&self, note_id: &str) -> Result<Option<Note>, DbError> {
        let note = self
            .conn_ref()
            .query_row(
                &format!("SELECT {NOTE_COLS} FROM notes WHERE id = ?1"),
                params![note_id],
                map_note_row,
            )
            .optional()?;
        Ok(note)
    }

    /// All notes for a subject, most recently updated first.
    pub fn get_notes(&self, subject_id: &str) -> Result<Vec<Note>, DbError> {
        let mut stmt = self.conn_ref().prepare(&format!(
            "SELECT {NOTE_COLS} FROM notes WHERE subject_id = ?1 ORDER BY updated_at DESC"
        ))?;
        let rows = stmt.query_map(params![subject_id], map_note_row)?;
        let mut notes = Vec::new();
        for row in rows {
            notes.push(row?);
        }
        Ok(notes)
    }

    /// Replace the mutable fields of a note by id. Silent no-op when the id
    /// does not exist. subject_id and created_at are immutable.
    pub fn update_note(&self, note: &Note) -> Result<(), DbError> {
        self.conn_ref().execute(
            "UPDATE notes SET title = ?1, content = ?2, tags = ?3, updated_at = ?4 WHERE id = ?5",
            params![
                note.title,
                note.content,
                join_list(&note.tags),
                note.updated_at.to_rfc3339(),
                note.id,
            ],
        )?;
        Ok(())
    }

    /// Delete a note. No-op if absent.
    pub fn delete_note(&self, note_id: &str) -> Result<(), DbError> {
        self.conn_ref()
            .execute("DELETE FROM notes WHERE id = ?1", params![note_id])?;
        Ok(())
    }
}
