//! Meeting CRUD. Meetings have no status and stay mutable indefinitely.

use rusqlite::{params, OptionalExtension, Row};

use super::{datetime_col, Database, DbError};
use crate::models::{join_list, split_list, Meeting};

fn map_meeting_row(row: &Row) -> rusqlite::Result<Meeting> {
    let attendees: Option<String> = row.get(4)?;
    Ok(Meeting {
        id: row.get(0)?,
        subject_id: row.get(1)?,
        title: row.get(2)?,
        date: datetime_col(3, &row.get::<_, String>(3)?)?,
        attendees: split_list(attendees.as_deref()),
        content: row.get(5)?,
        created_at: datetime_col(6, &row.get::<_, String>(6)?)?,
        updated_at: datetime_col(7, &row.get::<_, String>(7)?)?,
    })
}

const MEETING_COLS: &str = "id, subject_id, title, date, attendees, content, created_at, updated_at";

impl Database {
    /// Insert a new meeting. Fails with `DuplicateId` if the id exists.
    pub fn add_meeting(&self, meeting: &Meeting) -> Result<(), DbError> {
        self.conn_ref()
            .execute(
                "INSERT INTO meetings
                 (id, subject_id, title, date, attendees, content, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    meeting.id,
                    meeting.subject_id,
                    meeting.title,
                    meeting.date.to_rfc3339(),
                    join_list(&meeting.attendees),
                    meeting.content,
                    meeting.created_at.to_rfc3339(),
                    meeting.updated_at.to_rfc3339(),
                ],
            )
            .map_err(|e| Self::insert_error(e, "meetings", &meeting.id))?;
        Ok(())
    }

    /// Fetch a meeting by id. `Ok(None)` if absent.
    pub fn get_meeting(&self, meeting_id: &str) -> Result<Option<Meeting>, DbError> {
        let meeting = self
            .conn_ref()
            .query_row(
                &format!("SELECT {MEETING_COLS} FROM meetings WHERE id = ?1"),
                params![meeting_id],
                map_meeting_row,
            )
            .optional()?;
        Ok(meeting)
    }

    /// All meetings for a subject, most recent date first.
    pub fn get_meetings(&self, subject_id: &str) -> Result<Vec<Meeting>, DbError> {
        let mut stmt = self.conn_ref().prepare(&format!(
            "SELECT {MEETING_COLS} FROM meetings WHERE subject_id = ?1 ORDER BY date DESC"
        ))?;
        let rows = stmt.query_map(params![subject_id], map_meeting_row)?;
        let mut meetings = Vec::new();
        for row in rows {
            meetings.push(row?);
        }
        Ok(meetings)
    }

    /// Replace the mutable fields of a meeting by id. Silent no-op when the
    /// id does not exist. subject_id and created_at are immutable.
    pub fn update_meeting(&self, meeting: &Meeting) -> Result<(), DbError> {
        self.conn_ref().execute(
            "UPDATE meetings
             SET title = ?1, date = ?2, attendees = ?3, content = ?4, updated_at = ?5
             WHERE id = ?6",
            params![
                meeting.title,
                meeting.date.to_rfc3339(),
                join_list(&meeting.attendees),
                meeting.content,
                meeting.updated_at.to_rfc3339(),
                meeting.id,
            ],
        )?;
        Ok(())
    }

    /// Delete a meeting. No-op if absent.
    pub fn delete_meeting(&self, meeting_id: &str) -> Result<(), DbError> {
        self.conn_ref()
            .execute("DELETE FROM meetings WHERE id = ?1", params![meeting_id])?;
        Ok(())
    }
}
