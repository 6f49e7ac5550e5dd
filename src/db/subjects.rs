//! Subject CRUD and cascade delete.

use rusqlite::{params, OptionalExtension, Row};

use super::{datetime_col, enum_col, Database, DbError};
use crate::models::{Subject, SubjectType};

fn map_subject_row(row: &Row) -> rusqlite::Result<Subject> {
    let subject_type: String = row.get(3)?;
    Ok(Subject {
        id: row.get(0)?,
        name: row.get(1)?,
        code: row.get(2)?,
        subject_type: enum_col(3, SubjectType::parse(&subject_type))?,
        description: row.get(4)?,
        created_at: datetime_col(5, &row.get::<_, String>(5)?)?,
        last_reviewed_at: datetime_col(6, &row.get::<_, String>(6)?)?,
    })
}

const SUBJECT_COLS: &str = "id, name, code, type, description, created_at, last_reviewed_at";

impl Database {
    /// Insert a new subject. Fails with `DuplicateId` if the id exists.
    pub fn add_subject(&self, subject: &Subject) -> Result<(), DbError> {
        self.conn_ref()
            .execute(
                "INSERT INTO subjects (id, name, code, type, description, created_at, last_reviewed_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    subject.id,
                    subject.name,
                    subject.code,
                    subject.subject_type.as_str(),
                    subject.description,
                    subject.created_at.to_rfc3339(),
                    subject.last_reviewed_at.to_rfc3339(),
                ],
            )
            .map_err(|e| Self::insert_error(e, "subjects", &subject.id))?;
        Ok(())
    }

    /// Fetch a subject by id. `Ok(None)` if absent.
    pub fn get_subject(&self, subject_id: &str) -> Result<Option<Subject>, DbError> {
        let subject = self
            .conn_ref()
            .query_row(
                &format!("SELECT {SUBJECT_COLS} FROM subjects WHERE id = ?1"),
                params![subject_id],
                map_subject_row,
            )
            .optional()?;
        Ok(subject)
    }

    /// All subjects, most recently reviewed first.
    pub fn get_all_subjects(&self) -> Result<Vec<Subject>, DbError> {
        let mut stmt = self.conn_ref().prepare(&format!(
            "SELECT {SUBJECT_COLS} FROM subjects ORDER BY last_reviewed_at DESC"
        ))?;
        let rows = stmt.query_map([], map_subject_row)?;
        let mut subjects = Vec::new();
        for row in rows {
            subjects.push(row?);
        }
        Ok(subjects)
    }

    /// Replace all mutable fields of an existing subject by id.
    /// Silently no-ops when the id does not exist.
    pub fn update_subject(&self, subject: &Subject) -> Result<(), DbError> {
        self.conn_ref().execute(
            "UPDATE subjects
             SET name = ?1, code = ?2, type = ?3, description = ?4,
                 created_at = ?5, last_reviewed_at = ?6
             WHERE id = ?7",
            params![
                subject.name,
                subject.code,
                subject.subject_type.as_str(),
                subject.description,
                subject.created_at.to_rfc3339(),
                subject.last_reviewed_at.to_rfc3339(),
                subject.id,
            ],
        )?;
        Ok(())
    }

    /// Delete a subject and everything that references it, in one
    /// transaction. The index triggers remove the matching search rows as
    /// each table is swept.
    pub fn delete_subject(&self, subject_id: &str) -> Result<(), DbError> {
        self.with_transaction(|db| {
            let conn = db.conn_ref();
            conn.execute("DELETE FROM agenda_items WHERE subject_id = ?1", params![subject_id])?;
            conn.execute("DELETE FROM meetings WHERE subject_id = ?1", params![subject_id])?;
            conn.execute("DELETE FROM actions WHERE subject_id = ?1", params![subject_id])?;
            conn.execute("DELETE FROM notes WHERE subject_id = ?1", params![subject_id])?;
            conn.execute("DELETE FROM subjects WHERE id = ?1", params![subject_id])?;
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use super::super::test_utils::test_db;
    use super::*;
    use crate::models::{Action, AgendaItem, Meeting, Note};

    #[test]
    fn test_add_and_get_subject() {
        let db = test_db();
        let mut subject = Subject::new("Platform Team", SubjectType::Team);
        subject.code = Some("PLAT".into());
        db.add_subject(&subject).expect("add");

        let got = db.get_subject(&subject.id).expect("get").expect("present");
        assert_eq!(got, subject);
    }

    #[test]
    fn test_get_missing_subject_is_none() {
        let db = test_db();
        assert!(db.get_subject("nonexistent-id").expect("get").is_none());
    }

    #[test]
    fn test_add_duplicate_id_fails() {
        let db = test_db();
        let subject = Subject::new("Alpha", SubjectType::Project);
        db.add_subject(&subject).expect("first add");

        let mut clone = subject.clone();
        clone.name = "Beta".into();
        let err = db.add_subject(&clone).unwrap_err();
        assert!(matches!(err, DbError::DuplicateId { table: "subjects", .. }));

        // The collision did not clobber the original row.
        let got = db.get_subject(&subject.id).expect("get").expect("present");
        assert_eq!(got.name, "Alpha");
    }

    #[test]
    fn test_get_all_ordered_by_last_reviewed() {
        let db = test_db();
        let now = Utc::now();

        let mut stale = Subject::new("Stale", SubjectType::Person);
        stale.last_reviewed_at = now - Duration::days(30);
        let mut fresh = Subject::new("Fresh", SubjectType::Board);
        fresh.last_reviewed_at = now;
        db.add_subject(&stale).expect("add stale");
        db.add_subject(&fresh).expect("add fresh");

        let all = db.get_all_subjects().expect("list");
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].name, "Fresh");
        assert_eq!(all[1].name, "Stale");
    }

    #[test]
    fn test_update_subject() {
        let db = test_db();
        let mut subject = Subject::new("Old Name", SubjectType::Team);
        db.add_subject(&subject).expect("add");

        subject.name = "New Name".into();
        subject.description = Some("renamed".into());
        db.update_subject(&subject).expect("update");

        let got = db.get_subject(&subject.id).expect("get").expect("present");
        assert_eq!(got.name, "New Name");
        assert_eq!(got.description.as_deref(), Some("renamed"));
    }

    #[test]
    fn test_update_missing_subject_is_noop() {
        let db = test_db();
        let subject = Subject::new("Ghost", SubjectType::Team);
        db.update_subject(&subject).expect("update should not error");
        assert!(db.get_subject(&subject.id).expect("get").is_none());
    }

    #[test]
    fn test_cascade_delete_removes_all_dependents() {
        let db = test_db();
        let subject = Subject::new("Doomed", SubjectType::Project);
        let other = Subject::new("Survivor", SubjectType::Project);
        db.add_subject(&subject).expect("add");
        db.add_subject(&other).expect("add other");

        for i in 0..2 {
            db.add_agenda_item(&AgendaItem::new(&subject.id, format!("topic {i}"), 5))
                .expect("agenda");
        }
        db.add_meeting(&Meeting::new(&subject.id, Utc::now())).expect("meeting");
        for i in 0..3 {
            db.add_action(&Action::new(&subject.id, format!("task {i}"))).expect("action");
        }
        db.add_note(&Note::new(&subject.id, "note")).expect("note");

        let kept_action = Action::new(&other.id, "kept");
        db.add_action(&kept_action).expect("other action");

        db.delete_subject(&subject.id).expect("cascade");

        assert!(db.get_subject(&subject.id).expect("get").is_none());
        assert!(db.get_agenda_items(&subject.id).expect("agenda").is_empty());
        assert!(db.get_meetings(&subject.id).expect("meetings").is_empty());
        assert!(db.get_actions(&subject.id).expect("actions").is_empty());
        assert!(db.get_notes(&subject.id).expect("notes").is_empty());

        // Unrelated subject untouched.
        assert!(db.get_subject(&other.id).expect("get").is_some());
        assert_eq!(db.get_actions(&other.id).expect("actions").len(), 1);
    }

    #[test]
    fn test_delete_missing_subject_is_noop() {
        let db = test_db();
        db.delete_subject("no-such-id").expect("no-op delete");
    }
}
