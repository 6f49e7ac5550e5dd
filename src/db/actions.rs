//! Action CRUD, status transitions, timeframe buckets, and reverse lookups.

use chrono::{Duration, Utc};
use rusqlite::{params, OptionalExtension, Row};
use serde::Serialize;

use super::{datetime_col, enum_col, opt_datetime_col, Database, DbError};
use crate::models::{join_list, split_list, Action, ActionStatus, Timeframe};

/// A timeframe query row: the action joined with its owning subject's name.
#[derive(Debug, Clone, Serialize)]
pub struct TimeframeEntry {
    pub action: Action,
    pub subject_name: String,
}

fn map_action_row(row: &Row) -> rusqlite::Result<Action> {
    let status: String = row.get(4)?;
    let tags: Option<String> = row.get(12)?;
    Ok(Action {
        id: row.get(0)?,
        subject_id: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        status: enum_col(4, ActionStatus::parse(&status))?,
        due_date: opt_datetime_col(5, row.get(5)?)?,
        created_at: datetime_col(6, &row.get::<_, String>(6)?)?,
        completed_at: opt_datetime_col(7, row.get(7)?)?,
        archived_at: opt_datetime_col(8, row.get(8)?)?,
        meeting_id: row.get(9)?,
        note_id: row.get(10)?,
        agenda_item_id: row.get(11)?,
        tags: split_list(tags.as_deref()),
    })
}

const ACTION_COLS: &str = "id, subject_id, title, description, status, due_date, created_at, \
                           completed_at, archived_at, meeting_id, note_id, agenda_item_id, tags";

/// Dated actions first (ascending), then the undated ones. SQLite's plain
/// ascending sort would put NULLs first.
const ACTION_ORDER: &str = "CASE WHEN due_date IS NULL THEN 1 ELSE 0 END, due_date ASC";

impl Database {
    /// Insert a new action. Fails with `DuplicateId` if the id exists.
    pub fn add_action(&self, action: &Action) -> Result<(), DbError> {
        self.conn_ref()
            .execute(
                "INSERT INTO actions
                 (id, subject_id, title, description, status, due_date, created_at,
                  completed_at, archived_at, meeting_id, note_id, agenda_item_id, tags)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
                params![
                    action.id,
                    action.subject_id,
                    action.title,
                    action.description,
                    action.status.as_str(),
                    action.due_date.map(|dt| dt.to_rfc3339()),
                    action.created_at.to_rfc3339(),
                    action.completed_at.map(|dt| dt.to_rfc3339()),
                    action.archived_at.map(|dt| dt.to_rfc3339()),
                    action.meeting_id,
                    action.note_id,
                    action.agenda_item_id,
                    join_list(&action.tags),
                ],
            )
            .map_err(|e| Self::insert_error(e, "actions", &action.id))?;
        Ok(())
    }

    /// Fetch an action by id. `Ok(None)` if absent. Archived actions are
    /// still reachable here.
    pub fn get_action(&self, action_id: &str) -> Result<Option<Action>, DbError> {
        let action = self
            .conn_ref()
            .query_row(
                &format!("SELECT {ACTION_COLS} FROM actions WHERE id = ?1"),
                params![action_id],
                map_action_row,
            )
            .optional()?;
        Ok(action)
    }

    /// All actions for a subject: dated ones ascending, undated ones last.
    pub fn get_actions(&self, subject_id: &str) -> Result<Vec<Action>, DbError> {
        let mut stmt = self.conn_ref().prepare(&format!(
            "SELECT {ACTION_COLS} FROM actions WHERE subject_id = ?1 ORDER BY {ACTION_ORDER}"
        ))?;
        let rows = stmt.query_map(params![subject_id], map_action_row)?;
        let mut actions = Vec::new();
        for row in rows {
            actions.push(row?);
        }
        Ok(actions)
    }

    /// Replace the mutable fields of an action by id. Silent no-op when the
    /// id does not exist. subject_id and created_at are immutable.
    pub fn update_action(&self, action: &Action) -> Result<(), DbError> {
        self.conn_ref().execute(
            "UPDATE actions
             SET title = ?1, description = ?2, status = ?3, due_date = ?4,
                 completed_at = ?5, archived_at = ?6, meeting_id = ?7, note_id = ?8,
                 agenda_item_id = ?9, tags = ?10
             WHERE id = ?11",
            params![
                action.title,
                action.description,
                action.status.as_str(),
                action.due_date.map(|dt| dt.to_rfc3339()),
                action.completed_at.map(|dt| dt.to_rfc3339()),
                action.archived_at.map(|dt| dt.to_rfc3339()),
                action.meeting_id,
                action.note_id,
                action.agenda_item_id,
                join_list(&action.tags),
                action.id,
            ],
        )?;
        Ok(())
    }

    /// Delete an action. No-op if absent.
    pub fn delete_action(&self, action_id: &str) -> Result<(), DbError> {
        self.conn_ref()
            .execute("DELETE FROM actions WHERE id = ?1", params![action_id])?;
        Ok(())
    }

    /// Transition an action to done, stamping completed_at.
    /// Returns false if the id does not exist.
    pub fn complete_action(&self, action_id: &str) -> Result<bool, DbError> {
        let changed = self.conn_ref().execute(
            "UPDATE actions SET status = 'done', completed_at = ?1 WHERE id = ?2",
            params![Self::now_string(), action_id],
        )?;
        Ok(changed > 0)
    }

    /// Transition a done action back to todo, clearing completed_at.
    pub fn reopen_action(&self, action_id: &str) -> Result<bool, DbError> {
        let changed = self.conn_ref().execute(
            "UPDATE actions SET status = 'todo', completed_at = NULL WHERE id = ?1",
            params![action_id],
        )?;
        Ok(changed > 0)
    }

    /// Hide an action from default views by stamping archived_at. The row
    /// stays reachable by id.
    pub fn archive_action(&self, action_id: &str) -> Result<bool, DbError> {
        let changed = self.conn_ref().execute(
            "UPDATE actions SET archived_at = ?1 WHERE id = ?2",
            params![Self::now_string(), action_id],
        )?;
        Ok(changed > 0)
    }

    /// Actions in a due-date bucket, joined with the owning subject's name.
    ///
    /// Calendar-date semantics: an undated action can only match `All`.
    /// Unless `include_archived`, archived rows are excluded from every
    /// bucket, and under `All` a done action fades out once completed_at is
    /// more than seven days old.
    pub fn get_actions_by_timeframe(
        &self,
        timeframe: Timeframe,
        include_archived: bool,
    ) -> Result<Vec<TimeframeEntry>, DbError> {
        let mut conditions: Vec<String> = Vec::new();
        let mut sql_params: Vec<String> = Vec::new();

        if !include_archived {
            conditions.push("a.archived_at IS NULL".to_string());
        }

        match timeframe {
            Timeframe::Today => {
                conditions.push("date(a.due_date) = date('now')".to_string());
            }
            Timeframe::Week => {
                conditions.push(
                    "date(a.due_date) BETWEEN date('now') AND date('now', '+7 days')".to_string(),
                );
            }
            Timeframe::NextWeek => {
                conditions.push(
                    "date(a.due_date) BETWEEN date('now', '+8 days') AND date('now', '+14 days')"
                        .to_string(),
                );
            }
            Timeframe::All => {
                if !include_archived {
                    // Recently completed items stay visible for a week
                    // before dropping out of the view.
                    conditions.push("(a.status != 'done' OR a.completed_at >= ?1)".to_string());
                    sql_params.push((Utc::now() - Duration::days(7)).to_rfc3339());
                }
            }
        }

        let where_clause = if conditions.is_empty() {
            "1=1".to_string()
        } else {
            conditions.join(" AND ")
        };

        let mut stmt = self.conn_ref().prepare(&format!(
            "SELECT a.id, a.subject_id, a.title, a.description, a.status, a.due_date,
                    a.created_at, a.completed_at, a.archived_at, a.meeting_id, a.note_id,
                    a.agenda_item_id, a.tags, s.name AS subject_name
             FROM actions a
             JOIN subjects s ON a.subject_id = s.id
             WHERE {where_clause}
             ORDER BY CASE WHEN a.due_date IS NULL THEN 1 ELSE 0 END, a.due_date ASC"
        ))?;

        let rows = stmt.query_map(rusqlite::params_from_iter(sql_params.iter()), |row| {
            Ok(TimeframeEntry {
                action: map_action_row(row)?,
                subject_name: row.get(13)?,
            })
        })?;

        let mut entries = Vec::new();
        for row in rows {
            entries.push(row?);
        }
        Ok(entries)
    }

    /// Non-archived actions that originated from a meeting, newest first.
    pub fn get_actions_by_meeting(&self, meeting_id: &str) -> Result<Vec<Action>, DbError> {
        self.get_actions_by_origin("meeting_id", meeting_id)
    }

    /// Non-archived actions that originated from a note, newest first.
    pub fn get_actions_by_note(&self, note_id: &str) -> Result<Vec<Action>, DbError> {
        self.get_actions_by_origin("note_id", note_id)
    }

    fn get_actions_by_origin(&self, column: &str, id: &str) -> Result<Vec<Action>, DbError> {
        let mut stmt = self.conn_ref().prepare(&format!(
            "SELECT {ACTION_COLS} FROM actions
             WHERE {column} = ?1 AND archived_at IS NULL
             ORDER BY created_at DESC"
        ))?;
        let rows = stmt.query_map(params![id], map_action_row)?;
        let mut actions = Vec::new();
        for row in rows {
            actions.push(row?);
        }
        Ok(actions)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Duration, Utc};

    use super::super::test_utils::test_db;
    use super::*;
    use crate::models::{Subject, SubjectType};

    fn seeded_subject(db: &Database) -> Subject {
        let subject = Subject::new("Orbit", SubjectType::Project);
        db.add_subject(&subject).expect("add subject");
        subject
    }

    fn due(action: &mut Action, when: DateTime<Utc>) {
        action.due_date = Some(when);
    }

    #[test]
    fn test_add_and_get_action() {
        let db = test_db();
        let subject = seeded_subject(&db);
        let mut action = Action::new(&subject.id, "Write report");
        action.tags = vec!["writing".into(), "q3".into()];
        db.add_action(&action).expect("add");

        let got = db.get_action(&action.id).expect("get").expect("present");
        assert_eq!(got, action);
    }

    #[test]
    fn test_get_missing_action_is_none() {
        let db = test_db();
        assert!(db.get_action("missing").expect("get").is_none());
    }

    #[test]
    fn test_get_actions_orders_dated_first_then_undated() {
        let db = test_db();
        let subject = seeded_subject(&db);
        let now = Utc::now();

        let mut later = Action::new(&subject.id, "later");
        due(&mut later, now + Duration::days(5));
        let mut soon = Action::new(&subject.id, "soon");
        due(&mut soon, now + Duration::days(1));
        let undated = Action::new(&subject.id, "undated");

        db.add_action(&undated).expect("add");
        db.add_action(&later).expect("add");
        db.add_action(&soon).expect("add");

        let actions = db.get_actions(&subject.id).expect("list");
        let titles: Vec<&str> = actions.iter().map(|a| a.title.as_str()).collect();
        assert_eq!(titles, vec!["soon", "later", "undated"]);
    }

    #[test]
    fn test_complete_and_reopen() {
        let db = test_db();
        let subject = seeded_subject(&db);
        let action = Action::new(&subject.id, "Task");
        db.add_action(&action).expect("add");

        assert!(db.complete_action(&action.id).expect("complete"));
        let got = db.get_action(&action.id).expect("get").expect("present");
        assert_eq!(got.status, ActionStatus::Done);
        assert!(got.completed_at.is_some());

        assert!(db.reopen_action(&action.id).expect("reopen"));
        let got = db.get_action(&action.id).expect("get").expect("present");
        assert_eq!(got.status, ActionStatus::Todo);
        assert!(got.completed_at.is_none());
    }

    #[test]
    fn test_complete_missing_returns_false() {
        let db = test_db();
        assert!(!db.complete_action("missing").expect("complete"));
    }

    #[test]
    fn test_timeframe_boundaries() {
        let db = test_db();
        let subject = seeded_subject(&db);
        let now = Utc::now();

        let mut today = Action::new(&subject.id, "today");
        due(&mut today, now);
        let mut day7 = Action::new(&subject.id, "day7");
        due(&mut day7, now + Duration::days(7));
        let mut day8 = Action::new(&subject.id, "day8");
        due(&mut day8, now + Duration::days(8));
        let mut day15 = Action::new(&subject.id, "day15");
        due(&mut day15, now + Duration::days(15));
        let undated = Action::new(&subject.id, "undated");

        for a in [&today, &day7, &day8, &day15, &undated] {
            db.add_action(a).expect("add");
        }

        let titles = |tf: Timeframe| -> Vec<String> {
            db.get_actions_by_timeframe(tf, false)
                .expect("query")
                .into_iter()
                .map(|e| e.action.title)
                .collect()
        };

        assert_eq!(titles(Timeframe::Today), vec!["today"]);
        assert_eq!(titles(Timeframe::Week), vec!["today", "day7"]);
        assert_eq!(titles(Timeframe::NextWeek), vec!["day8"]);
        let all = titles(Timeframe::All);
        assert_eq!(all.len(), 5);
        // Undated actions appear only in the all bucket, after dated ones.
        assert_eq!(all.last().map(String::as_str), Some("undated"));
    }

    #[test]
    fn test_archived_excluded_from_every_bucket() {
        let db = test_db();
        let subject = seeded_subject(&db);
        let mut action = Action::new(&subject.id, "hidden");
        due(&mut action, Utc::now());
        db.add_action(&action).expect("add");
        assert!(db.archive_action(&action.id).expect("archive"));

        for tf in [Timeframe::Today, Timeframe::Week, Timeframe::All] {
            assert!(db.get_actions_by_timeframe(tf, false).expect("query").is_empty());
        }

        // include_archived brings it back.
        let entries = db.get_actions_by_timeframe(Timeframe::Today, true).expect("query");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].action.title, "hidden");

        // Direct lookup always works regardless of archive state.
        assert!(db.get_action(&action.id).expect("get").is_some());
    }

    #[test]
    fn test_completed_fade_out_window() {
        let db = test_db();
        let subject = seeded_subject(&db);
        let now = Utc::now();

        let mut recent = Action::new(&subject.id, "done recently");
        recent.status = ActionStatus::Done;
        recent.completed_at = Some(now - Duration::days(3));
        let mut old = Action::new(&subject.id, "done long ago");
        old.status = ActionStatus::Done;
        old.completed_at = Some(now - Duration::days(10));
        db.add_action(&recent).expect("add");
        db.add_action(&old).expect("add");

        let titles: Vec<String> = db
            .get_actions_by_timeframe(Timeframe::All, false)
            .expect("query")
            .into_iter()
            .map(|e| e.action.title)
            .collect();
        assert_eq!(titles, vec!["done recently"]);

        // include_archived lifts the fade-out rule as well.
        let all = db.get_actions_by_timeframe(Timeframe::All, true).expect("query");
        assert_eq!(all.len(), 2);
    }

    #[test]
    fn test_reverse_lookups_newest_first_skip_archived() {
        let db = test_db();
        let subject = seeded_subject(&db);
        let now = Utc::now();

        let mut first = Action::new(&subject.id, "first");
        first.meeting_id = Some("mtg-1".into());
        first.created_at = now - Duration::hours(2);
        let mut second = Action::new(&subject.id, "second");
        second.meeting_id = Some("mtg-1".into());
        second.created_at = now;
        let mut archived = Action::new(&subject.id, "archived");
        archived.meeting_id = Some("mtg-1".into());
        archived.archived_at = Some(now);
        let mut noted = Action::new(&subject.id, "from note");
        noted.note_id = Some("note-1".into());

        for a in [&first, &second, &archived, &noted] {
            db.add_action(a).expect("add");
        }

        let by_meeting = db.get_actions_by_meeting("mtg-1").expect("query");
        let titles: Vec<&str> = by_meeting.iter().map(|a| a.title.as_str()).collect();
        assert_eq!(titles, vec!["second", "first"]);

        let by_note = db.get_actions_by_note("note-1").expect("query");
        assert_eq!(by_note.len(), 1);
        assert_eq!(by_note[0].title, "from note");
    }

    #[test]
    fn test_end_to_end_scenario() {
        let db = test_db();
        let subject = Subject::new("Rollout", SubjectType::Project);
        db.add_subject(&subject).expect("add subject");

        let mut a1 = Action::new(&subject.id, "A1");
        a1.due_date = Some(Utc::now());
        let mut a2 = Action::new(&subject.id, "A2");
        a2.due_date = Some(Utc::now() + Duration::days(10));
        db.add_action(&a1).expect("add a1");
        db.add_action(&a2).expect("add a2");

        let today = db.get_actions_by_timeframe(Timeframe::Today, false).expect("query");
        assert_eq!(today.len(), 1);
        assert_eq!(today[0].action.id, a1.id);
        assert_eq!(today[0].subject_name, subject.name);

        // Same-day completion is well inside the fade window.
        assert!(db.complete_action(&a1.id).expect("complete"));
        let today = db.get_actions_by_timeframe(Timeframe::Today, false).expect("query");
        assert_eq!(today.len(), 1);
        assert_eq!(today[0].action.id, a1.id);

        db.delete_subject(&subject.id).expect("cascade");
        assert!(db.get_action(&a1.id).expect("get").is_none());
        assert!(db.get_action(&a2.id).expect("get").is_none());
    }
}
