//! Typed entities for the subject store, plus their flat-record transport form.
//!
//! A flat record is a `serde_json::Map<String, Value>` holding only
//! primitives: datetimes as RFC 3339 strings, enums as their wire string,
//! absent optionals as `Null`, list fields as JSON arrays. Presentation code
//! consumes records; the database layer consumes the typed structs directly.
//! No business rules live here — this module only shapes data.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use uuid::Uuid;

/// Flat key → primitive mapping used for transport and round-tripping.
pub type Record = Map<String, Value>;

/// Malformed entity data at the serialization boundary.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("missing required field `{0}`")]
    MissingField(&'static str),

    #[error("field `{field}` has invalid value `{value}`")]
    InvalidValue { field: &'static str, value: String },
}

// =============================================================================
// Enums
// =============================================================================

/// What kind of context a subject is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubjectType {
    Board,
    Project,
    Team,
    Person,
}

impl SubjectType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubjectType::Board => "board",
            SubjectType::Project => "project",
            SubjectType::Team => "team",
            SubjectType::Person => "person",
        }
    }

    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        match s {
            "board" => Ok(SubjectType::Board),
            "project" => Ok(SubjectType::Project),
            "team" => Ok(SubjectType::Team),
            "person" => Ok(SubjectType::Person),
            other => Err(ValidationError::InvalidValue {
                field: "type",
                value: other.to_string(),
            }),
        }
    }
}

/// Lifecycle of an agenda item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgendaStatus {
    Active,
    Discussed,
    Archived,
}

impl AgendaStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgendaStatus::Active => "active",
            AgendaStatus::Discussed => "discussed",
            AgendaStatus::Archived => "archived",
        }
    }

    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        match s {
            "active" => Ok(AgendaStatus::Active),
            "discussed" => Ok(AgendaStatus::Discussed),
            "archived" => Ok(AgendaStatus::Archived),
            other => Err(ValidationError::InvalidValue {
                field: "status",
                value: other.to_string(),
            }),
        }
    }
}

/// How often a recurring agenda item comes back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecurrencePattern {
    Weekly,
    Monthly,
    Quarterly,
}

impl RecurrencePattern {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecurrencePattern::Weekly => "weekly",
            RecurrencePattern::Monthly => "monthly",
            RecurrencePattern::Quarterly => "quarterly",
        }
    }

    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        match s {
            "weekly" => Ok(RecurrencePattern::Weekly),
            "monthly" => Ok(RecurrencePattern::Monthly),
            "quarterly" => Ok(RecurrencePattern::Quarterly),
            other => Err(ValidationError::InvalidValue {
                field: "recurrence_pattern",
                value: other.to_string(),
            }),
        }
    }
}

/// Status of an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionStatus {
    Todo,
    InProgress,
    Done,
}

impl ActionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionStatus::Todo => "todo",
            ActionStatus::InProgress => "in_progress",
            ActionStatus::Done => "done",
        }
    }

    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        match s {
            "todo" => Ok(ActionStatus::Todo),
            "in_progress" => Ok(ActionStatus::InProgress),
            "done" => Ok(ActionStatus::Done),
            other => Err(ValidationError::InvalidValue {
                field: "status",
                value: other.to_string(),
            }),
        }
    }
}

/// Due-date bucket for the default task views.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timeframe {
    Today,
    Week,
    NextWeek,
    All,
}

impl Timeframe {
    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        match s {
            "today" => Ok(Timeframe::Today),
            "week" => Ok(Timeframe::Week),
            "next_week" => Ok(Timeframe::NextWeek),
            "all" => Ok(Timeframe::All),
            other => Err(ValidationError::InvalidValue {
                field: "timeframe",
                value: other.to_string(),
            }),
        }
    }
}

// =============================================================================
// Entities
// =============================================================================

/// A subject is the organizing context everything else hangs off.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subject {
    pub id: String,
    pub name: String,
    pub subject_type: SubjectType,
    pub code: Option<String>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_reviewed_at: DateTime<Utc>,
}

impl Subject {
    /// Create a subject with a fresh id and current timestamps.
    pub fn new(name: impl Into<String>, subject_type: SubjectType) -> Self {
        let now = Utc::now();
        Subject {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            subject_type,
            code: None,
            description: None,
            created_at: now,
            last_reviewed_at: now,
        }
    }

    pub fn to_record(&self) -> Record {
        let mut rec = Record::new();
        rec.insert("id".into(), Value::String(self.id.clone()));
        rec.insert("name".into(), Value::String(self.name.clone()));
        rec.insert("type".into(), Value::String(self.subject_type.as_str().into()));
        rec.insert("code".into(), opt_string(&self.code));
        rec.insert("description".into(), opt_string(&self.description));
        rec.insert("created_at".into(), datetime_value(&self.created_at));
        rec.insert("last_reviewed_at".into(), datetime_value(&self.last_reviewed_at));
        rec
    }

    pub fn from_record(rec: &Record) -> Result<Self, ValidationError> {
        Ok(Subject {
            id: req_string(rec, "id")?,
            name: req_string(rec, "name")?,
            subject_type: SubjectType::parse(&req_string(rec, "type")?)?,
            code: get_opt_string(rec, "code"),
            description: get_opt_string(rec, "description"),
            created_at: req_datetime(rec, "created_at")?,
            last_reviewed_at: req_datetime(rec, "last_reviewed_at")?,
        })
    }
}

/// A topic queued for the next encounter with a subject.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgendaItem {
    pub id: String,
    pub subject_id: String,
    pub title: String,
    pub description: Option<String>,
    /// 1-10; the UI caps input at 10 but the store does not.
    pub priority: i64,
    pub status: AgendaStatus,
    pub created_at: DateTime<Utc>,
    pub discussed_at: Option<DateTime<Utc>>,
    pub is_recurring: bool,
    pub recurrence_pattern: Option<RecurrencePattern>,
}

impl AgendaItem {
    pub fn new(subject_id: impl Into<String>, title: impl Into<String>, priority: i64) -> Self {
        AgendaItem {
            id: Uuid::new_v4().to_string(),
            subject_id: subject_id.into(),
            title: title.into(),
            description: None,
            priority,
            status: AgendaStatus::Active,
            created_at: Utc::now(),
            discussed_at: None,
            is_recurring: false,
            recurrence_pattern: None,
        }
    }

    pub fn to_record(&self) -> Record {
        let mut rec = Record::new();
        rec.insert("id".into(), Value::String(self.id.clone()));
        rec.insert("subject_id".into(), Value::String(self.subject_id.clone()));
        rec.insert("title".into(), Value::String(self.title.clone()));
        rec.insert("description".into(), opt_string(&self.description));
        rec.insert("priority".into(), Value::from(self.priority));
        rec.insert("status".into(), Value::String(self.status.as_str().into()));
        rec.insert("created_at".into(), datetime_value(&self.created_at));
        rec.insert("discussed_at".into(), opt_datetime_value(&self.discussed_at));
        rec.insert("is_recurring".into(), Value::Bool(self.is_recurring));
        rec.insert(
            "recurrence_pattern".into(),
            match &self.recurrence_pattern {
                Some(p) => Value::String(p.as_str().into()),
                None => Value::Null,
            },
        );
        rec
    }

    pub fn from_record(rec: &Record) -> Result<Self, ValidationError> {
        let recurrence_pattern = match get_opt_string(rec, "recurrence_pattern") {
            Some(s) => Some(RecurrencePattern::parse(&s)?),
            None => None,
        };
        Ok(AgendaItem {
            id: req_string(rec, "id")?,
            subject_id: req_string(rec, "subject_id")?,
            title: req_string(rec, "title")?,
            description: get_opt_string(rec, "description"),
            priority: req_i64(rec, "priority")?,
            status: AgendaStatus::parse(&req_string(rec, "status")?)?,
            created_at: req_datetime(rec, "created_at")?,
            discussed_at: opt_datetime(rec, "discussed_at")?,
            is_recurring: opt_bool(rec, "is_recurring"),
            recurrence_pattern,
        })
    }
}

/// A dated record of an encounter with a subject. Mutable indefinitely.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Meeting {
    pub id: String,
    pub subject_id: String,
    pub title: String,
    pub date: DateTime<Utc>,
    /// Ordered free-text names. Values may not contain commas (see storage notes).
    pub attendees: Vec<String>,
    /// Markdown-flavored body.
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Meeting {
    pub fn new(subject_id: impl Into<String>, date: DateTime<Utc>) -> Self {
        let now = Utc::now();
        Meeting {
            id: Uuid::new_v4().to_string(),
            subject_id: subject_id.into(),
            title: "Meeting".to_string(),
            date,
            attendees: Vec::new(),
            content: String::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn to_record(&self) -> Record {
        let mut rec = Record::new();
        rec.insert("id".into(), Value::String(self.id.clone()));
        rec.insert("subject_id".into(), Value::String(self.subject_id.clone()));
        rec.insert("title".into(), Value::String(self.title.clone()));
        rec.insert("date".into(), datetime_value(&self.date));
        rec.insert("attendees".into(), string_list_value(&self.attendees));
        rec.insert("content".into(), Value::String(self.content.clone()));
        rec.insert("created_at".into(), datetime_value(&self.created_at));
        rec.insert("updated_at".into(), datetime_value(&self.updated_at));
        rec
    }

    pub fn from_record(rec: &Record) -> Result<Self, ValidationError> {
        Ok(Meeting {
            id: req_string(rec, "id")?,
            subject_id: req_string(rec, "subject_id")?,
            title: req_string(rec, "title")?,
            date: req_datetime(rec, "date")?,
            attendees: string_list(rec, "attendees"),
            content: req_string(rec, "content")?,
            created_at: req_datetime(rec, "created_at")?,
            updated_at: req_datetime(rec, "updated_at")?,
        })
    }
}

/// A task, optionally originating from a meeting, note, or agenda item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    pub id: String,
    pub subject_id: String,
    pub title: String,
    pub description: Option<String>,
    pub status: ActionStatus,
    pub due_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    /// Non-null iff status is done; maintained at the transition point.
    pub completed_at: Option<DateTime<Utc>>,
    /// Once set, hides the action from default views without deleting it.
    pub archived_at: Option<DateTime<Utc>>,
    pub meeting_id: Option<String>,
    pub note_id: Option<String>,
    pub agenda_item_id: Option<String>,
    pub tags: Vec<String>,
}

impl Action {
    pub fn new(subject_id: impl Into<String>, title: impl Into<String>) -> Self {
        Action {
            id: Uuid::new_v4().to_string(),
            subject_id: subject_id.into(),
            title: title.into(),
            description: None,
            status: ActionStatus::Todo,
            due_date: None,
            created_at: Utc::now(),
            completed_at: None,
            archived_at: None,
            meeting_id: None,
            note_id: None,
            agenda_item_id: None,
            tags: Vec::new(),
        }
    }

    pub fn to_record(&self) -> Record {
        let mut rec = Record::new();
        rec.insert("id".into(), Value::String(self.id.clone()));
        rec.insert("subject_id".into(), Value::String(self.subject_id.clone()));
        rec.insert("title".into(), Value::String(self.title.clone()));
        rec.insert("description".into(), opt_string(&self.description));
        rec.insert("status".into(), Value::String(self.status.as_str().into()));
        rec.insert("due_date".into(), opt_datetime_value(&self.due_date));
        rec.insert("created_at".into(), datetime_value(&self.created_at));
        rec.insert("completed_at".into(), opt_datetime_value(&self.completed_at));
        rec.insert("archived_at".into(), opt_datetime_value(&self.archived_at));
        rec.insert("meeting_id".into(), opt_string(&self.meeting_id));
        rec.insert("note_id".into(), opt_string(&self.note_id));
        rec.insert("agenda_item_id".into(), opt_string(&self.agenda_item_id));
        rec.insert("tags".into(), string_list_value(&self.tags));
        rec
    }

    pub fn from_record(rec: &Record) -> Result<Self, ValidationError> {
        Ok(Action {
            id: req_string(rec, "id")?,
            subject_id: req_string(rec, "subject_id")?,
            title: req_string(rec, "title")?,
            description: get_opt_string(rec, "description"),
            status: ActionStatus::parse(&req_string(rec, "status")?)?,
            due_date: opt_datetime(rec, "due_date")?,
            created_at: req_datetime(rec, "created_at")?,
            completed_at: opt_datetime(rec, "completed_at")?,
            archived_at: opt_datetime(rec, "archived_at")?,
            meeting_id: get_opt_string(rec, "meeting_id"),
            note_id: get_opt_string(rec, "note_id"),
            agenda_item_id: get_opt_string(rec, "agenda_item_id"),
            tags: string_list(rec, "tags"),
        })
    }
}

/// Freeform reference content attached to a subject.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub id: String,
    pub subject_id: String,
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Note {
    pub fn new(subject_id: impl Into<String>, title: impl Into<String>) -> Self {
        let now = Utc::now();
        Note {
            id: Uuid::new_v4().to_string(),
            subject_id: subject_id.into(),
            title: title.into(),
            content: String::new(),
            tags: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn to_record(&self) -> Record {
        let mut rec = Record::new();
        rec.insert("id".into(), Value::String(self.id.clone()));
        rec.insert("subject_id".into(), Value::String(self.subject_id.clone()));
        rec.insert("title".into(), Value::String(self.title.clone()));
        rec.insert("content".into(), Value::String(self.content.clone()));
        rec.insert("tags".into(), string_list_value(&self.tags));
        rec.insert("created_at".into(), datetime_value(&self.created_at));
        rec.insert("updated_at".into(), datetime_value(&self.updated_at));
        rec
    }

    pub fn from_record(rec: &Record) -> Result<Self, ValidationError> {
        Ok(Note {
            id: req_string(rec, "id")?,
            subject_id: req_string(rec, "subject_id")?,
            title: req_string(rec, "title")?,
            content: req_string(rec, "content")?,
            tags: string_list(rec, "tags"),
            created_at: req_datetime(rec, "created_at")?,
            updated_at: req_datetime(rec, "updated_at")?,
        })
    }
}

// =============================================================================
// List-field storage encoding
// =============================================================================

/// Join a list for column storage: `"a, b, c"`, `None` when empty.
///
/// Values containing a literal comma cannot round-trip through this encoding.
/// Kept for on-disk compatibility with the reference format.
pub fn join_list(items: &[String]) -> Option<String> {
    if items.is_empty() {
        None
    } else {
        Some(items.join(", "))
    }
}

/// Split a stored comma-joined column back into trimmed, non-empty parts.
pub fn split_list(stored: Option<&str>) -> Vec<String> {
    match stored {
        None => Vec::new(),
        Some(s) => s
            .split(',')
            .map(|part| part.trim().to_string())
            .filter(|part| !part.is_empty())
            .collect(),
    }
}

// =============================================================================
// Record helpers
// =============================================================================

fn opt_string(v: &Option<String>) -> Value {
    match v {
        Some(s) => Value::String(s.clone()),
        None => Value::Null,
    }
}

fn datetime_value(dt: &DateTime<Utc>) -> Value {
    Value::String(dt.to_rfc3339())
}

fn opt_datetime_value(dt: &Option<DateTime<Utc>>) -> Value {
    match dt {
        Some(dt) => datetime_value(dt),
        None => Value::Null,
    }
}

fn string_list_value(items: &[String]) -> Value {
    Value::Array(items.iter().map(|s| Value::String(s.clone())).collect())
}

fn req_string(rec: &Record, key: &'static str) -> Result<String, ValidationError> {
    match rec.get(key) {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(Value::Null) | None => Err(ValidationError::MissingField(key)),
        Some(other) => Err(ValidationError::InvalidValue {
            field: key,
            value: other.to_string(),
        }),
    }
}

fn get_opt_string(rec: &Record, key: &str) -> Option<String> {
    match rec.get(key) {
        Some(Value::String(s)) => Some(s.clone()),
        _ => None,
    }
}

fn req_i64(rec: &Record, key: &'static str) -> Result<i64, ValidationError> {
    match rec.get(key) {
        Some(Value::Number(n)) => n.as_i64().ok_or(ValidationError::InvalidValue {
            field: key,
            value: n.to_string(),
        }),
        Some(Value::Null) | None => Err(ValidationError::MissingField(key)),
        Some(other) => Err(ValidationError::InvalidValue {
            field: key,
            value: other.to_string(),
        }),
    }
}

fn opt_bool(rec: &Record, key: &str) -> bool {
    match rec.get(key) {
        Some(Value::Bool(b)) => *b,
        // Accept the integer encoding SQLite hands back for booleans.
        Some(Value::Number(n)) => n.as_i64().unwrap_or(0) != 0,
        _ => false,
    }
}

fn parse_datetime(key: &'static str, s: &str) -> Result<DateTime<Utc>, ValidationError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| ValidationError::InvalidValue {
            field: key,
            value: s.to_string(),
        })
}

fn req_datetime(rec: &Record, key: &'static str) -> Result<DateTime<Utc>, ValidationError> {
    parse_datetime(key, &req_string(rec, key)?)
}

fn opt_datetime(rec: &Record, key: &'static str) -> Result<Option<DateTime<Utc>>, ValidationError> {
    match rec.get(key) {
        Some(Value::String(s)) => Ok(Some(parse_datetime(key, s)?)),
        Some(Value::Null) | None => Ok(None),
        Some(other) => Err(ValidationError::InvalidValue {
            field: key,
            value: other.to_string(),
        }),
    }
}

/// Read a list field from a record: a JSON array of strings, or the stored
/// comma-joined string form, or null/missing for an empty list.
fn string_list(rec: &Record, key: &str) -> Vec<String> {
    match rec.get(key) {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|v| v.as_str())
            .map(|s| s.to_string())
            .collect(),
        Some(Value::String(s)) => split_list(Some(s)),
        _ => Vec::new(),
    }
}

// =============================================================================
// Tests
// =============================================================================
