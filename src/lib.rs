//! subtrack: a subject-centric local store for agendas, meetings, actions,
//! and notes, with a unified full-text search index.
//!
//! The store is a single SQLite file (or an in-memory instance for tests)
//! holding five entity tables plus a trigger-maintained FTS5 index. All
//! access goes through [`db::Database`]; presentation layers are external
//! and consume the typed entities in [`models`] or their flat-record form.

pub mod db;
mod migrations;
pub mod models;

pub use db::{ContentType, Database, DbError, SearchResult, TimeframeEntry};
pub use models::{
    Action, ActionStatus, AgendaItem, AgendaStatus, Meeting, Note, RecurrencePattern, Subject,
    SubjectType, Timeframe, ValidationError,
};
