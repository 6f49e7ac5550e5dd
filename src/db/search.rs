//! Ranked search over the unified full-text index.

use rusqlite::params_from_iter;
use serde::{Deserialize, Serialize};

use super::{Database, DbError};

/// Entity kind of a search result row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    Subject,
    Agenda,
    Meeting,
    Action,
    Note,
}

impl ContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Subject => "subject",
            ContentType::Agenda => "agenda",
            ContentType::Meeting => "meeting",
            ContentType::Action => "action",
            ContentType::Note => "note",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "subject" => Some(ContentType::Subject),
            "agenda" => Some(ContentType::Agenda),
            "meeting" => Some(ContentType::Meeting),
            "action" => Some(ContentType::Action),
            "note" => Some(ContentType::Note),
            _ => None,
        }
    }
}

/// A lightweight search hit. `rank` is the FTS relevance score; lower is a
/// better match (results arrive best first).
#[derive(Debug, Clone, Serialize)]
pub struct SearchResult {
    pub content_type: ContentType,
    pub content_id: String,
    pub subject_id: Option<String>,
    pub subject_name: String,
    pub title: String,
    pub rank: f64,
}

impl Database {
    /// Search across all entity types, best match first, capped at 50.
    ///
    /// An empty or whitespace-only query returns an empty list. So does a
    /// query the FTS engine cannot parse (unbalanced quotes and the like) —
    /// interactive search-as-you-type must never see an error for a
    /// half-typed query. `content_types` narrows the result to a subset of
    /// entity kinds.
    pub fn search(
        &self,
        query: &str,
        content_types: Option<&[ContentType]>,
    ) -> Result<Vec<SearchResult>, DbError> {
        if query.trim().is_empty() {
            return Ok(Vec::new());
        }

        let mut conditions = vec!["unified_fts MATCH ?1".to_string()];
        let mut sql_params: Vec<String> = vec![query.to_string()];

        if let Some(types) = content_types {
            if !types.is_empty() {
                let placeholders: Vec<String> = types
                    .iter()
                    .enumerate()
                    .map(|(i, _)| format!("?{}", i + 2))
                    .collect();
                conditions.push(format!("content_type IN ({})", placeholders.join(",")));
                sql_params.extend(types.iter().map(|t| t.as_str().to_string()));
            }
        }

        let where_clause = conditions.join(" AND ");
        let run = || -> rusqlite::Result<Vec<SearchResult>> {
            let mut stmt = self.conn_ref().prepare(&format!(
                "SELECT content_type, content_id, subject_id, subject_name, title, rank
                 FROM unified_fts
                 WHERE {where_clause}
                 ORDER BY rank
                 LIMIT 50"
            ))?;
            let rows = stmt.query_map(params_from_iter(sql_params.iter()), |row| {
                let kind: String = row.get(0)?;
                Ok(SearchResult {
                    // Index rows are written by our own triggers; an unknown
                    // kind here would mean index corruption.
                    content_type: ContentType::parse(&kind).unwrap_or(ContentType::Note),
                    content_id: row.get(1)?,
                    subject_id: row.get(2)?,
                    subject_name: row.get(3)?,
                    title: row.get(4)?,
                    rank: row.get(5)?,
                })
            })?;
            let mut results = Vec::new();
            for row in rows {
                results.push(row?);
            }
            Ok(results)
        };

        match run() {
            Ok(results) => Ok(results),
            // Malformed FTS query syntax surfaces as a generic SQLite error
            // at execution time. Degrade to no results rather than failing
            // the caller.
            Err(rusqlite::Error::SqliteFailure(_, msg)) => {
                log::debug!("search query rejected by FTS: {msg:?}");
                Ok(Vec::new())
            }
            Err(e) => Err(e.into()),
        }
    }
}
