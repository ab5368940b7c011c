//! Diesel row models for task persistence.

use super::schema::tasks;
use chrono::{DateTime, Utc};
use diesel::prelude::*;

/// Query result row for task records.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = tasks)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct TaskRow {
    /// Storage-assigned identifier.
    pub id: i64,
    /// Task description.
    pub description: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Insert model for task records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = tasks)]
pub struct NewTaskRow<'a> {
    /// Task description.
    pub description: &'a str,
}

/// Result of the table existence probe.
#[derive(Debug, Clone, Copy, QueryableByName)]
pub struct TableExistsRow {
    /// Whether the `tasks` table exists in the current schema.
    #[diesel(sql_type = diesel::sql_types::Bool)]
    pub table_exists: bool,
}
