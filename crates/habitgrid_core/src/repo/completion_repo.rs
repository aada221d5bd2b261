//! Completion repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide owner-scoped range/date queries over `completions` storage.
//! - Implement the transactional toggle upsert and range statistics.
//!
//! # Invariants
//! - The toggle read-then-write sequence runs inside one immediate
//!   transaction; the `(user_uuid, habit_uuid, date)` UNIQUE constraint is
//!   the backstop against duplicate rows.
//! - Date bounds are inclusive and compared lexicographically, which is
//!   correct because `DayDate` guarantees zero-padded ISO text.

use crate::db::DbError;
use crate::model::completion::{Completion, CompletionId, CompletionStats};
use crate::model::date::DayDate;
use crate::model::habit::{HabitId, UserId};
use crate::model::metadata::MetadataValues;
use crate::repo::{ensure_connection_ready, SchemaCheckError};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row, Transaction, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const COMPLETION_SELECT_SQL: &str = "SELECT
    uuid,
    user_uuid,
    habit_uuid,
    date,
    completed,
    metadata
FROM completions";

const COMPLETION_COLUMNS: &[&str] = &[
    "uuid",
    "user_uuid",
    "habit_uuid",
    "date",
    "completed",
    "metadata",
    "created_at",
    "updated_at",
];

pub type CompletionRepoResult<T> = Result<T, CompletionRepoError>;

/// Errors from completion persistence and query operations.
#[derive(Debug)]
pub enum CompletionRepoError {
    /// Underlying SQLite/bootstrap error.
    Db(DbError),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// Required table is missing.
    MissingRequiredTable(&'static str),
    /// Required column is missing from expected table.
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
    /// Persisted data cannot be converted to a valid read model.
    InvalidData(String),
    /// Toggle wrote a row it could not read back.
    InconsistentState(&'static str),
}

impl Display for CompletionRepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "completion repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "completion repository requires table `{table}`")
            }
            Self::MissingRequiredColumn { table, column } => write!(
                f,
                "completion repository requires column `{column}` in table `{table}`"
            ),
            Self::InvalidData(message) => {
                write!(f, "invalid persisted completion data: {message}")
            }
            Self::InconsistentState(details) => {
                write!(f, "inconsistent completion state: {details}")
            }
        }
    }
}

impl Error for CompletionRepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for CompletionRepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for CompletionRepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<SchemaCheckError> for CompletionRepoError {
    fn from(value: SchemaCheckError) -> Self {
        match value {
            SchemaCheckError::Sqlite(err) => Self::Db(DbError::Sqlite(err)),
            SchemaCheckError::UninitializedConnection {
                expected_version,
                actual_version,
            } => Self::UninitializedConnection {
                expected_version,
                actual_version,
            },
            SchemaCheckError::MissingTable(table) => Self::MissingRequiredTable(table),
            SchemaCheckError::MissingColumn { table, column } => {
                Self::MissingRequiredColumn { table, column }
            }
        }
    }
}

/// Input for one toggle call.
#[derive(Debug, Clone, PartialEq)]
pub struct ToggleRequest {
    /// Day the toggle applies to.
    pub date: DayDate,
    /// Habit being toggled.
    pub habit_uuid: HabitId,
    /// Explicit completion state. `None` flips an existing row and marks a
    /// freshly created row complete.
    pub completed: Option<bool>,
    /// Replacement metadata. `None` leaves existing metadata untouched.
    pub metadata: Option<MetadataValues>,
}

/// Repository interface for completion operations.
pub trait CompletionRepository {
    /// Lists completions with `date` in `[start, end]`, optionally narrowed
    /// to specific habits. An empty filter slice means unrestricted.
    fn list_range(
        &self,
        owner: UserId,
        start: &DayDate,
        end: &DayDate,
        habit_filter: &[HabitId],
    ) -> CompletionRepoResult<Vec<Completion>>;
    /// Lists all completions on one day.
    fn list_for_date(&self, owner: UserId, date: &DayDate)
        -> CompletionRepoResult<Vec<Completion>>;
    /// Creates or mutates the completion for `(owner, habit, date)` and
    /// returns the resulting row.
    fn toggle(&self, owner: UserId, request: &ToggleRequest) -> CompletionRepoResult<Completion>;
    /// Aggregates completion counts over an inclusive date range.
    fn stats(
        &self,
        owner: UserId,
        start: &DayDate,
        end: &DayDate,
        habit: Option<HabitId>,
    ) -> CompletionRepoResult<CompletionStats>;
}

/// SQLite-backed completion repository.
pub struct SqliteCompletionRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteCompletionRepository<'conn> {
    /// Creates repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> CompletionRepoResult<Self> {
        ensure_connection_ready(conn, "completions", COMPLETION_COLUMNS)?;
        Ok(Self { conn })
    }
}

impl CompletionRepository for SqliteCompletionRepository<'_> {
    fn list_range(
        &self,
        owner: UserId,
        start: &DayDate,
        end: &DayDate,
        habit_filter: &[HabitId],
    ) -> CompletionRepoResult<Vec<Completion>> {
        let mut sql = format!(
            "{COMPLETION_SELECT_SQL}
             WHERE user_uuid = ?
               AND date >= ?
               AND date <= ?"
        );
        let mut bind_values: Vec<Value> = vec![
            Value::Text(owner.to_string()),
            Value::Text(start.as_str().to_string()),
            Value::Text(end.as_str().to_string()),
        ];

        if !habit_filter.is_empty() {
            let placeholders = vec!["?"; habit_filter.len()].join(", ");
            sql.push_str(&format!(" AND habit_uuid IN ({placeholders})"));
            for habit in habit_filter {
                bind_values.push(Value::Text(habit.to_string()));
            }
        }

        sql.push_str(" ORDER BY date ASC, uuid ASC;");

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut completions = Vec::new();
        while let Some(row) = rows.next()? {
            completions.push(parse_completion_row(row)?);
        }
        Ok(completions)
    }

    fn list_for_date(
        &self,
        owner: UserId,
        date: &DayDate,
    ) -> CompletionRepoResult<Vec<Completion>> {
        let mut stmt = self.conn.prepare(&format!(
            "{COMPLETION_SELECT_SQL}
             WHERE user_uuid = ?1
               AND date = ?2
             ORDER BY uuid ASC;"
        ))?;

        let mut rows = stmt.query(params![owner.to_string(), date.as_str()])?;
        let mut completions = Vec::new();
        while let Some(row) = rows.next()? {
            completions.push(parse_completion_row(row)?);
        }
        Ok(completions)
    }

    fn toggle(&self, owner: UserId, request: &ToggleRequest) -> CompletionRepoResult<Completion> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;

        let existing = find_completion(&tx, owner, request.habit_uuid, &request.date)?;
        let row_uuid = match existing {
            Some(existing) => {
                let next_completed = request.completed.unwrap_or(!existing.completed);
                match &request.metadata {
                    Some(metadata) => {
                        tx.execute(
                            "UPDATE completions
                             SET completed = ?1,
                                 metadata = ?2,
                                 updated_at = (strftime('%s', 'now') * 1000)
                             WHERE uuid = ?3;",
                            params![
                                bool_to_int(next_completed),
                                values_to_json(Some(metadata))?,
                                existing.uuid.to_string(),
                            ],
                        )?;
                    }
                    None => {
                        tx.execute(
                            "UPDATE completions
                             SET completed = ?1,
                                 updated_at = (strftime('%s', 'now') * 1000)
                             WHERE uuid = ?2;",
                            params![bool_to_int(next_completed), existing.uuid.to_string()],
                        )?;
                    }
                }
                existing.uuid
            }
            None => {
                let uuid: CompletionId = Uuid::new_v4();
                tx.execute(
                    "INSERT INTO completions (
                        uuid,
                        user_uuid,
                        habit_uuid,
                        date,
                        completed,
                        metadata
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
                    params![
                        uuid.to_string(),
                        owner.to_string(),
                        request.habit_uuid.to_string(),
                        request.date.as_str(),
                        // A missing row with no explicit flag means the user
                        // is marking the habit done.
                        bool_to_int(request.completed.unwrap_or(true)),
                        values_to_json(request.metadata.as_ref())?,
                    ],
                )?;
                uuid
            }
        };

        let result = find_completion(&tx, owner, request.habit_uuid, &request.date)?
            .ok_or(CompletionRepoError::InconsistentState(
                "toggled row missing on read-back",
            ))?;
        if result.uuid != row_uuid {
            return Err(CompletionRepoError::InconsistentState(
                "toggled row identity changed during write",
            ));
        }

        tx.commit()?;
        Ok(result)
    }

    fn stats(
        &self,
        owner: UserId,
        start: &DayDate,
        end: &DayDate,
        habit: Option<HabitId>,
    ) -> CompletionRepoResult<CompletionStats> {
        let (total, completed): (u64, u64) = match habit {
            Some(habit) => self.conn.query_row(
                "SELECT COUNT(*), COALESCE(SUM(completed), 0)
                 FROM completions
                 WHERE user_uuid = ?1
                   AND habit_uuid = ?2
                   AND date >= ?3
                   AND date <= ?4;",
                params![
                    owner.to_string(),
                    habit.to_string(),
                    start.as_str(),
                    end.as_str()
                ],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )?,
            None => self.conn.query_row(
                "SELECT COUNT(*), COALESCE(SUM(completed), 0)
                 FROM completions
                 WHERE user_uuid = ?1
                   AND date >= ?2
                   AND date <= ?3;",
                params![owner.to_string(), start.as_str(), end.as_str()],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )?,
        };

        Ok(CompletionStats::from_counts(total, completed))
    }
}

fn find_completion(
    conn: &Connection,
    owner: UserId,
    habit: HabitId,
    date: &DayDate,
) -> CompletionRepoResult<Option<Completion>> {
    let mut stmt = conn.prepare(&format!(
        "{COMPLETION_SELECT_SQL}
         WHERE user_uuid = ?1
           AND habit_uuid = ?2
           AND date = ?3;"
    ))?;

    let mut rows = stmt.query(params![
        owner.to_string(),
        habit.to_string(),
        date.as_str()
    ])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(parse_completion_row(row)?));
    }
    Ok(None)
}

fn parse_completion_row(row: &Row<'_>) -> CompletionRepoResult<Completion> {
    let uuid_text: String = row.get("uuid")?;
    let user_uuid_text: String = row.get("user_uuid")?;
    let habit_uuid_text: String = row.get("habit_uuid")?;
    let date_text: String = row.get("date")?;

    let date = DayDate::parse(&date_text).map_err(|_| {
        CompletionRepoError::InvalidData(format!(
            "invalid date value `{date_text}` in completions.date"
        ))
    })?;

    let completed = match row.get::<_, i64>("completed")? {
        0 => false,
        1 => true,
        other => {
            return Err(CompletionRepoError::InvalidData(format!(
                "invalid completed value `{other}` in completions.completed"
            )));
        }
    };

    Ok(Completion {
        uuid: parse_uuid(&uuid_text, "completions.uuid")?,
        user_uuid: parse_uuid(&user_uuid_text, "completions.user_uuid")?,
        habit_uuid: parse_uuid(&habit_uuid_text, "completions.habit_uuid")?,
        date,
        completed,
        metadata: values_from_json(row.get::<_, Option<String>>("metadata")?.as_deref())?,
    })
}

fn values_to_json(values: Option<&MetadataValues>) -> CompletionRepoResult<Option<String>> {
    match values {
        None => Ok(None),
        Some(values) => serde_json::to_string(values).map(Some).map_err(|err| {
            CompletionRepoError::InvalidData(format!("unserializable metadata values: {err}"))
        }),
    }
}

fn values_from_json(json: Option<&str>) -> CompletionRepoResult<Option<MetadataValues>> {
    match json {
        None => Ok(None),
        Some(json) => serde_json::from_str(json).map(Some).map_err(|err| {
            CompletionRepoError::InvalidData(format!("invalid metadata values json: {err}"))
        }),
    }
}

fn parse_uuid(value: &str, column: &'static str) -> CompletionRepoResult<Uuid> {
    Uuid::parse_str(value).map_err(|_| {
        CompletionRepoError::InvalidData(format!("invalid uuid `{value}` in {column}"))
    })
}

fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}
