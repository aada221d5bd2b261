//! Habit repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide owner-scoped CRUD over canonical `habits` storage.
//! - Keep SQL details inside the core persistence boundary.
//!
//! # Invariants
//! - Write paths call `Habit::validate()` before SQL mutations.
//! - Read paths reject invalid persisted state instead of masking it.
//! - Deactivation cascades to direct children inside one transaction.

use crate::db::DbError;
use crate::model::completion::HabitDayStatus;
use crate::model::date::DayDate;
use crate::model::habit::{Habit, HabitId, HabitValidationError, UserId};
use crate::model::metadata::MetadataField;
use crate::repo::{ensure_connection_ready, SchemaCheckError};
use rusqlite::{params, Connection, Row, Transaction, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const HABIT_SELECT_SQL: &str = "SELECT
    uuid,
    user_uuid,
    name,
    color,
    icon,
    is_active,
    parent_uuid,
    metadata
FROM habits";

const HABIT_COLUMNS: &[&str] = &[
    "uuid",
    "user_uuid",
    "name",
    "color",
    "icon",
    "is_active",
    "parent_uuid",
    "metadata",
    "created_at",
    "updated_at",
];

pub type HabitRepoResult<T> = Result<T, HabitRepoError>;

/// Errors from habit persistence and query operations.
#[derive(Debug)]
pub enum HabitRepoError {
    /// Model-level validation failure before any write.
    Validation(HabitValidationError),
    /// Underlying SQLite/bootstrap error.
    Db(DbError),
    /// Target habit does not exist for the given owner. Deliberately covers
    /// both missing rows and rows owned by someone else.
    HabitNotFound(HabitId),
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
}

impl Display for HabitRepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::HabitNotFound(id) => write!(f, "habit not found: {id}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "habit repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "habit repository requires table `{table}`")
            }
            Self::MissingRequiredColumn { table, column } => write!(
                f,
                "habit repository requires column `{column}` in table `{table}`"
            ),
            Self::InvalidData(message) => write!(f, "invalid persisted habit data: {message}"),
        }
    }
}

impl Error for HabitRepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<HabitValidationError> for HabitRepoError {
    fn from(value: HabitValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for HabitRepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for HabitRepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<SchemaCheckError> for HabitRepoError {
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

/// Query options for listing habits.
#[derive(Debug, Clone, Copy, Default)]
pub struct HabitListQuery {
    /// When false, only top-level habits are returned.
    pub include_nested: bool,
}

/// Repository interface for habit CRUD operations.
pub trait HabitRepository {
    /// Inserts a new active habit after validation.
    fn create_habit(&self, habit: &Habit) -> HabitRepoResult<HabitId>;
    /// Loads one habit by id, active or not, scoped to `owner`.
    fn get_habit(&self, owner: UserId, id: HabitId) -> HabitRepoResult<Option<Habit>>;
    /// Lists the owner's active habits.
    fn list_habits(&self, owner: UserId, query: &HabitListQuery) -> HabitRepoResult<Vec<Habit>>;
    /// Lists active habits nested directly under `parent`.
    fn list_sub_habits(&self, owner: UserId, parent: HabitId) -> HabitRepoResult<Vec<Habit>>;
    /// Replaces name/color/icon/parent/metadata; never touches `is_active`.
    fn update_habit(&self, habit: &Habit) -> HabitRepoResult<()>;
    /// Deactivates one habit and all of its direct children atomically.
    fn deactivate_habit(&self, owner: UserId, id: HabitId) -> HabitRepoResult<()>;
    /// Pairs every active habit with its completion state on `date`.
    fn list_day_statuses(&self, owner: UserId, date: &DayDate)
        -> HabitRepoResult<Vec<HabitDayStatus>>;
}

/// SQLite-backed habit repository.
pub struct SqliteHabitRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteHabitRepository<'conn> {
    /// Creates repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> HabitRepoResult<Self> {
        ensure_connection_ready(conn, "habits", HABIT_COLUMNS)?;
        Ok(Self { conn })
    }
}

impl HabitRepository for SqliteHabitRepository<'_> {
    fn create_habit(&self, habit: &Habit) -> HabitRepoResult<HabitId> {
        habit.validate()?;

        self.conn.execute(
            "INSERT INTO habits (
                uuid,
                user_uuid,
                name,
                color,
                icon,
                is_active,
                parent_uuid,
                metadata
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
            params![
                habit.uuid.to_string(),
                habit.user_uuid.to_string(),
                habit.name.as_str(),
                habit.color.as_str(),
                habit.icon.as_str(),
                bool_to_int(habit.is_active),
                habit.parent_uuid.map(|value| value.to_string()),
                schema_to_json(habit.metadata.as_deref())?,
            ],
        )?;

        Ok(habit.uuid)
    }

    fn get_habit(&self, owner: UserId, id: HabitId) -> HabitRepoResult<Option<Habit>> {
        let mut stmt = self.conn.prepare(&format!(
            "{HABIT_SELECT_SQL}
             WHERE uuid = ?1
               AND user_uuid = ?2;"
        ))?;

        let mut rows = stmt.query(params![id.to_string(), owner.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_habit_row(row)?));
        }

        Ok(None)
    }

    fn list_habits(&self, owner: UserId, query: &HabitListQuery) -> HabitRepoResult<Vec<Habit>> {
        let mut sql = format!(
            "{HABIT_SELECT_SQL}
             WHERE user_uuid = ?1
               AND is_active = 1"
        );
        if !query.include_nested {
            sql.push_str(" AND parent_uuid IS NULL");
        }
        sql.push_str(" ORDER BY name ASC, uuid ASC;");

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query([owner.to_string()])?;
        let mut habits = Vec::new();
        while let Some(row) = rows.next()? {
            habits.push(parse_habit_row(row)?);
        }
        Ok(habits)
    }

    fn list_sub_habits(&self, owner: UserId, parent: HabitId) -> HabitRepoResult<Vec<Habit>> {
        let mut stmt = self.conn.prepare(&format!(
            "{HABIT_SELECT_SQL}
             WHERE user_uuid = ?1
               AND parent_uuid = ?2
               AND is_active = 1
             ORDER BY name ASC, uuid ASC;"
        ))?;

        let mut rows = stmt.query(params![owner.to_string(), parent.to_string()])?;
        let mut habits = Vec::new();
        while let Some(row) = rows.next()? {
            habits.push(parse_habit_row(row)?);
        }
        Ok(habits)
    }

    fn update_habit(&self, habit: &Habit) -> HabitRepoResult<()> {
        habit.validate()?;

        let changed = self.conn.execute(
            "UPDATE habits
             SET
                name = ?1,
                color = ?2,
                icon = ?3,
                parent_uuid = ?4,
                metadata = ?5,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?6
               AND user_uuid = ?7;",
            params![
                habit.name.as_str(),
                habit.color.as_str(),
                habit.icon.as_str(),
                habit.parent_uuid.map(|value| value.to_string()),
                schema_to_json(habit.metadata.as_deref())?,
                habit.uuid.to_string(),
                habit.user_uuid.to_string(),
            ],
        )?;

        if changed == 0 {
            return Err(HabitRepoError::HabitNotFound(habit.uuid));
        }

        Ok(())
    }

    fn deactivate_habit(&self, owner: UserId, id: HabitId) -> HabitRepoResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;

        let changed = tx.execute(
            "UPDATE habits
             SET is_active = 0,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?1
               AND user_uuid = ?2;",
            params![id.to_string(), owner.to_string()],
        )?;
        if changed == 0 {
            return Err(HabitRepoError::HabitNotFound(id));
        }

        tx.execute(
            "UPDATE habits
             SET is_active = 0,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE parent_uuid = ?1
               AND user_uuid = ?2
               AND is_active = 1;",
            params![id.to_string(), owner.to_string()],
        )?;

        tx.commit()?;
        Ok(())
    }

    fn list_day_statuses(
        &self,
        owner: UserId,
        date: &DayDate,
    ) -> HabitRepoResult<Vec<HabitDayStatus>> {
        let mut stmt = self.conn.prepare(
            "SELECT
                h.uuid AS uuid,
                h.name AS name,
                h.color AS color,
                h.icon AS icon,
                h.parent_uuid AS parent_uuid,
                COALESCE(c.completed, 0) AS completed
             FROM habits h
             LEFT JOIN completions c
               ON c.habit_uuid = h.uuid
              AND c.user_uuid = h.user_uuid
              AND c.date = ?2
             WHERE h.user_uuid = ?1
               AND h.is_active = 1
             ORDER BY h.name ASC, h.uuid ASC;",
        )?;

        let mut rows = stmt.query(params![owner.to_string(), date.as_str()])?;
        let mut statuses = Vec::new();
        while let Some(row) = rows.next()? {
            let uuid_text: String = row.get("uuid")?;
            let parent_uuid = row
                .get::<_, Option<String>>("parent_uuid")?
                .map(|value| parse_uuid(&value, "habits.parent_uuid"))
                .transpose()?;
            statuses.push(HabitDayStatus {
                habit_uuid: parse_uuid(&uuid_text, "habits.uuid")?,
                name: row.get("name")?,
                color: row.get("color")?,
                icon: row.get("icon")?,
                parent_uuid,
                completed: int_to_bool(row.get("completed")?, "completions.completed")?,
            });
        }
        Ok(statuses)
    }
}

fn parse_habit_row(row: &Row<'_>) -> HabitRepoResult<Habit> {
    let uuid_text: String = row.get("uuid")?;
    let user_uuid_text: String = row.get("user_uuid")?;
    let parent_uuid = row
        .get::<_, Option<String>>("parent_uuid")?
        .map(|value| parse_uuid(&value, "habits.parent_uuid"))
        .transpose()?;

    let habit = Habit {
        uuid: parse_uuid(&uuid_text, "habits.uuid")?,
        user_uuid: parse_uuid(&user_uuid_text, "habits.user_uuid")?,
        name: row.get("name")?,
        color: row.get("color")?,
        icon: row.get("icon")?,
        is_active: int_to_bool(row.get("is_active")?, "habits.is_active")?,
        parent_uuid,
        metadata: schema_from_json(row.get::<_, Option<String>>("metadata")?.as_deref())?,
    };
    habit.validate()?;
    Ok(habit)
}

fn schema_to_json(fields: Option<&[MetadataField]>) -> HabitRepoResult<Option<String>> {
    match fields {
        None => Ok(None),
        Some(fields) => serde_json::to_string(fields).map(Some).map_err(|err| {
            HabitRepoError::InvalidData(format!("unserializable metadata schema: {err}"))
        }),
    }
}

fn schema_from_json(json: Option<&str>) -> HabitRepoResult<Option<Vec<MetadataField>>> {
    match json {
        None => Ok(None),
        Some(json) => serde_json::from_str(json).map(Some).map_err(|err| {
            HabitRepoError::InvalidData(format!("invalid metadata schema json: {err}"))
        }),
    }
}

fn parse_uuid(value: &str, column: &'static str) -> HabitRepoResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| HabitRepoError::InvalidData(format!("invalid uuid `{value}` in {column}")))
}

fn int_to_bool(value: i64, column: &'static str) -> HabitRepoResult<bool> {
    match value {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(HabitRepoError::InvalidData(format!(
            "invalid boolean value `{other}` in {column}"
        ))),
    }
}

fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}
