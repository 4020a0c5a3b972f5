//! Lesson repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Load and store lessons wholesale, blocks included.
//! - Keep SQL and the stored JSON column inside the persistence boundary.
//!
//! # Invariants
//! - `content_blocks` is stored as a JSON array in the block wire shape.
//! - Every loaded block list is normalized before it leaves this module.
//! - `save_lesson` rewrites the whole row inside one immediate transaction.

use crate::db::DbError;
use crate::engine::normalize_loaded;
use crate::model::block::ContentBlock;
use crate::model::lesson::{Lesson, LessonId};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row, Transaction, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const LESSON_SELECT_SQL: &str = "SELECT
    uuid,
    title,
    description,
    estimated_duration,
    is_published,
    content_blocks
FROM lessons";

pub type RepoResult<T> = Result<T, RepoError>;

#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    NotFound(LessonId),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "lesson not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted lesson data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::NotFound(_) => None,
            Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Query options for listing lessons.
#[derive(Debug, Clone, Default)]
pub struct LessonListQuery {
    pub published_only: bool,
    pub limit: Option<u32>,
    pub offset: u32,
}

/// Persistence collaborator for lessons.
pub trait LessonRepository {
    fn create_lesson(&self, lesson: &Lesson) -> RepoResult<LessonId>;
    fn get_lesson(&self, id: LessonId) -> RepoResult<Option<Lesson>>;
    /// Rewrites the stored lesson; `NotFound` when it does not exist.
    fn save_lesson(&self, lesson: &Lesson) -> RepoResult<()>;
    fn list_lessons(&self, query: &LessonListQuery) -> RepoResult<Vec<Lesson>>;
    fn delete_lesson(&self, id: LessonId) -> RepoResult<()>;
}

/// SQLite-backed lesson repository.
pub struct SqliteLessonRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteLessonRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl LessonRepository for SqliteLessonRepository<'_> {
    fn create_lesson(&self, lesson: &Lesson) -> RepoResult<LessonId> {
        let blocks = encode_blocks(&lesson.content_blocks)?;
        self.conn.execute(
            "INSERT INTO lessons (
                uuid,
                title,
                description,
                estimated_duration,
                is_published,
                content_blocks
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            params![
                lesson.id.to_string(),
                lesson.title.as_str(),
                lesson.description.as_deref(),
                lesson.estimated_duration,
                bool_to_int(lesson.is_published),
                blocks,
            ],
        )?;
        Ok(lesson.id)
    }

    fn get_lesson(&self, id: LessonId) -> RepoResult<Option<Lesson>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{LESSON_SELECT_SQL} WHERE uuid = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_lesson_row(row)?));
        }
        Ok(None)
    }

    fn save_lesson(&self, lesson: &Lesson) -> RepoResult<()> {
        let blocks = encode_blocks(&lesson.content_blocks)?;
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let changed = tx.execute(
            "UPDATE lessons
             SET
                title = ?1,
                description = ?2,
                estimated_duration = ?3,
                is_published = ?4,
                content_blocks = ?5,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?6;",
            params![
                lesson.title.as_str(),
                lesson.description.as_deref(),
                lesson.estimated_duration,
                bool_to_int(lesson.is_published),
                blocks,
                lesson.id.to_string(),
            ],
        )?;
        if changed == 0 {
            // Dropping `tx` rolls back.
            return Err(RepoError::NotFound(lesson.id));
        }
        tx.commit()?;
        Ok(())
    }

    fn list_lessons(&self, query: &LessonListQuery) -> RepoResult<Vec<Lesson>> {
        let mut sql = format!("{LESSON_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if query.published_only {
            sql.push_str(" AND is_published = 1");
        }
        sql.push_str(" ORDER BY updated_at DESC, uuid ASC");

        if let Some(limit) = query.limit {
            sql.push_str(" LIMIT ?");
            bind_values.push(Value::Integer(i64::from(limit)));
            if query.offset > 0 {
                sql.push_str(" OFFSET ?");
                bind_values.push(Value::Integer(i64::from(query.offset)));
            }
        } else if query.offset > 0 {
            sql.push_str(" LIMIT -1 OFFSET ?");
            bind_values.push(Value::Integer(i64::from(query.offset)));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut lessons = Vec::new();
        while let Some(row) = rows.next()? {
            lessons.push(parse_lesson_row(row)?);
        }
        Ok(lessons)
    }

    fn delete_lesson(&self, id: LessonId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM lessons WHERE uuid = ?1;", [id.to_string()])?;
        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }
        Ok(())
    }
}

fn parse_lesson_row(row: &Row<'_>) -> RepoResult<Lesson> {
    let uuid_text: String = row.get("uuid")?;
    let id = Uuid::parse_str(&uuid_text).map_err(|_| {
        RepoError::InvalidData(format!("invalid uuid value `{uuid_text}` in lessons.uuid"))
    })?;

    let is_published = match row.get::<_, i64>("is_published")? {
        0 => false,
        1 => true,
        other => {
            return Err(RepoError::InvalidData(format!(
                "invalid is_published value `{other}` in lessons.is_published"
            )));
        }
    };

    let blocks_text: Option<String> = row.get("content_blocks")?;
    let content_blocks = decode_blocks(id, blocks_text.as_deref())?;

    Ok(Lesson {
        id,
        title: row.get("title")?,
        description: row.get("description")?,
        estimated_duration: row.get("estimated_duration")?,
        is_published,
        content_blocks,
    })
}

fn encode_blocks(blocks: &[ContentBlock]) -> RepoResult<String> {
    serde_json::to_string(blocks)
        .map_err(|err| RepoError::InvalidData(format!("failed to encode content_blocks: {err}")))
}

/// Parses the stored column; `NULL` and JSON `null` load as an empty list.
fn decode_blocks(id: LessonId, raw: Option<&str>) -> RepoResult<Vec<ContentBlock>> {
    let Some(raw) = raw.filter(|raw| !raw.trim().is_empty()) else {
        return Ok(Vec::new());
    };
    let blocks = serde_json::from_str::<Option<Vec<ContentBlock>>>(raw)
        .map_err(|err| {
            RepoError::InvalidData(format!(
                "invalid content_blocks JSON for lesson {id}: {err}"
            ))
        })?
        .unwrap_or_default();
    Ok(normalize_loaded(blocks))
}

fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}
