use chrono::{DateTime, SecondsFormat, Utc};
use clap::ValueEnum;
use rusqlite::{params, Connection, OptionalExtension, Result};
use std::path::{Path, PathBuf};

use crate::app_dirs::AppDirs;
use crate::editor::EditorBuffer;
use crate::language::Language;

/// Code the user typed for one problem in one language
#[derive(Debug, Clone, PartialEq)]
pub struct Draft {
    pub problem_id: String,
    pub language: Language,
    pub code: String,
    pub updated_at: DateTime<Utc>,
}

/// Local store for editor buffers, keyed by problem and language
#[derive(Debug)]
pub struct DraftStore {
    conn: Connection,
}

impl DraftStore {
    /// Open the database under the state directory, creating it if needed
    pub fn new() -> Result<Self> {
        let db_path = AppDirs::db_path().unwrap_or_else(|| PathBuf::from("mockprep_drafts.db"));
        Self::open(&db_path)
    }

    pub fn open(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                rusqlite::Error::SqliteFailure(
                    rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_CANTOPEN),
                    Some(format!("Failed to create directory: {}", e)),
                )
            })?;
        }
        Self::init(Connection::open(db_path)?)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS drafts (
                problem_id TEXT NOT NULL,
                language TEXT NOT NULL,
                code TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                PRIMARY KEY (problem_id, language)
            )
            "#,
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_drafts_updated_at ON drafts(problem_id, updated_at)",
            [],
        )?;

        Ok(DraftStore { conn })
    }

    /// Insert or overwrite the draft.
    ///
    /// `updated_at` is fixed-width UTC so that `ORDER BY updated_at` is chronological
    /// across offset changes. for the buffer's language
    pub fn save(&self, problem_id: &str, buffer: &EditorBuffer) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO drafts (problem_id, language, code, updated_at)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(problem_id, language)
            DO UPDATE SET code = excluded.code, updated_at = excluded.updated_at
            "#,
            params![
                problem_id,
                buffer.language.to_string(),
                buffer.text,
                Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true),
            ],
        )?;

        Ok(())
    }

    pub fn load(&self, problem_id: &str, language: Language) -> Result<Option<Draft>> {
        self.conn
            .query_row(
                r#"
                SELECT problem_id, language, code, updated_at
                FROM drafts
                WHERE problem_id = ?1 AND language = ?2
                "#,
                params![problem_id, language.to_string()],
                row_to_draft,
            )
            .optional()
    }

    /// Language of the most recently edited draft for a problem
    pub fn last_language(&self, problem_id: &str) -> Result<Option<Language>> {
        let language: Option<String> = self
            .conn
            .query_row(
                r#"
                SELECT language FROM drafts
                WHERE problem_id = ?1
                ORDER BY updated_at DESC
                LIMIT 1
                "#,
                [problem_id],
                |row| row.get(0),
            )
            .optional()?;

        Ok(language.and_then(|l| Language::from_str(&l, true).ok()))
    }
}

fn row_to_draft(row: &rusqlite::Row<'_>) -> Result<Draft> {
    let language_str: String = row.get(1)?;
    let language = Language::from_str(&language_str, true).map_err(|_| {
        rusqlite::Error::InvalidColumnType(1, "language".to_string(), rusqlite::types::Type::Text)
    })?;

    let timestamp_str: String = row.get(3)?;
    let updated_at = DateTime::parse_from_rfc3339(&timestamp_str)
        .map_err(|_| {
            rusqlite::Error::InvalidColumnType(
                3,
                "updated_at".to_string(),
                rusqlite::types::Type::Text,
            )
        })?
        .with_timezone(&Utc);

    Ok(Draft {
        problem_id: row.get(0)?,
        language,
        code: row.get(2)?,
        updated_at,
    })
}
