//! SQLite persistence for finished analyses
//!
//! One row per domain. Saving an analysis for a domain that already has a
//! row replaces it but keeps the original `created_at`.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::PathBuf;

use crate::pipeline::StartupState;
use crate::utils::get_domain;

const SCHEMA_VERSION: i32 = 1;

const ANALYSIS_COLUMNS: &str =
    "domain, url, startup_id, analysis_json, memo, errors_json, created_at, updated_at";

/// A stored analysis, as read back from the database
#[derive(Debug, Clone, PartialEq)]
pub struct StoredAnalysis {
    pub domain: String,
    pub url: String,
    pub startup_id: String,
    /// Saved state without slide images or raw website HTML
    pub state: StartupState,
    pub memo: Option<String>,
    pub errors: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub struct AnalysisStore {
    conn: Connection,
}

impl AnalysisStore {
    /// Open (or create) the database file, creating parent directories
    pub fn new(path: PathBuf) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create database directory {}", parent.display())
                })?;
            }
        }

        let conn = Connection::open(&path)
            .with_context(|| format!("Failed to open database at {}", path.display()))?;

        // WAL keeps readers unblocked while an analysis is being written
        conn.pragma_update(None, "journal_mode", "WAL")
            .context("Failed to enable WAL mode")?;

        tracing::debug!(path = %path.display(), "opened analysis store");
        Ok(Self { conn })
    }

    /// Store that lives only as long as this value
    pub fn new_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory database")?;
        Ok(Self { conn })
    }

    /// Open the file and make sure the schema exists
    pub fn open(path: PathBuf) -> Result<Self> {
        let store = Self::new(path)?;
        store.initialize_schema()?;
        Ok(store)
    }

    pub fn initialize_schema(&self) -> Result<()> {
        self.conn
            .execute_batch(
                r#"
                CREATE TABLE IF NOT EXISTS schema_version (
                    version INTEGER PRIMARY KEY
                );

                CREATE TABLE IF NOT EXISTS analyses (
                    domain TEXT PRIMARY KEY,
                    url TEXT NOT NULL,
                    startup_id TEXT NOT NULL,
                    analysis_json TEXT NOT NULL,
                    memo TEXT,
                    errors_json TEXT NOT NULL DEFAULT '[]',
                    created_at TEXT NOT NULL,
                    updated_at TEXT NOT NULL
                );

                CREATE INDEX IF NOT EXISTS idx_analyses_updated_at
                    ON analyses(updated_at DESC);
                "#,
            )
            .context("Failed to create analysis tables")?;

        self.conn
            .execute(
                "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
                params![SCHEMA_VERSION],
            )
            .context("Failed to record schema version")?;

        Ok(())
    }

    pub fn get_schema_version(&self) -> Result<i32> {
        let version = self
            .conn
            .query_row("SELECT MAX(version) FROM schema_version", [], |row| {
                row.get::<_, Option<i32>>(0)
            })
            .context("Failed to read schema version")?;
        Ok(version.unwrap_or(0))
    }

    /// Insert or replace the analysis for the URL's domain
    pub fn save(&self, url: &str, state: &StartupState) -> Result<()> {
        let domain = get_domain(url);
        let now = Utc::now().to_rfc3339();

        let analysis_json = serde_json::to_string(&state.for_storage())
            .context("Failed to serialize analysis state")?;
        let errors_json =
            serde_json::to_string(&state.errors).context("Failed to serialize errors")?;

        self.conn
            .execute(
                r#"
                INSERT INTO analyses (
                    domain, url, startup_id, analysis_json, memo, errors_json,
                    created_at, updated_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)
                ON CONFLICT(domain) DO UPDATE SET
                    url = excluded.url,
                    startup_id = excluded.startup_id,
                    analysis_json = excluded.analysis_json,
                    memo = excluded.memo,
                    errors_json = excluded.errors_json,
                    updated_at = excluded.updated_at
                "#,
                params![
                    domain,
                    url,
                    state.startup_id,
                    analysis_json,
                    state.memo,
                    errors_json,
                    now,
                ],
            )
            .with_context(|| format!("Failed to save analysis for {}", domain))?;

        tracing::info!(domain = %domain, "saved analysis");
        Ok(())
    }

    pub fn get_by_url(&self, url: &str) -> Result<Option<StoredAnalysis>> {
        let domain = get_domain(url);
        let sql = format!("SELECT {} FROM analyses WHERE domain = ?1", ANALYSIS_COLUMNS);

        self.conn
            .query_row(&sql, params![domain], map_analysis_row)
            .optional()
            .with_context(|| format!("Failed to load analysis for {}", domain))
    }

    pub fn exists(&self, url: &str) -> Result<bool> {
        let count: i64 = self
            .conn
            .query_row(
                "SELECT COUNT(*) FROM analyses WHERE domain = ?1",
                params![get_domain(url)],
                |row| row.get(0),
            )
            .context("Failed to check for analysis")?;
        Ok(count > 0)
    }

    /// Most recently updated first
    pub fn list(&self, limit: usize, offset: usize) -> Result<Vec<StoredAnalysis>> {
        let sql = format!(
            "SELECT {} FROM analyses ORDER BY updated_at DESC, domain ASC LIMIT ?1 OFFSET ?2",
            ANALYSIS_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;

        let rows = stmt
            .query_map(params![limit as i64, offset as i64], map_analysis_row)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .context("Failed to list analyses")?;

        Ok(rows)
    }

    pub fn count(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM analyses", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Returns whether a row was removed
    pub fn delete(&self, url: &str) -> Result<bool> {
        let domain = get_domain(url);
        let removed = self
            .conn
            .execute("DELETE FROM analyses WHERE domain = ?1", params![domain])
            .with_context(|| format!("Failed to delete analysis for {}", domain))?;

        tracing::info!(domain = %domain, removed, "deleted analysis");
        Ok(removed > 0)
    }

    /// Remove every stored analysis, returning how many there were
    pub fn clear(&self) -> Result<usize> {
        let removed = self
            .conn
            .execute("DELETE FROM analyses", [])
            .context("Failed to clear analyses")?;

        tracing::info!(removed, "cleared analysis store");
        Ok(removed)
    }
}

fn conversion_error(
    column: usize,
    err: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(column, rusqlite::types::Type::Text, Box::new(err))
}

fn parse_timestamp(value: &str, column: usize) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| conversion_error(column, e))
}

fn map_analysis_row(row: &Row) -> rusqlite::Result<StoredAnalysis> {
    let domain: String = row.get(0)?;
    let url: String = row.get(1)?;
    let startup_id: String = row.get(2)?;
    let analysis_json: String = row.get(3)?;
    let memo: Option<String> = row.get(4)?;
    let errors_json: String = row.get(5)?;
    let created_at_str: String = row.get(6)?;
    let updated_at_str: String = row.get(7)?;

    let state: StartupState =
        serde_json::from_str(&analysis_json).map_err(|e| conversion_error(3, e))?;
    let errors: Vec<String> =
        serde_json::from_str(&errors_json).map_err(|e| conversion_error(5, e))?;

    Ok(StoredAnalysis {
        domain,
        url,
        startup_id,
        state,
        memo,
        errors,
        created_at: parse_timestamp(&created_at_str, 6)?,
        updated_at: parse_timestamp(&updated_at_str, 7)?,
    })
}
