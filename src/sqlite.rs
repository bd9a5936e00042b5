// SQLite backend for preferences

use crate::models::now_ms;
use crate::prefs::{PrefValue, Preferences, validate_key};
use eyre::{Context, Result, eyre};
use rusqlite::{Connection, OptionalExtension};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

const CURRENT_VERSION: u32 = 1;

/// Database filename inside the data directory
pub const DB_FILE: &str = "task_manager_prefs.db";

/// Preferences persisted in a single SQLite table
pub struct SqlitePreferences {
    base_path: PathBuf,
    db: Connection,
}

impl SqlitePreferences {
    /// Open or create the database in the given directory
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let base_path = dir.as_ref().to_path_buf();

        fs::create_dir_all(&base_path).context("Failed to create data directory")?;

        let db_path = base_path.join(DB_FILE);
        let db = Connection::open(&db_path).context("Failed to open SQLite database")?;

        let prefs = Self { base_path, db };
        prefs.create_schema()?;
        prefs.write_version()?;

        Ok(prefs)
    }

    /// Directory holding the database
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn create_schema(&self) -> Result<()> {
        debug!("Creating preferences schema");

        self.db.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS preferences (
                key TEXT PRIMARY KEY,
                value_str TEXT,
                value_int INTEGER,
                updated_at INTEGER NOT NULL,
                CHECK ((value_str IS NULL) <> (value_int IS NULL))
            );
            "#,
        )?;

        Ok(())
    }

    fn write_version(&self) -> Result<()> {
        let version_path = self.base_path.join(".version");
        if !version_path.exists() {
            fs::write(version_path, CURRENT_VERSION.to_string())?;
        }
        Ok(())
    }
}

impl Preferences for SqlitePreferences {
    fn get(&self, key: &str) -> Result<Option<PrefValue>> {
        let row = self
            .db
            .query_row(
                "SELECT value_str, value_int FROM preferences WHERE key = ?1",
                [key],
                |row| Ok((row.get::<_, Option<String>>(0)?, row.get::<_, Option<i64>>(1)?)),
            )
            .optional()?;

        match row {
            None => Ok(None),
            Some((Some(s), None)) => Ok(Some(PrefValue::Str(s))),
            Some((None, Some(i))) => Ok(Some(PrefValue::Int(i))),
            Some(_) => Err(eyre!("Preference {} has an invalid row", key)),
        }
    }

    fn put(&mut self, key: &str, value: PrefValue) -> Result<()> {
        validate_key(key)?;

        let (value_str, value_int) = match value {
            PrefValue::Str(s) => (Some(s), None),
            PrefValue::Int(i) => (None, Some(i)),
        };

        self.db
            .execute(
                "INSERT OR REPLACE INTO preferences (key, value_str, value_int, updated_at)
                 VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![key, value_str, value_int, now_ms()],
            )
            .context("Failed to write preference")?;

        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.db
            .execute("DELETE FROM preferences WHERE key = ?1", [key])
            .context("Failed to delete preference")?;
        Ok(())
    }
}
