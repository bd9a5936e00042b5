// JSONL journal backend for preferences

use crate::models::now_ms;
use crate::prefs::{PrefValue, Preferences, validate_key};
use eyre::{Context, Result};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Journal filename inside the data directory
pub const JOURNAL_FILE: &str = "task_manager_prefs.jsonl";

/// Journal length (in lines) past which a write triggers compaction
pub const DEFAULT_COMPACT_THRESHOLD: usize = 256;

/// One line of the journal. A `None` value is a tombstone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub key: String,
    pub value: Option<PrefValue>,
    pub updated_at: i64,
}

/// Replayed journal: last entry per key plus the number of lines read
#[derive(Debug, Default)]
pub struct Journal {
    pub entries: HashMap<String, Entry>,
    pub lines: usize,
}

impl Journal {
    /// Live value for a key, ignoring tombstones
    pub fn value(&self, key: &str) -> Option<&PrefValue> {
        self.entries.get(key).and_then(|e| e.value.as_ref())
    }

    pub fn live_count(&self) -> usize {
        self.entries.values().filter(|e| e.value.is_some()).count()
    }
}

/// Append an entry to a JSONL file under an exclusive lock
pub fn append_jsonl(path: &Path, entry: &Entry) -> Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .context("Failed to open JSONL file for appending")?;

    file.lock_exclusive().context("Failed to acquire file lock")?;

    let json = serde_json::to_string(entry)?;
    writeln!(file, "{}", json)?;
    file.sync_all()?; // Ensure data is flushed to disk

    // Lock is released when file is dropped
    Ok(())
}

/// Read all entries from a JSONL file, keeping the last line per key
///
/// Appends are serialized by the file lock, so line order is write order.
/// `updated_at` is informational and never decides the winner.
/// Unreadable or malformed lines are skipped.
pub fn read_jsonl_latest(path: &Path) -> Result<Journal> {
    if !path.exists() {
        // File doesn't exist yet, nothing persisted
        return Ok(Journal::default());
    }

    let file = File::open(path).context("Failed to open JSONL file")?;
    file.lock_shared().context("Failed to acquire shared file lock")?;

    Ok(replay(BufReader::new(&file), path))
}

/// Replay journal lines from an already-locked reader
fn replay<R: BufRead>(reader: R, path: &Path) -> Journal {
    let mut journal = Journal::default();

    for (line_num, line) in reader.lines().enumerate() {
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                warn!(
                    file = ?path,
                    line = line_num + 1,
                    error = ?e,
                    "Failed to read line, skipping"
                );
                continue;
            }
        };

        if line.trim().is_empty() {
            continue;
        }
        journal.lines += 1;

        let entry: Entry = match serde_json::from_str(&line) {
            Ok(e) => e,
            Err(e) => {
                warn!(
                    file = ?path,
                    line = line_num + 1,
                    error = ?e,
                    "Failed to parse JSON, skipping"
                );
                continue;
            }
        };

        journal.entries.insert(entry.key.clone(), entry);
    }

    debug!(
        file = ?path,
        lines = journal.lines,
        keys = journal.entries.len(),
        "Replayed JSONL journal"
    );

    journal
}

/// Rewrite a JSONL file with one line per live entry
///
/// Writes to a sibling temp file and renames it over the original.
pub fn write_compacted(path: &Path, journal: &Journal) -> Result<usize> {
    let tmp_path = path.with_extension("jsonl.tmp");

    let mut live: Vec<&Entry> = journal.entries.values().filter(|e| e.value.is_some()).collect();
    live.sort_by(|a, b| a.key.cmp(&b.key));

    {
        let mut tmp = File::create(&tmp_path).context("Failed to create compaction file")?;
        for entry in &live {
            let json = serde_json::to_string(entry)?;
            writeln!(tmp, "{}", json)?;
        }
        tmp.sync_all()?;
    }

    fs::rename(&tmp_path, path).context("Failed to replace JSONL file with compacted copy")?;
    Ok(live.len())
}

/// Preferences persisted as an append-only JSONL journal
pub struct JsonlPreferences {
    path: PathBuf,
    compact_threshold: usize,
    lines: usize,
    // Live keys at open or at the last compaction
    baseline: usize,
}

impl JsonlPreferences {
    /// Open or create the journal in the given directory
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self> {
        Self::open_with_threshold(dir, DEFAULT_COMPACT_THRESHOLD)
    }

    pub fn open_with_threshold<P: AsRef<Path>>(dir: P, compact_threshold: usize) -> Result<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir).context("Failed to create data directory")?;

        let path = dir.join(JOURNAL_FILE);
        let journal = read_jsonl_latest(&path)?;
        let lines = journal.lines;
        let baseline = journal.live_count();
        debug!(path = ?path, lines, baseline, compact_threshold, "Opened JSONL preferences");

        Ok(Self {
            path,
            compact_threshold,
            lines,
            baseline,
        })
    }

    /// Path of the journal file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of lines in the journal
    pub fn lines(&self) -> usize {
        self.lines
    }

    /// Collapse the journal to one line per live key. Returns the live key count.
    pub fn compact(&mut self) -> Result<usize> {
        if !self.path.exists() {
            return Ok(0);
        }

        // Lock before reading so no append slips in ahead of the rename
        let file = OpenOptions::new()
            .read(true)
            .open(&self.path)
            .context("Failed to open JSONL file for compaction")?;
        file.lock_exclusive().context("Failed to acquire file lock")?;
        let journal = replay(BufReader::new(&file), &self.path);

        let before = journal.lines;
        let live = write_compacted(&self.path, &journal)?;
        self.lines = live;
        self.baseline = live;

        info!(path = ?self.path, before, after = live, "Compacted preference journal");
        Ok(live)
    }

    fn append(&mut self, key: &str, value: Option<PrefValue>) -> Result<()> {
        validate_key(key)?;

        let entry = Entry {
            key: key.to_string(),
            value,
            updated_at: now_ms(),
        };
        append_jsonl(&self.path, &entry)?;
        self.lines += 1;

        if self.compact_threshold > 0 && self.lines > self.baseline + self.compact_threshold {
            self.compact()?;
        }
        Ok(())
    }
}

impl Preferences for JsonlPreferences {
    fn get(&self, key: &str) -> Result<Option<PrefValue>> {
        let journal = read_jsonl_latest(&self.path)?;
        Ok(journal.value(key).cloned())
    }

    fn put(&mut self, key: &str, value: PrefValue) -> Result<()> {
        self.append(key, Some(value))
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.append(key, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_append_jsonl() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("test.jsonl");

        let entry = Entry {
            key: "theme_mode".to_string(),
            value: Some(PrefValue::Str("DARK".to_string())),
            updated_at: now_ms(),
        };
        append_jsonl(&path, &entry).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("\"key\":\"theme_mode\""));
        assert!(content.contains("\"value\":\"DARK\""));
    }

    #[test]
    fn test_read_jsonl_latest() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("test.jsonl");

        let first = Entry {
            key: "next_id".to_string(),
            value: Some(PrefValue::Int(2)),
            updated_at: 1000,
        };
        let second = Entry {
            key: "next_id".to_string(),
            value: Some(PrefValue::Int(3)),
            updated_at: 2000,
        };
        append_jsonl(&path, &first).unwrap();
        append_jsonl(&path, &second).unwrap();

        let journal = read_jsonl_latest(&path).unwrap();
        assert_eq!(journal.lines, 2);
        assert_eq!(journal.entries.len(), 1);
        assert_eq!(journal.value("next_id"), Some(&PrefValue::Int(3)));
    }

    #[test]
    fn test_read_jsonl_ties_go_to_later_line() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("test.jsonl");

        for n in [5, 6] {
            let entry = Entry {
                key: "next_id".to_string(),
                value: Some(PrefValue::Int(n)),
                updated_at: 1000,
            };
            append_jsonl(&path, &entry).unwrap();
        }

        let journal = read_jsonl_latest(&path).unwrap();
        assert_eq!(journal.value("next_id"), Some(&PrefValue::Int(6)));
    }

    #[test]
    fn test_read_jsonl_later_line_wins_despite_older_timestamp() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("test.jsonl");

        // Clock stepped back between the two writes
        fs::write(
            &path,
            r#"{"key":"theme_mode","value":"DARK","updated_at":2000}
{"key":"theme_mode","value":"LIGHT","updated_at":1000}
"#,
        )
        .unwrap();

        let journal = read_jsonl_latest(&path).unwrap();
        assert_eq!(journal.value("theme_mode"), Some(&PrefValue::Str("LIGHT".to_string())));
    }

    #[test]
    fn test_store_ids_survive_clock_step_back() {
        use crate::models::{Task, TaskCategory};
        use crate::store::{KEY_NEXT_ID, KEY_TASKS, TaskStore};

        let temp = TempDir::new().unwrap();
        let mut store = TaskStore::new(JsonlPreferences::open(temp.path()).unwrap());
        store.add_task(Task::new("First", TaskCategory::Work)).unwrap();

        // Second add lands with timestamps older than the first
        let path = store.prefs().path().to_path_buf();
        let stale = now_ms() - 5000;
        let tasks = r#"[{"id":1,"title":"First","category":"WORK","isCompleted":false},{"id":2,"title":"Second","category":"WORK","isCompleted":false}]"#;
        for (key, value) in [
            (KEY_TASKS, PrefValue::Str(tasks.to_string())),
            (KEY_NEXT_ID, PrefValue::Int(3)),
        ] {
            let entry = Entry {
                key: key.to_string(),
                value: Some(value),
                updated_at: stale,
            };
            append_jsonl(&path, &entry).unwrap();
        }

        assert_eq!(store.load_tasks().unwrap().len(), 2);
        assert_eq!(store.load_next_id().unwrap(), 3);

        store.add_task(Task::new("Third", TaskCategory::Work)).unwrap();
        let ids: Vec<i64> = store.load_tasks().unwrap().iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn test_read_jsonl_nonexistent_file() {
        let temp = TempDir::new().unwrap();
        let journal = read_jsonl_latest(&temp.path().join("nonexistent.jsonl")).unwrap();
        assert!(journal.entries.is_empty());
        assert_eq!(journal.lines, 0);
    }

    #[test]
    fn test_read_jsonl_malformed_line() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("test.jsonl");

        fs::write(
            &path,
            r#"{"key":"a","value":1,"updated_at":1000}
{malformed json}
{"key":"b","value":"two","updated_at":1000}
"#,
        )
        .unwrap();

        let journal = read_jsonl_latest(&path).unwrap();
        // Should skip malformed line and load the two valid entries
        assert_eq!(journal.entries.len(), 2);
        assert_eq!(journal.value("a"), Some(&PrefValue::Int(1)));
        assert_eq!(journal.value("b"), Some(&PrefValue::Str("two".to_string())));
    }

    #[test]
    fn test_tombstone_hides_value() {
        let temp = TempDir::new().unwrap();
        let mut prefs = JsonlPreferences::open(temp.path()).unwrap();

        prefs.put_string("k", "v").unwrap();
        prefs.remove("k").unwrap();
        assert_eq!(prefs.get("k").unwrap(), None);

        let content = fs::read_to_string(prefs.path()).unwrap();
        assert!(content.contains("\"value\":null"));
    }

    #[test]
    fn test_values_survive_reopen() {
        let temp = TempDir::new().unwrap();
        {
            let mut prefs = JsonlPreferences::open(temp.path()).unwrap();
            prefs.put_int("next_id", 4).unwrap();
            prefs.put_string("theme_mode", "LIGHT").unwrap();
        }

        let prefs = JsonlPreferences::open(temp.path()).unwrap();
        assert_eq!(prefs.lines(), 2);
        assert_eq!(prefs.get_int("next_id").unwrap(), Some(4));
        assert_eq!(prefs.get_string("theme_mode").unwrap(), Some("LIGHT".to_string()));
    }

    #[test]
    fn test_compact_keeps_live_keys_only() {
        let temp = TempDir::new().unwrap();
        let mut prefs = JsonlPreferences::open_with_threshold(temp.path(), 0).unwrap();

        for n in 1..=5 {
            prefs.put_int("next_id", n).unwrap();
        }
        prefs.put_string("gone", "soon").unwrap();
        prefs.remove("gone").unwrap();
        assert_eq!(prefs.lines(), 7);

        let live = prefs.compact().unwrap();
        assert_eq!(live, 1);
        assert_eq!(prefs.lines(), 1);
        assert_eq!(prefs.get_int("next_id").unwrap(), Some(5));
        assert_eq!(prefs.get("gone").unwrap(), None);

        let content = fs::read_to_string(prefs.path()).unwrap();
        assert_eq!(content.lines().count(), 1);
        assert!(!temp.path().join("task_manager_prefs.jsonl.tmp").exists());
    }

    #[test]
    fn test_auto_compaction_past_threshold() {
        let temp = TempDir::new().unwrap();
        let mut prefs = JsonlPreferences::open_with_threshold(temp.path(), 3).unwrap();

        for n in 1..=4 {
            prefs.put_int("next_id", n).unwrap();
        }

        // Fourth write crossed the threshold and collapsed the journal
        assert_eq!(prefs.lines(), 1);
        assert_eq!(prefs.get_int("next_id").unwrap(), Some(4));
    }

    #[test]
    fn test_small_threshold_does_not_compact_every_write() {
        let temp = TempDir::new().unwrap();
        let mut prefs = JsonlPreferences::open_with_threshold(temp.path(), 1).unwrap();

        for key in ["a", "b", "c"] {
            prefs.put_int(key, 1).unwrap();
        }
        assert_eq!(prefs.compact().unwrap(), 3);
        assert_eq!(prefs.lines(), 3);

        // One write past the live keys stays within the threshold
        prefs.put_int("a", 2).unwrap();
        assert_eq!(prefs.lines(), 4);

        prefs.put_int("a", 3).unwrap();
        assert_eq!(prefs.lines(), 3);
        assert_eq!(prefs.get_int("a").unwrap(), Some(3));
    }

    #[test]
    fn test_baseline_counts_existing_live_keys() {
        let temp = TempDir::new().unwrap();
        {
            let mut prefs = JsonlPreferences::open_with_threshold(temp.path(), 0).unwrap();
            for key in ["a", "b", "c"] {
                prefs.put_int(key, 1).unwrap();
            }
        }

        let mut prefs = JsonlPreferences::open_with_threshold(temp.path(), 2).unwrap();
        prefs.put_int("a", 2).unwrap();
        prefs.put_int("b", 2).unwrap();
        assert_eq!(prefs.lines(), 5);

        prefs.put_int("c", 2).unwrap();
        assert_eq!(prefs.lines(), 3);
    }

    #[test]
    fn test_compact_missing_file() {
        let temp = TempDir::new().unwrap();
        let mut prefs = JsonlPreferences::open(temp.path()).unwrap();
        assert_eq!(prefs.compact().unwrap(), 0);
    }

    #[test]
    fn test_put_rejects_blank_key() {
        let temp = TempDir::new().unwrap();
        let mut prefs = JsonlPreferences::open(temp.path()).unwrap();
        assert!(prefs.put_int(" ", 1).is_err());
    }
}
