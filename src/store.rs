// Task store persisted through a key-value preference backend

use crate::models::{Task, ThemeMode};
use crate::prefs::{PrefValue, Preferences};
use eyre::{Context, Result};
use tracing::{debug, info, warn};

pub const KEY_TASKS: &str = "tasks";
pub const KEY_NEXT_ID: &str = "next_id";
pub const KEY_THEME: &str = "theme_mode";

/// First id handed out by an empty store
pub const FIRST_ID: i64 = 1;

/// Sole owner of the task list, id counter and theme preference
///
/// Every mutation re-reads the persisted list, applies the change and writes
/// the whole list back. Nothing is cached between calls.
pub struct TaskStore<P: Preferences> {
    prefs: P,
}

impl<P: Preferences> TaskStore<P> {
    pub fn new(prefs: P) -> Self {
        Self { prefs }
    }

    /// Borrow the underlying preference backend
    pub fn prefs(&self) -> &P {
        &self.prefs
    }

    pub fn prefs_mut(&mut self) -> &mut P {
        &mut self.prefs
    }

    pub fn into_inner(self) -> P {
        self.prefs
    }

    // ========================================================================
    // Tasks
    // ========================================================================

    /// Load the persisted task list
    ///
    /// Absent or undecodable data yields an empty list. Backend I/O errors
    /// are still returned.
    pub fn load_tasks(&self) -> Result<Vec<Task>> {
        let raw = match self.prefs.get(KEY_TASKS)? {
            None => return Ok(Vec::new()),
            Some(PrefValue::Str(s)) => s,
            Some(other) => {
                warn!(key = KEY_TASKS, kind = other.type_name(), "Task list has wrong type, treating as empty");
                return Ok(Vec::new());
            }
        };

        match serde_json::from_str::<Vec<Task>>(&raw) {
            Ok(tasks) => Ok(tasks),
            Err(e) => {
                warn!(key = KEY_TASKS, error = ?e, "Failed to parse task list, treating as empty");
                Ok(Vec::new())
            }
        }
    }

    fn save_tasks(&mut self, tasks: &[Task]) -> Result<()> {
        let json = serde_json::to_string(tasks).context("Failed to serialize task list")?;
        self.prefs.put_string(KEY_TASKS, &json)?;
        debug!(count = tasks.len(), "Saved task list");
        Ok(())
    }

    /// Next id to assign, or `FIRST_ID` if none was persisted
    pub fn load_next_id(&self) -> Result<i64> {
        Ok(self.prefs.get_int(KEY_NEXT_ID)?.unwrap_or(FIRST_ID))
    }

    fn save_next_id(&mut self, next_id: i64) -> Result<()> {
        self.prefs.put_int(KEY_NEXT_ID, next_id)
    }

    /// Append a task and return the updated counter
    ///
    /// The candidate's id is replaced with the current counter value. The
    /// return value is the counter after the add, not the new task's id;
    /// call `load_tasks` to see the appended task.
    pub fn add_task(&mut self, task: Task) -> Result<i64> {
        let mut tasks = self.load_tasks()?;
        let id = self.load_next_id()?;

        tasks.push(Task { id, ..task });
        self.save_tasks(&tasks)?;

        let next_id = id + 1;
        self.save_next_id(next_id)?;

        info!(id, next_id, "Added task");
        Ok(next_id)
    }

    /// Flip completion on the task with the given id. Unknown ids are a no-op.
    pub fn toggle_task_completion(&mut self, id: i64) -> Result<()> {
        let mut tasks = self.load_tasks()?;

        let mut found = false;
        for task in tasks.iter_mut().filter(|t| t.id == id) {
            task.is_completed = !task.is_completed;
            found = true;
        }
        if !found {
            debug!(id, "Toggle for unknown task id");
        }

        self.save_tasks(&tasks)
    }

    /// Remove the task with the given id. Unknown ids are a no-op.
    pub fn delete_task(&mut self, id: i64) -> Result<()> {
        let mut tasks = self.load_tasks()?;

        let before = tasks.len();
        tasks.retain(|t| t.id != id);
        debug!(id, removed = before - tasks.len(), "Deleted task");

        self.save_tasks(&tasks)
    }

    /// Empty the list and reset the counter
    pub fn clear_all_tasks(&mut self) -> Result<()> {
        self.save_tasks(&[])?;
        self.save_next_id(FIRST_ID)?;
        info!("Cleared all tasks");
        Ok(())
    }

    // ========================================================================
    // Theme
    // ========================================================================

    pub fn save_theme(&mut self, mode: ThemeMode) -> Result<()> {
        self.prefs.put_string(KEY_THEME, mode.name())?;
        debug!(theme = mode.name(), "Saved theme");
        Ok(())
    }

    /// Persisted theme; absent or unrecognized values fall back to System
    pub fn load_theme(&self) -> Result<ThemeMode> {
        let mode = match self.prefs.get(KEY_THEME)? {
            None => ThemeMode::System,
            Some(PrefValue::Str(name)) => ThemeMode::from_name(&name).unwrap_or_else(|| {
                warn!(key = KEY_THEME, value = %name, "Unknown theme name, using System");
                ThemeMode::System
            }),
            Some(other) => {
                warn!(key = KEY_THEME, kind = other.type_name(), "Theme has wrong type, using System");
                ThemeMode::System
            }
        };
        Ok(mode)
    }
}
