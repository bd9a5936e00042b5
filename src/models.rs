// Data models for the task list

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A single entry in the task list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: i64,
    pub title: String,
    pub category: TaskCategory,
    #[serde(rename = "isCompleted")]
    pub is_completed: bool,
}

impl Task {
    /// Candidate task for `TaskStore::add_task`. The id is assigned by the store.
    pub fn new(title: impl Into<String>, category: TaskCategory) -> Self {
        Self {
            id: 0,
            title: title.into(),
            category,
            is_completed: false,
        }
    }

    /// Build a candidate from raw user input, rejecting blank titles
    pub fn draft(input: &str, category: TaskCategory) -> Option<Self> {
        let title = input.trim();
        if title.is_empty() {
            return None;
        }
        Some(Self::new(title, category))
    }
}

/// Fixed set of categories a task can be tagged with
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskCategory {
    Work,
    #[default]
    Personal,
    Shopping,
    Health,
    Study,
    Other,
}

impl TaskCategory {
    /// All categories in declaration order
    pub const ALL: [TaskCategory; 6] = [
        TaskCategory::Work,
        TaskCategory::Personal,
        TaskCategory::Shopping,
        TaskCategory::Health,
        TaskCategory::Study,
        TaskCategory::Other,
    ];

    /// Persisted enum name (e.g. "WORK")
    pub fn name(self) -> &'static str {
        match self {
            TaskCategory::Work => "WORK",
            TaskCategory::Personal => "PERSONAL",
            TaskCategory::Shopping => "SHOPPING",
            TaskCategory::Health => "HEALTH",
            TaskCategory::Study => "STUDY",
            TaskCategory::Other => "OTHER",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            TaskCategory::Work => "Work",
            TaskCategory::Personal => "Personal",
            TaskCategory::Shopping => "Shopping",
            TaskCategory::Health => "Health",
            TaskCategory::Study => "Study",
            TaskCategory::Other => "Other",
        }
    }

    /// Chip color as 0xAARRGGBB
    pub fn color(self) -> u32 {
        match self {
            TaskCategory::Work => 0xFF2196F3,     // blue
            TaskCategory::Personal => 0xFF4CAF50, // green
            TaskCategory::Shopping => 0xFFFF9800, // orange
            TaskCategory::Health => 0xFFE91E63,   // pink
            TaskCategory::Study => 0xFF9C27B0,    // purple
            TaskCategory::Other => 0xFF607D8B,    // blue grey
        }
    }

    pub fn rgb(self) -> (u8, u8, u8) {
        let argb = self.color();
        ((argb >> 16) as u8, (argb >> 8) as u8, argb as u8)
    }
}

impl fmt::Display for TaskCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

impl FromStr for TaskCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        TaskCategory::ALL
            .into_iter()
            .find(|c| c.name().eq_ignore_ascii_case(s) || c.display_name().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                let names: Vec<&str> = TaskCategory::ALL.iter().map(|c| c.display_name()).collect();
                format!("Unknown category: {} (expected one of {})", s, names.join(", "))
            })
    }
}

/// Theme preference
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ThemeMode {
    Light,
    Dark,
    #[default]
    System,
}

impl ThemeMode {
    pub const ALL: [ThemeMode; 3] = [ThemeMode::Light, ThemeMode::Dark, ThemeMode::System];

    /// Persisted enum name (e.g. "SYSTEM")
    pub fn name(self) -> &'static str {
        match self {
            ThemeMode::Light => "LIGHT",
            ThemeMode::Dark => "DARK",
            ThemeMode::System => "SYSTEM",
        }
    }

    /// Exact match against the persisted name. No trimming, no case folding.
    pub fn from_name(name: &str) -> Option<Self> {
        ThemeMode::ALL.into_iter().find(|m| m.name() == name)
    }

    pub fn label(self) -> &'static str {
        match self {
            ThemeMode::Light => "Light Theme",
            ThemeMode::Dark => "Dark Theme",
            ThemeMode::System => "System Theme",
        }
    }

    /// Whether the dark palette applies, given the host's own setting
    pub fn is_dark(self, system_dark: bool) -> bool {
        match self {
            ThemeMode::Light => false,
            ThemeMode::Dark => true,
            ThemeMode::System => system_dark,
        }
    }
}

impl fmt::Display for ThemeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl FromStr for ThemeMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        ThemeMode::ALL
            .into_iter()
            .find(|m| m.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("Unknown theme: {} (expected light, dark or system)", s))
    }
}

/// Current timestamp in milliseconds
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
