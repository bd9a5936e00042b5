// Category filtering and progress counters over a task snapshot

use crate::models::{Task, TaskCategory};

/// Which tasks the list view shows
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CategoryFilter {
    #[default]
    All,
    Only(TaskCategory),
}

impl CategoryFilter {
    /// Select a category chip. Selecting the active chip goes back to All.
    pub fn select(&mut self, category: TaskCategory) {
        *self = match *self {
            CategoryFilter::Only(current) if current == category => CategoryFilter::All,
            _ => CategoryFilter::Only(category),
        };
    }

    pub fn clear(&mut self) {
        *self = CategoryFilter::All;
    }

    pub fn category(self) -> Option<TaskCategory> {
        match self {
            CategoryFilter::All => None,
            CategoryFilter::Only(c) => Some(c),
        }
    }

    pub fn matches(self, task: &Task) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Only(c) => task.category == c,
        }
    }

    /// Tasks passing the filter, in snapshot order
    pub fn apply(self, tasks: &[Task]) -> Vec<&Task> {
        tasks.iter().filter(|t| self.matches(t)).collect()
    }
}

impl From<Option<TaskCategory>> for CategoryFilter {
    fn from(category: Option<TaskCategory>) -> Self {
        category.map_or(CategoryFilter::All, CategoryFilter::Only)
    }
}

/// Per-category task counts, skipping empty categories, in declaration order
pub fn category_counts(tasks: &[Task]) -> Vec<(TaskCategory, usize)> {
    TaskCategory::ALL
        .into_iter()
        .map(|c| (c, tasks.iter().filter(|t| t.category == c).count()))
        .filter(|(_, n)| *n > 0)
        .collect()
}

/// Completion counter for the visible tasks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub completed: usize,
    pub total: usize,
}

impl Progress {
    pub fn of<'a>(tasks: impl IntoIterator<Item = &'a Task>) -> Self {
        let mut progress = Progress { completed: 0, total: 0 };
        for task in tasks {
            progress.total += 1;
            if task.is_completed {
                progress.completed += 1;
            }
        }
        progress
    }

    pub fn label(&self, filter: CategoryFilter) -> String {
        match filter {
            CategoryFilter::All => format!("Progress: {}/{} tasks completed", self.completed, self.total),
            CategoryFilter::Only(c) => format!(
                "Progress ({}): {}/{} tasks completed",
                c.display_name(),
                self.completed,
                self.total
            ),
        }
    }
}

/// Placeholder shown when the filtered view is empty
pub fn empty_message(all_tasks_empty: bool) -> &'static str {
    if all_tasks_empty {
        "No tasks yet! Add one above to get started."
    } else {
        "No tasks in this category."
    }
}
