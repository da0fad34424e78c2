//! Task domain model
//!
//! Pure domain logic for task management with no I/O operations.
//! Every rule that depends on the current time takes it as a parameter.

use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::date::parse_due_date;
use crate::error::{CoreError, Result};

/// Category assigned when the caller does not pick one
pub const DEFAULT_CATEGORY: &str = "Personal";

const SECONDS_PER_DAY: i64 = 86_400;

/// Task priority, ordered High < Medium < Low for sorting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Priority {
    High,
    #[default]
    Medium,
    Low,
}

impl Priority {
    /// Sort rank (High = 1)
    pub fn rank(self) -> u8 {
        match self {
            Priority::High => 1,
            Priority::Medium => 2,
            Priority::Low => 3,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Priority::High => "High",
            Priority::Medium => "Medium",
            Priority::Low => "Low",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = CoreError;

    /// Case-insensitive; anything outside High/Medium/Low is rejected
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "high" => Ok(Priority::High),
            "medium" => Ok(Priority::Medium),
            "low" => Ok(Priority::Low),
            other => Err(CoreError::validation(
                "priority",
                format!("'{}' is not one of High, Medium, Low", other),
            )),
        }
    }
}

/// A single task
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Task {
    pub id: u32,
    pub title: String,
    pub description: String,
    pub category: String,
    pub priority: Priority,
    pub due_date: Option<NaiveDate>,
    pub completed: bool,
    /// Set exactly while `completed` is true
    pub completed_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Task {
    /// Create a new task with the given title, stamped at `created_at`
    pub fn new(title: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            id: 0,
            title: title.into(),
            description: String::new(),
            category: DEFAULT_CATEGORY.to_string(),
            priority: Priority::default(),
            due_date: None,
            completed: false,
            completed_date: None,
            created_at,
        }
    }

    /// Builder method to set task ID
    pub fn with_id(mut self, id: u32) -> Self {
        self.id = id;
        self
    }

    /// Builder method to set description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Builder method to set category
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    /// Builder method to set priority
    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    /// Builder method to set due date
    pub fn with_due_date(mut self, due_date: Option<NaiveDate>) -> Self {
        self.due_date = due_date;
        self
    }

    /// Builder method to set completion status as of `now`
    pub fn with_completed(mut self, completed: bool, now: DateTime<Utc>) -> Self {
        self.set_completed(completed, now);
        self
    }

    /// Set completion status, keeping `completed_date` in step.
    ///
    /// Setting the current value again is a no-op, so an existing
    /// completion timestamp is preserved.
    pub fn set_completed(&mut self, completed: bool, now: DateTime<Utc>) {
        if self.completed == completed {
            return;
        }
        self.completed = completed;
        self.completed_date = completed.then_some(now);
    }

    /// Toggle completion status
    pub fn toggle_complete(&mut self, now: DateTime<Utc>) {
        self.set_completed(!self.completed, now);
    }

    /// Check if task is overdue at `now`.
    ///
    /// A due date counts from midnight UTC at the start of that day.
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        match self.due_date {
            Some(date) if !self.completed => now > start_of_day(date),
            _ => false,
        }
    }

    /// Whole days until the due date, rounded down; negative once overdue.
    ///
    /// `None` when there is no due date or the task is completed.
    pub fn days_until_due(&self, now: DateTime<Utc>) -> Option<i64> {
        match self.due_date {
            Some(date) if !self.completed => {
                let delta = start_of_day(date) - now;
                Some(delta.num_seconds().div_euclid(SECONDS_PER_DAY))
            }
            _ => None,
        }
    }

    fn apply(&mut self, fields: DraftFields) {
        self.title = fields.title;
        self.description = fields.description;
        self.category = fields.category;
        self.priority = fields.priority;
        self.due_date = fields.due_date;
    }
}

/// The id after `id`, or a storage error once the id space is used up
pub fn following_id(id: u32) -> Result<u32> {
    id.checked_add(1)
        .ok_or_else(|| CoreError::storage(format!("No task ids left after #{}", id)))
}

fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN))
}

/// Caller-supplied fields for creating or updating a task
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskDraft {
    pub title: String,
    pub description: String,
    /// `None` or blank falls back to [`DEFAULT_CATEGORY`]
    pub category: Option<String>,
    pub priority: Option<Priority>,
    /// Unparsed due date; `None` or blank means no deadline
    pub due_date: Option<String>,
}

impl TaskDraft {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            ..Self::default()
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn with_due_date(mut self, due_date: impl Into<String>) -> Self {
        self.due_date = Some(due_date.into());
        self
    }

    /// Validate every field before anything is mutated
    fn validate(&self, today: NaiveDate) -> Result<DraftFields> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(CoreError::validation("title", "Title must not be empty"));
        }

        let due_date = match self.due_date.as_deref() {
            Some(input) => parse_due_date(input, today)?,
            None => None,
        };

        let category = self
            .category
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .unwrap_or(DEFAULT_CATEGORY)
            .to_string();

        Ok(DraftFields {
            title: title.to_string(),
            description: self.description.clone(),
            category,
            priority: self.priority.unwrap_or_default(),
            due_date,
        })
    }
}

struct DraftFields {
    title: String,
    description: String,
    category: String,
    priority: Priority,
    due_date: Option<NaiveDate>,
}

/// Read model of a task with its derived state at a given instant
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct TaskView {
    #[serde(flatten)]
    pub task: Task,
    pub is_overdue: bool,
    pub days_until_due: Option<i64>,
}

impl TaskView {
    pub fn new(task: &Task, now: DateTime<Utc>) -> Self {
        Self {
            task: task.clone(),
            is_overdue: task.is_overdue(now),
            days_until_due: task.days_until_due(now),
        }
    }
}

/// In-memory collection of tasks
///
/// This is a pure domain model with no I/O operations.
/// Persistence is handled by a [`crate::store::TaskBackend`].
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct TaskCollection {
    pub tasks: BTreeMap<u32, Task>,
    /// Ids are handed out monotonically and never reused
    pub next_id: u32,
}

impl Default for TaskCollection {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskCollection {
    /// Create a new empty task collection
    pub fn new() -> Self {
        TaskCollection {
            tasks: BTreeMap::new(),
            next_id: 1,
        }
    }

    /// Validate a draft and add it as a new task created at `now`
    pub fn create(&mut self, draft: &TaskDraft, now: DateTime<Utc>) -> Result<Task> {
        let fields = draft.validate(now.date_naive())?;

        let id = self.next_id;
        let next_id = following_id(id)?;
        let mut task = Task::new(String::new(), now).with_id(id);
        task.apply(fields);

        self.tasks.insert(id, task.clone());
        self.next_id = next_id;
        Ok(task)
    }

    /// Replace every mutable field of task `id` with the draft's values
    pub fn update(&mut self, id: u32, draft: &TaskDraft, now: DateTime<Utc>) -> Result<Task> {
        self.get_or_err(id)?;
        let fields = draft.validate(now.date_naive())?;

        let task = self.get_mut_or_err(id)?;
        task.apply(fields);
        Ok(task.clone())
    }

    /// Flip completion of task `id`
    pub fn toggle(&mut self, id: u32, now: DateTime<Utc>) -> Result<Task> {
        let task = self.get_mut_or_err(id)?;
        task.toggle_complete(now);
        Ok(task.clone())
    }

    /// Add an existing task to the collection
    pub fn insert(&mut self, task: Task) -> Result<()> {
        if task.id >= self.next_id {
            self.next_id = following_id(task.id)?;
        }
        self.tasks.insert(task.id, task);
        Ok(())
    }

    /// Get a task by ID
    pub fn get(&self, id: u32) -> Option<&Task> {
        self.tasks.get(&id)
    }

    /// Get or return error if task not found
    pub fn get_or_err(&self, id: u32) -> Result<&Task> {
        self.get(id).ok_or(CoreError::TaskNotFound(id))
    }

    /// Get mutable or return error if task not found
    pub fn get_mut_or_err(&mut self, id: u32) -> Result<&mut Task> {
        self.tasks.get_mut(&id).ok_or(CoreError::TaskNotFound(id))
    }

    /// Remove a task by ID
    pub fn remove(&mut self, id: u32) -> Result<Task> {
        self.tasks.remove(&id).ok_or(CoreError::TaskNotFound(id))
    }

    /// Remove all completed tasks, returns count of removed tasks
    pub fn remove_completed(&mut self) -> usize {
        let before = self.tasks.len();
        self.tasks.retain(|_, task| !task.completed);
        before - self.tasks.len()
    }

    /// Iterate tasks in id order
    pub fn iter(&self) -> impl Iterator<Item = &Task> {
        self.tasks.values()
    }

    /// Count total tasks
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Check if collection is empty
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Get unique categories sorted alphabetically
    pub fn categories(&self) -> Vec<String> {
        let mut categories: Vec<String> = self.tasks.values().map(|t| t.category.clone()).collect();
        categories.sort();
        categories.dedup();
        categories
    }
}
