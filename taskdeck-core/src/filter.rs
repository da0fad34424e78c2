//! Task filtering and sorting logic
//!
//! Provides a builder-style API for the query request. Filters run in a
//! fixed order (category, priority, status, search) before the sort.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;

use crate::task::{Priority, Task, TaskCollection};

/// Value meaning "no filter" for textual category/priority parameters
pub const ALL: &str = "all";

/// Sort order for tasks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskSort {
    /// Newest first
    #[default]
    DateCreated,
    Priority,
    DueDate,
    Title,
}

impl TaskSort {
    /// Create from string (case-insensitive); unknown keys fall back to `DateCreated`
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "priority" => Self::Priority,
            "due_date" => Self::DueDate,
            "title" => Self::Title,
            _ => Self::DateCreated,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::DateCreated => "date_created",
            Self::Priority => "priority",
            Self::DueDate => "due_date",
            Self::Title => "title",
        }
    }
}

/// Completion-state filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusFilter {
    #[default]
    All,
    Active,
    Completed,
    Overdue,
}

impl StatusFilter {
    /// Create from string (case-insensitive); unknown values fall back to `All`
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "active" => Self::Active,
            "completed" => Self::Completed,
            "overdue" => Self::Overdue,
            _ => Self::All,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Overdue => "overdue",
        }
    }

    fn matches(self, task: &Task, now: DateTime<Utc>) -> bool {
        match self {
            Self::All => true,
            Self::Active => !task.completed,
            Self::Completed => task.completed,
            Self::Overdue => task.is_overdue(now),
        }
    }
}

/// Builder for the task query request
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskFilter {
    /// Exact category match
    pub category: Option<String>,
    /// Exact match against the priority's display name
    pub priority: Option<String>,
    pub status: StatusFilter,
    /// Case-sensitive substring of title or description
    pub search: Option<String>,
    pub sort: TaskSort,
}

impl TaskFilter {
    /// Create a new filter with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a filter from textual parameters as sent by a client.
    ///
    /// Exactly `"all"`, blank or absent means no filter for category and
    /// priority. A priority value is kept verbatim, so text that is not one
    /// of `High`, `Medium`, `Low` matches no task. Unknown status and sort
    /// values fall back to their defaults.
    pub fn from_params(
        category: Option<&str>,
        priority: Option<&str>,
        status: Option<&str>,
        search: Option<&str>,
        sort: Option<&str>,
    ) -> Self {
        let mut filter = Self::new()
            .with_category(category.map(str::to_string))
            .with_status(status.map(StatusFilter::parse).unwrap_or_default())
            .with_search(search.map(str::to_string))
            .sort_by(sort.map(TaskSort::parse).unwrap_or_default());
        filter.priority = unless_all(priority).map(str::to_string);
        filter
    }

    /// Filter by exact category
    pub fn in_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Set category filter; `"all"` or blank clears it
    pub fn with_category(mut self, category: Option<String>) -> Self {
        self.category = category.filter(|c| unless_all(Some(c.as_str())).is_some());
        self
    }

    /// Set priority filter
    pub fn with_priority(mut self, priority: Option<Priority>) -> Self {
        self.priority = priority.map(|p| p.as_str().to_string());
        self
    }

    /// Set status filter
    pub fn with_status(mut self, status: StatusFilter) -> Self {
        self.status = status;
        self
    }

    /// Filter to only show active tasks
    pub fn active(self) -> Self {
        self.with_status(StatusFilter::Active)
    }

    /// Filter to only show completed tasks
    pub fn completed(self) -> Self {
        self.with_status(StatusFilter::Completed)
    }

    /// Filter to only show overdue tasks
    pub fn overdue(self) -> Self {
        self.with_status(StatusFilter::Overdue)
    }

    /// Filter by search term
    pub fn search(mut self, term: impl Into<String>) -> Self {
        self.search = Some(term.into());
        self
    }

    /// Set search term; an empty term disables the search
    pub fn with_search(mut self, term: Option<String>) -> Self {
        self.search = term.filter(|t| !t.is_empty());
        self
    }

    /// Sort by given field
    pub fn sort_by(mut self, sort: TaskSort) -> Self {
        self.sort = sort;
        self
    }

    /// Check if a task matches this filter
    pub fn matches(&self, task: &Task, now: DateTime<Utc>) -> bool {
        if let Some(category) = &self.category {
            if &task.category != category {
                return false;
            }
        }

        if let Some(priority) = &self.priority {
            if task.priority.as_str() != priority {
                return false;
            }
        }

        if !self.status.matches(task, now) {
            return false;
        }

        if let Some(term) = self.search.as_deref().filter(|t| !t.is_empty()) {
            if !task.title.contains(term) && !task.description.contains(term) {
                return false;
            }
        }

        true
    }

    /// Apply filter and sort to a collection of tasks.
    ///
    /// Every sort is stable over the incoming order.
    pub fn apply<'a>(
        &self,
        tasks: impl Iterator<Item = &'a Task>,
        now: DateTime<Utc>,
    ) -> Vec<&'a Task> {
        let mut filtered: Vec<&Task> = tasks.filter(|t| self.matches(t, now)).collect();

        match self.sort {
            TaskSort::DateCreated => filtered.sort_by_key(|t| Reverse((t.created_at, t.id))),
            TaskSort::Priority => filtered.sort_by_key(|t| t.priority.rank()),
            // Tasks without a due date go last
            TaskSort::DueDate => filtered.sort_by_key(|t| (t.due_date.is_none(), t.due_date)),
            TaskSort::Title => filtered.sort_by(|a, b| a.title.cmp(&b.title)),
        }

        filtered
    }
}

fn unless_all(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty() && *v != ALL)
}

/// Extension trait for TaskCollection to support filtering
pub trait FilterExt {
    /// Get tasks filtered and sorted according to the filter
    fn get_filtered(&self, filter: &TaskFilter, now: DateTime<Utc>) -> Vec<&Task>;
}

impl FilterExt for TaskCollection {
    fn get_filtered(&self, filter: &TaskFilter, now: DateTime<Utc>) -> Vec<&Task> {
        filter.apply(self.iter(), now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::TaskDraft;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 10, 9, 0, 0).unwrap()
    }

    fn ids(tasks: &[&Task]) -> Vec<u32> {
        tasks.iter().map(|t| t.id).collect()
    }

    /// A(Low, active), B(High, active), C(Medium, completed)
    fn sample() -> TaskCollection {
        let mut collection = TaskCollection::new();
        collection
            .create(&TaskDraft::new("A", "").with_priority(Priority::Low), now())
            .unwrap();
        collection
            .create(&TaskDraft::new("B", "").with_priority(Priority::High), now())
            .unwrap();
        collection
            .create(&TaskDraft::new("C", "").with_priority(Priority::Medium), now())
            .unwrap();
        collection.toggle(3, now()).unwrap();
        collection
    }

    #[test]
    fn test_active_sorted_by_priority() {
        let collection = sample();
        let filter = TaskFilter::new().active().sort_by(TaskSort::Priority);

        let titles: Vec<&str> = collection
            .get_filtered(&filter, now())
            .iter()
            .map(|t| t.title.as_str())
            .collect();
        assert_eq!(titles, vec!["B", "A"]);
    }

    #[test]
    fn test_filter_completed() {
        let collection = sample();
        let results = collection.get_filtered(&TaskFilter::new().completed(), now());

        assert_eq!(ids(&results), vec![3]);
    }

    #[test]
    fn test_overdue_disjoint_from_completed() {
        let mut collection = TaskCollection::new();
        let due = |d: &str| TaskDraft::new("t", "").with_due_date(d);
        collection.create(&due("2026-03-01"), now()).unwrap();
        collection.create(&due("2026-03-02"), now()).unwrap();
        collection.create(&due("2026-04-01"), now()).unwrap();
        collection.create(&TaskDraft::new("none", ""), now()).unwrap();
        collection.toggle(2, now()).unwrap();

        let overdue = collection.get_filtered(&TaskFilter::new().overdue(), now());
        let completed = collection.get_filtered(&TaskFilter::new().completed(), now());

        assert_eq!(ids(&overdue), vec![1]);
        assert!(overdue.iter().all(|t| !completed.iter().any(|c| c.id == t.id)));
    }

    #[test]
    fn test_category_and_priority_exact_match() {
        let mut collection = TaskCollection::new();
        collection
            .create(&TaskDraft::new("a", "").with_category("Work").with_priority(Priority::High), now())
            .unwrap();
        collection
            .create(&TaskDraft::new("b", "").with_category("work").with_priority(Priority::High), now())
            .unwrap();
        collection
            .create(&TaskDraft::new("c", "").with_category("Work"), now())
            .unwrap();

        let filter = TaskFilter::new()
            .in_category("Work")
            .with_priority(Some(Priority::High));
        assert_eq!(ids(&collection.get_filtered(&filter, now())), vec![1]);
    }

    #[test]
    fn test_search_title_or_description_case_sensitive() {
        let mut collection = TaskCollection::new();
        collection.create(&TaskDraft::new("Buy groceries", ""), now()).unwrap();
        collection.create(&TaskDraft::new("Call mom", "buy flowers"), now()).unwrap();
        collection.create(&TaskDraft::new("Write report", ""), now()).unwrap();

        let lower = collection.get_filtered(&TaskFilter::new().search("buy"), now());
        assert_eq!(ids(&lower), vec![2]);

        let upper = collection.get_filtered(&TaskFilter::new().search("Buy"), now());
        assert_eq!(ids(&upper), vec![1]);
    }

    #[test]
    fn test_empty_search_matches_everything() {
        let collection = sample();
        let filter = TaskFilter::new().with_search(Some(String::new()));

        assert_eq!(collection.get_filtered(&filter, now()).len(), 3);
    }

    #[test]
    fn test_default_sort_newest_first() {
        let mut collection = TaskCollection::new();
        collection.create(&TaskDraft::new("old", ""), now()).unwrap();
        collection
            .create(&TaskDraft::new("new", ""), now() + Duration::hours(1))
            .unwrap();
        collection
            .create(&TaskDraft::new("same instant", ""), now() + Duration::hours(1))
            .unwrap();

        assert_eq!(ids(&collection.get_filtered(&TaskFilter::new(), now())), vec![3, 2, 1]);
    }

    #[test]
    fn test_sort_by_due_date_missing_last() {
        let mut collection = TaskCollection::new();
        collection.create(&TaskDraft::new("none", ""), now()).unwrap();
        collection
            .create(&TaskDraft::new("late", "").with_due_date("2026-05-01"), now())
            .unwrap();
        collection
            .create(&TaskDraft::new("soon", "").with_due_date("2026-03-12"), now())
            .unwrap();

        let filter = TaskFilter::new().sort_by(TaskSort::DueDate);
        assert_eq!(ids(&collection.get_filtered(&filter, now())), vec![3, 2, 1]);
    }

    #[test]
    fn test_sort_by_title_is_case_sensitive() {
        let mut collection = TaskCollection::new();
        for title in ["zebra", "Mango", "Apple"] {
            collection.create(&TaskDraft::new(title, ""), now()).unwrap();
        }

        let filter = TaskFilter::new().sort_by(TaskSort::Title);
        let titles: Vec<&str> = collection
            .get_filtered(&filter, now())
            .iter()
            .map(|t| t.title.as_str())
            .collect();
        assert_eq!(titles, vec!["Apple", "Mango", "zebra"]);
    }

    #[test]
    fn test_priority_sort_is_stable_and_lossless() {
        let mut collection = TaskCollection::new();
        let priorities = [
            Priority::Low,
            Priority::High,
            Priority::Medium,
            Priority::High,
            Priority::Low,
            Priority::Medium,
        ];
        for (i, priority) in priorities.iter().enumerate() {
            collection
                .create(&TaskDraft::new(format!("t{i}"), "").with_priority(*priority), now())
                .unwrap();
        }

        let filter = TaskFilter::new().sort_by(TaskSort::Priority);
        let results = collection.get_filtered(&filter, now());

        assert_eq!(results.len(), priorities.len());
        assert_eq!(ids(&results), vec![2, 4, 3, 6, 1, 5]);
    }

    #[test]
    fn test_from_params() {
        let filter = TaskFilter::from_params(
            Some("all"),
            Some("High"),
            Some("overdue"),
            Some("report"),
            Some("due_date"),
        );

        assert_eq!(filter.category, None);
        assert_eq!(filter.priority.as_deref(), Some("High"));
        assert_eq!(filter.status, StatusFilter::Overdue);
        assert_eq!(filter.search.as_deref(), Some("report"));
        assert_eq!(filter.sort, TaskSort::DueDate);
    }

    #[test]
    fn test_from_params_fallbacks() {
        let filter =
            TaskFilter::from_params(Some("Work"), None, Some("bogus"), Some(""), Some("bogus"));

        assert_eq!(filter.category.as_deref(), Some("Work"));
        assert_eq!(filter.priority, None);
        assert_eq!(filter.status, StatusFilter::All);
        assert_eq!(filter.search, None);
        assert_eq!(filter.sort, TaskSort::DateCreated);
    }

    #[test]
    fn test_unknown_or_miscased_priority_matches_nothing() {
        let collection = sample();

        for text in ["urgent", "high", "HIGH"] {
            let filter = TaskFilter::from_params(None, Some(text), None, None, None);
            assert!(collection.get_filtered(&filter, now()).is_empty(), "{text}");
        }

        let filter = TaskFilter::from_params(None, Some("High"), None, None, None);
        assert_eq!(ids(&collection.get_filtered(&filter, now())), vec![2]);
    }

    #[test]
    fn test_all_sentinel_is_exact() {
        let mut collection = TaskCollection::new();
        collection
            .create(&TaskDraft::new("a", "").with_category("Work"), now())
            .unwrap();
        collection
            .create(&TaskDraft::new("b", "").with_category("ALL"), now())
            .unwrap();

        let everything = TaskFilter::from_params(Some("all"), Some("all"), None, None, None);
        assert_eq!(collection.get_filtered(&everything, now()).len(), 2);

        let literal = TaskFilter::from_params(Some("ALL"), Some("ALL"), None, None, None);
        assert_eq!(literal.category.as_deref(), Some("ALL"));
        assert!(collection.get_filtered(&literal, now()).is_empty());

        let literal = TaskFilter::new().with_category(Some("ALL".to_string()));
        assert_eq!(ids(&collection.get_filtered(&literal, now())), vec![2]);
    }

    #[test]
    fn test_builder_category_treats_all_as_no_filter() {
        assert_eq!(TaskFilter::new().with_category(Some("all".to_string())).category, None);
        assert_eq!(TaskFilter::new().with_category(Some("  ".to_string())).category, None);
        assert_eq!(
            TaskFilter::new().with_category(Some("Work".to_string())).category.as_deref(),
            Some("Work")
        );
    }
}
