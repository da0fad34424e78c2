//! Task Store
//!
//! The authoritative task collection plus its query engine. Storage and the
//! current time are injected, so the store holds no hidden global state.
//!
//! Every mutation runs under one write lock: the clock is read once, the
//! change is applied to a copy, the copy is persisted, and only then does it
//! replace the live collection. A rejected or failed operation leaves the
//! store exactly as it was.

use chrono::{DateTime, Duration, Utc};
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};

use crate::error::Result;
use crate::filter::{FilterExt, TaskFilter};
use crate::stats::Stats;
use crate::task::{Task, TaskCollection, TaskDraft, TaskView};

/// Source of the current time
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to
#[derive(Debug)]
pub struct FixedClock {
    instant: Mutex<DateTime<Utc>>,
}

impl FixedClock {
    pub fn new(instant: DateTime<Utc>) -> Self {
        Self {
            instant: Mutex::new(instant),
        }
    }

    pub fn advance(&self, by: Duration) {
        *self.instant.lock() += by;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.instant.lock()
    }
}

/// Persistence seam for the store
pub trait TaskBackend: Send + Sync {
    /// Load the full collection
    fn load(&self) -> Result<TaskCollection>;

    /// Persist the full collection
    fn save(&self, collection: &TaskCollection) -> Result<()>;
}

/// Backend that keeps nothing beyond the store's own memory
#[derive(Debug, Default)]
pub struct MemoryBackend {
    initial: TaskCollection,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing collection
    pub fn with_collection(initial: TaskCollection) -> Self {
        Self { initial }
    }
}

impl TaskBackend for MemoryBackend {
    fn load(&self) -> Result<TaskCollection> {
        Ok(self.initial.clone())
    }

    fn save(&self, _collection: &TaskCollection) -> Result<()> {
        Ok(())
    }
}

/// Result of [`TaskStore::query`]
#[derive(Debug, Clone, Serialize)]
pub struct QueryResult {
    /// Filtered, searched and sorted tasks
    pub items: Vec<Task>,
    /// Counts over the unfiltered collection
    pub stats: Stats,
    /// Distinct categories over the unfiltered collection
    pub categories: Vec<String>,
    /// The instant the query was evaluated at
    pub as_of: DateTime<Utc>,
}

impl QueryResult {
    /// Items with derived state, evaluated at the same instant as the query
    pub fn views(&self) -> Vec<TaskView> {
        self.items
            .iter()
            .map(|task| TaskView::new(task, self.as_of))
            .collect()
    }
}

/// Authoritative task collection
pub struct TaskStore {
    tasks: RwLock<TaskCollection>,
    backend: Box<dyn TaskBackend>,
    clock: Arc<dyn Clock>,
}

impl TaskStore {
    /// Load the collection from `backend` and wrap it in a store
    pub fn open(backend: impl TaskBackend + 'static, clock: Arc<dyn Clock>) -> Result<Self> {
        let tasks = backend.load()?;
        debug!(count = tasks.len(), "task store opened");
        Ok(Self {
            tasks: RwLock::new(tasks),
            backend: Box::new(backend),
            clock,
        })
    }

    /// In-memory store, mostly for tests
    pub fn in_memory(clock: Arc<dyn Clock>) -> Self {
        Self {
            tasks: RwLock::new(TaskCollection::new()),
            backend: Box::new(MemoryBackend::new()),
            clock,
        }
    }

    /// Current time according to the injected clock
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn create(&self, draft: &TaskDraft) -> Result<Task> {
        let task = self.mutate(|tasks, now| tasks.create(draft, now))?;
        info!(id = task.id, title = %task.title, "task created");
        Ok(task)
    }

    pub fn update(&self, id: u32, draft: &TaskDraft) -> Result<Task> {
        let task = self.mutate(|tasks, now| tasks.update(id, draft, now))?;
        info!(id, "task updated");
        Ok(task)
    }

    pub fn delete(&self, id: u32) -> Result<Task> {
        let task = self.mutate(|tasks, _| tasks.remove(id))?;
        info!(id, "task deleted");
        Ok(task)
    }

    pub fn toggle(&self, id: u32) -> Result<Task> {
        let task = self.mutate(|tasks, now| tasks.toggle(id, now))?;
        info!(id, completed = task.completed, "task toggled");
        Ok(task)
    }

    /// Remove every completed task, returns how many were removed
    pub fn delete_all_completed(&self) -> Result<usize> {
        let removed = self.mutate(|tasks, _| Ok(tasks.remove_completed()))?;
        info!(removed, "completed tasks deleted");
        Ok(removed)
    }

    pub fn get(&self, id: u32) -> Result<Task> {
        self.tasks.read().get_or_err(id).cloned()
    }

    /// A single task with its derived state
    pub fn view(&self, id: u32) -> Result<TaskView> {
        let now = self.clock.now();
        let tasks = self.tasks.read();
        Ok(TaskView::new(tasks.get_or_err(id)?, now))
    }

    /// Filter, search and sort the collection; stats ignore the filter
    pub fn query(&self, filter: &TaskFilter) -> Result<QueryResult> {
        let now = self.clock.now();
        let tasks = self.tasks.read();

        let items: Vec<Task> = tasks.get_filtered(filter, now).into_iter().cloned().collect();
        debug!(matched = items.len(), total = tasks.len(), ?filter, "task query");

        Ok(QueryResult {
            items,
            stats: Stats::collect(tasks.iter(), now),
            categories: tasks.categories(),
            as_of: now,
        })
    }

    /// Distinct categories currently in use
    pub fn categories(&self) -> Vec<String> {
        self.tasks.read().categories()
    }

    /// Summary counts over the whole collection
    pub fn stats(&self) -> Stats {
        let now = self.clock.now();
        Stats::collect(self.tasks.read().iter(), now)
    }

    fn mutate<T>(
        &self,
        op: impl FnOnce(&mut TaskCollection, DateTime<Utc>) -> Result<T>,
    ) -> Result<T> {
        let mut live = self.tasks.write();
        let now = self.clock.now();

        let mut next = live.clone();
        let value = op(&mut next, now)?;
        self.backend.save(&next)?;

        *live = next;
        Ok(value)
    }
}
