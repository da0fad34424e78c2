//! taskdeck core - pure domain logic for task tracking
//!
//! This crate contains no file or network I/O. Persistence is plugged in
//! through [`store::TaskBackend`] by the consuming crate.

pub mod date;
pub mod error;
pub mod filter;
pub mod stats;
pub mod store;
pub mod task;

pub use error::{CoreError, Result};
pub use filter::{StatusFilter, TaskFilter, TaskSort};
pub use stats::Stats;
pub use store::{Clock, FixedClock, MemoryBackend, QueryResult, SystemClock, TaskBackend, TaskStore};
pub use task::{Priority, Task, TaskCollection, TaskDraft, TaskView, DEFAULT_CATEGORY};
