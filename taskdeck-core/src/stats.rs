//! Aggregate counts over the whole task collection

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::task::{Priority, Task};

/// Summary counts, always computed over the unfiltered collection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    pub total: usize,
    pub completed: usize,
    pub active: usize,
    pub overdue: usize,
    /// Active tasks with High priority
    pub high_priority: usize,
}

impl Stats {
    /// Count tasks as of `now`
    pub fn collect<'a>(tasks: impl IntoIterator<Item = &'a Task>, now: DateTime<Utc>) -> Self {
        tasks.into_iter().fold(Self::default(), |mut stats, task| {
            stats.total += 1;
            if task.completed {
                stats.completed += 1;
            } else {
                stats.active += 1;
                if task.priority == Priority::High {
                    stats.high_priority += 1;
                }
            }
            if task.is_overdue(now) {
                stats.overdue += 1;
            }
            stats
        })
    }
}
