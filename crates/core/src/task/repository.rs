//! Task repository trait
//!
//! Defines the interface for task storage operations. Lookups of an unknown
//! id are not errors: `get` and `update` return `None`, `delete` returns
//! `false`. `Err` is reserved for infrastructure failures.

use async_trait::async_trait;

use super::model::{NewTask, Task, TaskPatch};
use super::stats::WeeklyStats;
use crate::Result;

/// Repository interface for task CRUD operations
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Short backend name, used in logs and the health endpoint
    fn backend(&self) -> &'static str;

    /// Get all tasks, or only those on `date` when given
    async fn list(&self, date: Option<&str>) -> Result<Vec<Task>>;

    /// Get a task by ID
    async fn get(&self, id: &str) -> Result<Option<Task>>;

    /// Create a new task with a freshly generated ID
    async fn create(&self, input: NewTask) -> Result<Task>;

    /// Merge the supplied fields into an existing task
    async fn update(&self, id: &str, patch: TaskPatch) -> Result<Option<Task>>;

    /// Delete a task by ID, returning whether it existed
    async fn delete(&self, id: &str) -> Result<bool>;

    /// Completion counts for tasks dated within `[start_date, end_date]`
    async fn weekly_stats(&self, start_date: &str, end_date: &str) -> Result<WeeklyStats>;
}

/// Ordering shared by every backend: by date, then start time
pub(crate) fn sort_tasks(tasks: &mut [Task]) {
    tasks.sort_by(|a, b| {
        a.date
            .cmp(&b.date)
            .then_with(|| a.start_time.cmp(&b.start_time))
            .then_with(|| a.id.cmp(&b.id))
    });
}
