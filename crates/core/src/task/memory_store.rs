//! In-memory task storage implementation
//!
//! Tasks live in a process-local map and are lost on restart.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::model::{NewTask, Task, TaskPatch};
use super::repository::{sort_tasks, TaskRepository};
use super::stats::WeeklyStats;
use crate::Result;

/// Ephemeral task store keyed by task id
#[derive(Default)]
pub struct MemoryTaskStore {
    tasks: RwLock<HashMap<String, Task>>,
}

impl MemoryTaskStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TaskRepository for MemoryTaskStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn list(&self, date: Option<&str>) -> Result<Vec<Task>> {
        let tasks = self.tasks.read().await;
        let mut matching: Vec<Task> = tasks
            .values()
            .filter(|t| date.map_or(true, |d| t.date == d))
            .cloned()
            .collect();
        sort_tasks(&mut matching);
        Ok(matching)
    }

    async fn get(&self, id: &str) -> Result<Option<Task>> {
        let tasks = self.tasks.read().await;
        Ok(tasks.get(id).cloned())
    }

    async fn create(&self, input: NewTask) -> Result<Task> {
        let task = Task::from_new(Uuid::new_v4().to_string(), input);
        self.tasks
            .write()
            .await
            .insert(task.id.clone(), task.clone());
        tracing::debug!("Created task {}", task.id);
        Ok(task)
    }

    async fn update(&self, id: &str, patch: TaskPatch) -> Result<Option<Task>> {
        let mut tasks = self.tasks.write().await;
        let Some(task) = tasks.get_mut(id) else {
            return Ok(None);
        };
        task.apply(patch);
        Ok(Some(task.clone()))
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let removed = self.tasks.write().await.remove(id).is_some();
        if removed {
            tracing::debug!("Deleted task {}", id);
        }
        Ok(removed)
    }

    async fn weekly_stats(&self, start_date: &str, end_date: &str) -> Result<WeeklyStats> {
        let tasks = self.tasks.read().await;
        Ok(WeeklyStats::tally(
            tasks.values().filter(|t| t.falls_within(start_date, end_date)),
        ))
    }
}
