//! Task model definitions

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// A dated, timed to-do item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub title: String,
    pub description: String,
    /// ISO `YYYY-MM-DD`, compared as a plain string
    pub date: String,
    /// `HH:MM`, 24-hour
    pub start_time: String,
    pub end_time: String,
    pub completed: bool,
}

impl Task {
    /// Build a task from creation input, filling defaults for omitted fields
    pub fn from_new(id: impl Into<String>, input: NewTask) -> Self {
        Self {
            id: id.into(),
            title: input.title,
            description: input.description.unwrap_or_default(),
            date: input.date,
            start_time: input.start_time,
            end_time: input.end_time,
            completed: input.completed.unwrap_or(false),
        }
    }

    /// Overwrite the fields supplied in `patch`, leaving the rest untouched.
    /// The id is never part of a patch.
    pub fn apply(&mut self, patch: TaskPatch) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(date) = patch.date {
            self.date = date;
        }
        if let Some(start_time) = patch.start_time {
            self.start_time = start_time;
        }
        if let Some(end_time) = patch.end_time {
            self.end_time = end_time;
        }
        if let Some(completed) = patch.completed {
            self.completed = completed;
        }
    }

    /// Case-insensitive match of `query` against title or description.
    /// Surrounding whitespace is part of the query.
    pub fn matches_query(&self, query: &str) -> bool {
        let query = query.to_lowercase();
        if query.is_empty() {
            return true;
        }
        self.title.to_lowercase().contains(&query)
            || self.description.to_lowercase().contains(&query)
    }

    /// Whether the task's date lies in `[start, end]`
    pub fn falls_within(&self, start: &str, end: &str) -> bool {
        self.date.as_str() >= start && self.date.as_str() <= end
    }
}

/// Input for creating a task
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTask {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub date: String,
    pub start_time: String,
    pub end_time: String,
    #[serde(default)]
    pub completed: Option<bool>,
}

impl NewTask {
    pub fn new(
        title: impl Into<String>,
        date: impl Into<String>,
        start_time: impl Into<String>,
        end_time: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            description: None,
            date: date.into(),
            start_time: start_time.into(),
            end_time: end_time.into(),
            completed: None,
        }
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the completion flag
    pub fn with_completed(mut self, completed: bool) -> Self {
        self.completed = Some(completed);
        self
    }

    pub fn validate(&self) -> Result<()> {
        validate_title(&self.title)
    }
}

/// Merge-patch input: only the supplied fields are overwritten
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
}

impl TaskPatch {
    /// A patch that only toggles completion
    pub fn completed(completed: bool) -> Self {
        Self {
            completed: Some(completed),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    pub fn validate(&self) -> Result<()> {
        match &self.title {
            Some(title) => validate_title(title),
            None => Ok(()),
        }
    }
}

fn validate_title(title: &str) -> Result<()> {
    if title.trim().is_empty() {
        return Err(Error::InvalidInput("Title cannot be empty".to_string()));
    }
    Ok(())
}
