//! Week ranges and weekly completion statistics

use chrono::{NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use super::model::Task;

/// Date format used for task dates and range bounds
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Completion counts over a date range
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeklyStats {
    pub completed: u64,
    pub pending: u64,
    pub total: u64,
}

impl WeeklyStats {
    /// Build from the two disjoint counts; `total` is always their sum
    pub fn new(completed: u64, pending: u64) -> Self {
        Self {
            completed,
            pending,
            total: completed + pending,
        }
    }

    /// Count completed and pending tasks
    pub fn tally<'a>(tasks: impl IntoIterator<Item = &'a Task>) -> Self {
        let (completed, pending) = tasks.into_iter().fold((0, 0), |(done, open), task| {
            if task.completed {
                (done + 1, open)
            } else {
                (done, open + 1)
            }
        });
        Self::new(completed, pending)
    }

    /// Fraction of tasks completed, 0 when there are none
    pub fn completion_ratio(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.completed as f64 / self.total as f64
        }
    }
}

/// A Sunday-to-Saturday week
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeekRange {
    first: NaiveDate,
    last: NaiveDate,
}

impl WeekRange {
    /// The week that contains `date`
    pub fn containing(date: NaiveDate) -> Self {
        let week = date.week(Weekday::Sun);
        Self {
            first: week.first_day(),
            last: week.last_day(),
        }
    }

    /// Parse a `YYYY-MM-DD` string and return its week
    pub fn containing_str(date: &str) -> Option<Self> {
        NaiveDate::parse_from_str(date, DATE_FORMAT)
            .ok()
            .map(Self::containing)
    }

    /// Inclusive lower bound as an ISO date string
    pub fn start(&self) -> String {
        self.first.format(DATE_FORMAT).to_string()
    }

    /// Inclusive upper bound as an ISO date string
    pub fn end(&self) -> String {
        self.last.format(DATE_FORMAT).to_string()
    }

    /// The seven days of the week, Sunday first
    pub fn days(&self) -> Vec<String> {
        self.first
            .iter_days()
            .take(7)
            .map(|day| day.format(DATE_FORMAT).to_string())
            .collect()
    }
}
