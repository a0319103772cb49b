//! Week overview endpoint
//!
//! Backs the weekly calendar strip: the Sunday-start week around a date,
//! the task count for each of its days, and the week's completion stats.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use chrono::Local;
use serde::{Deserialize, Serialize};

use dayplan_core::task::{WeekRange, WeeklyStats};

use super::task::{api_error, store_error, ApiError};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct WeekQuery {
    /// Any day of the week; defaults to today
    #[serde(default)]
    pub date: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DaySummary {
    pub date: String,
    pub task_count: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeekOverview {
    pub start_date: String,
    pub end_date: String,
    pub days: Vec<DaySummary>,
    pub stats: WeeklyStats,
    /// Share of the week's tasks that are done, 0.0 for an empty week
    pub completion_ratio: f64,
}

/// GET /api/week - Days and stats of the week containing `date`
async fn week_overview(
    State(state): State<AppState>,
    Query(query): Query<WeekQuery>,
) -> Result<Json<WeekOverview>, ApiError> {
    let week = match query.date.as_deref() {
        Some(date) => WeekRange::containing_str(date).ok_or_else(|| {
            api_error(
                StatusCode::BAD_REQUEST,
                format!("Invalid date {:?}, expected YYYY-MM-DD", date),
            )
        })?,
        None => WeekRange::containing(Local::now().date_naive()),
    };

    let (start_date, end_date) = (week.start(), week.end());
    let store = state.task_store();

    let mut days = Vec::with_capacity(7);
    for date in week.days() {
        let tasks = store
            .list(Some(&date))
            .await
            .map_err(|e| store_error("fetching week", e))?;
        days.push(DaySummary {
            date,
            task_count: tasks.len(),
        });
    }

    let stats = store
        .weekly_stats(&start_date, &end_date)
        .await
        .map_err(|e| store_error("fetching week stats", e))?;

    Ok(Json(WeekOverview {
        start_date,
        end_date,
        days,
        completion_ratio: stats.completion_ratio(),
        stats,
    }))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/api/week", get(week_overview))
}
