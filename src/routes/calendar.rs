use std::collections::HashMap;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Serialize;
use uuid::Uuid;

use crate::auth::AuthenticatedUser;
use crate::calendar::{self, UNNAMED};
use crate::error::AppResult;
use crate::holidays;
use crate::state::AppState;

use super::schedules::{load_schedule_details, MonthQuery, ScheduleDetail};
use super::workspaces::require_member;

#[derive(Serialize)]
pub struct DayCell {
    pub date: String,
    pub holiday: Option<&'static str>,
    pub schedules: Vec<ScheduleDetail>,
}

#[derive(Serialize)]
pub struct DutySummaryEntry {
    pub member_id: Uuid,
    pub display_name: String,
    pub count: i64,
}

#[derive(Serialize)]
pub struct MonthViewResponse {
    pub year: i32,
    pub month: u32,
    /// Empty cells before day 1 in a Sunday-first week grid.
    pub leading_blanks: u32,
    pub days: Vec<DayCell>,
    pub summary: Vec<DutySummaryEntry>,
    /// Whether the caller may edit day cells (owner or editor role).
    pub editable: bool,
}

/// Derived month view: the grid, rows grouped per day, holiday labels and
/// the per-member duty tally, assembled from one schedule load.
pub async fn month_view(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(workspace_id): Path<Uuid>,
    Query(query): Query<MonthQuery>,
) -> AppResult<Json<MonthViewResponse>> {
    let cursor = query.cursor()?;
    let mut conn = state.db()?;
    let caller = require_member(&mut conn, workspace_id, user.user_id)?;

    let details = load_schedule_details(
        &mut conn,
        workspace_id,
        cursor.first_day(),
        cursor.last_day(),
    )?;

    let mut by_date: HashMap<String, Vec<ScheduleDetail>> = HashMap::new();
    let mut display_names: HashMap<Uuid, String> = HashMap::new();
    for detail in &details {
        if let Some(member) = &detail.member {
            display_names.insert(detail.member_id, member.display_name.clone());
        }
        by_date
            .entry(detail.date.format("%Y-%m-%d").to_string())
            .or_default()
            .push(detail.clone());
    }

    let days = cursor
        .days()
        .into_iter()
        .map(|day| {
            let key = day.format("%Y-%m-%d").to_string();
            let schedules = by_date.remove(&key).unwrap_or_default();
            DayCell {
                date: key,
                holiday: holidays::holiday_name(day),
                schedules,
            }
        })
        .collect();

    let summary = calendar::fold_duty_counts(details.iter().map(|d| d.member_id))
        .into_iter()
        .map(|(member_id, count)| DutySummaryEntry {
            member_id,
            display_name: display_names
                .get(&member_id)
                .cloned()
                .unwrap_or_else(|| UNNAMED.to_string()),
            count,
        })
        .collect();

    Ok(Json(MonthViewResponse {
        year: cursor.year,
        month: cursor.month,
        leading_blanks: cursor.leading_blanks(),
        days,
        summary,
        editable: caller.can_edit_schedule(),
    }))
}
