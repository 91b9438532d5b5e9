use std::collections::{HashMap, HashSet};

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::NaiveDate;
use diesel::{prelude::*, PgConnection};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::AuthenticatedUser;
use crate::calendar::{self, MonthCursor};
use crate::error::{AppError, AppResult};
use crate::models::{DutyType, Member, NewSchedule, Profile, Schedule};
use crate::schema::{duty_types, members, profiles, schedules};
use crate::state::AppState;

use super::workspaces::{require_editor, require_member};

#[derive(Deserialize)]
pub struct MonthQuery {
    pub year: i32,
    pub month: u32,
}

impl MonthQuery {
    pub fn cursor(&self) -> AppResult<MonthCursor> {
        MonthCursor::new(self.year, self.month)
            .ok_or_else(|| AppError::bad_request("month must be between 1 and 12"))
    }
}

#[derive(Deserialize)]
pub struct ReconcileDayRequest {
    /// Draft mapping for the day: duty type id to the member covering it.
    pub assignments: HashMap<Uuid, Uuid>,
}

#[derive(Serialize, Clone)]
pub struct DutyTypeRef {
    pub id: Uuid,
    pub name: String,
    pub color: String,
}

#[derive(Serialize, Clone)]
pub struct MemberRef {
    pub id: Uuid,
    pub email: String,
    pub display_name: String,
    pub removed: bool,
}

#[derive(Serialize, Clone)]
pub struct ScheduleDetail {
    pub id: Uuid,
    pub date: NaiveDate,
    pub member_id: Uuid,
    pub duty_type_id: Uuid,
    /// Joined display data; None when the referenced row no longer exists.
    pub duty_type: Option<DutyTypeRef>,
    pub member: Option<MemberRef>,
}

#[derive(Serialize)]
pub struct DayScheduleResponse {
    pub date: NaiveDate,
    pub schedules: Vec<ScheduleDetail>,
}

#[derive(Serialize)]
pub struct ClearedResponse {
    pub deleted: usize,
}

pub async fn list_schedules(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(workspace_id): Path<Uuid>,
    Query(query): Query<MonthQuery>,
) -> AppResult<Json<Vec<ScheduleDetail>>> {
    let cursor = query.cursor()?;
    let mut conn = state.db()?;
    require_member(&mut conn, workspace_id, user.user_id)?;

    let details = load_schedule_details(
        &mut conn,
        workspace_id,
        cursor.first_day(),
        cursor.last_day(),
    )?;
    Ok(Json(details))
}

/// Reconciles one day's draft against the stored rows: update where the
/// member changed, insert new pairs, delete pairs the draft dropped. The
/// whole diff runs in one transaction and the response carries the
/// authoritative post-write rows for the date, so callers never need a
/// follow-up reload.
pub async fn reconcile_day(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path((workspace_id, date)): Path<(Uuid, NaiveDate)>,
    Json(payload): Json<ReconcileDayRequest>,
) -> AppResult<Json<DayScheduleResponse>> {
    let mut conn = state.db()?;
    let caller = require_member(&mut conn, workspace_id, user.user_id)?;
    require_editor(&caller)?;

    let draft = payload.assignments;

    // One member per day across duty types, mirroring what the day editor
    // enforces.
    let mut seen_members = HashSet::new();
    for member_id in draft.values() {
        if !seen_members.insert(*member_id) {
            return Err(AppError::bad_request(
                "a member cannot cover two duty types on the same day",
            ));
        }
    }

    let active_duty_types: HashSet<Uuid> = duty_types::table
        .filter(duty_types::workspace_id.eq(workspace_id))
        .filter(duty_types::deleted_at.is_null())
        .select(duty_types::id)
        .load::<Uuid>(&mut conn)?
        .into_iter()
        .collect();
    if let Some(unknown) = draft.keys().find(|id| !active_duty_types.contains(id)) {
        return Err(AppError::bad_request(format!(
            "unknown or deleted duty type {unknown}"
        )));
    }

    let active_members: HashSet<Uuid> = members::table
        .filter(members::workspace_id.eq(workspace_id))
        .filter(members::removed_at.is_null())
        .select(members::id)
        .load::<Uuid>(&mut conn)?
        .into_iter()
        .collect();
    if let Some(unknown) = draft.values().find(|id| !active_members.contains(id)) {
        return Err(AppError::bad_request(format!(
            "unknown or removed member {unknown}"
        )));
    }

    conn.transaction::<(), AppError, _>(|conn| {
        let existing: Vec<Schedule> = schedules::table
            .filter(schedules::workspace_id.eq(workspace_id))
            .filter(schedules::date.eq(date))
            .load(conn)?;
        let prior: HashMap<Uuid, &Schedule> =
            existing.iter().map(|row| (row.duty_type_id, row)).collect();

        for (&duty_type_id, &member_id) in &draft {
            match prior.get(&duty_type_id) {
                Some(row) if row.member_id == member_id => {}
                Some(row) => {
                    diesel::update(schedules::table.find(row.id))
                        .set(schedules::member_id.eq(member_id))
                        .execute(conn)?;
                }
                None => {
                    let new_row = NewSchedule {
                        id: Uuid::new_v4(),
                        workspace_id,
                        date,
                        member_id,
                        duty_type_id,
                    };
                    diesel::insert_into(schedules::table)
                        .values(&new_row)
                        .execute(conn)?;
                }
            }
        }

        for row in &existing {
            if !draft.contains_key(&row.duty_type_id) {
                diesel::delete(schedules::table.find(row.id)).execute(conn)?;
            }
        }

        Ok(())
    })?;

    let schedules = load_schedule_details(&mut conn, workspace_id, date, date)?;
    Ok(Json(DayScheduleResponse { date, schedules }))
}

pub async fn clear_day(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path((workspace_id, date)): Path<(Uuid, NaiveDate)>,
) -> AppResult<Json<ClearedResponse>> {
    let mut conn = state.db()?;
    let caller = require_member(&mut conn, workspace_id, user.user_id)?;
    require_editor(&caller)?;

    let deleted = diesel::delete(
        schedules::table
            .filter(schedules::workspace_id.eq(workspace_id))
            .filter(schedules::date.eq(date)),
    )
    .execute(&mut conn)?;

    Ok(Json(ClearedResponse { deleted }))
}

pub async fn clear_month(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(workspace_id): Path<Uuid>,
    Query(query): Query<MonthQuery>,
) -> AppResult<Json<ClearedResponse>> {
    let cursor = query.cursor()?;
    let mut conn = state.db()?;
    let caller = require_member(&mut conn, workspace_id, user.user_id)?;
    require_editor(&caller)?;

    let deleted = diesel::delete(
        schedules::table
            .filter(schedules::workspace_id.eq(workspace_id))
            .filter(schedules::date.between(cursor.first_day(), cursor.last_day())),
    )
    .execute(&mut conn)?;

    Ok(Json(ClearedResponse { deleted }))
}

/// Loads schedule rows for a date window with their display joins. The join
/// data is fetched in a second pass and attached leniently: a row whose duty
/// type was soft-deleted or whose member was removed still comes back, with
/// the reference resolved from the historical row.
pub fn load_schedule_details(
    conn: &mut PgConnection,
    workspace_id: Uuid,
    from: NaiveDate,
    to: NaiveDate,
) -> AppResult<Vec<ScheduleDetail>> {
    let rows: Vec<Schedule> = schedules::table
        .filter(schedules::workspace_id.eq(workspace_id))
        .filter(schedules::date.between(from, to))
        .order((schedules::date.asc(), schedules::created_at.asc()))
        .load(conn)?;

    let duty_type_ids: Vec<Uuid> = rows.iter().map(|r| r.duty_type_id).collect();
    let member_ids: Vec<Uuid> = rows.iter().map(|r| r.member_id).collect();

    let duty_type_map: HashMap<Uuid, DutyType> = duty_types::table
        .filter(duty_types::id.eq_any(&duty_type_ids))
        .load::<DutyType>(conn)?
        .into_iter()
        .map(|dt| (dt.id, dt))
        .collect();

    let member_map: HashMap<Uuid, (Member, Option<Profile>)> = members::table
        .left_join(profiles::table)
        .filter(members::id.eq_any(&member_ids))
        .load::<(Member, Option<Profile>)>(conn)?
        .into_iter()
        .map(|(member, profile)| (member.id, (member, profile)))
        .collect();

    let details = rows
        .into_iter()
        .map(|row| {
            let duty_type = duty_type_map.get(&row.duty_type_id).map(|dt| DutyTypeRef {
                id: dt.id,
                name: dt.name.clone(),
                color: dt.color.clone(),
            });
            let member = member_map.get(&row.member_id).map(|(member, profile)| {
                let display_name = calendar::display_name(
                    profile.as_ref().and_then(|p| p.first_name.as_deref()),
                    profile.as_ref().and_then(|p| p.nickname.as_deref()),
                    Some(member.email.as_str()),
                    profile.as_ref().and_then(|p| p.year_level.as_deref()),
                );
                MemberRef {
                    id: member.id,
                    email: member.email.clone(),
                    display_name,
                    removed: member.is_removed(),
                }
            });
            ScheduleDetail {
                id: row.id,
                date: row.date,
                member_id: row.member_id,
                duty_type_id: row.duty_type_id,
                duty_type,
                member,
            }
        })
        .collect();

    Ok(details)
}
