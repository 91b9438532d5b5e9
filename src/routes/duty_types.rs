use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::AuthenticatedUser;
use crate::error::{AppError, AppResult};
use crate::models::{DutyType, NewDutyType};
use crate::schema::duty_types;
use crate::state::AppState;

use super::workspaces::{require_editor, require_member};

#[derive(Deserialize)]
pub struct CreateDutyTypeRequest {
    pub name: String,
    pub color: String,
}

#[derive(Deserialize)]
pub struct UpdateDutyTypeRequest {
    pub name: Option<String>,
    pub color: Option<String>,
}

#[derive(Serialize)]
pub struct DutyTypeResponse {
    pub id: Uuid,
    pub workspace_id: Uuid,
    pub name: String,
    pub color: String,
}

fn to_response(duty_type: DutyType) -> DutyTypeResponse {
    DutyTypeResponse {
        id: duty_type.id,
        workspace_id: duty_type.workspace_id,
        name: duty_type.name,
        color: duty_type.color,
    }
}

fn validate_color(color: &str) -> AppResult<String> {
    let color = color.trim();
    let valid = color.len() == 7
        && color.starts_with('#')
        && color[1..].chars().all(|c| c.is_ascii_hexdigit());
    if !valid {
        return Err(AppError::bad_request("color must look like #RRGGBB"));
    }
    Ok(color.to_uppercase())
}

pub async fn list_duty_types(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(workspace_id): Path<Uuid>,
) -> AppResult<Json<Vec<DutyTypeResponse>>> {
    let mut conn = state.db()?;
    require_member(&mut conn, workspace_id, user.user_id)?;

    let rows: Vec<DutyType> = duty_types::table
        .filter(duty_types::workspace_id.eq(workspace_id))
        .filter(duty_types::deleted_at.is_null())
        .order(duty_types::name.asc())
        .load(&mut conn)?;

    Ok(Json(rows.into_iter().map(to_response).collect()))
}

pub async fn create_duty_type(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(workspace_id): Path<Uuid>,
    Json(payload): Json<CreateDutyTypeRequest>,
) -> AppResult<(StatusCode, Json<DutyTypeResponse>)> {
    let name = payload.name.trim().to_string();
    if name.is_empty() {
        return Err(AppError::bad_request("name must not be empty"));
    }
    let color = validate_color(&payload.color)?;

    let mut conn = state.db()?;
    let caller = require_member(&mut conn, workspace_id, user.user_id)?;
    require_editor(&caller)?;

    // An active row with the name always collides, even when a soft-deleted
    // row with the same name also exists (renames can leave both behind).
    let active: Option<DutyType> = duty_types::table
        .filter(duty_types::workspace_id.eq(workspace_id))
        .filter(duty_types::name.eq(&name))
        .filter(duty_types::deleted_at.is_null())
        .first(&mut conn)
        .optional()?;
    if active.is_some() {
        return Err(AppError::conflict("duty type already exists"));
    }

    // Re-adding a deleted name reactivates the original row instead of
    // minting a second id, keeping old schedule references intact.
    let deleted: Option<DutyType> = duty_types::table
        .filter(duty_types::workspace_id.eq(workspace_id))
        .filter(duty_types::name.eq(&name))
        .filter(duty_types::deleted_at.is_not_null())
        .order(duty_types::created_at.asc())
        .first(&mut conn)
        .optional()?;

    if let Some(duty_type) = deleted {
        diesel::update(duty_types::table.find(duty_type.id))
            .set((
                duty_types::deleted_at.eq(None::<chrono::DateTime<Utc>>),
                duty_types::color.eq(&color),
            ))
            .execute(&mut conn)?;
        let reactivated: DutyType = duty_types::table.find(duty_type.id).first(&mut conn)?;
        return Ok((StatusCode::OK, Json(to_response(reactivated))));
    }

    let new_duty_type = NewDutyType {
        id: Uuid::new_v4(),
        workspace_id,
        name,
        color,
    };
    diesel::insert_into(duty_types::table)
        .values(&new_duty_type)
        .execute(&mut conn)?;

    let inserted: DutyType = duty_types::table.find(new_duty_type.id).first(&mut conn)?;
    Ok((StatusCode::CREATED, Json(to_response(inserted))))
}

pub async fn update_duty_type(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path((workspace_id, duty_type_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<UpdateDutyTypeRequest>,
) -> AppResult<Json<DutyTypeResponse>> {
    let mut conn = state.db()?;
    let caller = require_member(&mut conn, workspace_id, user.user_id)?;
    require_editor(&caller)?;

    let existing: DutyType = duty_types::table
        .filter(duty_types::id.eq(duty_type_id))
        .filter(duty_types::workspace_id.eq(workspace_id))
        .filter(duty_types::deleted_at.is_null())
        .first(&mut conn)
        .optional()?
        .ok_or_else(AppError::not_found)?;

    let name = match payload.name {
        Some(raw) => {
            let trimmed = raw.trim().to_string();
            if trimmed.is_empty() {
                return Err(AppError::bad_request("name must not be empty"));
            }
            if trimmed != existing.name {
                let duplicate: Option<DutyType> = duty_types::table
                    .filter(duty_types::workspace_id.eq(workspace_id))
                    .filter(duty_types::name.eq(&trimmed))
                    .filter(duty_types::deleted_at.is_null())
                    .filter(duty_types::id.ne(duty_type_id))
                    .first(&mut conn)
                    .optional()?;
                if duplicate.is_some() {
                    return Err(AppError::conflict("duty type already exists"));
                }
            }
            trimmed
        }
        None => existing.name.clone(),
    };

    let color = match payload.color {
        Some(raw) => validate_color(&raw)?,
        None => existing.color.clone(),
    };

    diesel::update(duty_types::table.find(duty_type_id))
        .set((duty_types::name.eq(&name), duty_types::color.eq(&color)))
        .execute(&mut conn)?;

    let updated: DutyType = duty_types::table.find(duty_type_id).first(&mut conn)?;
    Ok(Json(to_response(updated)))
}

pub async fn delete_duty_type(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path((workspace_id, duty_type_id)): Path<(Uuid, Uuid)>,
) -> AppResult<StatusCode> {
    let mut conn = state.db()?;
    let caller = require_member(&mut conn, workspace_id, user.user_id)?;
    require_editor(&caller)?;

    let affected = diesel::update(
        duty_types::table
            .filter(duty_types::id.eq(duty_type_id))
            .filter(duty_types::workspace_id.eq(workspace_id))
            .filter(duty_types::deleted_at.is_null()),
    )
    .set(duty_types::deleted_at.eq(Some(Utc::now())))
    .execute(&mut conn)?;

    if affected == 0 {
        return Err(AppError::not_found());
    }

    Ok(StatusCode::NO_CONTENT)
}
