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
use crate::calendar;
use crate::error::{AppError, AppResult};
use crate::invitations;
use crate::models::{
    Member, Profile, Workspace, MEMBER_STATUS_REMOVED, ROLE_EDITOR, ROLE_VIEWER,
};
use crate::schema::{members, profiles, workspaces};
use crate::state::AppState;

use super::workspaces::{require_member, require_owner};

#[derive(Deserialize)]
pub struct InviteMemberRequest {
    pub email: String,
    pub role: Option<String>,
}

#[derive(Serialize)]
pub struct MemberProfileInfo {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub nickname: Option<String>,
    pub year_level: Option<String>,
    pub avatar_url: Option<String>,
}

#[derive(Serialize)]
pub struct MemberResponse {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub email: String,
    pub role: String,
    pub status: String,
    pub display_name: String,
    pub profile: Option<MemberProfileInfo>,
}

#[derive(Serialize)]
pub struct PendingInvitation {
    pub id: Uuid,
    pub workspace_id: Uuid,
    pub workspace_name: String,
    pub email: String,
    pub role: String,
}

pub fn to_member_response(member: Member, profile: Option<Profile>) -> MemberResponse {
    let display_name = calendar::display_name(
        profile.as_ref().and_then(|p| p.first_name.as_deref()),
        profile.as_ref().and_then(|p| p.nickname.as_deref()),
        Some(member.email.as_str()),
        profile.as_ref().and_then(|p| p.year_level.as_deref()),
    );
    MemberResponse {
        id: member.id,
        user_id: member.user_id,
        email: member.email,
        role: member.role,
        status: member.status,
        display_name,
        profile: profile.map(|p| MemberProfileInfo {
            first_name: p.first_name,
            last_name: p.last_name,
            nickname: p.nickname,
            year_level: p.year_level,
            avatar_url: p.avatar_url,
        }),
    }
}

pub async fn list_members(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(workspace_id): Path<Uuid>,
) -> AppResult<Json<Vec<MemberResponse>>> {
    let mut conn = state.db()?;
    require_member(&mut conn, workspace_id, user.user_id)?;

    let rows: Vec<(Member, Option<Profile>)> = members::table
        .left_join(profiles::table)
        .filter(members::workspace_id.eq(workspace_id))
        .filter(members::removed_at.is_null())
        .load(&mut conn)?;

    let mut response: Vec<MemberResponse> = rows
        .into_iter()
        .map(|(member, profile)| to_member_response(member, profile))
        .collect();
    response.sort_by(|a, b| a.display_name.cmp(&b.display_name));

    Ok(Json(response))
}

pub async fn invite_member(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(workspace_id): Path<Uuid>,
    Json(payload): Json<InviteMemberRequest>,
) -> AppResult<(StatusCode, Json<MemberResponse>)> {
    let email = invitations::normalize_email(&payload.email);
    if email.is_empty() || !email.contains('@') {
        return Err(AppError::bad_request("a valid email address is required"));
    }
    let role = payload.role.unwrap_or_else(|| ROLE_VIEWER.to_string());
    if role != ROLE_VIEWER && role != ROLE_EDITOR {
        return Err(AppError::bad_request("role must be viewer or editor"));
    }

    let mut conn = state.db()?;
    let caller = require_member(&mut conn, workspace_id, user.user_id)?;
    require_owner(&caller)?;

    let invitation = invitations::invite_member(&mut conn, workspace_id, &email, &role)?;
    Ok((
        StatusCode::CREATED,
        Json(to_member_response(invitation, None)),
    ))
}

pub async fn remove_member(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path((workspace_id, member_id)): Path<(Uuid, Uuid)>,
) -> AppResult<StatusCode> {
    let mut conn = state.db()?;
    let caller = require_member(&mut conn, workspace_id, user.user_id)?;
    require_owner(&caller)?;

    if caller.id == member_id {
        return Err(AppError::bad_request("owners cannot remove themselves"));
    }

    let target: Member = members::table
        .filter(members::id.eq(member_id))
        .filter(members::workspace_id.eq(workspace_id))
        .first(&mut conn)
        .optional()?
        .ok_or_else(AppError::not_found)?;

    if target.is_removed() {
        return Ok(StatusCode::NO_CONTENT);
    }

    // Soft removal: historical schedule rows keep referencing the member.
    diesel::update(members::table.find(target.id))
        .set((
            members::removed_at.eq(Some(Utc::now())),
            members::status.eq(MEMBER_STATUS_REMOVED),
            members::updated_at.eq(Utc::now()),
        ))
        .execute(&mut conn)?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_pending_invitations(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> AppResult<Json<Vec<PendingInvitation>>> {
    let mut conn = state.db()?;
    let pending = invitations::pending_invitations(&mut conn, &user.email)?;

    let workspace_ids: Vec<Uuid> = pending.iter().map(|m| m.workspace_id).collect();
    let workspace_names: Vec<Workspace> = workspaces::table
        .filter(workspaces::id.eq_any(&workspace_ids))
        .load(&mut conn)?;

    let response = pending
        .into_iter()
        .map(|invitation| {
            let workspace_name = workspace_names
                .iter()
                .find(|w| w.id == invitation.workspace_id)
                .map(|w| w.name.clone())
                .unwrap_or_default();
            PendingInvitation {
                id: invitation.id,
                workspace_id: invitation.workspace_id,
                workspace_name,
                email: invitation.email,
                role: invitation.role,
            }
        })
        .collect();

    Ok(Json(response))
}

pub async fn accept_invitation(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(invitation_id): Path<Uuid>,
) -> AppResult<Json<MemberResponse>> {
    let mut conn = state.db()?;
    let accepted =
        invitations::accept_invitation(&mut conn, invitation_id, user.user_id, &user.email)?
            .ok_or_else(AppError::not_found)?;

    let profile: Option<Profile> = profiles::table
        .find(user.user_id)
        .first(&mut conn)
        .optional()?;
    Ok(Json(to_member_response(accepted, profile)))
}
