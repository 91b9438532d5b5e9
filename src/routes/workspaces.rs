use axum::{
    extract::{Path, State},
    Json,
};
use chrono::Utc;
use diesel::{prelude::*, PgConnection};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::AuthenticatedUser;
use crate::error::{AppError, AppResult};
use crate::models::{
    Member, NewMember, NewWorkspace, Profile, Workspace, MEMBER_STATUS_ACTIVE, ROLE_OWNER,
};
use crate::schema::{members, profiles, workspaces};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct CreateWorkspaceRequest {
    pub name: String,
}

#[derive(Deserialize)]
pub struct RenameWorkspaceRequest {
    pub name: String,
}

#[derive(Serialize)]
pub struct WorkspaceSummary {
    pub id: Uuid,
    pub name: String,
    pub role: String,
    pub member_id: Uuid,
}

#[derive(Serialize)]
pub struct WorkspaceListResponse {
    pub workspaces: Vec<WorkspaceSummary>,
    /// The workspace the caller last activated, when it is still among the
    /// memberships; else the first membership; null for a fresh account.
    pub active_workspace_id: Option<Uuid>,
}

#[derive(Serialize)]
pub struct ActivateResponse {
    pub active_workspace_id: Uuid,
}

pub async fn create_workspace(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(payload): Json<CreateWorkspaceRequest>,
) -> AppResult<Json<WorkspaceSummary>> {
    let name = payload.name.trim().to_string();
    if name.is_empty() {
        return Err(AppError::bad_request("workspace name must not be empty"));
    }

    let mut conn = state.db()?;
    let profile: Profile = profiles::table.find(user.user_id).first(&mut conn)?;

    let summary = conn.transaction::<WorkspaceSummary, AppError, _>(|conn| {
        let new_workspace = NewWorkspace {
            id: Uuid::new_v4(),
            name: name.clone(),
            created_by: user.user_id,
        };
        diesel::insert_into(workspaces::table)
            .values(&new_workspace)
            .execute(conn)?;

        let owner = NewMember {
            id: Uuid::new_v4(),
            workspace_id: new_workspace.id,
            user_id: Some(user.user_id),
            email: profile.email.clone(),
            role: ROLE_OWNER.to_string(),
            status: MEMBER_STATUS_ACTIVE.to_string(),
        };
        diesel::insert_into(members::table)
            .values(&owner)
            .execute(conn)?;

        // A freshly created workspace becomes the active one.
        diesel::update(profiles::table.find(user.user_id))
            .set((
                profiles::active_workspace_id.eq(Some(new_workspace.id)),
                profiles::updated_at.eq(Utc::now()),
            ))
            .execute(conn)?;

        Ok(WorkspaceSummary {
            id: new_workspace.id,
            name,
            role: ROLE_OWNER.to_string(),
            member_id: owner.id,
        })
    })?;

    Ok(Json(summary))
}

pub async fn list_workspaces(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> AppResult<Json<WorkspaceListResponse>> {
    let mut conn = state.db()?;

    let rows: Vec<(Member, Workspace)> = members::table
        .inner_join(workspaces::table)
        .filter(members::user_id.eq(user.user_id))
        .filter(members::removed_at.is_null())
        .order(members::created_at.asc())
        .load(&mut conn)?;

    let summaries: Vec<WorkspaceSummary> = rows
        .into_iter()
        .map(|(member, workspace)| WorkspaceSummary {
            id: workspace.id,
            name: workspace.name,
            role: member.role,
            member_id: member.id,
        })
        .collect();

    let stored: Option<Uuid> = profiles::table
        .find(user.user_id)
        .select(profiles::active_workspace_id)
        .first(&mut conn)?;

    let active_workspace_id = stored
        .filter(|id| summaries.iter().any(|w| w.id == *id))
        .or_else(|| summaries.first().map(|w| w.id));

    Ok(Json(WorkspaceListResponse {
        workspaces: summaries,
        active_workspace_id,
    }))
}

pub async fn activate_workspace(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(workspace_id): Path<Uuid>,
) -> AppResult<Json<ActivateResponse>> {
    let mut conn = state.db()?;

    let membership: Option<Member> = members::table
        .filter(members::workspace_id.eq(workspace_id))
        .filter(members::user_id.eq(user.user_id))
        .filter(members::removed_at.is_null())
        .first(&mut conn)
        .optional()?;

    if membership.is_none() {
        // Switching to an unknown workspace is a no-op; the stored active
        // workspace stays as it was.
        tracing::warn!(
            user_id = %user.user_id,
            %workspace_id,
            "refused to activate workspace without membership"
        );
        return Err(AppError::conflict("not a member of that workspace"));
    }

    diesel::update(profiles::table.find(user.user_id))
        .set((
            profiles::active_workspace_id.eq(Some(workspace_id)),
            profiles::updated_at.eq(Utc::now()),
        ))
        .execute(&mut conn)?;

    Ok(Json(ActivateResponse {
        active_workspace_id: workspace_id,
    }))
}

pub async fn rename_workspace(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(workspace_id): Path<Uuid>,
    Json(payload): Json<RenameWorkspaceRequest>,
) -> AppResult<Json<WorkspaceSummary>> {
    let name = payload.name.trim().to_string();
    if name.is_empty() {
        return Err(AppError::bad_request("workspace name must not be empty"));
    }

    let mut conn = state.db()?;
    let member = require_member(&mut conn, workspace_id, user.user_id)?;
    require_owner(&member)?;

    diesel::update(workspaces::table.find(workspace_id))
        .set((
            workspaces::name.eq(&name),
            workspaces::updated_at.eq(Utc::now()),
        ))
        .execute(&mut conn)?;

    Ok(Json(WorkspaceSummary {
        id: workspace_id,
        name,
        role: member.role,
        member_id: member.id,
    }))
}

/// Loads the caller's active membership in a workspace; 403 when absent.
/// Every workspace-scoped route goes through this.
pub fn require_member(
    conn: &mut PgConnection,
    workspace_id: Uuid,
    user_id: Uuid,
) -> AppResult<Member> {
    members::table
        .filter(members::workspace_id.eq(workspace_id))
        .filter(members::user_id.eq(user_id))
        .filter(members::removed_at.is_null())
        .first(conn)
        .optional()?
        .ok_or_else(|| AppError::forbidden("not a member of this workspace"))
}

pub fn require_owner(member: &Member) -> AppResult<()> {
    if member.role != ROLE_OWNER {
        return Err(AppError::forbidden("requires the owner role"));
    }
    Ok(())
}

pub fn require_editor(member: &Member) -> AppResult<()> {
    if !member.can_edit_schedule() {
        return Err(AppError::forbidden("requires the owner or editor role"));
    }
    Ok(())
}
