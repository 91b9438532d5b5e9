use chrono::Utc;
use diesel::prelude::*;
use diesel::PgConnection;
use uuid::Uuid;

use crate::models::{Member, NewMember, MEMBER_STATUS_ACTIVE, MEMBER_STATUS_INVITED};
use crate::schema::members;

/// Invites `email` into a workspace. If any member row exists for the pair,
/// whatever its status, it is reset to a fresh invitation (restore + clear
/// prior user linkage); otherwise a new invitation row is inserted. Row
/// identity is preserved so repeated invites stay idempotent.
pub fn invite_member(
    conn: &mut PgConnection,
    workspace_id: Uuid,
    email: &str,
    role: &str,
) -> QueryResult<Member> {
    let email = normalize_email(email);
    let now = Utc::now();

    let existing: Option<Member> = members::table
        .filter(members::workspace_id.eq(workspace_id))
        .filter(members::email.eq(&email))
        .order(members::created_at.asc())
        .first(conn)
        .optional()?;

    if let Some(member) = existing {
        diesel::update(members::table.find(member.id))
            .set((
                members::removed_at.eq(None::<chrono::DateTime<Utc>>),
                members::status.eq(MEMBER_STATUS_INVITED),
                members::user_id.eq(None::<Uuid>),
                members::role.eq(role),
                members::updated_at.eq(now),
            ))
            .execute(conn)?;
        return members::table.find(member.id).first(conn);
    }

    let invitation = NewMember {
        id: Uuid::new_v4(),
        workspace_id,
        user_id: None,
        email,
        role: role.to_string(),
        status: MEMBER_STATUS_INVITED.to_string(),
    };
    diesel::insert_into(members::table)
        .values(&invitation)
        .execute(conn)?;
    members::table.find(invitation.id).first(conn)
}

/// Links every unclaimed invitation matching `email` to the signed-in user.
/// Runs at signup and at every login; claiming updates rows in place and
/// never inserts, so a second pass finds nothing left to claim.
pub fn claim_pending_invitations(
    conn: &mut PgConnection,
    user_id: Uuid,
    email: &str,
) -> QueryResult<usize> {
    let email = normalize_email(email);
    let claimed = diesel::update(
        members::table
            .filter(members::email.eq(&email))
            .filter(members::user_id.is_null())
            .filter(members::removed_at.is_null()),
    )
    .set((
        members::user_id.eq(user_id),
        members::status.eq(MEMBER_STATUS_ACTIVE),
        members::updated_at.eq(Utc::now()),
    ))
    .execute(conn)?;

    if claimed > 0 {
        tracing::info!(%user_id, claimed, "claimed pending workspace invitations");
    }
    Ok(claimed)
}

/// Loads the caller's unclaimed invitation rows.
pub fn pending_invitations(conn: &mut PgConnection, email: &str) -> QueryResult<Vec<Member>> {
    members::table
        .filter(members::email.eq(normalize_email(email)))
        .filter(members::user_id.is_null())
        .filter(members::removed_at.is_null())
        .order(members::created_at.asc())
        .load(conn)
}

/// Accepts one invitation by id. Returns `Ok(None)` when the row does not
/// belong to the caller's email; accepting a row already claimed by the
/// same user is a no-op that still reports the row.
pub fn accept_invitation(
    conn: &mut PgConnection,
    invitation_id: Uuid,
    user_id: Uuid,
    email: &str,
) -> QueryResult<Option<Member>> {
    let email = normalize_email(email);
    let invitation: Option<Member> = members::table
        .find(invitation_id)
        .first(conn)
        .optional()?;

    let Some(invitation) = invitation else {
        return Ok(None);
    };
    if invitation.email != email || invitation.is_removed() {
        return Ok(None);
    }
    if invitation.user_id == Some(user_id) {
        return Ok(Some(invitation));
    }
    if invitation.user_id.is_some() {
        return Ok(None);
    }

    diesel::update(members::table.find(invitation.id))
        .set((
            members::user_id.eq(user_id),
            members::status.eq(MEMBER_STATUS_ACTIVE),
            members::updated_at.eq(Utc::now()),
        ))
        .execute(conn)?;
    members::table.find(invitation.id).first(conn).map(Some)
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
