mod common;

use anyhow::Result;
use axum::http::StatusCode;
use common::{acquire_db_lock, body_to_vec, TestApp};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

#[derive(Deserialize)]
struct MemberResponse {
    id: Uuid,
    user_id: Option<Uuid>,
    email: String,
    role: String,
    status: String,
}

async fn setup_workspace(app: &TestApp, owner_email: &str) -> Result<(String, Uuid)> {
    let token = app.signup_token(owner_email, "hunter2hunter2").await?;
    let response = app
        .post_json("/api/workspaces", &json!({ "name": "Clinic A" }), Some(&token))
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_to_vec(response.into_body()).await?;
    let parsed: serde_json::Value = serde_json::from_slice(&body)?;
    let workspace_id: Uuid = serde_json::from_value(parsed["id"].clone())?;
    Ok((token, workspace_id))
}

async fn list_members(app: &TestApp, token: &str, workspace_id: Uuid) -> Result<Vec<MemberResponse>> {
    let response = app
        .get(&format!("/api/workspaces/{workspace_id}/members"), Some(token))
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_to_vec(response.into_body()).await?;
    Ok(serde_json::from_slice(&body)?)
}

async fn invite(app: &TestApp, token: &str, workspace_id: Uuid, email: &str) -> Result<MemberResponse> {
    let response = app
        .post_json(
            &format!("/api/workspaces/{workspace_id}/members"),
            &json!({ "email": email }),
            Some(token),
        )
        .await?;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_to_vec(response.into_body()).await?;
    Ok(serde_json::from_slice(&body)?)
}

#[tokio::test]
async fn signup_claims_a_pending_invitation_exactly_once() -> Result<()> {
    let _lock = acquire_db_lock().await;
    let app = TestApp::new().await?;
    let (owner, workspace_id) = setup_workspace(&app, "owner@example.com").await?;

    let invitation = invite(&app, &owner, workspace_id, "doc@example.com").await?;
    assert_eq!(invitation.status, "invited");
    assert_eq!(invitation.role, "viewer");
    assert_eq!(invitation.user_id, None);

    // Signing up with the invited email links the invitation in place.
    app.signup_token("doc@example.com", "hunter2hunter2").await?;
    let members = list_members(&app, &owner, workspace_id).await?;
    assert_eq!(members.len(), 2);
    let doc = members
        .iter()
        .find(|m| m.email == "doc@example.com")
        .expect("claimed member");
    assert_eq!(doc.id, invitation.id);
    assert_eq!(doc.status, "active");
    assert!(doc.user_id.is_some());

    // A second claim pass (every login runs one) must not mint another row.
    app.login_token("doc@example.com", "hunter2hunter2").await?;
    let members = list_members(&app, &owner, workspace_id).await?;
    assert_eq!(
        members
            .iter()
            .filter(|m| m.email == "doc@example.com")
            .count(),
        1
    );

    app.cleanup().await?;
    Ok(())
}

#[tokio::test]
async fn existing_account_accepts_via_pending_invitations() -> Result<()> {
    let _lock = acquire_db_lock().await;
    let app = TestApp::new().await?;
    let (owner, workspace_id) = setup_workspace(&app, "owner@example.com").await?;

    // The account exists before the invitation, so no claim fired at signup.
    let late = app.signup_token("late@example.com", "hunter2hunter2").await?;
    invite(&app, &owner, workspace_id, "late@example.com").await?;

    let pending = app.get("/api/invitations/pending", Some(&late)).await?;
    assert_eq!(pending.status(), StatusCode::OK);
    let body = body_to_vec(pending.into_body()).await?;
    let invitations: Vec<serde_json::Value> = serde_json::from_slice(&body)?;
    assert_eq!(invitations.len(), 1);
    assert_eq!(invitations[0]["workspace_name"], "Clinic A");
    let invitation_id = invitations[0]["id"].as_str().unwrap().to_string();

    let accepted = app
        .post_json(
            &format!("/api/invitations/{invitation_id}/accept"),
            &json!({}),
            Some(&late),
        )
        .await?;
    assert_eq!(accepted.status(), StatusCode::OK);

    // Accepting again is a no-op, not a duplicate membership.
    let again = app
        .post_json(
            &format!("/api/invitations/{invitation_id}/accept"),
            &json!({}),
            Some(&late),
        )
        .await?;
    assert_eq!(again.status(), StatusCode::OK);

    let members = list_members(&app, &owner, workspace_id).await?;
    assert_eq!(
        members
            .iter()
            .filter(|m| m.email == "late@example.com")
            .count(),
        1
    );

    app.cleanup().await?;
    Ok(())
}

#[tokio::test]
async fn re_inviting_a_removed_member_restores_the_row() -> Result<()> {
    let _lock = acquire_db_lock().await;
    let app = TestApp::new().await?;
    let (owner, workspace_id) = setup_workspace(&app, "owner@example.com").await?;

    let invitation = invite(&app, &owner, workspace_id, "doc@example.com").await?;
    app.signup_token("doc@example.com", "hunter2hunter2").await?;

    let removed = app
        .delete(
            &format!("/api/workspaces/{workspace_id}/members/{}", invitation.id),
            Some(&owner),
        )
        .await?;
    assert_eq!(removed.status(), StatusCode::NO_CONTENT);
    let members = list_members(&app, &owner, workspace_id).await?;
    assert!(members.iter().all(|m| m.email != "doc@example.com"));

    // Re-invite resets the same row to a fresh, unclaimed invitation.
    let re_invited = invite(&app, &owner, workspace_id, "doc@example.com").await?;
    assert_eq!(re_invited.id, invitation.id);
    assert_eq!(re_invited.status, "invited");
    assert_eq!(re_invited.user_id, None);

    app.cleanup().await?;
    Ok(())
}

#[tokio::test]
async fn owners_cannot_remove_themselves_and_viewers_cannot_invite() -> Result<()> {
    let _lock = acquire_db_lock().await;
    let app = TestApp::new().await?;
    let (owner, workspace_id) = setup_workspace(&app, "owner@example.com").await?;

    let members = list_members(&app, &owner, workspace_id).await?;
    let owner_member = &members[0];
    let refused = app
        .delete(
            &format!("/api/workspaces/{workspace_id}/members/{}", owner_member.id),
            Some(&owner),
        )
        .await?;
    assert_eq!(refused.status(), StatusCode::BAD_REQUEST);

    invite(&app, &owner, workspace_id, "viewer@example.com").await?;
    let viewer = app
        .signup_token("viewer@example.com", "hunter2hunter2")
        .await?;
    let refused = app
        .post_json(
            &format!("/api/workspaces/{workspace_id}/members"),
            &json!({ "email": "friend@example.com" }),
            Some(&viewer),
        )
        .await?;
    assert_eq!(refused.status(), StatusCode::FORBIDDEN);

    app.cleanup().await?;
    Ok(())
}
