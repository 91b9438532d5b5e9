mod common;

use anyhow::Result;
use axum::http::StatusCode;
use common::{acquire_db_lock, body_to_vec, TestApp};
use serde_json::{json, Value};

const FAKE_BASE: &str = "https://fake-avatars.test/";

async fn patch_profile(app: &TestApp, token: &str, body: &Value) -> Result<Value> {
    let response = app.patch_json("/api/profile", body, Some(token)).await?;
    assert_eq!(response.status(), StatusCode::OK);
    Ok(serde_json::from_slice(&body_to_vec(response.into_body()).await?)?)
}

#[tokio::test]
async fn patch_distinguishes_set_clear_and_omitted_fields() -> Result<()> {
    let _lock = acquire_db_lock().await;
    let app = TestApp::new().await?;
    let token = app.signup_token("anya@example.com", "hunter2hunter2").await?;

    let profile = patch_profile(
        &app,
        &token,
        &json!({ "first_name": "Anya", "nickname": "An", "phone": "081-555-0101" }),
    )
    .await?;
    assert_eq!(profile["first_name"], "Anya");
    assert_eq!(profile["nickname"], "An");
    assert_eq!(profile["phone"], "081-555-0101");

    // Null clears, absent keys stay untouched.
    let profile = patch_profile(
        &app,
        &token,
        &json!({ "nickname": null, "title": "Dr." }),
    )
    .await?;
    assert_eq!(profile["first_name"], "Anya");
    assert_eq!(profile["nickname"], Value::Null);
    assert_eq!(profile["title"], "Dr.");
    assert_eq!(profile["phone"], "081-555-0101");

    // A bare or whitespace string clears like null.
    let profile = patch_profile(&app, &token, &json!({ "phone": "  " })).await?;
    assert_eq!(profile["phone"], Value::Null);

    // Non-string values are rejected before any write.
    let refused = app
        .patch_json("/api/profile", &json!({ "first_name": 42 }), Some(&token))
        .await?;
    assert_eq!(refused.status(), StatusCode::BAD_REQUEST);
    let me = app.get("/api/profile", Some(&token)).await?;
    let profile: Value = serde_json::from_slice(&body_to_vec(me.into_body()).await?)?;
    assert_eq!(profile["first_name"], "Anya");

    app.cleanup().await?;
    Ok(())
}

#[tokio::test]
async fn avatar_upload_replaces_the_previous_object() -> Result<()> {
    let _lock = acquire_db_lock().await;
    let app = TestApp::new().await?;
    let token = app.signup_token("pic@example.com", "hunter2hunter2").await?;
    let storage = app.storage();

    let response = app
        .upload_avatar("first.png", "image/png", b"png-bytes-one", &token)
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    let profile: Value = serde_json::from_slice(&body_to_vec(response.into_body()).await?)?;
    let first_url = profile["avatar_url"].as_str().expect("avatar url").to_string();
    assert!(first_url.starts_with(FAKE_BASE));
    assert!(first_url.ends_with(".png"));
    assert_eq!(storage.object_count().await, 1);

    let response = app
        .upload_avatar("second.jpg", "image/jpeg", b"jpeg-bytes-two", &token)
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    let profile: Value = serde_json::from_slice(&body_to_vec(response.into_body()).await?)?;
    let second_url = profile["avatar_url"].as_str().expect("avatar url").to_string();
    assert_ne!(second_url, first_url);

    // The old object is deleted, only the replacement remains in the bucket.
    assert_eq!(storage.object_count().await, 1);
    let first_key = first_url.strip_prefix(FAKE_BASE).unwrap();
    let second_key = second_url.strip_prefix(FAKE_BASE).unwrap();
    assert!(storage.get(first_key).await.is_none());
    let stored = storage.get(second_key).await.expect("replacement object");
    assert_eq!(stored.bytes, b"jpeg-bytes-two");
    assert_eq!(stored.content_type.as_deref(), Some("image/jpeg"));

    app.cleanup().await?;
    Ok(())
}

#[tokio::test]
async fn avatar_upload_rejects_non_images() -> Result<()> {
    let _lock = acquire_db_lock().await;
    let app = TestApp::new().await?;
    let token = app.signup_token("txt@example.com", "hunter2hunter2").await?;

    let response = app
        .upload_avatar("notes.txt", "text/plain", b"not an image", &token)
        .await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(app.storage().object_count().await, 0);

    let me = app.get("/api/profile", Some(&token)).await?;
    let profile: Value = serde_json::from_slice(&body_to_vec(me.into_body()).await?)?;
    assert_eq!(profile["avatar_url"], Value::Null);

    app.cleanup().await?;
    Ok(())
}
