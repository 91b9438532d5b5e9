use axum::{
    extract::{Multipart, State},
    Json,
};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use crate::auth::AuthenticatedUser;
use crate::error::{AppError, AppResult};
use crate::models::Profile;
use crate::schema::profiles;
use crate::state::AppState;
use crate::utils::json::{string_field, FieldPatch};

#[derive(Serialize)]
pub struct ProfileResponse {
    pub id: Uuid,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub nickname: Option<String>,
    pub title: Option<String>,
    pub year_level: Option<String>,
    pub phone: Option<String>,
    pub avatar_url: Option<String>,
    pub active_workspace_id: Option<Uuid>,
}

pub fn to_profile_response(profile: &Profile) -> ProfileResponse {
    ProfileResponse {
        id: profile.id,
        email: profile.email.clone(),
        first_name: profile.first_name.clone(),
        last_name: profile.last_name.clone(),
        nickname: profile.nickname.clone(),
        title: profile.title.clone(),
        year_level: profile.year_level.clone(),
        phone: profile.phone.clone(),
        avatar_url: profile.avatar_url.clone(),
        active_workspace_id: profile.active_workspace_id,
    }
}

#[derive(AsChangeset, Default)]
#[diesel(table_name = profiles)]
struct ProfilePatch {
    first_name: Option<Option<String>>,
    last_name: Option<Option<String>>,
    nickname: Option<Option<String>>,
    title: Option<Option<String>>,
    year_level: Option<Option<String>>,
    phone: Option<Option<String>>,
    avatar_url: Option<Option<String>>,
    updated_at: Option<DateTime<Utc>>,
}

impl ProfilePatch {
    fn is_empty(&self) -> bool {
        self.first_name.is_none()
            && self.last_name.is_none()
            && self.nickname.is_none()
            && self.title.is_none()
            && self.year_level.is_none()
            && self.phone.is_none()
            && self.avatar_url.is_none()
    }
}

pub async fn get_profile(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> AppResult<Json<ProfileResponse>> {
    let mut conn = state.db()?;
    let profile: Profile = profiles::table.find(user.user_id).first(&mut conn)?;
    Ok(Json(to_profile_response(&profile)))
}

pub async fn update_profile(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(body): Json<Value>,
) -> AppResult<Json<ProfileResponse>> {
    let mut patch = ProfilePatch::default();
    patch.first_name = read_field(&body, "first_name")?;
    patch.last_name = read_field(&body, "last_name")?;
    patch.nickname = read_field(&body, "nickname")?;
    patch.title = read_field(&body, "title")?;
    patch.year_level = read_field(&body, "year_level")?;
    patch.phone = read_field(&body, "phone")?;

    let mut conn = state.db()?;
    if patch.is_empty() {
        let profile: Profile = profiles::table.find(user.user_id).first(&mut conn)?;
        return Ok(Json(to_profile_response(&profile)));
    }

    patch.updated_at = Some(Utc::now());
    diesel::update(profiles::table.find(user.user_id))
        .set(&patch)
        .execute(&mut conn)?;

    let updated: Profile = profiles::table.find(user.user_id).first(&mut conn)?;
    Ok(Json(to_profile_response(&updated)))
}

/// Accepts a multipart `file` part, stores it in the avatar bucket under
/// `<user_id>/<uuid>.<ext>`, deletes the previously stored avatar object and
/// records the public URL on the profile.
pub async fn upload_avatar(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    mut multipart: Multipart,
) -> AppResult<Json<ProfileResponse>> {
    let mut upload: Option<(String, Option<String>, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| AppError::bad_request(format!("invalid multipart body: {err}")))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field.file_name().unwrap_or("avatar").to_string();
        let content_type = field.content_type().map(|ct| ct.to_string());
        let bytes = field
            .bytes()
            .await
            .map_err(|err| AppError::bad_request(format!("failed to read upload: {err}")))?;
        upload = Some((filename, content_type, bytes.to_vec()));
        break;
    }

    let (filename, content_type, bytes) =
        upload.ok_or_else(|| AppError::bad_request("missing file field"))?;
    if bytes.is_empty() {
        return Err(AppError::bad_request("uploaded file is empty"));
    }

    let content_type = content_type
        .or_else(|| mime_guess::from_path(&filename).first().map(|m| m.to_string()));
    if !content_type
        .as_deref()
        .is_some_and(|ct| ct.starts_with("image/"))
    {
        return Err(AppError::bad_request("avatar must be an image"));
    }

    let extension = filename
        .rsplit('.')
        .next()
        .filter(|ext| ext.len() <= 5 && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|ext| ext.to_ascii_lowercase())
        .unwrap_or_else(|| "png".to_string());

    let mut conn = state.db()?;
    let profile: Profile = profiles::table.find(user.user_id).first(&mut conn)?;

    // Drop the old object first so orphans never accumulate in the bucket.
    if let Some(old_key) = profile
        .avatar_url
        .as_deref()
        .and_then(|url| state.storage.key_for_url(url))
    {
        if let Err(err) = state.storage.delete_object(&old_key).await {
            tracing::warn!(%old_key, error = %err, "failed to delete previous avatar object");
        }
    }

    let key = format!("{}/{}.{}", user.user_id, Uuid::new_v4(), extension);
    state
        .storage
        .put_object(&key, bytes, content_type)
        .await?;
    let avatar_url = state.storage.object_url(&key);

    diesel::update(profiles::table.find(user.user_id))
        .set((
            profiles::avatar_url.eq(Some(avatar_url)),
            profiles::updated_at.eq(Utc::now()),
        ))
        .execute(&mut conn)?;

    let updated: Profile = profiles::table.find(user.user_id).first(&mut conn)?;
    Ok(Json(to_profile_response(&updated)))
}

fn read_field(body: &Value, key: &str) -> AppResult<Option<Option<String>>> {
    match string_field(body, key).map_err(AppError::bad_request)? {
        FieldPatch::Missing => Ok(None),
        FieldPatch::Clear => Ok(Some(None)),
        FieldPatch::Set(value) => {
            let trimmed = value.trim();
            if trimmed.is_empty() {
                Ok(Some(None))
            } else {
                Ok(Some(Some(trimmed.to_string())))
            }
        }
    }
}
