//! Profile actions: edit profile and delete account

use axum::extract::multipart::MultipartError;
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::response::Redirect;
use axum_extra::extract::CookieJar;

use super::ActionsApiState;
use super::types::{AvatarUpload, ProfileUpdate};
use crate::api::auth::Auth;
use crate::api::types::ApiError;
use crate::core::constants::{MAX_STATUS_LENGTH, MAX_USERNAME_LENGTH};
use crate::utils::avatar::resolve_image_mime;

const USERNAME_FIELD: &str = "username-input";
const STATUS_FIELD: &str = "user-status-select";
const AVATAR_FIELD: &str = "image-file-upload";

fn avatar_too_large(max_bytes: usize) -> ApiError {
    ApiError::bad_request(
        "AVATAR_TOO_LARGE",
        format!("Avatar must be at most {} KiB", max_bytes / 1024),
    )
}

fn multipart_error(e: MultipartError, max_bytes: usize) -> ApiError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return avatar_too_large(max_bytes);
    }
    ApiError::bad_request("MULTIPART_ERROR", e.body_text())
}

/// Read the profile form, stopping as soon as the avatar passes the cap
async fn read_profile_form(
    mut multipart: Multipart,
    max_bytes: usize,
) -> Result<ProfileUpdate, ApiError> {
    let mut update = ProfileUpdate::default();

    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, max_bytes))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            USERNAME_FIELD => {
                let text = field.text().await.map_err(|e| multipart_error(e, max_bytes))?;
                update.username = Some(text);
            }
            STATUS_FIELD => {
                let text = field.text().await.map_err(|e| multipart_error(e, max_bytes))?;
                update.status = Some(text);
            }
            AVATAR_FIELD => {
                let content_type = field.content_type().map(str::to_string);
                let file_name = field.file_name().map(str::to_string);

                let mut bytes = Vec::new();
                while let Some(chunk) = field
                    .chunk()
                    .await
                    .map_err(|e| multipart_error(e, max_bytes))?
                {
                    if bytes.len() + chunk.len() > max_bytes {
                        return Err(avatar_too_large(max_bytes));
                    }
                    bytes.extend_from_slice(&chunk);
                }

                // Browsers send an empty part when no file was chosen
                if !bytes.is_empty() {
                    update.avatar = Some(AvatarUpload {
                        bytes,
                        content_type,
                        file_name,
                    });
                }
            }
            other => tracing::debug!(field = other, "Ignoring unknown profile field"),
        }
    }

    Ok(update)
}

/// Update name (at the identity provider), status and avatar
#[utoipa::path(
    post,
    path = "/account-actions/update-profile",
    tag = "profile",
    request_body(
        content_type = "multipart/form-data",
        description = "`username-input`, `user-status-select` and an optional `image-file-upload` file"
    ),
    responses(
        (status = 303, description = "Redirect to the profile page"),
        (status = 400, description = "Field too long, avatar too large or not an image"),
        (status = 502, description = "Identity provider unavailable")
    )
)]
pub async fn update_profile(
    State(state): State<ActionsApiState>,
    auth: Auth,
    multipart: Multipart,
) -> Result<Redirect, ApiError> {
    let update = read_profile_form(multipart, state.avatar_max_bytes).await?;

    // Validate everything before changing anything
    let username = update
        .username
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty());
    if let Some(name) = username
        && name.chars().count() as u64 > MAX_USERNAME_LENGTH
    {
        return Err(ApiError::bad_request(
            "USERNAME_TOO_LONG",
            format!("Name must be at most {} characters", MAX_USERNAME_LENGTH),
        ));
    }

    let status = update.status.as_deref().map(str::trim);
    if let Some(status) = status
        && status.chars().count() as u64 > MAX_STATUS_LENGTH
    {
        return Err(ApiError::bad_request(
            "STATUS_TOO_LONG",
            format!("Status must be at most {} characters", MAX_STATUS_LENGTH),
        ));
    }

    let avatar = match &update.avatar {
        Some(upload) => {
            let mime = resolve_image_mime(
                &upload.bytes,
                upload.content_type.as_deref(),
                upload.file_name.as_deref(),
            )
            .ok_or_else(|| {
                ApiError::bad_request(
                    "INVALID_IMAGE",
                    "Avatar must be a PNG, JPEG, GIF, WebP or BMP image",
                )
            })?;
            Some((upload.bytes.as_slice(), mime))
        }
        None => None,
    };

    if let Some(name) = username {
        state
            .identity
            .update_username(auth.user_id(), name)
            .await
            .map_err(ApiError::from_identity)?;
    }

    let repo = state.database.repository();
    if let Some(status) = status {
        repo.set_status(auth.user_id(), Some(status).filter(|s| !s.is_empty()))
            .await
            .map_err(ApiError::from_data)?;
    }
    if let Some((bytes, mime)) = &avatar {
        repo.set_avatar(auth.user_id(), bytes, mime)
            .await
            .map_err(ApiError::from_data)?;
    }

    tracing::info!(
        user_id = %auth.user_id(),
        name_changed = username.is_some(),
        status_changed = status.is_some(),
        avatar_changed = avatar.is_some(),
        "Profile updated"
    );
    Ok(Redirect::to("/account/profile"))
}

/// Delete the account at the identity provider and locally
///
/// Projects where the user was the only developer are deleted with it.
#[utoipa::path(
    post,
    path = "/account-actions/delete-account",
    tag = "profile",
    responses(
        (status = 303, description = "Session cleared, redirect to the logged-out page"),
        (status = 502, description = "Identity provider unavailable")
    )
)]
pub async fn delete_account(
    State(state): State<ActionsApiState>,
    auth: Auth,
    jar: CookieJar,
) -> Result<(CookieJar, Redirect), ApiError> {
    match state.identity.delete_user(auth.user_id()).await {
        Ok(()) => {}
        Err(e) if e.is_not_found() => {
            tracing::debug!(user_id = %auth.user_id(), "Identity already deleted");
        }
        Err(e) => return Err(ApiError::from_identity(e)),
    }

    let deleted_projects = state
        .database
        .repository()
        .delete_user(auth.user_id())
        .await
        .map_err(ApiError::from_data)?;

    tracing::info!(user_id = %auth.user_id(), deleted_projects, "Account deleted");

    let jar = jar.remove(state.auth_manager.session_removal_cookie());
    Ok((jar, Redirect::to("/account/logged-out")))
}
