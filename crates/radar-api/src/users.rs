use axum::{Extension, Json, extract::State};

use radar_db::models::ProfileUpdate;
use radar_types::api::{
    Claims, SetAvatarRequest, UpdateProfileRequest, Updated, UserProfile,
};

use crate::error::{ApiError, ApiResult};
use crate::extract::{ApiJson, ApiPath};
use crate::state::{AppState, blocking};
use crate::validate::Checks;

/// GET /users
pub async fn list_users(State(state): State<AppState>) -> ApiResult<Json<Vec<UserProfile>>> {
    let rows = blocking(&state, |db| db.list_users()).await?;
    Ok(Json(rows.into_iter().map(Into::into).collect()))
}

/// GET /users/{id}
pub async fn get_user(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<Json<UserProfile>> {
    let row = blocking(&state, move |db| db.get_user(id))
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;
    Ok(Json(row.into()))
}

/// POST /users: update the caller's own profile. Omitted fields are kept.
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiJson(req): ApiJson<UpdateProfileRequest>,
) -> ApiResult<Json<Updated>> {
    if let Some(name) = &req.name {
        Checks::new().required("name", name).finish()?;
    }

    let user_id = claims.sub;
    let updated = blocking(&state, move |db| {
        let name = req.name.as_deref().map(str::trim);
        db.update_profile(
            user_id,
            &ProfileUpdate {
                name,
                email: req.email.as_deref(),
                bio: req.bio.as_deref(),
                social: req.social.as_deref(),
                custom_html: req.custom_html.as_deref(),
            },
        )
    })
    .await?;

    Ok(Json(Updated { updated }))
}

/// POST /users/avatar: point the avatar at one of the caller's media, or clear it.
pub async fn set_avatar(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiJson(req): ApiJson<SetAvatarRequest>,
) -> ApiResult<Json<Updated>> {
    if let Some(media_id) = req.media_id {
        let media = blocking(&state, move |db| db.get_media(media_id))
            .await?
            .ok_or_else(|| ApiError::not_found("Media not found"))?;
        if media.user_id != Some(claims.sub) {
            return Err(ApiError::forbidden("Media belongs to another user"));
        }
    }

    let user_id = claims.sub;
    let media_id = req.media_id;
    let updated = blocking(&state, move |db| db.set_avatar(user_id, media_id)).await?;
    Ok(Json(Updated { updated }))
}
