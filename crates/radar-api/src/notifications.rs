use axum::{Extension, Json, extract::State};

use radar_types::api::{Claims, Notification, UnreadCount, Updated};

use crate::error::ApiResult;
use crate::extract::ApiPath;
use crate::state::{AppState, blocking};

pub async fn list(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<Json<Vec<Notification>>> {
    let rows = blocking(&state, move |db| db.notifications_for(claims.sub)).await?;
    Ok(Json(rows.into_iter().map(Into::into).collect()))
}

pub async fn unread_count(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<Json<UnreadCount>> {
    let count = blocking(&state, move |db| db.unread_count(claims.sub)).await?;
    Ok(Json(UnreadCount { count }))
}

/// Only touches the caller's own notification; anything else reports 0.
pub async fn mark_read(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<Json<Updated>> {
    let user_id = claims.sub;
    let updated = blocking(&state, move |db| db.mark_notification_read(id, user_id)).await?;
    Ok(Json(Updated { updated }))
}

pub async fn mark_all_read(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<Json<Updated>> {
    let updated = blocking(&state, move |db| db.mark_all_notifications_read(claims.sub)).await?;
    Ok(Json(Updated { updated }))
}
