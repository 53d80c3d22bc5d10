use axum::{Extension, Json, extract::State};
use tracing::info;

use radar_types::api::{Claims, FollowResult, FollowStatus, FollowUser, UnfollowResult};

use crate::effects::{self, Action};
use crate::error::{ApiError, ApiResult};
use crate::extract::ApiPath;
use crate::state::{AppState, blocking};

async fn require_user(state: &AppState, id: i64) -> ApiResult<()> {
    if blocking(state, move |db| db.user_exists(id)).await? {
        Ok(())
    } else {
        Err(ApiError::not_found("User not found"))
    }
}

/// GET /follow/followers/{id}
pub async fn followers(
    State(state): State<AppState>,
    ApiPath(user_id): ApiPath<i64>,
) -> ApiResult<Json<Vec<FollowUser>>> {
    require_user(&state, user_id).await?;
    let rows = blocking(&state, move |db| db.followers(user_id)).await?;
    Ok(Json(rows.into_iter().map(Into::into).collect()))
}

/// GET /follow/following/{id}
pub async fn following(
    State(state): State<AppState>,
    ApiPath(user_id): ApiPath<i64>,
) -> ApiResult<Json<Vec<FollowUser>>> {
    require_user(&state, user_id).await?;
    let rows = blocking(&state, move |db| db.following(user_id)).await?;
    Ok(Json(rows.into_iter().map(Into::into).collect()))
}

/// GET /follow/{id}: does the caller follow `id`?
pub async fn status(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiPath(target): ApiPath<i64>,
) -> ApiResult<Json<FollowStatus>> {
    let me = claims.sub;
    let following = blocking(&state, move |db| db.is_following(me, target)).await?;
    Ok(Json(FollowStatus { following }))
}

/// POST /follow/{id}
pub async fn follow(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiPath(target): ApiPath<i64>,
) -> ApiResult<Json<FollowResult>> {
    let me = claims.sub;
    if target == me {
        return Err(ApiError::bad_request("Cannot follow yourself"));
    }
    require_user(&state, target).await?;

    let created = blocking(&state, move |db| db.follow(me, target)).await?;
    // Re-following after an unfollow creates a fresh edge but pays nothing.
    if created && effects::first_time(&state, me, Action::Follow, target).await {
        info!("{} followed user {}", claims.username, target);
        effects::notify(
            &state,
            target,
            format!("{} started following you", claims.username),
        )
        .await;
        effects::reward(&state, me, Action::Follow).await;
        effects::reward(&state, target, Action::Followed).await;
    }

    Ok(Json(FollowResult { followed: true }))
}

/// DELETE /follow/{id}
pub async fn unfollow(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiPath(target): ApiPath<i64>,
) -> ApiResult<Json<UnfollowResult>> {
    let me = claims.sub;
    let unfollowed = blocking(&state, move |db| db.unfollow(me, target)).await?;
    Ok(Json(UnfollowResult { unfollowed }))
}
