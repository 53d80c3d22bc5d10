use axum::{Json, extract::State};

use radar_types::api::{AwardedBadge, Badge, GamificationSummary, LeaderboardEntry, Level};
use radar_types::models::ProfileKind;

use crate::error::{ApiError, ApiResult};
use crate::extract::ApiPath;
use crate::state::{AppState, blocking};

const LEADERBOARD_SIZE: u32 = 10;

/// GET /gamification/levels
pub async fn levels(State(state): State<AppState>) -> ApiResult<Json<Vec<Level>>> {
    let rows = blocking(&state, |db| db.levels()).await?;
    Ok(Json(rows.into_iter().map(Into::into).collect()))
}

/// GET /gamification/badges
pub async fn badges(State(state): State<AppState>) -> ApiResult<Json<Vec<Badge>>> {
    let rows = blocking(&state, |db| db.badges()).await?;
    Ok(Json(rows.into_iter().map(Into::into).collect()))
}

/// GET /gamification/users/{id}: points, current level per kind and badges.
pub async fn user_summary(
    State(state): State<AppState>,
    ApiPath(user_id): ApiPath<i64>,
) -> ApiResult<Json<GamificationSummary>> {
    let (user, levels, badges) = blocking(&state, move |db| {
        let Some(user) = db.get_user(user_id)? else {
            return Ok(None);
        };
        Ok(Some((user, db.levels()?, db.badges_for_user(user_id)?)))
    })
    .await?
    .ok_or_else(|| ApiError::not_found("User not found"))?;

    let current = |kind: ProfileKind, name: Option<&str>| -> Option<Level> {
        let name = name?;
        levels
            .iter()
            .find(|l| l.kind == kind.as_str() && l.name == name)
            .cloned()
            .map(Level::from)
    };

    Ok(Json(GamificationSummary {
        user_id: user.id,
        is_artist: user.is_artist,
        fan_points: user.fan_points,
        artist_points: user.artist_points,
        fan_level: current(ProfileKind::Fan, user.fan_level.as_deref()),
        artist_level: current(ProfileKind::Artist, user.artist_level.as_deref()),
        badges: badges.into_iter().map(AwardedBadge::from).collect(),
    }))
}

/// GET /leaderboard/fans
pub async fn top_fans(State(state): State<AppState>) -> ApiResult<Json<Vec<LeaderboardEntry>>> {
    leaderboard(&state, ProfileKind::Fan).await
}

/// GET /leaderboard/artists
pub async fn top_artists(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<LeaderboardEntry>>> {
    leaderboard(&state, ProfileKind::Artist).await
}

async fn leaderboard(state: &AppState, kind: ProfileKind) -> ApiResult<Json<Vec<LeaderboardEntry>>> {
    let rows = blocking(state, move |db| db.leaderboard(kind, LEADERBOARD_SIZE)).await?;
    Ok(Json(rows.into_iter().map(Into::into).collect()))
}
