use axum::{Extension, Json, extract::State};

use radar_types::api::{Claims, Feed};

use crate::error::ApiResult;
use crate::state::{AppState, blocking};

/// Items per section.
const FEED_LIMIT: u32 = 50;

/// GET /feed: recent activity from everyone the caller follows.
pub async fn feed(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<Json<Feed>> {
    let viewer = claims.sub;
    let feed = blocking(&state, move |db| {
        Ok(Feed {
            posts: into_api(db.feed_posts(viewer, FEED_LIMIT)?),
            media: into_api(db.feed_media(viewer, FEED_LIMIT)?),
            shows: into_api(db.feed_shows(viewer, FEED_LIMIT)?),
            merch: into_api(db.feed_merch(viewer, FEED_LIMIT)?),
        })
    })
    .await?;
    Ok(Json(feed))
}

fn into_api<R, T: From<R>>(rows: Vec<R>) -> Vec<T> {
    rows.into_iter().map(T::from).collect()
}
