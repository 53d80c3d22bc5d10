use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};

use radar_types::api::{Claims, CreateShowRequest, Created, Deleted, Show};

use crate::error::{ApiError, ApiResult};
use crate::extract::{ApiJson, ApiPath};
use crate::state::{AppState, blocking};
use crate::validate::{Checks, escape_html, non_empty, valid_show_date};

/// GET /shows, soonest first.
pub async fn list_shows(State(state): State<AppState>) -> ApiResult<Json<Vec<Show>>> {
    let rows = blocking(&state, |db| db.list_shows()).await?;
    Ok(Json(rows.into_iter().map(Into::into).collect()))
}

/// GET /shows/user/{id}
pub async fn shows_for_artist(
    State(state): State<AppState>,
    ApiPath(artist_id): ApiPath<i64>,
) -> ApiResult<Json<Vec<Show>>> {
    let rows = blocking(&state, move |db| db.shows_for_artist(artist_id)).await?;
    Ok(Json(rows.into_iter().map(Into::into).collect()))
}

/// POST /shows (artists only)
pub async fn create_show(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiJson(req): ApiJson<CreateShowRequest>,
) -> ApiResult<impl IntoResponse> {
    if !claims.is_artist {
        return Err(ApiError::forbidden("Only artists can create shows"));
    }

    let mut checks = Checks::new();
    checks.required("venue", &req.venue).required("date", &req.date);
    if !req.date.trim().is_empty() {
        checks.check(
            valid_show_date(&req.date),
            "date",
            "must be YYYY-MM-DD, YYYY-MM-DDTHH:MM or RFC 3339",
        );
    }
    checks.finish()?;

    let venue = escape_html(req.venue.trim());
    let date = req.date.trim().to_owned();
    let description = non_empty(req.description).map(|d| escape_html(&d));
    let artist_id = claims.sub;

    let id = blocking(&state, move |db| {
        db.insert_show(artist_id, &venue, &date, description.as_deref())
    })
    .await?;

    Ok((StatusCode::CREATED, Json(Created { id })))
}

/// DELETE /shows/{id} (owner only)
pub async fn delete_show(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<Json<Deleted>> {
    let show = blocking(&state, move |db| db.get_show(id))
        .await?
        .ok_or_else(|| ApiError::not_found("Show not found"))?;
    if show.artist_id != claims.sub {
        return Err(ApiError::forbidden("Not your show"));
    }

    let deleted = blocking(&state, move |db| db.delete_show(id)).await?;
    Ok(Json(Deleted { deleted }))
}
