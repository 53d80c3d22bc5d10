use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::Deserialize;

use radar_db::models::ReactionChange;
use radar_types::api::{
    BoardPost, Claims, Comment, CreateCommentRequest, CreatePostRequest, Deleted,
    ReactionRemoved, ReactionResponse, UpdatePostRequest,
};
use radar_types::models::Reaction;

use crate::effects::{self, Action};
use crate::error::{ApiError, ApiResult};
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::state::{AppState, blocking};
use crate::validate::{Checks, non_empty};

#[derive(Debug, Deserialize)]
pub struct TrendingQuery {
    pub limit: Option<u32>,
}

const TRENDING_DEFAULT: u32 = 10;
const TRENDING_MAX: u32 = 100;

fn post_not_found() -> ApiError {
    ApiError::not_found("Post not found")
}

/// Author of post `id`, or 404.
async fn require_post(state: &AppState, id: i64) -> ApiResult<i64> {
    blocking(state, move |db| db.post_author(id))
        .await?
        .ok_or_else(post_not_found)
}

async fn load_post(state: &AppState, id: i64) -> ApiResult<BoardPost> {
    let row = blocking(state, move |db| db.get_post(id))
        .await?
        .ok_or_else(post_not_found)?;
    Ok(row.into())
}

// ── Posts ───────────────────────────────────────────────────────────────

/// GET /board
pub async fn list_posts(State(state): State<AppState>) -> ApiResult<Json<Vec<BoardPost>>> {
    let rows = blocking(&state, |db| db.list_posts()).await?;
    Ok(Json(rows.into_iter().map(Into::into).collect()))
}

/// GET /board/trending?limit=
pub async fn trending(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<TrendingQuery>,
) -> ApiResult<Json<Vec<BoardPost>>> {
    let limit = query.limit.unwrap_or(TRENDING_DEFAULT).clamp(1, TRENDING_MAX);
    let rows = blocking(&state, move |db| db.trending_posts(limit)).await?;
    Ok(Json(rows.into_iter().map(Into::into).collect()))
}

/// GET /board/user/{id}
pub async fn posts_for_user(
    State(state): State<AppState>,
    ApiPath(user_id): ApiPath<i64>,
) -> ApiResult<Json<Vec<BoardPost>>> {
    let rows = blocking(&state, move |db| db.posts_for_user(user_id)).await?;
    Ok(Json(rows.into_iter().map(Into::into).collect()))
}

/// GET /board/{id}
pub async fn get_post(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<Json<BoardPost>> {
    Ok(Json(load_post(&state, id).await?))
}

/// POST /board
pub async fn create_post(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiJson(req): ApiJson<CreatePostRequest>,
) -> ApiResult<impl IntoResponse> {
    Checks::new().required("content", &req.content).finish()?;

    let user_id = claims.sub;
    let headline = non_empty(req.headline);
    let content = req.content.trim().to_owned();
    let id = blocking(&state, move |db| {
        db.insert_post(user_id, headline.as_deref(), &content)
    })
    .await?;

    effects::reward(&state, user_id, Action::Post).await;

    Ok((StatusCode::CREATED, Json(load_post(&state, id).await?)))
}

/// PUT /board/{id} (author only)
pub async fn update_post(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(req): ApiJson<UpdatePostRequest>,
) -> ApiResult<Json<BoardPost>> {
    if let Some(content) = &req.content {
        Checks::new().required("content", content).finish()?;
    }

    let author = require_post(&state, id).await?;
    if author != claims.sub {
        return Err(ApiError::forbidden("Only the author can edit this post"));
    }

    let headline = req.headline.map(|h| h.trim().to_owned());
    let content = req.content.map(|c| c.trim().to_owned());
    blocking(&state, move |db| {
        db.update_post(id, headline.as_deref(), content.as_deref())
    })
    .await?;

    Ok(Json(load_post(&state, id).await?))
}

/// DELETE /board/{id} (author only). Reactions and comments go with it.
pub async fn delete_post(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<Json<Deleted>> {
    let author = require_post(&state, id).await?;
    if author != claims.sub {
        return Err(ApiError::forbidden("Only the author can delete this post"));
    }

    let deleted = blocking(&state, move |db| db.delete_post(id)).await?;
    Ok(Json(Deleted { deleted }))
}

// ── Reactions ───────────────────────────────────────────────────────────

/// POST /board/{id}/like
pub async fn like(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<Json<ReactionResponse>> {
    react(&state, &claims, id, Reaction::Like).await
}

/// POST /board/{id}/dislike
pub async fn dislike(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<Json<ReactionResponse>> {
    react(&state, &claims, id, Reaction::Dislike).await
}

async fn react(
    state: &AppState,
    claims: &Claims,
    post_id: i64,
    reaction: Reaction,
) -> ApiResult<Json<ReactionResponse>> {
    let author = require_post(state, post_id).await?;

    let user_id = claims.sub;
    let (change, post) = blocking(state, move |db| {
        let change = db.set_reaction(post_id, user_id, reaction)?;
        let post = db
            .get_post(post_id)?
            .ok_or_else(|| anyhow::anyhow!("post {} vanished while reacting", post_id))?;
        Ok((change, post))
    })
    .await?;

    if reaction == Reaction::Like
        && change != ReactionChange::Unchanged
        && effects::first_time(state, user_id, Action::Like, post_id).await
    {
        if author != user_id {
            effects::notify(state, author, format!("{} liked your post", claims.username)).await;
        }
        effects::reward(state, user_id, Action::Like).await;
    }

    Ok(Json(ReactionResponse {
        success: true,
        reaction: reaction.value(),
        likes: post.likes,
        dislikes: post.dislikes,
    }))
}

/// DELETE /board/{id}/reaction
pub async fn remove_reaction(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<Json<ReactionRemoved>> {
    require_post(&state, id).await?;
    let user_id = claims.sub;
    let removed = blocking(&state, move |db| db.clear_reaction(id, user_id)).await?;
    Ok(Json(ReactionRemoved { removed }))
}

// ── Comments ────────────────────────────────────────────────────────────

/// GET /board/{id}/comments, oldest first.
pub async fn list_comments(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<Json<Vec<Comment>>> {
    require_post(&state, id).await?;
    let rows = blocking(&state, move |db| db.list_comments(id)).await?;
    Ok(Json(rows.into_iter().map(Into::into).collect()))
}

/// POST /board/{id}/comments
pub async fn add_comment(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(req): ApiJson<CreateCommentRequest>,
) -> ApiResult<impl IntoResponse> {
    Checks::new().required("content", &req.content).finish()?;
    let author = require_post(&state, id).await?;

    let user_id = claims.sub;
    let content = req.content.trim().to_owned();
    let comment: Comment = blocking(&state, move |db| {
        let comment_id = db.insert_comment(id, user_id, &content)?;
        db.get_comment(comment_id)?
            .ok_or_else(|| anyhow::anyhow!("comment {} vanished after insert", comment_id))
    })
    .await?
    .into();

    if author != user_id {
        effects::notify(
            &state,
            author,
            format!("{} commented on your post", claims.username),
        )
        .await;
    }
    effects::reward(&state, user_id, Action::Comment).await;

    Ok((StatusCode::CREATED, Json(comment)))
}
