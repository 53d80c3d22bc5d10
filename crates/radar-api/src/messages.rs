use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};

use radar_types::api::{Claims, Message, SendMessageRequest};

use crate::effects::{self, Action};
use crate::error::{ApiError, ApiResult};
use crate::extract::{ApiJson, ApiPath};
use crate::state::{AppState, blocking};
use crate::validate::Checks;

const PAGE_LIMIT: u32 = 100;

/// POST /messages. The sender is always the caller.
pub async fn send_message(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiJson(req): ApiJson<SendMessageRequest>,
) -> ApiResult<impl IntoResponse> {
    Checks::new().required("content", &req.content).finish()?;

    let receiver_id = req.receiver_id;
    if !blocking(&state, move |db| db.user_exists(receiver_id)).await? {
        return Err(ApiError::not_found("Receiver not found"));
    }

    let sender_id = claims.sub;
    let content = req.content;
    let message: Message = blocking(&state, move |db| {
        let id = db.insert_message(sender_id, receiver_id, &content)?;
        db.get_message(id)?
            .ok_or_else(|| anyhow::anyhow!("message {} vanished after insert", id))
    })
    .await?
    .into();

    if receiver_id != sender_id {
        effects::notify(
            &state,
            receiver_id,
            format!("New message from {}", claims.username),
        )
        .await;
    }
    effects::reward(&state, sender_id, Action::Message).await;

    Ok((StatusCode::CREATED, Json(message)))
}

/// GET /messages/inbox
pub async fn inbox(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<Json<Vec<Message>>> {
    let rows = blocking(&state, move |db| db.inbox(claims.sub, PAGE_LIMIT)).await?;
    Ok(Json(rows.into_iter().map(Into::into).collect()))
}

/// GET /messages/sent
pub async fn sent(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<Json<Vec<Message>>> {
    let rows = blocking(&state, move |db| db.sent(claims.sub, PAGE_LIMIT)).await?;
    Ok(Json(rows.into_iter().map(Into::into).collect()))
}

/// GET /messages/conversation/{user_id}, oldest first.
pub async fn conversation(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiPath(other_id): ApiPath<i64>,
) -> ApiResult<Json<Vec<Message>>> {
    let me = claims.sub;
    let rows = blocking(&state, move |db| db.conversation(me, other_id, PAGE_LIMIT)).await?;
    Ok(Json(rows.into_iter().map(Into::into).collect()))
}
