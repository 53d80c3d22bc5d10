use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware,
    routing::{delete, get, post, put},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::error::ApiError;
use crate::middleware::{require_auth, track_requests};
use crate::state::AppState;
use crate::{
    auth, board, feed, follows, gamification, media, merch, messages, metrics, notifications,
    shows, users,
};

/// Room for multipart boundaries and part headers on top of the file itself.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Build the full HTTP API.
pub fn build(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/health", get(metrics::health))
        .route("/metrics", get(metrics::metrics))
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/users", get(users::list_users))
        .route("/users/{id}", get(users::get_user))
        .route("/media", get(media::list_media))
        .route("/media/{id}", get(media::download_media))
        .route("/profile-media/user/{id}", get(media::list_profile_media))
        .route("/shows", get(shows::list_shows))
        .route("/shows/user/{id}", get(shows::shows_for_artist))
        .route("/merch", get(merch::list_merch))
        .route("/merch/user/{id}", get(merch::merch_for_user))
        .route("/board", get(board::list_posts))
        .route("/board/trending", get(board::trending))
        .route("/board/user/{id}", get(board::posts_for_user))
        .route("/board/{id}", get(board::get_post))
        .route("/board/{id}/comments", get(board::list_comments))
        .route("/follow/followers/{id}", get(follows::followers))
        .route("/follow/following/{id}", get(follows::following))
        .route("/gamification/levels", get(gamification::levels))
        .route("/gamification/badges", get(gamification::badges))
        .route("/gamification/users/{id}", get(gamification::user_summary))
        .route("/leaderboard/fans", get(gamification::top_fans))
        .route("/leaderboard/artists", get(gamification::top_artists));

    let protected_routes = Router::new()
        .route("/users", post(users::update_profile))
        .route("/users/avatar", post(users::set_avatar))
        .route("/messages", post(messages::send_message))
        .route("/messages/inbox", get(messages::inbox))
        .route("/messages/sent", get(messages::sent))
        .route("/messages/conversation/{user_id}", get(messages::conversation))
        .route("/media", post(media::upload_media))
        .route("/media/{id}", delete(media::delete_media))
        .route("/profile-media", post(media::upload_profile_media))
        .route("/shows", post(shows::create_show))
        .route("/shows/{id}", delete(shows::delete_show))
        .route("/merch", post(merch::create_merch))
        .route("/merch/{id}", delete(merch::delete_merch))
        .route("/board", post(board::create_post))
        .route("/board/{id}", put(board::update_post).delete(board::delete_post))
        .route("/board/{id}/like", post(board::like))
        .route("/board/{id}/dislike", post(board::dislike))
        .route("/board/{id}/reaction", delete(board::remove_reaction))
        .route("/board/{id}/comments", post(board::add_comment))
        .route("/follow/{id}", get(follows::status).post(follows::follow).delete(follows::unfollow))
        .route("/feed", get(feed::feed))
        .route("/notifications", get(notifications::list))
        .route("/notifications/unread_count", get(notifications::unread_count))
        .route("/notifications/read_all", post(notifications::mark_all_read))
        .route("/notifications/{id}/read", post(notifications::mark_read))
        .layer(middleware::from_fn_with_state(state.clone(), require_auth));

    let body_limit = state.max_upload_bytes + MULTIPART_OVERHEAD;

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .fallback(not_found)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(middleware::from_fn_with_state(state.clone(), track_requests))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn not_found() -> ApiError {
    ApiError::not_found("Not found")
}
