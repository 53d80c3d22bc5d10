use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::ProfileKind;

// -- JWT Claims --

/// JWT claims issued at register/login and checked by the auth middleware.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i64,
    pub username: String,
    pub is_artist: bool,
    pub exp: usize,
}

// -- Errors --

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<FieldError>>,
}

// -- Auth --

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    pub email: Option<String>,
    pub bio: Option<String>,
    pub social: Option<String>,
    #[serde(default)]
    pub is_artist: bool,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub id: i64,
    pub username: String,
    pub is_artist: bool,
    pub token: String,
}

// -- Users --

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: i64,
    pub name: String,
    pub username: String,
    pub email: Option<String>,
    pub bio: Option<String>,
    pub social: Option<String>,
    pub custom_html: Option<String>,
    pub is_artist: bool,
    pub avatar_media_id: Option<i64>,
    pub fan_points: i64,
    pub artist_points: i64,
    pub fan_level: Option<String>,
    pub artist_level: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub bio: Option<String>,
    pub social: Option<String>,
    pub custom_html: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SetAvatarRequest {
    pub media_id: Option<i64>,
}

/// Row count touched by an update.
#[derive(Debug, Serialize, Deserialize)]
pub struct Updated {
    pub updated: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Created {
    pub id: i64,
}

// -- Messages --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SendMessageRequest {
    pub receiver_id: i64,
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: i64,
    pub sender_id: i64,
    pub sender_username: String,
    pub receiver_id: i64,
    pub receiver_username: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

// -- Media --

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Media {
    pub id: i64,
    pub user_id: Option<i64>,
    pub file_name: String,
    pub original_name: Option<String>,
    pub mime_type: String,
    pub size: i64,
    pub sha256: String,
    pub uploaded_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    pub id: i64,
    pub file: String,
    pub size: i64,
    pub mime_type: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProfileMediaResponse {
    pub id: i64,
    pub media_id: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Deleted {
    pub deleted: bool,
}

// -- Shows --

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Show {
    pub id: i64,
    pub artist_id: i64,
    pub artist_username: String,
    pub venue: String,
    pub date: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct CreateShowRequest {
    #[serde(default)]
    pub venue: String,
    #[serde(default)]
    pub date: String,
    pub description: Option<String>,
}

// -- Merch --

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Merch {
    pub id: i64,
    pub user_id: i64,
    pub username: String,
    pub product_name: String,
    pub price: f64,
    pub stock: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct CreateMerchRequest {
    #[serde(default)]
    pub product_name: String,
    pub price: Option<f64>,
    pub stock: Option<i64>,
}

// -- Board --

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardPost {
    pub id: i64,
    pub user_id: i64,
    pub username: String,
    pub headline: Option<String>,
    pub content: String,
    pub likes: i64,
    pub dislikes: i64,
    pub comments: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct CreatePostRequest {
    pub headline: Option<String>,
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdatePostRequest {
    pub headline: Option<String>,
    pub content: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReactionResponse {
    pub success: bool,
    pub reaction: i64,
    pub likes: i64,
    pub dislikes: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReactionRemoved {
    pub removed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: i64,
    pub post_id: i64,
    pub user_id: i64,
    pub username: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateCommentRequest {
    #[serde(default)]
    pub content: String,
}

// -- Follows --

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FollowUser {
    pub id: i64,
    pub username: String,
    pub is_artist: bool,
    pub since: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FollowStatus {
    pub following: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FollowResult {
    pub followed: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UnfollowResult {
    pub unfollowed: bool,
}

// -- Feed --

#[derive(Debug, Serialize, Deserialize)]
pub struct Feed {
    pub posts: Vec<BoardPost>,
    pub media: Vec<Media>,
    pub shows: Vec<Show>,
    pub merch: Vec<Merch>,
}

// -- Notifications --

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: i64,
    pub user_id: i64,
    pub message: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UnreadCount {
    pub count: i64,
}

// -- Gamification --

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Level {
    pub id: i64,
    pub kind: ProfileKind,
    pub name: String,
    pub threshold: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Badge {
    pub id: i64,
    pub kind: ProfileKind,
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AwardedBadge {
    #[serde(flatten)]
    pub badge: Badge,
    pub awarded_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GamificationSummary {
    pub user_id: i64,
    pub is_artist: bool,
    pub fan_points: i64,
    pub artist_points: i64,
    pub fan_level: Option<Level>,
    pub artist_level: Option<Level>,
    pub badges: Vec<AwardedBadge>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub id: i64,
    pub name: String,
    pub username: String,
    pub points: i64,
}

// -- Health --

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
    pub total_requests: u64,
    pub total_errors: u64,
    pub avg_response_time: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_awarded_badge_is_flat() {
        let awarded = AwardedBadge {
            badge: Badge {
                id: 2,
                kind: ProfileKind::Fan,
                name: "First Post".into(),
                description: "Posted on the board".into(),
            },
            awarded_at: DateTime::parse_from_rfc3339("2024-05-01T12:00:00Z")
                .unwrap()
                .with_timezone(&Utc),
        };
        let value = serde_json::to_value(&awarded).unwrap();
        assert_eq!(value["name"], "First Post");
        assert_eq!(value["kind"], "fan");
        assert!(value.get("badge").is_none());
    }

    #[test]
    fn test_error_body_omits_missing_details() {
        let body = ErrorBody {
            error: "Not found".into(),
            details: None,
        };
        assert_eq!(serde_json::to_string(&body).unwrap(), r#"{"error":"Not found"}"#);
    }

    #[test]
    fn test_metrics_are_camel_case() {
        let snapshot = MetricsSnapshot {
            total_requests: 3,
            total_errors: 1,
            avg_response_time: 1.5,
        };
        let value = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(value["totalRequests"], 3);
        assert_eq!(value["avgResponseTime"], 1.5);
    }
}
