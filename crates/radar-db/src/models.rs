//! Database row types. These map directly to SQLite rows and are kept
//! distinct from the radar-types API models; the `From` impls below do
//! the conversion, including timestamp parsing.

use chrono::{DateTime, Utc};
use radar_types::api;
use radar_types::models::ProfileKind;
use tracing::warn;

pub struct UserRow {
    pub id: i64,
    pub name: String,
    pub username: String,
    pub password: String,
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
    pub created_at: String,
}

pub struct NewUser<'a> {
    pub name: &'a str,
    pub username: &'a str,
    pub password_hash: &'a str,
    pub email: Option<&'a str>,
    pub bio: Option<&'a str>,
    pub social: Option<&'a str>,
    pub is_artist: bool,
}

/// Profile fields to change; `None` leaves the column untouched.
#[derive(Default)]
pub struct ProfileUpdate<'a> {
    pub name: Option<&'a str>,
    pub email: Option<&'a str>,
    pub bio: Option<&'a str>,
    pub social: Option<&'a str>,
    pub custom_html: Option<&'a str>,
}

pub struct MessageRow {
    pub id: i64,
    pub sender_id: i64,
    pub sender_username: String,
    pub receiver_id: i64,
    pub receiver_username: String,
    pub content: String,
    pub created_at: String,
}

pub struct MediaRow {
    pub id: i64,
    pub user_id: Option<i64>,
    pub file_name: String,
    pub original_name: Option<String>,
    pub mime_type: String,
    pub size: i64,
    pub sha256: String,
    pub uploaded_at: String,
}

pub struct NewMedia<'a> {
    pub user_id: i64,
    pub file_name: &'a str,
    pub original_name: Option<&'a str>,
    pub mime_type: &'a str,
    pub size: i64,
    pub sha256: &'a str,
}

pub struct ShowRow {
    pub id: i64,
    pub artist_id: i64,
    pub artist_username: String,
    pub venue: String,
    pub date: String,
    pub description: Option<String>,
    pub created_at: String,
}

pub struct MerchRow {
    pub id: i64,
    pub user_id: i64,
    pub username: String,
    pub product_name: String,
    pub price: f64,
    pub stock: i64,
    pub created_at: String,
}

/// A board post with its aggregated reaction and comment counts.
pub struct PostRow {
    pub id: i64,
    pub user_id: i64,
    pub username: String,
    pub headline: Option<String>,
    pub content: String,
    pub likes: i64,
    pub dislikes: i64,
    pub comments: i64,
    pub created_at: String,
    pub updated_at: Option<String>,
}

pub struct CommentRow {
    pub id: i64,
    pub post_id: i64,
    pub user_id: i64,
    pub username: String,
    pub content: String,
    pub created_at: String,
}

pub struct FollowRow {
    pub user_id: i64,
    pub username: String,
    pub is_artist: bool,
    pub since: String,
}

pub struct NotificationRow {
    pub id: i64,
    pub user_id: i64,
    pub message: String,
    pub is_read: bool,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct LevelRow {
    pub id: i64,
    pub kind: String,
    pub name: String,
    pub threshold: i64,
}

pub struct BadgeRow {
    pub id: i64,
    pub kind: String,
    pub name: String,
    pub description: String,
}

pub struct AwardedBadgeRow {
    pub badge: BadgeRow,
    pub awarded_at: String,
}

pub struct LeaderboardRow {
    pub id: i64,
    pub name: String,
    pub username: String,
    pub points: i64,
}

/// Result of `add_points`: the new counter and level for the user's kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PointsUpdate {
    pub kind: ProfileKind,
    pub points: i64,
    pub level_id: Option<i64>,
}

/// Outcome of upserting a board reaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReactionChange {
    Added,
    Changed,
    Unchanged,
}

/// SQLite stores timestamps as "YYYY-MM-DD HH:MM:SS" without timezone.
/// Parse as naive UTC, accepting RFC 3339 too.
pub fn parse_timestamp(raw: &str) -> DateTime<Utc> {
    raw.parse::<DateTime<Utc>>()
        .or_else(|_| {
            chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
                .map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            warn!("Corrupt timestamp '{}': {}", raw, e);
            DateTime::default()
        })
}

fn parse_kind(raw: &str) -> ProfileKind {
    raw.parse().unwrap_or_else(|e| {
        warn!("{}", e);
        ProfileKind::Fan
    })
}

impl From<UserRow> for api::UserProfile {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            username: row.username,
            email: row.email,
            bio: row.bio,
            social: row.social,
            custom_html: row.custom_html,
            is_artist: row.is_artist,
            avatar_media_id: row.avatar_media_id,
            fan_points: row.fan_points,
            artist_points: row.artist_points,
            fan_level: row.fan_level,
            artist_level: row.artist_level,
            created_at: parse_timestamp(&row.created_at),
        }
    }
}

impl From<MessageRow> for api::Message {
    fn from(row: MessageRow) -> Self {
        Self {
            id: row.id,
            sender_id: row.sender_id,
            sender_username: row.sender_username,
            receiver_id: row.receiver_id,
            receiver_username: row.receiver_username,
            content: row.content,
            created_at: parse_timestamp(&row.created_at),
        }
    }
}

impl From<MediaRow> for api::Media {
    fn from(row: MediaRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            file_name: row.file_name,
            original_name: row.original_name,
            mime_type: row.mime_type,
            size: row.size,
            sha256: row.sha256,
            uploaded_at: parse_timestamp(&row.uploaded_at),
        }
    }
}

impl From<ShowRow> for api::Show {
    fn from(row: ShowRow) -> Self {
        Self {
            id: row.id,
            artist_id: row.artist_id,
            artist_username: row.artist_username,
            venue: row.venue,
            date: row.date,
            description: row.description,
            created_at: parse_timestamp(&row.created_at),
        }
    }
}

impl From<MerchRow> for api::Merch {
    fn from(row: MerchRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            username: row.username,
            product_name: row.product_name,
            price: row.price,
            stock: row.stock,
            created_at: parse_timestamp(&row.created_at),
        }
    }
}

impl From<PostRow> for api::BoardPost {
    fn from(row: PostRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            username: row.username,
            headline: row.headline,
            content: row.content,
            likes: row.likes,
            dislikes: row.dislikes,
            comments: row.comments,
            created_at: parse_timestamp(&row.created_at),
            updated_at: row.updated_at.as_deref().map(parse_timestamp),
        }
    }
}

impl From<CommentRow> for api::Comment {
    fn from(row: CommentRow) -> Self {
        Self {
            id: row.id,
            post_id: row.post_id,
            user_id: row.user_id,
            username: row.username,
            content: row.content,
            created_at: parse_timestamp(&row.created_at),
        }
    }
}

impl From<FollowRow> for api::FollowUser {
    fn from(row: FollowRow) -> Self {
        Self {
            id: row.user_id,
            username: row.username,
            is_artist: row.is_artist,
            since: parse_timestamp(&row.since),
        }
    }
}

impl From<NotificationRow> for api::Notification {
    fn from(row: NotificationRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            message: row.message,
            is_read: row.is_read,
            created_at: parse_timestamp(&row.created_at),
        }
    }
}

impl From<LevelRow> for api::Level {
    fn from(row: LevelRow) -> Self {
        Self {
            id: row.id,
            kind: parse_kind(&row.kind),
            name: row.name,
            threshold: row.threshold,
        }
    }
}

impl From<BadgeRow> for api::Badge {
    fn from(row: BadgeRow) -> Self {
        Self {
            id: row.id,
            kind: parse_kind(&row.kind),
            name: row.name,
            description: row.description,
        }
    }
}

impl From<AwardedBadgeRow> for api::AwardedBadge {
    fn from(row: AwardedBadgeRow) -> Self {
        Self {
            badge: row.badge.into(),
            awarded_at: parse_timestamp(&row.awarded_at),
        }
    }
}

impl From<LeaderboardRow> for api::LeaderboardEntry {
    fn from(row: LeaderboardRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            username: row.username,
            points: row.points,
        }
    }
}
