//! Side effects attached to user actions: notifications and rewards.
//!
//! These are awaited by the triggering handler but never fail it; errors
//! are logged at `warn` and dropped.

use tracing::{debug, warn};

use crate::state::{AppState, blocking};

/// Rewardable actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Post,
    Comment,
    Like,
    Follow,
    Followed,
    Message,
    ProfileMedia,
}

impl Action {
    pub fn points(self) -> i64 {
        match self {
            Self::Post => 10,
            Self::Comment => 2,
            Self::Like => 1,
            Self::Follow => 1,
            Self::Followed => 3,
            Self::Message => 1,
            Self::ProfileMedia => 5,
        }
    }

    /// Name recorded in `reward_grants`.
    pub fn key(self) -> &'static str {
        match self {
            Self::Post => "post",
            Self::Comment => "comment",
            Self::Like => "like",
            Self::Follow => "follow",
            Self::Followed => "followed",
            Self::Message => "message",
            Self::ProfileMedia => "profile_media",
        }
    }

    /// Badge granted the first time the action happens, if any.
    pub fn badge(self) -> Option<&'static str> {
        match self {
            Self::Post => Some("First Post"),
            Self::Comment => Some("First Comment"),
            Self::Like => None,
            Self::Follow => Some("First Follow"),
            Self::Followed => Some("First Fan"),
            Self::Message => Some("First Message"),
            Self::ProfileMedia => Some("Debut Release"),
        }
    }
}

/// True the first time `user_id` performs `action` on `target_id`.
/// Toggle actions (likes, follows) gate their notification and reward on
/// this. A failed lookup counts as already granted.
pub async fn first_time(state: &AppState, user_id: i64, action: Action, target_id: i64) -> bool {
    let result = blocking(state, move |db| db.claim_reward(user_id, action.key(), target_id)).await;
    match result {
        Ok(fresh) => fresh,
        Err(e) => {
            warn!("Failed to record {:?} grant for user {}: {}", action, user_id, e);
            false
        }
    }
}

pub async fn notify(state: &AppState, user_id: i64, message: String) {
    let result = blocking(state, move |db| db.insert_notification(user_id, &message)).await;
    if let Err(e) = result {
        warn!("Failed to notify user {}: {}", user_id, e);
    }
}

pub async fn reward(state: &AppState, user_id: i64, action: Action) {
    let result = blocking(state, move |db| {
        let update = db.add_points(user_id, action.points())?;
        let badge = match action.badge() {
            Some(name) if db.award_badge(user_id, name)? => Some(name),
            _ => None,
        };
        Ok((update, badge))
    })
    .await;

    match result {
        Ok((Some(update), badge)) => {
            debug!(
                "User {} +{} {} points for {:?} (now {})",
                user_id,
                action.points(),
                update.kind.as_str(),
                action,
                update.points
            );
            if let Some(name) = badge {
                debug!("User {} earned badge '{}'", user_id, name);
            }
        }
        Ok((None, _)) => warn!("Reward for unknown user {}", user_id),
        Err(e) => warn!("Failed to reward user {} for {:?}: {}", user_id, action, e),
    }
}
