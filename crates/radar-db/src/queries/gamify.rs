use anyhow::Result;
use rusqlite::{Connection, Row};

use radar_types::models::ProfileKind;

use super::OptionalExt;
use crate::Database;
use crate::models::{AwardedBadgeRow, BadgeRow, LeaderboardRow, LevelRow, PointsUpdate};

impl Database {
    // -- Points & levels --

    /// Credit `amount` points to the counter matching the user's profile kind
    /// and move the user to the highest level whose threshold is reached.
    ///
    /// Runs in one transaction, so concurrent awards never leave the level
    /// out of step with the counter. Returns `None` for an unknown user.
    pub fn add_points(&self, user_id: i64, amount: i64) -> Result<Option<PointsUpdate>> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let Some(kind) = user_kind(&tx, user_id)? else {
                return Ok(None);
            };

            let points_col = kind.points_column();
            tx.execute(
                &format!("UPDATE users SET {points_col} = {points_col} + ?1 WHERE id = ?2"),
                rusqlite::params![amount, user_id],
            )?;
            let points: i64 = tx.query_row(
                &format!("SELECT {points_col} FROM users WHERE id = ?1"),
                [user_id],
                |row| row.get(0),
            )?;

            let level_id: Option<i64> = tx
                .query_row(
                    "SELECT id FROM levels WHERE kind = ?1 AND threshold <= ?2
                     ORDER BY threshold DESC LIMIT 1",
                    rusqlite::params![kind.as_str(), points],
                    |row| row.get(0),
                )
                .optional()?;
            tx.execute(
                &format!("UPDATE users SET {} = ?1 WHERE id = ?2", kind.level_column()),
                rusqlite::params![level_id, user_id],
            )?;

            tx.commit()?;
            Ok(Some(PointsUpdate { kind, points, level_id }))
        })
    }

    /// Record that `user_id` has been rewarded for `action` on `target_id`.
    /// Returns false when that grant already exists, so undo/redo cycles
    /// pay out once.
    pub fn claim_reward(&self, user_id: i64, action: &str, target_id: i64) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "INSERT OR IGNORE INTO reward_grants (user_id, action, target_id) VALUES (?1, ?2, ?3)",
                rusqlite::params![user_id, action, target_id],
            )?;
            Ok(changed > 0)
        })
    }

    pub fn get_level(&self, id: i64) -> Result<Option<LevelRow>> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT id, kind, name, threshold FROM levels WHERE id = ?1",
                [id],
                map_level,
            )
            .optional()
        })
    }

    pub fn levels(&self) -> Result<Vec<LevelRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, kind, name, threshold FROM levels ORDER BY kind, threshold",
            )?;
            let rows = stmt
                .query_map([], map_level)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    // -- Badges --

    pub fn badges(&self) -> Result<Vec<BadgeRow>> {
        self.with_conn(|conn| {
            let mut stmt =
                conn.prepare("SELECT id, kind, name, description FROM badges ORDER BY kind, id")?;
            let rows = stmt
                .query_map([], map_badge)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Award the badge called `name` from the user's own kind.
    /// Returns true only the first time; unknown names award nothing.
    pub fn award_badge(&self, user_id: i64, name: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let Some(kind) = user_kind(conn, user_id)? else {
                return Ok(false);
            };
            let changed = conn.execute(
                "INSERT OR IGNORE INTO user_badges (user_id, badge_id)
                 SELECT ?1, id FROM badges WHERE kind = ?2 AND name = ?3",
                rusqlite::params![user_id, kind.as_str(), name],
            )?;
            Ok(changed > 0)
        })
    }

    /// Badges a user holds, in award order.
    pub fn badges_for_user(&self, user_id: i64) -> Result<Vec<AwardedBadgeRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT b.id, b.kind, b.name, b.description, ub.awarded_at
                 FROM user_badges ub
                 JOIN badges b ON b.id = ub.badge_id
                 WHERE ub.user_id = ?1
                 ORDER BY ub.awarded_at ASC, b.id ASC",
            )?;
            let rows = stmt
                .query_map([user_id], |row| {
                    Ok(AwardedBadgeRow {
                        badge: map_badge(row)?,
                        awarded_at: row.get(4)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    // -- Leaderboard --

    /// Top users of one kind by that kind's points. Ties go to the older account.
    pub fn leaderboard(&self, kind: ProfileKind, limit: u32) -> Result<Vec<LeaderboardRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT id, name, username, {col} FROM users
                 WHERE is_artist = ?1
                 ORDER BY {col} DESC, id ASC
                 LIMIT ?2",
                col = kind.points_column()
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(rusqlite::params![kind == ProfileKind::Artist, limit], |row| {
                    Ok(LeaderboardRow {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        username: row.get(2)?,
                        points: row.get(3)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }
}

fn user_kind(conn: &Connection, user_id: i64) -> Result<Option<ProfileKind>> {
    let is_artist: Option<bool> = conn
        .query_row("SELECT is_artist FROM users WHERE id = ?1", [user_id], |row| row.get(0))
        .optional()?;
    Ok(is_artist.map(ProfileKind::from_is_artist))
}

fn map_level(row: &Row<'_>) -> rusqlite::Result<LevelRow> {
    Ok(LevelRow {
        id: row.get(0)?,
        kind: row.get(1)?,
        name: row.get(2)?,
        threshold: row.get(3)?,
    })
}

fn map_badge(row: &Row<'_>) -> rusqlite::Result<BadgeRow> {
    Ok(BadgeRow {
        id: row.get(0)?,
        kind: row.get(1)?,
        name: row.get(2)?,
        description: row.get(3)?,
    })
}
