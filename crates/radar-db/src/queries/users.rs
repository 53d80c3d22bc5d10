use anyhow::Result;
use rusqlite::{Connection, Row};

use super::{OptionalExt, is_constraint_violation};
use crate::Database;
use crate::models::{NewUser, ProfileUpdate, UserRow};

const USER_SELECT: &str = "
    SELECT u.id, u.name, u.username, u.password, u.email, u.bio, u.social, u.custom_html,
           u.is_artist, u.avatar_media_id, u.fan_points, u.artist_points,
           fl.name, al.name, u.created_at
    FROM users u
    LEFT JOIN levels fl ON fl.id = u.fan_level_id
    LEFT JOIN levels al ON al.id = u.artist_level_id";

impl Database {
    // -- Users --

    /// Insert a user at the entry level of both kinds.
    /// Returns `None` if the username is taken.
    pub fn create_user(&self, user: &NewUser<'_>) -> Result<Option<i64>> {
        self.with_conn(|conn| {
            let result = conn.execute(
                "INSERT INTO users (name, username, password, email, bio, social, is_artist,
                                    fan_level_id, artist_level_id)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7,
                         (SELECT id FROM levels WHERE kind = 'fan' AND threshold <= 0
                          ORDER BY threshold DESC LIMIT 1),
                         (SELECT id FROM levels WHERE kind = 'artist' AND threshold <= 0
                          ORDER BY threshold DESC LIMIT 1))",
                rusqlite::params![
                    user.name,
                    user.username,
                    user.password_hash,
                    user.email,
                    user.bio,
                    user.social,
                    user.is_artist,
                ],
            );

            match result {
                Ok(_) => Ok(Some(conn.last_insert_rowid())),
                Err(e) if is_constraint_violation(&e) => Ok(None),
                Err(e) => Err(e.into()),
            }
        })
    }

    pub fn get_user_by_username(&self, username: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "u.username", &username))
    }

    pub fn get_user(&self, id: i64) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "u.id", &id))
    }

    pub fn user_exists(&self, id: i64) -> Result<bool> {
        self.with_conn(|conn| {
            let found: Option<i64> = conn
                .query_row("SELECT 1 FROM users WHERE id = ?1", [id], |row| row.get(0))
                .optional()?;
            Ok(found.is_some())
        })
    }

    pub fn count_users(&self) -> Result<i64> {
        self.with_conn(|conn| {
            Ok(conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?)
        })
    }

    pub fn list_users(&self) -> Result<Vec<UserRow>> {
        self.with_conn(|conn| {
            let sql = format!("{} ORDER BY u.id", USER_SELECT);
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([], map_user)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn update_profile(&self, id: i64, update: &ProfileUpdate<'_>) -> Result<usize> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE users SET
                    name = COALESCE(?1, name),
                    email = COALESCE(?2, email),
                    bio = COALESCE(?3, bio),
                    social = COALESCE(?4, social),
                    custom_html = COALESCE(?5, custom_html)
                 WHERE id = ?6",
                rusqlite::params![
                    update.name,
                    update.email,
                    update.bio,
                    update.social,
                    update.custom_html,
                    id,
                ],
            )?;
            Ok(changed)
        })
    }

    pub fn set_avatar(&self, user_id: i64, media_id: Option<i64>) -> Result<usize> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE users SET avatar_media_id = ?1 WHERE id = ?2",
                rusqlite::params![media_id, user_id],
            )?;
            Ok(changed)
        })
    }
}

fn query_user(
    conn: &Connection,
    column: &str,
    value: &dyn rusqlite::types::ToSql,
) -> Result<Option<UserRow>> {
    let sql = format!("{} WHERE {} = ?1", USER_SELECT, column);
    let mut stmt = conn.prepare(&sql)?;
    stmt.query_row([value], map_user).optional()
}

fn map_user(row: &Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        name: row.get(1)?,
        username: row.get(2)?,
        password: row.get(3)?,
        email: row.get(4)?,
        bio: row.get(5)?,
        social: row.get(6)?,
        custom_html: row.get(7)?,
        is_artist: row.get(8)?,
        avatar_media_id: row.get(9)?,
        fan_points: row.get(10)?,
        artist_points: row.get(11)?,
        fan_level: row.get(12)?,
        artist_level: row.get(13)?,
        created_at: row.get(14)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::test_support;

    #[test]
    fn test_duplicate_username_is_rejected() {
        let db = Database::open_in_memory().unwrap();
        let id = test_support::user(&db, "alice", false);
        assert!(id > 0);

        let again = db
            .create_user(&NewUser {
                name: "Alice Again",
                username: "alice",
                password_hash: "hash",
                email: None,
                bio: None,
                social: None,
                is_artist: false,
            })
            .unwrap();
        assert!(again.is_none());
    }

    #[test]
    fn test_new_user_starts_at_entry_levels() {
        let db = Database::open_in_memory().unwrap();
        let id = test_support::user(&db, "bob", true);

        let user = db.get_user(id).unwrap().unwrap();
        assert!(user.is_artist);
        assert_eq!(user.fan_level.as_deref(), Some("Listener"));
        assert_eq!(user.artist_level.as_deref(), Some("Garage Band"));
        assert_eq!(user.artist_points, 0);
    }

    #[test]
    fn test_update_profile_only_touches_supplied_fields() {
        let db = Database::open_in_memory().unwrap();
        let id = test_support::user(&db, "carol", false);
        db.update_profile(id, &ProfileUpdate { bio: Some("noise"), ..Default::default() })
            .unwrap();
        db.update_profile(id, &ProfileUpdate { email: Some("c@example.com"), ..Default::default() })
            .unwrap();

        let user = db.get_user_by_username("carol").unwrap().unwrap();
        assert_eq!(user.bio.as_deref(), Some("noise"));
        assert_eq!(user.email.as_deref(), Some("c@example.com"));
        assert_eq!(user.name, "carol");
    }
}
