use anyhow::Result;
use rusqlite::Row;

use radar_types::models::Reaction;

use super::OptionalExt;
use crate::Database;
use crate::models::{CommentRow, PostRow, ReactionChange};

/// Posts with their like, dislike and comment counts. Counts come from
/// correlated subqueries so a post with no reactions still reports zeros.
pub(crate) const POST_SELECT: &str = "
    SELECT p.id, p.user_id, u.username, p.headline, p.content,
           (SELECT COUNT(*) FROM board_reactions r WHERE r.post_id = p.id AND r.reaction = 1) AS likes,
           (SELECT COUNT(*) FROM board_reactions r WHERE r.post_id = p.id AND r.reaction = -1) AS dislikes,
           (SELECT COUNT(*) FROM board_comments c WHERE c.post_id = p.id) AS comments,
           p.created_at, p.updated_at
    FROM board_posts p
    JOIN users u ON u.id = p.user_id";

const COMMENT_SELECT: &str = "
    SELECT c.id, c.post_id, c.user_id, u.username, c.content, c.created_at
    FROM board_comments c
    JOIN users u ON u.id = c.user_id";

impl Database {
    // -- Posts --

    pub fn insert_post(&self, user_id: i64, headline: Option<&str>, content: &str) -> Result<i64> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO board_posts (user_id, headline, content) VALUES (?1, ?2, ?3)",
                rusqlite::params![user_id, headline, content],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    pub fn get_post(&self, id: i64) -> Result<Option<PostRow>> {
        self.with_conn(|conn| {
            let sql = format!("{} WHERE p.id = ?1", POST_SELECT);
            conn.query_row(&sql, [id], map_post).optional()
        })
    }

    /// Author of a post, or `None` if it does not exist.
    pub fn post_author(&self, id: i64) -> Result<Option<i64>> {
        self.with_conn(|conn| {
            conn.query_row("SELECT user_id FROM board_posts WHERE id = ?1", [id], |row| row.get(0))
                .optional()
        })
    }

    /// Newest first.
    pub fn list_posts(&self) -> Result<Vec<PostRow>> {
        self.with_conn(|conn| {
            let sql = format!("{} ORDER BY p.created_at DESC, p.id DESC", POST_SELECT);
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([], map_post)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn posts_for_user(&self, user_id: i64) -> Result<Vec<PostRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "{} WHERE p.user_id = ?1 ORDER BY p.created_at DESC, p.id DESC",
                POST_SELECT
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([user_id], map_post)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Most liked first, then most commented, then newest.
    pub fn trending_posts(&self, limit: u32) -> Result<Vec<PostRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "{} ORDER BY likes DESC, comments DESC, p.created_at DESC, p.id DESC LIMIT ?1",
                POST_SELECT
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([limit], map_post)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Apply an edit and stamp `updated_at`. `None` keeps the current value.
    pub fn update_post(&self, id: i64, headline: Option<&str>, content: Option<&str>) -> Result<usize> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE board_posts SET
                    headline = COALESCE(?1, headline),
                    content = COALESCE(?2, content),
                    updated_at = datetime('now')
                 WHERE id = ?3",
                rusqlite::params![headline, content, id],
            )?;
            Ok(changed)
        })
    }

    pub fn delete_post(&self, id: i64) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute("DELETE FROM board_posts WHERE id = ?1", [id])?;
            Ok(changed > 0)
        })
    }

    // -- Reactions --

    /// Upsert the user's single reaction on a post.
    /// The lookup and write happen under one lock acquisition.
    pub fn set_reaction(&self, post_id: i64, user_id: i64, reaction: Reaction) -> Result<ReactionChange> {
        self.with_conn(|conn| {
            let existing: Option<Option<Reaction>> = conn
                .query_row(
                    "SELECT reaction FROM board_reactions WHERE post_id = ?1 AND user_id = ?2",
                    rusqlite::params![post_id, user_id],
                    |row| row.get::<_, i64>(0),
                )
                .optional()?
                .map(Reaction::from_value);

            match existing {
                Some(Some(current)) if current == reaction => Ok(ReactionChange::Unchanged),
                Some(_) => {
                    conn.execute(
                        "UPDATE board_reactions SET reaction = ?1 WHERE post_id = ?2 AND user_id = ?3",
                        rusqlite::params![reaction.value(), post_id, user_id],
                    )?;
                    Ok(ReactionChange::Changed)
                }
                None => {
                    conn.execute(
                        "INSERT INTO board_reactions (post_id, user_id, reaction) VALUES (?1, ?2, ?3)",
                        rusqlite::params![post_id, user_id, reaction.value()],
                    )?;
                    Ok(ReactionChange::Added)
                }
            }
        })
    }

    pub fn clear_reaction(&self, post_id: i64, user_id: i64) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "DELETE FROM board_reactions WHERE post_id = ?1 AND user_id = ?2",
                rusqlite::params![post_id, user_id],
            )?;
            Ok(changed > 0)
        })
    }

    // -- Comments --

    pub fn insert_comment(&self, post_id: i64, user_id: i64, content: &str) -> Result<i64> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO board_comments (post_id, user_id, content) VALUES (?1, ?2, ?3)",
                rusqlite::params![post_id, user_id, content],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    pub fn get_comment(&self, id: i64) -> Result<Option<CommentRow>> {
        self.with_conn(|conn| {
            let sql = format!("{} WHERE c.id = ?1", COMMENT_SELECT);
            conn.query_row(&sql, [id], map_comment).optional()
        })
    }

    /// Oldest first.
    pub fn list_comments(&self, post_id: i64) -> Result<Vec<CommentRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "{} WHERE c.post_id = ?1 ORDER BY c.created_at ASC, c.id ASC",
                COMMENT_SELECT
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([post_id], map_comment)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }
}

pub(crate) fn map_post(row: &Row<'_>) -> rusqlite::Result<PostRow> {
    Ok(PostRow {
        id: row.get(0)?,
        user_id: row.get(1)?,
        username: row.get(2)?,
        headline: row.get(3)?,
        content: row.get(4)?,
        likes: row.get(5)?,
        dislikes: row.get(6)?,
        comments: row.get(7)?,
        created_at: row.get(8)?,
        updated_at: row.get(9)?,
    })
}

fn map_comment(row: &Row<'_>) -> rusqlite::Result<CommentRow> {
    Ok(CommentRow {
        id: row.get(0)?,
        post_id: row.get(1)?,
        user_id: row.get(2)?,
        username: row.get(3)?,
        content: row.get(4)?,
        created_at: row.get(5)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::test_support;

    #[test]
    fn test_like_counts_once_per_user() {
        let db = Database::open_in_memory().unwrap();
        let author = test_support::user(&db, "author", true);
        let ed = test_support::user(&db, "ed", false);
        let fay = test_support::user(&db, "fay", false);
        let post = db.insert_post(author, Some("Hello"), "World").unwrap();

        assert_eq!(db.set_reaction(post, ed, Reaction::Like).unwrap(), ReactionChange::Added);
        assert_eq!(db.set_reaction(post, ed, Reaction::Like).unwrap(), ReactionChange::Unchanged);
        assert_eq!(db.get_post(post).unwrap().unwrap().likes, 1);

        db.set_reaction(post, fay, Reaction::Like).unwrap();
        assert_eq!(db.get_post(post).unwrap().unwrap().likes, 2);

        assert_eq!(db.set_reaction(post, fay, Reaction::Dislike).unwrap(), ReactionChange::Changed);
        assert_eq!(db.set_reaction(post, fay, Reaction::Dislike).unwrap(), ReactionChange::Unchanged);
        let row = db.get_post(post).unwrap().unwrap();
        assert_eq!((row.likes, row.dislikes), (1, 1));

        assert!(db.clear_reaction(post, ed).unwrap());
        assert!(!db.clear_reaction(post, ed).unwrap());
        assert_eq!(db.get_post(post).unwrap().unwrap().likes, 0);
    }

    #[test]
    fn test_comments_and_counts() {
        let db = Database::open_in_memory().unwrap();
        let author = test_support::user(&db, "author", false);
        let fan = test_support::user(&db, "fan", false);
        let post = db.insert_post(author, None, "first").unwrap();

        db.insert_comment(post, fan, "Nice").unwrap();
        db.insert_comment(post, author, "Thanks").unwrap();

        let comments = db.list_comments(post).unwrap();
        assert_eq!(comments.len(), 2);
        assert_eq!(comments[0].content, "Nice");
        assert_eq!(comments[0].username, "fan");
        assert_eq!(db.get_post(post).unwrap().unwrap().comments, 2);
    }

    #[test]
    fn test_update_sets_updated_at_and_delete_cascades() {
        let db = Database::open_in_memory().unwrap();
        let author = test_support::user(&db, "author", false);
        let post = db.insert_post(author, Some("Old"), "text").unwrap();
        db.insert_comment(post, author, "self reply").unwrap();
        assert!(db.get_post(post).unwrap().unwrap().updated_at.is_none());

        assert_eq!(db.update_post(post, Some("New"), None).unwrap(), 1);
        let row = db.get_post(post).unwrap().unwrap();
        assert_eq!(row.headline.as_deref(), Some("New"));
        assert_eq!(row.content, "text");
        assert!(row.updated_at.is_some());

        assert!(db.delete_post(post).unwrap());
        assert!(db.list_comments(post).unwrap().is_empty());
        assert_eq!(db.post_author(post).unwrap(), None);
    }

    #[test]
    fn test_trending_orders_by_likes() {
        let db = Database::open_in_memory().unwrap();
        let a = test_support::user(&db, "a", false);
        let b = test_support::user(&db, "b", false);
        let quiet = db.insert_post(a, None, "quiet").unwrap();
        let loud = db.insert_post(a, None, "loud").unwrap();
        db.set_reaction(quiet, b, Reaction::Like).unwrap();
        db.set_reaction(loud, a, Reaction::Like).unwrap();
        db.set_reaction(loud, b, Reaction::Like).unwrap();

        let trending = db.trending_posts(10).unwrap();
        assert_eq!(trending[0].id, loud);
        assert_eq!(trending[1].id, quiet);
        assert_eq!(db.trending_posts(1).unwrap().len(), 1);
    }
}
