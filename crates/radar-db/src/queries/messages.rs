use anyhow::Result;
use rusqlite::Row;

use super::OptionalExt;
use crate::Database;
use crate::models::MessageRow;

// JOIN users twice to fetch both usernames in a single query
const MESSAGE_SELECT: &str = "
    SELECT m.id, m.sender_id, s.username, m.receiver_id, r.username, m.content, m.created_at
    FROM messages m
    JOIN users s ON s.id = m.sender_id
    JOIN users r ON r.id = m.receiver_id";

impl Database {
    // -- Messages --

    pub fn insert_message(&self, sender_id: i64, receiver_id: i64, content: &str) -> Result<i64> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO messages (sender_id, receiver_id, content) VALUES (?1, ?2, ?3)",
                rusqlite::params![sender_id, receiver_id, content],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    pub fn get_message(&self, id: i64) -> Result<Option<MessageRow>> {
        self.with_conn(|conn| {
            let sql = format!("{} WHERE m.id = ?1", MESSAGE_SELECT);
            conn.query_row(&sql, [id], map_message).optional()
        })
    }

    /// Messages received by `user_id`, newest first.
    pub fn inbox(&self, user_id: i64, limit: u32) -> Result<Vec<MessageRow>> {
        self.query_messages("WHERE m.receiver_id = ?1 ORDER BY m.created_at DESC, m.id DESC", user_id, None, limit)
    }

    /// Messages sent by `user_id`, newest first.
    pub fn sent(&self, user_id: i64, limit: u32) -> Result<Vec<MessageRow>> {
        self.query_messages("WHERE m.sender_id = ?1 ORDER BY m.created_at DESC, m.id DESC", user_id, None, limit)
    }

    /// Both directions between two users, oldest first.
    pub fn conversation(&self, user_id: i64, other_id: i64, limit: u32) -> Result<Vec<MessageRow>> {
        self.query_messages(
            "WHERE (m.sender_id = ?1 AND m.receiver_id = ?2)
                OR (m.sender_id = ?2 AND m.receiver_id = ?1)
             ORDER BY m.created_at ASC, m.id ASC",
            user_id,
            Some(other_id),
            limit,
        )
    }

    fn query_messages(
        &self,
        clause: &str,
        user_id: i64,
        other_id: Option<i64>,
        limit: u32,
    ) -> Result<Vec<MessageRow>> {
        self.with_conn(|conn| {
            let sql = format!("{} {} LIMIT ?3", MESSAGE_SELECT, clause);
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(rusqlite::params![user_id, other_id, limit], map_message)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }
}

fn map_message(row: &Row<'_>) -> rusqlite::Result<MessageRow> {
    Ok(MessageRow {
        id: row.get(0)?,
        sender_id: row.get(1)?,
        sender_username: row.get(2)?,
        receiver_id: row.get(3)?,
        receiver_username: row.get(4)?,
        content: row.get(5)?,
        created_at: row.get(6)?,
    })
}
