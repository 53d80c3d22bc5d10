use anyhow::Result;
use rusqlite::Row;

use super::OptionalExt;
use crate::Database;
use crate::models::ShowRow;

pub(crate) const SHOW_SELECT: &str = "
    SELECT s.id, s.artist_id, u.username, s.venue, s.date, s.description, s.created_at
    FROM shows s
    JOIN users u ON u.id = s.artist_id";

impl Database {
    // -- Shows --

    pub fn insert_show(
        &self,
        artist_id: i64,
        venue: &str,
        date: &str,
        description: Option<&str>,
    ) -> Result<i64> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO shows (artist_id, venue, date, description) VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![artist_id, venue, date, description],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    pub fn get_show(&self, id: i64) -> Result<Option<ShowRow>> {
        self.with_conn(|conn| {
            let sql = format!("{} WHERE s.id = ?1", SHOW_SELECT);
            conn.query_row(&sql, [id], map_show).optional()
        })
    }

    /// All shows, soonest first.
    pub fn list_shows(&self) -> Result<Vec<ShowRow>> {
        self.with_conn(|conn| {
            let sql = format!("{} ORDER BY s.date ASC, s.id ASC", SHOW_SELECT);
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([], map_show)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn shows_for_artist(&self, artist_id: i64) -> Result<Vec<ShowRow>> {
        self.with_conn(|conn| {
            let sql = format!("{} WHERE s.artist_id = ?1 ORDER BY s.date ASC, s.id ASC", SHOW_SELECT);
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([artist_id], map_show)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn delete_show(&self, id: i64) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute("DELETE FROM shows WHERE id = ?1", [id])?;
            Ok(changed > 0)
        })
    }
}

pub(crate) fn map_show(row: &Row<'_>) -> rusqlite::Result<ShowRow> {
    Ok(ShowRow {
        id: row.get(0)?,
        artist_id: row.get(1)?,
        artist_username: row.get(2)?,
        venue: row.get(3)?,
        date: row.get(4)?,
        description: row.get(5)?,
        created_at: row.get(6)?,
    })
}
