use anyhow::Result;
use rusqlite::Row;

use super::OptionalExt;
use crate::Database;
use crate::models::{MediaRow, NewMedia};

pub(crate) const MEDIA_COLUMNS: &str =
    "media.id, media.user_id, media.file_name, media.original_name, media.mime_type, media.size, media.sha256, media.uploaded_at";

impl Database {
    // -- Media --

    pub fn insert_media(&self, media: &NewMedia<'_>) -> Result<i64> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO media (user_id, file_name, original_name, mime_type, size, sha256)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                rusqlite::params![
                    media.user_id,
                    media.file_name,
                    media.original_name,
                    media.mime_type,
                    media.size,
                    media.sha256,
                ],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    pub fn get_media(&self, id: i64) -> Result<Option<MediaRow>> {
        self.with_conn(|conn| {
            let sql = format!("SELECT {} FROM media WHERE media.id = ?1", MEDIA_COLUMNS);
            conn.query_row(&sql, [id], map_media).optional()
        })
    }

    pub fn list_media(&self) -> Result<Vec<MediaRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {} FROM media ORDER BY media.uploaded_at DESC, media.id DESC",
                MEDIA_COLUMNS
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([], map_media)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Delete the row; profile links cascade and avatars referencing it are cleared.
    pub fn delete_media(&self, id: i64) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute("DELETE FROM media WHERE id = ?1", [id])?;
            Ok(changed > 0)
        })
    }

    // -- Profile media --

    /// Insert the media row and link it to the owner's profile atomically.
    /// Returns (profile_media id, media id).
    pub fn insert_profile_media(&self, media: &NewMedia<'_>) -> Result<(i64, i64)> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            tx.execute(
                "INSERT INTO media (user_id, file_name, original_name, mime_type, size, sha256)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                rusqlite::params![
                    media.user_id,
                    media.file_name,
                    media.original_name,
                    media.mime_type,
                    media.size,
                    media.sha256,
                ],
            )?;
            let media_id = tx.last_insert_rowid();

            tx.execute(
                "INSERT INTO profile_media (user_id, media_id) VALUES (?1, ?2)",
                rusqlite::params![media.user_id, media_id],
            )?;
            let link_id = tx.last_insert_rowid();

            tx.commit()?;
            Ok((link_id, media_id))
        })
    }

    pub fn profile_media_for_user(&self, user_id: i64) -> Result<Vec<MediaRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {} FROM profile_media
                 JOIN media ON profile_media.media_id = media.id
                 WHERE profile_media.user_id = ?1
                 ORDER BY profile_media.created_at DESC, profile_media.id DESC",
                MEDIA_COLUMNS
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([user_id], map_media)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }
}

pub(crate) fn map_media(row: &Row<'_>) -> rusqlite::Result<MediaRow> {
    Ok(MediaRow {
        id: row.get(0)?,
        user_id: row.get(1)?,
        file_name: row.get(2)?,
        original_name: row.get(3)?,
        mime_type: row.get(4)?,
        size: row.get(5)?,
        sha256: row.get(6)?,
        uploaded_at: row.get(7)?,
    })
}
