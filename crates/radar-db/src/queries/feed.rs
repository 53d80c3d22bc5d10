//! Content from the accounts a viewer follows, newest first.

use anyhow::Result;

use super::board::{POST_SELECT, map_post};
use super::media::{MEDIA_COLUMNS, map_media};
use super::merch::{MERCH_SELECT, map_merch};
use super::shows::{SHOW_SELECT, map_show};
use crate::Database;
use crate::models::{MediaRow, MerchRow, PostRow, ShowRow};

const FOLLOWED: &str = "(SELECT followed_id FROM follows WHERE follower_id = ?1)";

impl Database {
    // -- Feed --

    pub fn feed_posts(&self, viewer_id: i64, limit: u32) -> Result<Vec<PostRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "{} WHERE p.user_id IN {} ORDER BY p.created_at DESC, p.id DESC LIMIT ?2",
                POST_SELECT, FOLLOWED
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(rusqlite::params![viewer_id, limit], map_post)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn feed_media(&self, viewer_id: i64, limit: u32) -> Result<Vec<MediaRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {} FROM media WHERE media.user_id IN {}
                 ORDER BY media.uploaded_at DESC, media.id DESC LIMIT ?2",
                MEDIA_COLUMNS, FOLLOWED
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(rusqlite::params![viewer_id, limit], map_media)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Upcoming shows only, soonest first. Dates compare as ISO strings, so
    /// a show dated today still counts.
    pub fn feed_shows(&self, viewer_id: i64, limit: u32) -> Result<Vec<ShowRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "{} WHERE s.artist_id IN {} AND s.date >= date('now')
                 ORDER BY s.date ASC, s.id ASC LIMIT ?2",
                SHOW_SELECT, FOLLOWED
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(rusqlite::params![viewer_id, limit], map_show)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn feed_merch(&self, viewer_id: i64, limit: u32) -> Result<Vec<MerchRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "{} WHERE m.user_id IN {} ORDER BY m.created_at DESC, m.id DESC LIMIT ?2",
                MERCH_SELECT, FOLLOWED
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(rusqlite::params![viewer_id, limit], map_merch)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewMedia;
    use crate::queries::test_support;

    #[test]
    fn test_feed_only_includes_followed_accounts() {
        let db = Database::open_in_memory().unwrap();
        let fan = test_support::user(&db, "fan", false);
        let band = test_support::user(&db, "band", true);
        let stranger = test_support::user(&db, "stranger", true);

        db.follow(fan, band).unwrap();

        db.insert_post(band, None, "new single out").unwrap();
        db.insert_post(stranger, None, "ignored").unwrap();
        db.insert_show(band, "Basement", "2030-02-02", None).unwrap();
        db.insert_merch(band, "Tape", 7.0, 10).unwrap();
        db.insert_merch(stranger, "Patch", 2.0, 1).unwrap();
        db.insert_media(&NewMedia {
            user_id: band,
            file_name: "a.mp4",
            original_name: None,
            mime_type: "video/mp4",
            size: 1,
            sha256: "00",
        })
        .unwrap();

        let posts = db.feed_posts(fan, 50).unwrap();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].content, "new single out");
        assert_eq!(db.feed_shows(fan, 50).unwrap().len(), 1);
        assert_eq!(db.feed_merch(fan, 50).unwrap().len(), 1);
        assert_eq!(db.feed_media(fan, 50).unwrap().len(), 1);

        // Nothing is followed from the other side.
        assert!(db.feed_posts(band, 50).unwrap().is_empty());

        db.unfollow(fan, band).unwrap();
        assert!(db.feed_posts(fan, 50).unwrap().is_empty());
    }

    #[test]
    fn test_feed_shows_skip_past_dates() {
        let db = Database::open_in_memory().unwrap();
        let fan = test_support::user(&db, "fan", false);
        let band = test_support::user(&db, "band", true);
        db.follow(fan, band).unwrap();

        for day in 1..=3 {
            db.insert_show(band, "Old Hall", &format!("2001-01-0{}", day), None).unwrap();
        }
        db.insert_show(band, "Warehouse", "2099-06-01T20:00", None).unwrap();
        db.insert_show(band, "Basement", "2099-05-01", None).unwrap();

        let shows = db.feed_shows(fan, 2).unwrap();
        let venues: Vec<_> = shows.iter().map(|s| s.venue.as_str()).collect();
        assert_eq!(venues, ["Basement", "Warehouse"]);
    }

    #[test]
    fn test_feed_respects_limit() {
        let db = Database::open_in_memory().unwrap();
        let fan = test_support::user(&db, "fan", false);
        let band = test_support::user(&db, "band", true);
        db.follow(fan, band).unwrap();
        for i in 0..5 {
            db.insert_post(band, None, &format!("post {}", i)).unwrap();
        }
        let posts = db.feed_posts(fan, 3).unwrap();
        assert_eq!(posts.len(), 3);
        assert_eq!(posts[0].content, "post 4");
    }
}
