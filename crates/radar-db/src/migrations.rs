use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);"
    )?;

    let version: i64 = conn
        .query_row("SELECT COALESCE(MAX(version), 0) FROM schema_version", [], |r| r.get(0))?;

    if version < 1 {
        info!("Running migration v1 (initial schema)");
        conn.execute_batch(
            "
            CREATE TABLE users (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                name            TEXT NOT NULL,
                username        TEXT NOT NULL UNIQUE,
                password        TEXT NOT NULL,
                email           TEXT,
                bio             TEXT,
                social          TEXT,
                custom_html     TEXT,
                is_artist       INTEGER NOT NULL DEFAULT 0,
                avatar_media_id INTEGER REFERENCES media(id) ON DELETE SET NULL,
                fan_points      INTEGER NOT NULL DEFAULT 0,
                artist_points   INTEGER NOT NULL DEFAULT 0,
                fan_level_id    INTEGER REFERENCES levels(id),
                artist_level_id INTEGER REFERENCES levels(id),
                created_at      TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE TABLE messages (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                sender_id   INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                receiver_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                content     TEXT NOT NULL,
                created_at  TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE INDEX idx_messages_receiver ON messages(receiver_id, created_at);
            CREATE INDEX idx_messages_sender ON messages(sender_id, created_at);

            CREATE TABLE media (
                id            INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id       INTEGER REFERENCES users(id) ON DELETE CASCADE,
                file_name     TEXT NOT NULL UNIQUE,
                original_name TEXT,
                mime_type     TEXT NOT NULL,
                size          INTEGER NOT NULL,
                sha256        TEXT NOT NULL,
                uploaded_at   TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE TABLE profile_media (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id     INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                media_id    INTEGER NOT NULL REFERENCES media(id) ON DELETE CASCADE,
                created_at  TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE INDEX idx_profile_media_user ON profile_media(user_id, created_at);

            CREATE TABLE shows (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                artist_id   INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                venue       TEXT NOT NULL,
                date        TEXT NOT NULL,
                description TEXT,
                created_at  TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE TABLE merch (
                id           INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id      INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                product_name TEXT NOT NULL,
                price        REAL NOT NULL,
                stock        INTEGER NOT NULL DEFAULT 0,
                created_at   TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE TABLE board_posts (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id     INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                headline    TEXT,
                content     TEXT NOT NULL,
                created_at  TEXT NOT NULL DEFAULT (datetime('now')),
                updated_at  TEXT
            );

            CREATE INDEX idx_board_posts_user ON board_posts(user_id, created_at);

            CREATE TABLE board_reactions (
                post_id     INTEGER NOT NULL REFERENCES board_posts(id) ON DELETE CASCADE,
                user_id     INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                reaction    INTEGER NOT NULL CHECK (reaction IN (1, -1)),
                created_at  TEXT NOT NULL DEFAULT (datetime('now')),
                UNIQUE(post_id, user_id)
            );

            CREATE TABLE board_comments (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                post_id     INTEGER NOT NULL REFERENCES board_posts(id) ON DELETE CASCADE,
                user_id     INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                content     TEXT NOT NULL,
                created_at  TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE INDEX idx_board_comments_post ON board_comments(post_id, created_at);

            CREATE TABLE follows (
                follower_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                followed_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                created_at  TEXT NOT NULL DEFAULT (datetime('now')),
                PRIMARY KEY (follower_id, followed_id),
                CHECK (follower_id != followed_id)
            );

            CREATE INDEX idx_follows_followed ON follows(followed_id);

            CREATE TABLE notifications (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id     INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                message     TEXT NOT NULL,
                is_read     INTEGER NOT NULL DEFAULT 0,
                created_at  TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE INDEX idx_notifications_user ON notifications(user_id, is_read);

            CREATE TABLE levels (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                kind        TEXT NOT NULL CHECK (kind IN ('fan', 'artist')),
                name        TEXT NOT NULL,
                threshold   INTEGER NOT NULL,
                UNIQUE(kind, name)
            );

            CREATE TABLE badges (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                kind        TEXT NOT NULL CHECK (kind IN ('fan', 'artist')),
                name        TEXT NOT NULL,
                description TEXT NOT NULL,
                UNIQUE(kind, name)
            );

            CREATE TABLE user_badges (
                user_id     INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                badge_id    INTEGER NOT NULL REFERENCES badges(id) ON DELETE CASCADE,
                awarded_at  TEXT NOT NULL DEFAULT (datetime('now')),
                PRIMARY KEY (user_id, badge_id)
            );

            INSERT INTO levels (kind, name, threshold) VALUES
                ('fan', 'Listener', 0),
                ('fan', 'Supporter', 25),
                ('fan', 'Superfan', 100),
                ('fan', 'Tastemaker', 250),
                ('artist', 'Garage Band', 0),
                ('artist', 'Local Act', 25),
                ('artist', 'Headliner', 100),
                ('artist', 'Legend', 250);

            INSERT INTO badges (kind, name, description) VALUES
                ('fan', 'Debut Release', 'Uploaded your first profile media'),
                ('fan', 'First Post', 'Posted on the board'),
                ('fan', 'First Comment', 'Commented on a board post'),
                ('fan', 'First Message', 'Sent a direct message'),
                ('fan', 'First Follow', 'Followed someone'),
                ('fan', 'First Fan', 'Gained a follower'),
                ('artist', 'Debut Release', 'Uploaded your first release'),
                ('artist', 'First Post', 'Posted on the board'),
                ('artist', 'First Comment', 'Commented on a board post'),
                ('artist', 'First Message', 'Sent a direct message'),
                ('artist', 'First Follow', 'Followed someone'),
                ('artist', 'First Fan', 'Gained your first fan');

            INSERT INTO schema_version (version) VALUES (1);
            "
        )?;
    }

    if version < 2 {
        info!("Running migration v2 (reward grants)");
        conn.execute_batch(
            "
            CREATE TABLE reward_grants (
                user_id     INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                action      TEXT NOT NULL,
                target_id   INTEGER NOT NULL,
                granted_at  TEXT NOT NULL DEFAULT (datetime('now')),
                PRIMARY KEY (user_id, action, target_id)
            );

            INSERT INTO schema_version (version) VALUES (2);
            "
        )?;
    }

    info!("Database migrations complete");
    Ok(())
}
