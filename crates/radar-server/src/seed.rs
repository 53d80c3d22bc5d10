//! Demo content for a fresh database.

use anyhow::Context;
use tracing::info;

use radar_db::Database;
use radar_db::models::NewUser;
use radar_types::models::Reaction;

const DEMO_PASSWORD: &str = "password123";

/// Insert demo users, posts, reactions, a comment and a mutual follow.
/// Does nothing once any user exists. Returns whether anything was seeded.
pub fn seed_demo(db: &Database) -> anyhow::Result<bool> {
    if db.count_users()? > 0 {
        return Ok(false);
    }

    let password_hash = radar_api::auth::hash_password(DEMO_PASSWORD)?;
    let create = |name: &str, username: &str, bio: &str, is_artist: bool| -> anyhow::Result<i64> {
        db.create_user(&NewUser {
            name,
            username,
            password_hash: &password_hash,
            email: None,
            bio: Some(bio),
            social: None,
            is_artist,
        })?
        .with_context(|| format!("demo user {} already exists", username))
    };

    let fan = create("Demo Fan", "demo1", "Always at the front row.", false)?;
    let artist = create("Demo Artist", "demoartist", "Basement noise since 2019.", true)?;
    let other = create("Another Fan", "demo2", "Tapes only.", false)?;

    let release = db.insert_post(
        artist,
        Some("New demo out"),
        "Recorded live in the garage. Tell me what you think.",
    )?;
    let question = db.insert_post(fan, None, "Any good shows this weekend?")?;

    db.set_reaction(release, fan, Reaction::Like)?;
    db.set_reaction(release, other, Reaction::Like)?;
    db.set_reaction(question, other, Reaction::Dislike)?;
    db.insert_comment(release, other, "The second track is great.")?;

    db.follow(fan, artist)?;
    db.follow(artist, fan)?;

    info!("Seeded demo data (users demo1, demoartist, demo2)");
    Ok(true)
}
