//! End-to-end tests driving the full router against an in-memory database.

use std::path::PathBuf;

use axum::{
    Router,
    body::Body,
    http::{HeaderMap, Method, Request, StatusCode, header},
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;
use uuid::Uuid;

use radar_api::{ApiConfig, AppState, build, build_state};
use radar_db::Database;

const PNG_BYTES: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDRfake-image-data";

struct TestApp {
    router: Router,
    state: AppState,
    upload_dir: PathBuf,
    scratch_dir: PathBuf,
}

impl Drop for TestApp {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.upload_dir);
        let _ = std::fs::remove_dir_all(&self.scratch_dir);
    }
}

struct Reply {
    status: StatusCode,
    headers: HeaderMap,
    body: Vec<u8>,
}

impl Reply {
    fn json(&self) -> Value {
        if self.body.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&self.body).unwrap()
        }
    }
}

impl TestApp {
    async fn new() -> Self {
        Self::with_scanner(None).await
    }

    /// An app whose virus scanner is a shell script with the given body.
    async fn with_scanner(script: Option<&str>) -> Self {
        let id = Uuid::new_v4();
        let upload_dir = std::env::temp_dir().join(format!("radar-api-test-{}", id));
        let scratch_dir = std::env::temp_dir().join(format!("radar-api-scratch-{}", id));
        std::fs::create_dir_all(&scratch_dir).unwrap();

        let scan_command = script.map(|body| {
            let path = scratch_dir.join("scan.sh");
            std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
            }
            path.to_string_lossy().into_owned()
        });

        let db = Database::open_in_memory().unwrap();
        let state = build_state(
            db,
            ApiConfig {
                jwt_secret: "test-secret".into(),
                token_ttl_days: 1,
                upload_dir: upload_dir.clone(),
                max_upload_bytes: 1024 * 1024,
                scan_command,
            },
        )
        .await
        .unwrap();
        Self {
            router: build(state.clone()),
            state,
            upload_dir,
            scratch_dir,
        }
    }

    fn stored_files(&self) -> usize {
        std::fs::read_dir(&self.upload_dir).unwrap().count()
    }

    async fn send(&self, req: Request<Body>) -> Reply {
        let resp = self.router.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let headers = resp.headers().clone();
        let body = resp.into_body().collect().await.unwrap().to_bytes().to_vec();
        Reply {
            status,
            headers,
            body,
        }
    }

    async fn call(&self, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> Reply {
        let mut req = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            req = req.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let req = match body {
            Some(body) => req
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => req.body(Body::empty()).unwrap(),
        };
        self.send(req).await
    }

    async fn get(&self, uri: &str, token: Option<&str>) -> Reply {
        self.call(Method::GET, uri, token, None).await
    }

    async fn post(&self, uri: &str, token: &str, body: Value) -> Reply {
        self.call(Method::POST, uri, Some(token), Some(body)).await
    }

    /// Register a user and return (id, token).
    async fn register(&self, username: &str, is_artist: bool) -> (i64, String) {
        let reply = self
            .call(
                Method::POST,
                "/auth/register",
                None,
                Some(json!({
                    "name": username,
                    "username": username,
                    "password": "password123",
                    "is_artist": is_artist,
                })),
            )
            .await;
        assert_eq!(reply.status, StatusCode::CREATED);
        let body = reply.json();
        (
            body["id"].as_i64().unwrap(),
            body["token"].as_str().unwrap().to_owned(),
        )
    }

    async fn upload(&self, uri: &str, token: &str, file_name: &str, content_type: &str, data: &[u8]) -> Reply {
        let boundary = "radar-test-boundary";
        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--{boundary}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(data);
        body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

        let req = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", boundary),
            )
            .body(Body::from(body))
            .unwrap();
        self.send(req).await
    }
}

#[tokio::test]
async fn test_register_login_and_auth_guard() {
    let app = TestApp::new().await;
    let (id, token) = app.register("ann", false).await;

    let login = app
        .call(
            Method::POST,
            "/auth/login",
            None,
            Some(json!({"username": "ann", "password": "password123"})),
        )
        .await;
    assert_eq!(login.status, StatusCode::OK);
    assert_eq!(login.json()["id"], id);

    let wrong = app
        .call(
            Method::POST,
            "/auth/login",
            None,
            Some(json!({"username": "ann", "password": "nope"})),
        )
        .await;
    assert_eq!(wrong.status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong.json()["error"], "Invalid credentials");

    let dup = app
        .call(
            Method::POST,
            "/auth/register",
            None,
            Some(json!({"name": "Ann", "username": "ann", "password": "x"})),
        )
        .await;
    assert_eq!(dup.status, StatusCode::CONFLICT);

    let missing = app
        .call(Method::POST, "/auth/register", None, Some(json!({"username": "bo"})))
        .await;
    assert_eq!(missing.status, StatusCode::BAD_REQUEST);
    let details = missing.json()["details"].as_array().unwrap().len();
    assert_eq!(details, 3); // name, username length, password

    let no_token = app.get("/messages/inbox", None).await;
    assert_eq!(no_token.status, StatusCode::UNAUTHORIZED);
    assert_eq!(no_token.json()["error"], "Token required");

    let bad_token = app.get("/messages/inbox", Some("garbage")).await;
    assert_eq!(bad_token.json()["error"], "Invalid token");

    let ok = app.get("/messages/inbox", Some(&token)).await;
    assert_eq!(ok.status, StatusCode::OK);
    assert_eq!(ok.json(), json!([]));
}

#[tokio::test]
async fn test_likes_count_once_per_user() {
    let app = TestApp::new().await;
    let (_, author) = app.register("author", true).await;
    let (_, ben) = app.register("ben", false).await;
    let (_, cat) = app.register("cat", false).await;

    let post = app
        .post("/board", &author, json!({"headline": "New EP", "content": "Out now"}))
        .await;
    assert_eq!(post.status, StatusCode::CREATED);
    let post_id = post.json()["id"].as_i64().unwrap();
    let like_uri = format!("/board/{}/like", post_id);

    let first = app.post(&like_uri, &ben, json!({})).await.json();
    assert_eq!(first["likes"], 1);
    let repeat = app.post(&like_uri, &ben, json!({})).await.json();
    assert_eq!(repeat["likes"], 1);
    let second = app.post(&like_uri, &cat, json!({})).await.json();
    assert_eq!(second["likes"], 2);

    let flipped = app
        .post(&format!("/board/{}/dislike", post_id), &cat, json!({}))
        .await
        .json();
    assert_eq!(flipped["reaction"], -1);
    assert_eq!((flipped["likes"].as_i64(), flipped["dislikes"].as_i64()), (Some(1), Some(1)));

    let removed = app
        .call(Method::DELETE, &format!("/board/{}/reaction", post_id), Some(&ben), None)
        .await;
    assert_eq!(removed.json()["removed"], true);
    assert_eq!(app.get(&format!("/board/{}", post_id), None).await.json()["likes"], 0);

    // The author heard about the two likes.
    let unread = app.get("/notifications/unread_count", Some(&author)).await.json();
    assert_eq!(unread["count"], 2);

    let missing = app.post("/board/9999/like", &ben, json!({})).await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_follow_notifies_and_drives_feed() {
    let app = TestApp::new().await;
    let (fan_id, fan) = app.register("fan", false).await;
    let (band_id, band) = app.register("band", true).await;

    app.post("/board", &band, json!({"content": "tour dates soon"})).await;
    app.post("/shows", &band, json!({"venue": "The Pit", "date": "2030-06-01"})).await;

    let empty = app.get("/feed", Some(&fan)).await.json();
    assert_eq!(empty["posts"], json!([]));

    let self_follow = app.post(&format!("/follow/{}", fan_id), &fan, json!({})).await;
    assert_eq!(self_follow.status, StatusCode::BAD_REQUEST);
    assert_eq!(self_follow.json()["error"], "Cannot follow yourself");
    let ghost = app.post("/follow/4242", &fan, json!({})).await;
    assert_eq!(ghost.status, StatusCode::NOT_FOUND);

    let followed = app.post(&format!("/follow/{}", band_id), &fan, json!({})).await;
    assert_eq!(followed.json()["followed"], true);
    let status = app.get(&format!("/follow/{}", band_id), Some(&fan)).await.json();
    assert_eq!(status["following"], true);

    let notes = app.get("/notifications", Some(&band)).await.json();
    assert_eq!(notes.as_array().unwrap().len(), 1);
    assert_eq!(notes[0]["message"], "fan started following you");

    let followers = app.get(&format!("/follow/followers/{}", band_id), None).await.json();
    assert_eq!(followers[0]["username"], "fan");

    let feed = app.get("/feed", Some(&fan)).await.json();
    assert_eq!(feed["posts"].as_array().unwrap().len(), 1);
    assert_eq!(feed["shows"][0]["venue"], "The Pit");

    // Both sides were rewarded.
    let band_summary = app.get(&format!("/gamification/users/{}", band_id), None).await.json();
    assert_eq!(band_summary["artist_points"], 10 + 3);
    let fan_summary = app.get(&format!("/gamification/users/{}", fan_id), None).await.json();
    assert_eq!(fan_summary["fan_points"], 1);
    assert_eq!(fan_summary["badges"][0]["name"], "First Follow");

    let unfollowed = app
        .call(Method::DELETE, &format!("/follow/{}", band_id), Some(&fan), None)
        .await;
    assert_eq!(unfollowed.json()["unfollowed"], true);
    let feed = app.get("/feed", Some(&fan)).await.json();
    assert_eq!(feed["posts"], json!([]));

    let read_all = app.post("/notifications/read_all", &band, json!({})).await.json();
    assert_eq!(read_all["updated"], 1);
}

#[tokio::test]
async fn test_upload_download_and_ranges() {
    let app = TestApp::new().await;
    let (_, owner) = app.register("owner", false).await;
    let (_, other) = app.register("other", false).await;

    let data: Vec<u8> = (0u8..=99).collect();
    let uploaded = app
        .upload("/media", &owner, "track one.bin", "application/octet-stream", &data)
        .await;
    assert_eq!(uploaded.status, StatusCode::CREATED);
    let body = uploaded.json();
    let id = body["id"].as_i64().unwrap();
    assert_eq!(body["size"], 100);
    assert!(body["file"].as_str().unwrap().ends_with(".bin"));

    let full = app.get(&format!("/media/{}", id), None).await;
    assert_eq!(full.status, StatusCode::OK);
    assert_eq!(full.body, data);
    assert_eq!(full.headers[header::ACCEPT_RANGES], "bytes");

    let req = Request::builder()
        .uri(format!("/media/{}", id))
        .header(header::RANGE, "bytes=10-19")
        .body(Body::empty())
        .unwrap();
    let partial = app.send(req).await;
    assert_eq!(partial.status, StatusCode::PARTIAL_CONTENT);
    assert_eq!(partial.body, data[10..20].to_vec());
    assert_eq!(partial.headers[header::CONTENT_RANGE], "bytes 10-19/100");

    let req = Request::builder()
        .uri(format!("/media/{}", id))
        .header(header::RANGE, "bytes=500-")
        .body(Body::empty())
        .unwrap();
    assert_eq!(app.send(req).await.status, StatusCode::RANGE_NOT_SATISFIABLE);

    let listed = app.get("/media", None).await.json();
    assert_eq!(listed[0]["original_name"], "track one.bin");

    let denied = app
        .call(Method::DELETE, &format!("/media/{}", id), Some(&other), None)
        .await;
    assert_eq!(denied.status, StatusCode::FORBIDDEN);
    let deleted = app
        .call(Method::DELETE, &format!("/media/{}", id), Some(&owner), None)
        .await;
    assert_eq!(deleted.json()["deleted"], true);
    assert_eq!(app.get(&format!("/media/{}", id), None).await.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_profile_media_types_and_reward() {
    let app = TestApp::new().await;
    let (id, token) = app.register("painter", true).await;

    let text = app
        .upload("/profile-media", &token, "notes.txt", "text/plain", b"just text")
        .await;
    assert_eq!(text.status, StatusCode::BAD_REQUEST);
    assert_eq!(text.json()["error"], "Invalid MIME type");

    // Declared type is wrong but the bytes are a PNG.
    let png = app
        .upload("/profile-media", &token, "cover.png", "application/octet-stream", PNG_BYTES)
        .await;
    assert_eq!(png.status, StatusCode::CREATED);
    let media_id = png.json()["media_id"].as_i64().unwrap();

    let listed = app.get(&format!("/profile-media/user/{}", id), None).await.json();
    assert_eq!(listed[0]["id"], media_id);
    assert_eq!(listed[0]["mime_type"], "image/png");

    let avatar = app.post("/users/avatar", &token, json!({"media_id": media_id})).await;
    assert_eq!(avatar.json()["updated"], 1);
    let profile = app.get(&format!("/users/{}", id), None).await.json();
    assert_eq!(profile["avatar_media_id"], media_id);

    let summary = app.get(&format!("/gamification/users/{}", id), None).await.json();
    assert_eq!(summary["artist_points"], 5);
    assert_eq!(summary["badges"][0]["name"], "Debut Release");
}

#[tokio::test]
async fn test_edit_and_delete_are_author_only() {
    let app = TestApp::new().await;
    let (_, author) = app.register("author", false).await;
    let (_, other) = app.register("other", false).await;

    let post = app.post("/board", &author, json!({"content": "draft"})).await.json();
    let uri = format!("/board/{}", post["id"]);
    assert_eq!(post["updated_at"], Value::Null);

    let hijack = app
        .call(Method::PUT, &uri, Some(&other), Some(json!({"content": "mine now"})))
        .await;
    assert_eq!(hijack.status, StatusCode::FORBIDDEN);

    let edited = app
        .call(Method::PUT, &uri, Some(&author), Some(json!({"headline": "Final"})))
        .await
        .json();
    assert_eq!(edited["headline"], "Final");
    assert_eq!(edited["content"], "draft");
    assert!(edited["updated_at"].is_string());

    app.post(&format!("{}/comments", uri), &other, json!({"content": "nice"})).await;
    let comments = app.get(&format!("{}/comments", uri), None).await.json();
    assert_eq!(comments[0]["username"], "other");

    let denied = app.call(Method::DELETE, &uri, Some(&other), None).await;
    assert_eq!(denied.status, StatusCode::FORBIDDEN);
    let deleted = app.call(Method::DELETE, &uri, Some(&author), None).await;
    assert_eq!(deleted.json()["deleted"], true);
    assert_eq!(app.get(&uri, None).await.status, StatusCode::NOT_FOUND);
    assert_eq!(
        app.get(&format!("{}/comments", uri), None).await.status,
        StatusCode::NOT_FOUND
    );
}

#[tokio::test]
async fn test_posting_grants_points_and_badge() {
    let app = TestApp::new().await;
    let (id, token) = app.register("poster", false).await;

    let before = app.get(&format!("/gamification/users/{}", id), None).await.json();
    assert_eq!(before["fan_level"]["name"], "Listener");

    for i in 0..3 {
        app.post("/board", &token, json!({"content": format!("post {}", i)})).await;
    }

    let after = app.get(&format!("/gamification/users/{}", id), None).await.json();
    assert_eq!(after["fan_points"], 30);
    assert_eq!(after["artist_points"], 0);
    assert_eq!(after["fan_level"]["name"], "Supporter");
    let badges = after["badges"].as_array().unwrap();
    assert_eq!(badges.len(), 1);
    assert_eq!(badges[0]["name"], "First Post");

    let board = app.get("/leaderboard/fans", None).await.json();
    assert_eq!(board[0]["username"], "poster");
    assert_eq!(board[0]["points"], 30);
    assert_eq!(app.get("/leaderboard/artists", None).await.json(), json!([]));

    let trending = app.get("/board/trending?limit=2", None).await.json();
    assert_eq!(trending.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_messages_between_users() {
    let app = TestApp::new().await;
    let (ann_id, ann) = app.register("ann", false).await;
    let (bob_id, bob) = app.register("bob", true).await;

    let ghost = app
        .post("/messages", &ann, json!({"receiver_id": 999, "content": "hello?"}))
        .await;
    assert_eq!(ghost.status, StatusCode::NOT_FOUND);

    let empty = app
        .post("/messages", &ann, json!({"receiver_id": bob_id, "content": "  "}))
        .await;
    assert_eq!(empty.status, StatusCode::BAD_REQUEST);

    let sent = app
        .post("/messages", &ann, json!({"receiver_id": bob_id, "content": "love the demo"}))
        .await;
    assert_eq!(sent.status, StatusCode::CREATED);
    assert_eq!(sent.json()["sender_id"], ann_id);

    app.post("/messages", &bob, json!({"receiver_id": ann_id, "content": "thanks!"}))
        .await;

    let inbox = app.get("/messages/inbox", Some(&bob)).await.json();
    assert_eq!(inbox[0]["content"], "love the demo");
    assert_eq!(inbox[0]["sender_username"], "ann");

    let convo = app
        .get(&format!("/messages/conversation/{}", bob_id), Some(&ann))
        .await
        .json();
    assert_eq!(convo.as_array().unwrap().len(), 2);
    assert_eq!(convo[0]["content"], "love the demo");

    let unread = app.get("/notifications/unread_count", Some(&bob)).await.json();
    assert_eq!(unread["count"], 1);
}

#[tokio::test]
async fn test_shows_and_merch_rules() {
    let app = TestApp::new().await;
    let (_, fan) = app.register("fan", false).await;
    let (band_id, band) = app.register("band", true).await;

    let forbidden = app
        .post("/shows", &fan, json!({"venue": "Garage", "date": "2030-01-01"}))
        .await;
    assert_eq!(forbidden.status, StatusCode::FORBIDDEN);

    let bad_date = app
        .post("/shows", &band, json!({"venue": "Garage", "date": "someday"}))
        .await;
    assert_eq!(bad_date.status, StatusCode::BAD_REQUEST);
    assert_eq!(bad_date.json()["details"][0]["field"], "date");

    let created = app
        .post(
            "/shows",
            &band,
            json!({"venue": "<Club>", "date": "2030-01-01T21:00", "description": "R&B night"}),
        )
        .await;
    assert_eq!(created.status, StatusCode::CREATED);
    let shows = app.get(&format!("/shows/user/{}", band_id), None).await.json();
    assert_eq!(shows[0]["venue"], "&lt;Club&gt;");
    assert_eq!(shows[0]["description"], "R&amp;B night");

    let negative = app
        .post("/merch", &band, json!({"product_name": "Tee", "price": -1.0}))
        .await;
    assert_eq!(negative.status, StatusCode::BAD_REQUEST);

    let merch = app
        .post("/merch", &band, json!({"product_name": "Tee", "price": 15.5}))
        .await;
    assert_eq!(merch.status, StatusCode::CREATED);
    let merch_id = merch.json()["id"].as_i64().unwrap();
    let listed = app.get("/merch", None).await.json();
    assert_eq!(listed[0]["stock"], 0);

    let denied = app
        .call(Method::DELETE, &format!("/merch/{}", merch_id), Some(&fan), None)
        .await;
    assert_eq!(denied.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_health_metrics_and_fallback() {
    let app = TestApp::new().await;

    let health = app.get("/health", None).await;
    assert_eq!(health.json(), json!({"status": "ok"}));
    assert!(health.headers.contains_key("x-request-id"));

    let missing = app.get("/definitely/not/here", None).await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
    assert_eq!(missing.json(), json!({"error": "Not found"}));

    let metrics = app.get("/metrics", None).await.json();
    assert_eq!(metrics["totalRequests"], 2);
    assert_eq!(metrics["totalErrors"], 1);
    assert!(metrics["avgResponseTime"].is_number());
}

#[tokio::test]
async fn test_follow_cycles_reward_once() {
    let app = TestApp::new().await;
    let (fan_id, fan) = app.register("fan", false).await;
    let (band_id, band) = app.register("band", true).await;
    let uri = format!("/follow/{}", band_id);

    for _ in 0..5 {
        let followed = app.post(&uri, &fan, json!({})).await;
        assert_eq!(followed.json()["followed"], true);
        let unfollowed = app.call(Method::DELETE, &uri, Some(&fan), None).await;
        assert_eq!(unfollowed.json()["unfollowed"], true);
    }

    let band_summary = app.get(&format!("/gamification/users/{}", band_id), None).await.json();
    assert_eq!(band_summary["artist_points"], 3);
    assert_eq!(band_summary["artist_level"]["name"], "Garage Band");
    let fan_summary = app.get(&format!("/gamification/users/{}", fan_id), None).await.json();
    assert_eq!(fan_summary["fan_points"], 1);

    let unread = app.get("/notifications/unread_count", Some(&band)).await.json();
    assert_eq!(unread["count"], 1);
}

#[tokio::test]
async fn test_like_cycles_reward_once() {
    let app = TestApp::new().await;
    let (fan_id, fan) = app.register("fan", false).await;
    let (_, band) = app.register("band", true).await;

    let post = app.post("/board", &band, json!({"content": "new single"})).await.json();
    let like_uri = format!("/board/{}/like", post["id"]);
    let dislike_uri = format!("/board/{}/dislike", post["id"]);

    for _ in 0..5 {
        assert_eq!(app.post(&like_uri, &fan, json!({})).await.json()["likes"], 1);
        assert_eq!(app.post(&dislike_uri, &fan, json!({})).await.json()["likes"], 0);
    }
    let reaction_uri = format!("/board/{}/reaction", post["id"]);
    app.call(Method::DELETE, &reaction_uri, Some(&fan), None).await;
    assert_eq!(app.post(&like_uri, &fan, json!({})).await.json()["likes"], 1);

    let fan_summary = app.get(&format!("/gamification/users/{}", fan_id), None).await.json();
    assert_eq!(fan_summary["fan_points"], 1);
    assert_eq!(fan_summary["fan_level"]["name"], "Listener");

    let unread = app.get("/notifications/unread_count", Some(&band)).await.json();
    assert_eq!(unread["count"], 1);
}

#[tokio::test]
async fn test_profile_media_rejects_other_iso_brands() {
    let app = TestApp::new().await;
    let (_, token) = app.register("snapper", false).await;

    let heic = b"\0\0\0\x18ftypheic\0\0\0\0mif1heic";
    let reply = app
        .upload("/profile-media", &token, "photo.heic", "image/heic", heic)
        .await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.json()["error"], "Invalid MIME type");

    // A HEIC labelled as MP4 is still caught by its brand.
    let reply = app
        .upload("/profile-media", &token, "photo.mp4", "video/mp4", heic)
        .await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);

    let mp4 = b"\0\0\0\x18ftypmp42\0\0\0\0mp42isom";
    let reply = app
        .upload("/profile-media", &token, "clip.mp4", "application/octet-stream", mp4)
        .await;
    assert_eq!(reply.status, StatusCode::CREATED);
}

#[cfg(unix)]
#[tokio::test]
async fn test_infected_upload_is_rejected_and_removed() {
    let app = TestApp::with_scanner(Some("echo \"$1: Eicar-Test-Signature FOUND\"\nexit 1")).await;
    let (_, token) = app.register("uploader", false).await;

    let reply = app
        .upload("/media", &token, "eicar.txt", "text/plain", b"not really a virus")
        .await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.json()["error"], "Infected file");
    assert_eq!(app.stored_files(), 0);
    assert_eq!(app.get("/media", None).await.json(), json!([]));

    let reply = app
        .upload("/profile-media", &token, "cover.png", "image/png", PNG_BYTES)
        .await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(app.stored_files(), 0);
}

#[cfg(unix)]
#[tokio::test]
async fn test_failed_scan_is_a_server_error() {
    let app = TestApp::with_scanner(Some("exit 40")).await;
    let (_, token) = app.register("uploader", false).await;

    let reply = app
        .upload("/media", &token, "song.mp3", "audio/mpeg", b"ID3\x04\0tune")
        .await;
    assert_eq!(reply.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(reply.json()["error"], "Virus scan failed");
    assert_eq!(app.stored_files(), 0);
    assert_eq!(app.get("/media", None).await.json(), json!([]));
}

#[cfg(unix)]
#[tokio::test]
async fn test_clean_scan_keeps_upload() {
    let app = TestApp::with_scanner(Some("echo \"$1: OK\"\nexit 0")).await;
    let (_, token) = app.register("uploader", false).await;

    let reply = app
        .upload("/media", &token, "demo.bin", "application/octet-stream", b"raw bytes")
        .await;
    assert_eq!(reply.status, StatusCode::CREATED);
    assert_eq!(app.stored_files(), 1);
}

#[tokio::test]
async fn test_failed_insert_removes_stored_file() {
    let app = TestApp::new().await;
    // Valid signature, but no such user row: the media insert hits the foreign key.
    let token = radar_api::auth::create_token(&app.state, 4242, "ghost", false).unwrap();

    let reply = app
        .upload("/media", &token, "orphan.bin", "application/octet-stream", b"orphan")
        .await;
    assert_eq!(reply.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(reply.json()["error"], "Internal server error");
    assert_eq!(app.stored_files(), 0);
    assert_eq!(app.get("/media", None).await.json(), json!([]));
}
