use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use jsonwebtoken::{EncodingKey, Header, encode};
use tracing::info;

use radar_db::models::NewUser;
use radar_types::api::{AuthResponse, Claims, LoginRequest, RegisterRequest};

use crate::error::{ApiError, ApiResult};
use crate::extract::ApiJson;
use crate::state::{AppState, blocking};
use crate::validate::{Checks, non_empty};

pub async fn register(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<RegisterRequest>,
) -> ApiResult<impl IntoResponse> {
    let username = req.username.trim().to_owned();
    Checks::new()
        .required("name", &req.name)
        .required("username", &username)
        .length("username", &username, 3, 32)
        .required("password", &req.password)
        .finish()?;

    // Argon2 is CPU-bound.
    let password = req.password;
    let password_hash = tokio::task::spawn_blocking(move || hash_password(&password)).await??;

    let name = req.name.trim().to_owned();
    let email = non_empty(req.email);
    let bio = non_empty(req.bio);
    let social = non_empty(req.social);
    let is_artist = req.is_artist;
    let uname = username.clone();

    let user_id = blocking(&state, move |db| {
        db.create_user(&NewUser {
            name: &name,
            username: &uname,
            password_hash: &password_hash,
            email: email.as_deref(),
            bio: bio.as_deref(),
            social: social.as_deref(),
            is_artist,
        })
    })
    .await?
    .ok_or_else(|| ApiError::Conflict("Username already taken".into()))?;

    let token = create_token(&state, user_id, &username, is_artist)?;
    info!("Registered {} (id {}, artist: {})", username, user_id, is_artist);

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            id: user_id,
            username,
            is_artist,
            token,
        }),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> ApiResult<Json<AuthResponse>> {
    let invalid = || ApiError::unauthorized("Invalid credentials");

    let username = req.username.trim().to_owned();
    let user = blocking(&state, move |db| db.get_user_by_username(&username))
        .await?
        .ok_or_else(invalid)?;

    let stored_hash = user.password.clone();
    let password = req.password;
    let verified =
        tokio::task::spawn_blocking(move || verify_password(&password, &stored_hash)).await??;
    if !verified {
        return Err(invalid());
    }

    let token = create_token(&state, user.id, &user.username, user.is_artist)?;

    Ok(Json(AuthResponse {
        id: user.id,
        username: user.username,
        is_artist: user.is_artist,
        token,
    }))
}

pub fn hash_password(password: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("password hashing failed: {}", e))?
        .to_string();
    Ok(hash)
}

pub fn verify_password(password: &str, hash: &str) -> anyhow::Result<bool> {
    let parsed =
        PasswordHash::new(hash).map_err(|e| anyhow::anyhow!("stored hash is corrupt: {}", e))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

pub fn create_token(
    state: &AppState,
    user_id: i64,
    username: &str,
    is_artist: bool,
) -> anyhow::Result<String> {
    let claims = Claims {
        sub: user_id,
        username: username.to_string(),
        is_artist,
        exp: (chrono::Utc::now() + state.token_ttl).timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(state.jwt_secret.as_bytes()),
    )?;

    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("password123").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("password123", &hash).unwrap());
        assert!(!verify_password("wrong", &hash).unwrap());
        assert!(verify_password("x", "not a hash").is_err());
    }
}
