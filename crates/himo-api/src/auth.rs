use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::{
    body::Bytes,
    extract::State,
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
};
use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use himo_db::him_id::HashedHimIds;
use himo_db::models::{Registration, UserRow};
use himo_db::time;
use himo_types::api::{AuthRequest, AuthResponse, UserProfile};

use crate::error::ApiError;
use crate::request::parse_body;
use crate::response;
use crate::state::{AppState, with_store};

const MIN_CREDENTIAL_LEN: usize = 3;

/// Prefix reserved for soft-deleted accounts.
const DELETED_PREFIX: &str = "DELETED_";

pub async fn handle(State(state): State<AppState>, method: Method, body: Bytes) -> Response {
    match dispatch(&state, method, body).await {
        Ok(res) => res,
        Err(e) => e.into_response(),
    }
}

async fn dispatch(state: &AppState, method: Method, body: Bytes) -> Result<Response, ApiError> {
    state.store()?;

    if method != Method::POST {
        return Err(ApiError::MethodNotAllowed);
    }

    let req: AuthRequest = parse_body(&body)?;
    match req.action.as_deref() {
        Some("login") => login(state, req).await,
        Some("register") => register(state, req).await,
        _ => Err(ApiError::MethodNotAllowed),
    }
}

async fn login(state: &AppState, req: AuthRequest) -> Result<Response, ApiError> {
    let username = req.username.trim().to_string();
    let password = req.password.trim().to_string();
    if username.is_empty() || password.is_empty() {
        return Err(ApiError::invalid("Username and password required"));
    }

    let user = with_store(state, move |db| {
        let user = db
            .get_user_by_username(&username)?
            .ok_or(ApiError::InvalidCredentials)?;

        if !verify_password(&password, &user.password_hash)? {
            return Err(ApiError::InvalidCredentials);
        }
        if user.is_banned {
            warn!("Banned user {} tried to log in", user.id);
            return Err(ApiError::AccountBanned);
        }

        db.record_login(user.id, Utc::now())?
            .ok_or_else(|| ApiError::Internal(anyhow::anyhow!("User {} vanished during login", user.id)))
    })
    .await?;

    info!("User {} ({}) logged in", user.username, user.id);
    Ok(response::json(
        StatusCode::OK,
        &AuthResponse {
            success: true,
            user: profile(&user)?,
        },
    ))
}

async fn register(state: &AppState, req: AuthRequest) -> Result<Response, ApiError> {
    let username = req.username.trim().to_string();
    let password = req.password.trim().to_string();
    if username.is_empty() || password.is_empty() {
        return Err(ApiError::invalid("Username and password required"));
    }
    if username.chars().count() < MIN_CREDENTIAL_LEN || password.chars().count() < MIN_CREDENTIAL_LEN {
        return Err(ApiError::invalid(
            "Username and password must be at least 3 characters",
        ));
    }
    if username.starts_with(DELETED_PREFIX) {
        return Err(ApiError::invalid("Username is reserved"));
    }

    let user = with_store(state, move |db| {
        // Cheap pre-check so taken names don't pay for a hash
        if db.get_user_by_username(&username)?.is_some() {
            return Err(ApiError::UsernameTaken);
        }

        let password_hash = hash_password(&password)?;
        let mut him_ids = HashedHimIds::new(Uuid::new_v4());

        match db.register_user(&username, &password_hash, &mut him_ids, Utc::now())? {
            Registration::Created(user) => Ok(user),
            Registration::UsernameTaken => Err(ApiError::UsernameTaken),
            Registration::HimIdExhausted => Err(ApiError::IdGenerationExhausted),
        }
    })
    .await?;

    info!("Registered user {} ({}) as {}", user.username, user.id, user.him_id);
    Ok(response::json(
        StatusCode::CREATED,
        &AuthResponse {
            success: true,
            user: profile(&user)?,
        },
    ))
}

/// Argon2id PHC string for a new secret.
pub fn hash_password(password: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("password hashing failed: {}", e))?;
    Ok(hash.to_string())
}

fn verify_password(password: &str, stored: &str) -> Result<bool, ApiError> {
    let parsed = PasswordHash::new(stored)
        .map_err(|e| anyhow::anyhow!("stored password hash is unreadable: {}", e))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

/// Public projection of a user row. Drops the credential secret.
pub(crate) fn profile(row: &UserRow) -> Result<UserProfile, ApiError> {
    Ok(UserProfile {
        id: row.id,
        username: row.username.clone(),
        him_id: row.him_id.clone(),
        him_coins: row.him_coins,
        is_premium: row.is_premium,
        is_verified: row.is_verified,
        is_admin: row.is_admin,
        is_banned: row.is_banned,
        created_at: time::from_db(&row.created_at)?,
        last_login: row.last_login.as_deref().map(time::from_db).transpose()?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hashes_verify_only_their_own_secret() {
        let hash = hash_password("secret").unwrap();
        assert_ne!(hash, "secret");
        assert!(verify_password("secret", &hash).unwrap());
        assert!(!verify_password("wrong", &hash).unwrap());
    }

    #[test]
    fn unreadable_hash_is_a_server_error() {
        let err = verify_password("secret", "secret").unwrap_err();
        assert!(matches!(err, ApiError::Internal(_)));
    }
}
