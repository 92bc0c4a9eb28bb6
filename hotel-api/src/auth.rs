use anyhow::Context;
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use axum::{extract::State, routing::post, Json, Router};
use chrono::{DateTime, Duration, Utc};
use hotel_core::models::AdminUser;
use hotel_core::repository::AdminRepository;
use hotel_shared::Masked;
use jsonwebtoken::{encode, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::middleware::auth::{AdminClaims, ADMIN_ROLE};
use crate::{
    error::AppError,
    state::{AppState, AuthConfig},
};

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
struct AuthResponse {
    token: String,
    expires_at: DateTime<Utc>,
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/admin/login", post(login))
}

// ============================================================================
// Passwords
// ============================================================================

/// Argon2id PHC string with a fresh random salt.
pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::InternalServerError(format!("Password hashing failed: {}", e)))
}

/// False for a wrong password and for a hash that cannot be parsed.
pub fn verify_password(password: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok(),
        Err(_) => false,
    }
}

// ============================================================================
// Tokens
// ============================================================================

pub fn issue_token(auth: &AuthConfig, admin: &AdminUser) -> Result<(String, DateTime<Utc>), AppError> {
    let expires_at = Utc::now() + Duration::seconds(auth.expiration as i64);
    let claims = AdminClaims {
        sub: admin.id.to_string(),
        email: admin.email.clone(),
        role: ADMIN_ROLE.to_owned(),
        exp: expires_at.timestamp() as usize,
    };

    let token = encode(&Header::default(), &claims, &EncodingKey::from_secret(auth.secret.as_bytes()))
        .map_err(|e| AppError::InternalServerError(format!("Token encoding failed: {}", e)))?;

    Ok((token, expires_at))
}

/// POST /admin/login
async fn login(State(state): State<AppState>, Json(req): Json<LoginRequest>) -> Result<Json<AuthResponse>, AppError> {
    let rejected = || AppError::AuthenticationError("Invalid email or password".to_string());

    let admin = state.admins.find_admin_by_email(req.email.trim()).await?.ok_or_else(|| {
        tracing::info!("Login attempt for unknown admin {}", Masked(req.email.as_str()));
        rejected()
    })?;

    if !verify_password(&req.password, &admin.password_hash) {
        tracing::info!("Wrong password for admin {}", Masked(admin.email.as_str()));
        return Err(rejected());
    }

    let (token, expires_at) = issue_token(&state.auth, &admin)?;
    tracing::info!("Admin {} logged in", admin.id);
    Ok(Json(AuthResponse { token, expires_at }))
}

/// Seeds the configured admin account while no admin exists yet.
pub async fn bootstrap_admin(
    admins: &dyn AdminRepository,
    email: Option<&str>,
    password: Option<&str>,
) -> anyhow::Result<()> {
    let (Some(email), Some(password)) = (email, password) else {
        return Ok(());
    };
    if admins.count_admins().await.context("counting admin accounts")? > 0 {
        return Ok(());
    }

    let password_hash = hash_password(password).context("hashing the bootstrap admin password")?;
    let admin = AdminUser {
        id: Uuid::new_v4(),
        email: email.trim().to_string(),
        password_hash,
        created_at: Utc::now(),
    };
    admins.create_admin(&admin).await.context("creating bootstrap admin")?;
    tracing::warn!("Bootstrap admin {} created; change its password", Masked(admin.email.as_str()));
    Ok(())
}
