use argon2::{
    Argon2, PasswordHasher,
    password_hash::{PasswordHash, PasswordVerifier, SaltString},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use password_hash::rand_core::OsRng;
use sea_orm::ActiveEnum;

use crate::{
    config::AppConfig,
    dto::auth::{Claims, LoginRequest, LoginResponse},
    entity::users,
    error::{AppError, AppResult},
    repository::Repositories,
};

/// Token signing settings.
#[derive(Debug, Clone)]
pub struct AuthSettings {
    pub jwt_secret: String,
    pub token_ttl: Duration,
}

impl AuthSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            jwt_secret: config.jwt_secret.clone(),
            token_ttl: Duration::minutes(config.token_ttl_minutes),
        }
    }
}

pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))?
        .to_string();
    Ok(hash)
}

pub fn verify_password(password: &str, password_hash: &str) -> AppResult<bool> {
    let parsed_hash = PasswordHash::new(password_hash)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("Invalid password hash")))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

pub fn issue_token(settings: &AuthSettings, user: &users::Model) -> AppResult<LoginResponse> {
    let expiration = Utc::now()
        .checked_add_signed(settings.token_ttl)
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to set expiration")))?;

    let claims = Claims {
        sub: user.id.to_string(),
        email: user.email.clone(),
        role: user.role,
        exp: expiration.timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(settings.jwt_secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))?;

    Ok(LoginResponse {
        access_token: token,
        token_type: "Bearer".into(),
        scope: user.role,
        expires_in: settings.token_ttl.num_seconds(),
    })
}

pub fn decode_token(settings: &AuthSettings, token: &str) -> AppResult<Claims> {
    let decoded = decode::<Claims>(
        token,
        &DecodingKey::from_secret(settings.jwt_secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| AppError::Unauthorized("Invalid or expired token".into()))?;
    Ok(decoded.claims)
}

/// Exchange email and password for an access token. An unknown email and a
/// wrong password fail the same way.
pub async fn login(
    repo: &Repositories,
    settings: &AuthSettings,
    payload: LoginRequest,
) -> AppResult<LoginResponse> {
    payload.validate()?;
    let LoginRequest { email, password } = payload;

    let user = repo
        .user()
        .get_user_by_email(email.trim())
        .await?
        .ok_or(AppError::InvalidCredentials)?;

    if !verify_password(&password, &user.password_hash)? {
        return Err(AppError::InvalidCredentials);
    }
    if !user.is_active {
        tracing::warn!(user_id = user.id, "login attempt by inactive user");
        return Err(AppError::InvalidCredentials);
    }

    let resp = issue_token(settings, &user)?;
    tracing::info!(user_id = user.id, role = %user.role.to_value(), "user logged in");
    Ok(resp)
}
