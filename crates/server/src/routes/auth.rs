use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    Json,
};
use jsonwebtoken::{encode, EncodingKey, Header};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use shared::{Actor, AuthResponse, LoginRequest, RegisterRequest, Role};
use uuid::Uuid;

use crate::{config::AuthConfig, db::User, error::AppError, state::AppState};

const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // user_id
    pub role: Role,
    pub exp: usize,
}

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    let email = req.email.trim().to_lowercase();
    if email.is_empty() || !email.contains('@') {
        return Err(AppError::BadRequest("A valid email is required".to_string()));
    }
    if req.password.len() < MIN_PASSWORD_LEN {
        return Err(AppError::BadRequest(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }

    // Check if user already exists
    if state.db.get_user_by_email(&email).await?.is_some() {
        return Err(AppError::BadRequest("Email already registered".to_string()));
    }

    let password_hash = hash_password(&req.password)?;

    let role = if state
        .config
        .auth
        .admin_emails
        .iter()
        .any(|admin| admin.eq_ignore_ascii_case(&email))
    {
        Role::Admin
    } else {
        Role::User
    };

    // Create user
    let user_id = Uuid::new_v4().to_string();
    let user = User {
        id: user_id.clone(),
        email,
        password_hash,
        full_name: req.full_name.filter(|n| !n.trim().is_empty()),
        created_at: None,
    };
    state.db.create_user(&user).await?;
    state.db.grant_role(&user_id, role).await?;
    tracing::info!("Registered user {} as {}", user_id, role.as_str());

    let token = generate_token(&user_id, role, &state.config.auth)?;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            token,
            user_id,
            role,
        }),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    // Find user
    let user = state
        .db
        .get_user_by_email(&req.email.trim().to_lowercase())
        .await?
        .ok_or_else(|| AppError::AuthError("Invalid email or password".to_string()))?;

    verify_password(&req.password, &user.password_hash)?;

    let role = state.db.get_role(&user.id).await?;
    let token = generate_token(&user.id, role, &state.config.auth)?;

    Ok(Json(AuthResponse {
        token,
        user_id: user.id,
        role,
    }))
}

fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(e.to_string()))
}

fn verify_password(password: &str, stored_hash: &str) -> Result<(), AppError> {
    let parsed_hash =
        PasswordHash::new(stored_hash).map_err(|e| AppError::Internal(e.to_string()))?;
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AppError::AuthError("Invalid email or password".to_string()))
}

fn generate_token(user_id: &str, role: Role, auth_config: &AuthConfig) -> Result<String, AppError> {
    let expiration = chrono::Utc::now()
        .checked_add_signed(chrono::Duration::hours(auth_config.token_expiry_hours as i64))
        .ok_or_else(|| AppError::Internal("Failed to calculate expiration".to_string()))?
        .timestamp() as usize;

    let claims = Claims {
        sub: user_id.to_string(),
        role,
        exp: expiration,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(auth_config.jwt_secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(e.to_string()))
}

pub fn verify_token(token: &str, secret: &str) -> Result<Claims, AppError> {
    jsonwebtoken::decode::<Claims>(
        token,
        &jsonwebtoken::DecodingKey::from_secret(secret.as_bytes()),
        &jsonwebtoken::Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| AppError::AuthError(e.to_string()))
}

/// Resolve the caller from the `Authorization: Bearer` header
pub fn authenticate(state: &AppState, headers: &HeaderMap) -> Result<Actor, AppError> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .ok_or_else(|| AppError::AuthError("Missing or invalid Authorization header".to_string()))?;

    let claims = verify_token(token, &state.config.auth.jwt_secret)?;
    Ok(Actor::new(claims.sub, claims.role))
}

/// Like [`authenticate`], but only lets administrators through
pub fn authenticate_admin(state: &AppState, headers: &HeaderMap) -> Result<Actor, AppError> {
    let actor = authenticate(state, headers)?;
    if !actor.is_admin() {
        return Err(AppError::Forbidden("Administrator access required".to_string()));
    }
    Ok(actor)
}
