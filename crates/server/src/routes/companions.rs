//! Companion catalog: public browsing plus the administrator CRUD endpoints

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use chrono::{DateTime, Utc};
use shared::{Companion, CompanionFilter, CompanionInput};
use uuid::Uuid;

use crate::{
    error::AppError,
    routes::auth::authenticate_admin,
    state::AppState,
};

/// GET /companions
pub async fn list_available(
    State(state): State<AppState>,
    Query(filter): Query<CompanionFilter>,
) -> Result<Json<Vec<Companion>>, AppError> {
    let companions = state
        .db
        .list_available_companions()
        .await?
        .into_iter()
        .filter(|c| filter.matches(c))
        .collect();
    Ok(Json(companions))
}

/// GET /companions/:id
pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Companion>, AppError> {
    state
        .db
        .get_companion(&id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Companion {} not found", id)))
}

/// GET /admin/companions
pub async fn list_all(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<Companion>>, AppError> {
    authenticate_admin(&state, &headers)?;
    Ok(Json(state.db.list_all_companions().await?))
}

/// POST /admin/companions
pub async fn create(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(input): Json<CompanionInput>,
) -> Result<(StatusCode, Json<Companion>), AppError> {
    let admin = authenticate_admin(&state, &headers)?;
    input.validate().map_err(|e| AppError::BadRequest(e.to_string()))?;

    let companion = build(Uuid::new_v4().to_string(), input, state.clock.now());
    state.db.insert_companion(&companion).await?;
    tracing::info!("Companion {} created by {}", companion.id, admin.user_id);

    Ok((StatusCode::CREATED, Json(companion)))
}

/// PUT /admin/companions/:id
pub async fn update(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(input): Json<CompanionInput>,
) -> Result<Json<Companion>, AppError> {
    let admin = authenticate_admin(&state, &headers)?;
    input.validate().map_err(|e| AppError::BadRequest(e.to_string()))?;

    let existing = state
        .db
        .get_companion(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Companion {} not found", id)))?;

    let companion = build(existing.id, input, existing.created_at);
    if !state.db.update_companion(&companion).await? {
        return Err(AppError::NotFound(format!("Companion {} not found", id)));
    }
    tracing::info!("Companion {} updated by {}", companion.id, admin.user_id);

    Ok(Json(companion))
}

/// DELETE /admin/companions/:id
pub async fn delete(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let admin = authenticate_admin(&state, &headers)?;
    if !state.db.delete_companion(&id).await? {
        return Err(AppError::NotFound(format!("Companion {} not found", id)));
    }
    tracing::info!("Companion {} deleted by {}", id, admin.user_id);
    Ok(StatusCode::NO_CONTENT)
}

fn build(id: String, input: CompanionInput, created_at: DateTime<Utc>) -> Companion {
    Companion {
        id,
        name: input.name.trim().to_string(),
        bio: input.bio,
        avatar_url: input.avatar_url,
        city: input.city.trim().to_string(),
        energy_type: input.energy_type,
        hourly_rate: input.hourly_rate,
        is_available: input.is_available,
        is_verified: input.is_verified,
        rating: input.rating.unwrap_or_default(),
        total_sessions: input.total_sessions,
        languages: input.languages,
        created_at,
    }
}
