use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use shared::{
    AdminBookingView, Booking, BookingStatus, ClientBookingView, CreateBookingRequest,
    RefundQuote, TransitionRequest, TransitionResponse,
};

use crate::{
    error::AppError,
    routes::auth::{authenticate, authenticate_admin},
    state::AppState,
};

/// POST /bookings
pub async fn create(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<CreateBookingRequest>,
) -> Result<(StatusCode, Json<Booking>), AppError> {
    let actor = authenticate(&state, &headers)?;
    let booking = state.bookings.create(&actor, req).await?;
    Ok((StatusCode::CREATED, Json(booking)))
}

/// GET /bookings
pub async fn list_mine(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<ClientBookingView>>, AppError> {
    let actor = authenticate(&state, &headers)?;
    Ok(Json(state.bookings.list_for_client(&actor).await?))
}

/// GET /bookings/active
pub async fn list_active(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<ClientBookingView>>, AppError> {
    let actor = authenticate(&state, &headers)?;
    Ok(Json(state.bookings.active_for_client(&actor).await?))
}

/// POST /bookings/:id/status
pub async fn transition(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(req): Json<TransitionRequest>,
) -> Result<Json<TransitionResponse>, AppError> {
    let actor = authenticate(&state, &headers)?;
    let booking = state.bookings.transition(&actor, &id, req.status).await?;

    let refund = (booking.status == BookingStatus::Cancelled)
        .then(|| state.bookings.evaluate_cancellation_policy(&booking, state.bookings.now()));

    Ok(Json(TransitionResponse { booking, refund }))
}

/// GET /bookings/:id/refund-quote
pub async fn refund_quote(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<RefundQuote>, AppError> {
    let actor = authenticate(&state, &headers)?;
    Ok(Json(state.bookings.refund_quote(&actor, &id).await?))
}

/// GET /admin/bookings
pub async fn list_all(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<AdminBookingView>>, AppError> {
    authenticate_admin(&state, &headers)?;
    Ok(Json(state.bookings.list_all().await?))
}

/// DELETE /admin/bookings/:id
///
/// Removes the row outright; no lifecycle rule applies.
pub async fn delete(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let admin = authenticate_admin(&state, &headers)?;
    if !state.db.delete_booking(&id).await? {
        return Err(AppError::NotFound(format!("Booking {} not found", id)));
    }
    tracing::warn!("Booking {} deleted by admin {}", id, admin.user_id);
    Ok(StatusCode::NO_CONTENT)
}
