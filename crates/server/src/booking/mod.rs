//! Booking lifecycle: creation and pricing, status transitions, and the
//! cancellation refund policy.
//!
//! Every operation takes the acting user explicitly. The manager trusts the
//! actor's id and role as given; authenticating them is the router's job.

use chrono::{DateTime, FixedOffset, Timelike, Utc};
use shared::{
    Actor, AdminBookingView, Booking, BookingStatus, ClientBookingView, CreateBookingRequest,
    RefundQuote,
};
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

use crate::clock::Clock;
use crate::db::Database;
use crate::notify::{BookingNotification, Notifier};


#[derive(Debug, Error)]
pub enum BookingError {
    #[error("invalid or missing field: {0}")]
    Validation(String),

    #[error("companion {0} is not available for booking")]
    CompanionUnavailable(String),

    #[error("duration must be between {min} and {max} hours, got {0}", min = shared::MIN_DURATION_HOURS, max = shared::MAX_DURATION_HOURS)]
    InvalidDuration(u32),

    #[error("booking date {0} is in the past")]
    InvalidDate(chrono::NaiveDate),

    #[error("cannot move booking from {from} to {to}")]
    InvalidTransition {
        from: BookingStatus,
        to: BookingStatus,
    },

    #[error("booking not found")]
    NotFound,

    #[error("store failure: {0}")]
    Store(String),
}

impl From<anyhow::Error> for BookingError {
    fn from(e: anyhow::Error) -> Self {
        BookingError::Store(format!("{e:#}"))
    }
}

#[derive(Clone)]
pub struct BookingManager {
    db: Database,
    notifier: Notifier,
    clock: Arc<dyn Clock>,
    tz: FixedOffset,
}

impl BookingManager {
    pub fn new(db: Database, notifier: Notifier, clock: Arc<dyn Clock>, tz: FixedOffset) -> Self {
        Self {
            db,
            notifier,
            clock,
            tz,
        }
    }

    /// Validate, price and persist a new `pending` booking for `actor`, then
    /// queue the new-booking notification.
    ///
    /// Only the date is checked against today; a start time earlier today is
    /// accepted. Overlapping bookings for one companion are not prevented.
    pub async fn create(
        &self,
        actor: &Actor,
        req: CreateBookingRequest,
    ) -> Result<Booking, BookingError> {
        let companion_id = required("companion_id", &req.companion_id)?;
        let venue_name = required("venue_name", &req.venue_name)?;
        let venue_address = required("venue_address", &req.venue_address)?;
        let phone = required("phone", &req.phone)?;
        // Stored at whole-second precision
        let start_time = req
            .start_time
            .with_nanosecond(0)
            .ok_or_else(|| BookingError::Validation("start_time".to_string()))?;

        if !shared::is_valid_duration(req.duration_hours) {
            return Err(BookingError::InvalidDuration(req.duration_hours));
        }

        let now = self.clock.now();
        if req.booking_date < shared::local_today(now, self.tz) {
            return Err(BookingError::InvalidDate(req.booking_date));
        }

        let companion = match self.db.get_companion(&companion_id).await? {
            Some(c) if c.is_available => c,
            _ => return Err(BookingError::CompanionUnavailable(companion_id)),
        };

        let total_amount = shared::total_amount(companion.hourly_rate, req.duration_hours)
            .ok_or_else(|| BookingError::Validation("total_amount".to_string()))?;

        let booking = Booking {
            id: Uuid::new_v4().to_string(),
            client_id: actor.user_id.clone(),
            companion_id,
            booking_date: req.booking_date,
            start_time,
            duration_hours: req.duration_hours,
            venue_name,
            venue_address,
            presence_nature: req.presence_nature,
            special_notes: req
                .special_notes
                .map(|n| n.trim().to_string())
                .filter(|n| !n.is_empty()),
            phone,
            total_amount,
            status: BookingStatus::Pending,
            created_at: now,
            updated_at: now,
        };

        self.db.insert_booking(&booking).await?;
        tracing::info!(
            "Booking {} created by {} for companion {} ({} x {}h = {})",
            booking.id,
            actor.user_id,
            booking.companion_id,
            companion.hourly_rate,
            booking.duration_hours,
            booking.total_amount
        );

        let client_name = self.client_display_name(&actor.user_id).await;
        self.notifier.dispatch(BookingNotification {
            booking_id: booking.id.clone(),
            client_name,
            companion_name: companion.name,
            booking_date: booking.booking_date,
            start_time: booking.start_time,
            venue_name: booking.venue_name.clone(),
            total_amount: booking.total_amount,
            phone: booking.phone.clone(),
        });

        Ok(booking)
    }

    /// Move a booking to `new_status`.
    ///
    /// Administrators may write any status. Clients may only cancel their own
    /// bookings while pending or confirmed. A client addressing someone else's
    /// booking sees `NotFound`.
    pub async fn transition(
        &self,
        actor: &Actor,
        booking_id: &str,
        new_status: BookingStatus,
    ) -> Result<Booking, BookingError> {
        let current = self.visible_booking(actor, booking_id).await?;

        if !shared::may_transition(actor.is_admin(), current.status, new_status) {
            return Err(BookingError::InvalidTransition {
                from: current.status,
                to: new_status,
            });
        }

        let updated = self
            .db
            .update_booking_status(booking_id, new_status, self.clock.now())
            .await?
            .ok_or(BookingError::NotFound)?;

        tracing::info!(
            "Booking {} moved {} -> {} by {} ({})",
            booking_id,
            current.status,
            updated.status,
            actor.user_id,
            actor.role.as_str()
        );
        Ok(updated)
    }

    /// Advisory refund tier for cancelling `booking` at `cancel_at`
    pub fn evaluate_cancellation_policy(
        &self,
        booking: &Booking,
        cancel_at: DateTime<Utc>,
    ) -> RefundQuote {
        shared::evaluate_cancellation_policy(booking, cancel_at, self.tz)
    }

    /// What cancelling right now would refund
    pub async fn refund_quote(
        &self,
        actor: &Actor,
        booking_id: &str,
    ) -> Result<RefundQuote, BookingError> {
        let booking = self.visible_booking(actor, booking_id).await?;
        Ok(self.evaluate_cancellation_policy(&booking, self.clock.now()))
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub async fn list_for_client(
        &self,
        actor: &Actor,
    ) -> Result<Vec<ClientBookingView>, BookingError> {
        Ok(self.db.list_bookings_for_client(&actor.user_id).await?)
    }

    /// The caller's confirmed bookings from today (service time zone) onward.
    /// A non-empty result is what unlocks the safety/SOS surface.
    pub async fn active_for_client(
        &self,
        actor: &Actor,
    ) -> Result<Vec<ClientBookingView>, BookingError> {
        let today = shared::local_today(self.clock.now(), self.tz);
        Ok(self
            .db
            .list_active_bookings_for_client(&actor.user_id, today)
            .await?)
    }

    pub async fn list_all(&self) -> Result<Vec<AdminBookingView>, BookingError> {
        Ok(self.db.list_all_bookings().await?)
    }

    async fn visible_booking(&self, actor: &Actor, booking_id: &str) -> Result<Booking, BookingError> {
        let booking = self
            .db
            .get_booking(booking_id)
            .await?
            .ok_or(BookingError::NotFound)?;
        if !actor.is_admin() && booking.client_id != actor.user_id {
            return Err(BookingError::NotFound);
        }
        Ok(booking)
    }

    /// Falls back to the raw id; a lookup failure must not affect the booking
    async fn client_display_name(&self, user_id: &str) -> String {
        match self.db.get_user_by_id(user_id).await {
            Ok(Some(user)) => user.email,
            Ok(None) => user_id.to_string(),
            Err(e) => {
                tracing::warn!("Could not look up client {} for notification: {}", user_id, e);
                user_id.to_string()
            }
        }
    }
}

fn required(field: &str, value: &str) -> Result<String, BookingError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(BookingError::Validation(field.to_string()));
    }
    Ok(trimmed.to_string())
}
