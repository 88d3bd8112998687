use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{Booking, BookingStatus, EnergyType, PresenceNature, Role};
use crate::policy::RefundQuote;

// ============================================================================
// Auth
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub full_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub user_id: String,
    pub role: Role,
}

// ============================================================================
// Bookings
// ============================================================================

/// Body of `POST /bookings`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateBookingRequest {
    pub companion_id: String,
    pub booking_date: NaiveDate,
    pub start_time: NaiveTime,
    pub duration_hours: u32,
    pub venue_name: String,
    pub venue_address: String,
    pub presence_nature: PresenceNature,
    #[serde(default)]
    pub special_notes: Option<String>,
    pub phone: String,
}

/// Body of `POST /bookings/{id}/status`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransitionRequest {
    pub status: BookingStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransitionResponse {
    pub booking: Booking,
    /// Present when the booking was moved to `cancelled`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refund: Option<RefundQuote>,
}

/// Client dashboard row: one of the caller's bookings with who was booked
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientBookingView {
    #[serde(flatten)]
    pub booking: Booking,
    pub companion_name: Option<String>,
}

/// Admin panel row: a booking joined with display fields from other tables
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminBookingView {
    #[serde(flatten)]
    pub booking: Booking,
    pub companion_name: Option<String>,
    pub client_email: Option<String>,
}

// ============================================================================
// Catalog
// ============================================================================

/// A required field was empty or out of range
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
#[error("{0} is missing or invalid")]
pub struct InvalidField(pub &'static str);

/// Admin create/update payload for a companion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompanionInput {
    pub name: String,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    pub city: String,
    pub energy_type: EnergyType,
    pub hourly_rate: i64,
    #[serde(default = "default_true")]
    pub is_available: bool,
    #[serde(default)]
    pub is_verified: bool,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub total_sessions: i64,
    #[serde(default)]
    pub languages: Vec<String>,
}

fn default_true() -> bool {
    true
}

impl CompanionInput {
    pub fn validate(&self) -> Result<(), InvalidField> {
        if self.name.trim().is_empty() {
            return Err(InvalidField("name"));
        }
        if self.city.trim().is_empty() {
            return Err(InvalidField("city"));
        }
        if self.hourly_rate <= 0 {
            return Err(InvalidField("hourly_rate"));
        }
        if let Some(rating) = self.rating {
            if !(0.0..=5.0).contains(&rating) {
                return Err(InvalidField("rating"));
            }
        }
        if self.total_sessions < 0 {
            return Err(InvalidField("total_sessions"));
        }
        Ok(())
    }
}

/// JSON error body returned by every failing endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}
