use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A stored string did not name any variant of a closed vocabulary
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown {kind}: {value:?}")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

impl UnknownVariant {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

// ============================================================================
// Vocabularies
// ============================================================================

/// Booking lifecycle state. `Completed` and `Cancelled` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Completed,
    Cancelled,
}

impl BookingStatus {
    pub const ALL: [BookingStatus; 4] = [
        BookingStatus::Pending,
        BookingStatus::Confirmed,
        BookingStatus::Completed,
        BookingStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Completed => "completed",
            BookingStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, BookingStatus::Completed | BookingStatus::Cancelled)
    }
}

impl FromStr for BookingStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(BookingStatus::Pending),
            "confirmed" => Ok(BookingStatus::Confirmed),
            "completed" => Ok(BookingStatus::Completed),
            "cancelled" => Ok(BookingStatus::Cancelled),
            other => Err(UnknownVariant::new("booking status", other)),
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the client and companion will be doing during the session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PresenceNature {
    ParkSitting,
    ShoppingTogether,
    RestaurantDining,
    CafeCompanion,
    EventAttendance,
    OfficeSupport,
    HospitalVisit,
    WalkingCompanion,
}

impl PresenceNature {
    pub fn as_str(&self) -> &'static str {
        match self {
            PresenceNature::ParkSitting => "park_sitting",
            PresenceNature::ShoppingTogether => "shopping_together",
            PresenceNature::RestaurantDining => "restaurant_dining",
            PresenceNature::CafeCompanion => "cafe_companion",
            PresenceNature::EventAttendance => "event_attendance",
            PresenceNature::OfficeSupport => "office_support",
            PresenceNature::HospitalVisit => "hospital_visit",
            PresenceNature::WalkingCompanion => "walking_companion",
        }
    }

    /// Human-readable label used in notifications and the CLI
    pub fn label(&self) -> &'static str {
        match self {
            PresenceNature::ParkSitting => "Sitting in a park",
            PresenceNature::ShoppingTogether => "Shopping together",
            PresenceNature::RestaurantDining => "Eating at a restaurant",
            PresenceNature::CafeCompanion => "Café companion",
            PresenceNature::EventAttendance => "Event attendance",
            PresenceNature::OfficeSupport => "Office support",
            PresenceNature::HospitalVisit => "Hospital visit",
            PresenceNature::WalkingCompanion => "Walking companion",
        }
    }
}

impl FromStr for PresenceNature {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "park_sitting" => Ok(PresenceNature::ParkSitting),
            "shopping_together" => Ok(PresenceNature::ShoppingTogether),
            "restaurant_dining" => Ok(PresenceNature::RestaurantDining),
            "cafe_companion" => Ok(PresenceNature::CafeCompanion),
            "event_attendance" => Ok(PresenceNature::EventAttendance),
            "office_support" => Ok(PresenceNature::OfficeSupport),
            "hospital_visit" => Ok(PresenceNature::HospitalVisit),
            "walking_companion" => Ok(PresenceNature::WalkingCompanion),
            other => Err(UnknownVariant::new("presence nature", other)),
        }
    }
}

/// Companion personality tag used for catalog filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnergyType {
    SilentObservant,
    ComfortingPresence,
    PublicEventPlusOne,
    CalmListener,
    GentleCompanion,
}

impl EnergyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EnergyType::SilentObservant => "silent_observant",
            EnergyType::ComfortingPresence => "comforting_presence",
            EnergyType::PublicEventPlusOne => "public_event_plus_one",
            EnergyType::CalmListener => "calm_listener",
            EnergyType::GentleCompanion => "gentle_companion",
        }
    }
}

impl FromStr for EnergyType {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "silent_observant" => Ok(EnergyType::SilentObservant),
            "comforting_presence" => Ok(EnergyType::ComfortingPresence),
            "public_event_plus_one" => Ok(EnergyType::PublicEventPlusOne),
            "calm_listener" => Ok(EnergyType::CalmListener),
            "gentle_companion" => Ok(EnergyType::GentleCompanion),
            other => Err(UnknownVariant::new("energy type", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Moderator,
    #[default]
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Moderator => "moderator",
            Role::User => "user",
        }
    }
}

impl FromStr for Role {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "moderator" => Ok(Role::Moderator),
            "user" => Ok(Role::User),
            other => Err(UnknownVariant::new("role", other)),
        }
    }
}

// ============================================================================
// Records
// ============================================================================

/// The authenticated caller of an operation, as vouched for by the identity provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub user_id: String,
    pub role: Role,
}

impl Actor {
    pub fn new(user_id: impl Into<String>, role: Role) -> Self {
        Self {
            user_id: user_id.into(),
            role,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// A bookable companion profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Companion {
    pub id: String,
    pub name: String,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub city: String,
    pub energy_type: EnergyType,
    /// Whole rupees per hour, always positive
    pub hourly_rate: i64,
    pub is_available: bool,
    pub is_verified: bool,
    pub rating: f64,
    pub total_sessions: i64,
    pub languages: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// A single reservation of a companion by a client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    pub id: String,
    pub client_id: String,
    pub companion_id: String,
    pub booking_date: NaiveDate,
    pub start_time: NaiveTime,
    pub duration_hours: u32,
    pub venue_name: String,
    pub venue_address: String,
    pub presence_nature: PresenceNature,
    pub special_notes: Option<String>,
    pub phone: String,
    /// Fixed at creation; later rate changes do not touch it
    pub total_amount: i64,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
