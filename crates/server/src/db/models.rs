//! Raw table rows. Columns are stored as plain SQLite text/integers and are
//! parsed into the typed records from `shared` at this boundary, so a row
//! holding an unknown enum value fails loudly instead of leaking through.

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, NaiveTime, SecondsFormat, Utc};
use shared::{AdminBookingView, Booking, ClientBookingView, Companion};
use sqlx::FromRow;

pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const TIME_FORMAT: &str = "%H:%M:%S";

/// Fixed-width RFC 3339 so that text ordering matches time ordering
pub fn timestamp(t: &DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(s)
        .with_context(|| format!("bad timestamp {s:?}"))?
        .with_timezone(&Utc))
}

#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: String,
    pub email: String,
    pub password_hash: String,
    pub full_name: Option<String>,
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, FromRow)]
pub struct CompanionRow {
    pub id: String,
    pub name: String,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub city: String,
    pub energy_type: String,
    pub hourly_rate: i64,
    pub is_available: bool,
    pub is_verified: bool,
    pub rating: Option<f64>,
    pub total_sessions: Option<i64>,
    /// JSON array of strings
    pub languages: Option<String>,
    pub created_at: String,
}

impl From<&Companion> for CompanionRow {
    fn from(c: &Companion) -> Self {
        Self {
            id: c.id.clone(),
            name: c.name.clone(),
            bio: c.bio.clone(),
            avatar_url: c.avatar_url.clone(),
            city: c.city.clone(),
            energy_type: c.energy_type.as_str().to_string(),
            hourly_rate: c.hourly_rate,
            is_available: c.is_available,
            is_verified: c.is_verified,
            rating: Some(c.rating),
            total_sessions: Some(c.total_sessions),
            // Serializing a Vec<String> cannot fail
            languages: serde_json::to_string(&c.languages).ok(),
            created_at: timestamp(&c.created_at),
        }
    }
}

impl TryFrom<CompanionRow> for Companion {
    type Error = anyhow::Error;

    fn try_from(row: CompanionRow) -> Result<Self> {
        let languages = match row.languages.as_deref() {
            Some(json) => serde_json::from_str(json)
                .with_context(|| format!("bad languages for companion {}", row.id))?,
            None => Vec::new(),
        };
        Ok(Companion {
            energy_type: row.energy_type.parse()?,
            created_at: parse_timestamp(&row.created_at)?,
            rating: row.rating.unwrap_or_default(),
            total_sessions: row.total_sessions.unwrap_or_default(),
            languages,
            id: row.id,
            name: row.name,
            bio: row.bio,
            avatar_url: row.avatar_url,
            city: row.city,
            hourly_rate: row.hourly_rate,
            is_available: row.is_available,
            is_verified: row.is_verified,
        })
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct BookingRow {
    pub id: String,
    pub user_id: String,
    pub companion_id: String,
    pub booking_date: String,
    pub start_time: String,
    pub duration_hours: i64,
    pub venue_name: String,
    pub venue_address: String,
    pub presence_nature: String,
    pub special_notes: Option<String>,
    pub phone: String,
    pub total_amount: i64,
    pub status: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<&Booking> for BookingRow {
    fn from(b: &Booking) -> Self {
        Self {
            id: b.id.clone(),
            user_id: b.client_id.clone(),
            companion_id: b.companion_id.clone(),
            booking_date: b.booking_date.format(DATE_FORMAT).to_string(),
            start_time: b.start_time.format(TIME_FORMAT).to_string(),
            duration_hours: i64::from(b.duration_hours),
            venue_name: b.venue_name.clone(),
            venue_address: b.venue_address.clone(),
            presence_nature: b.presence_nature.as_str().to_string(),
            special_notes: b.special_notes.clone(),
            phone: b.phone.clone(),
            total_amount: b.total_amount,
            status: b.status.as_str().to_string(),
            created_at: timestamp(&b.created_at),
            updated_at: timestamp(&b.updated_at),
        }
    }
}

impl TryFrom<BookingRow> for Booking {
    type Error = anyhow::Error;

    fn try_from(row: BookingRow) -> Result<Self> {
        Ok(Booking {
            booking_date: NaiveDate::parse_from_str(&row.booking_date, DATE_FORMAT)
                .with_context(|| format!("bad booking_date {:?}", row.booking_date))?,
            start_time: NaiveTime::parse_from_str(&row.start_time, TIME_FORMAT)
                .with_context(|| format!("bad start_time {:?}", row.start_time))?,
            duration_hours: u32::try_from(row.duration_hours)
                .with_context(|| format!("bad duration_hours {}", row.duration_hours))?,
            presence_nature: row.presence_nature.parse()?,
            status: row.status.parse()?,
            created_at: parse_timestamp(&row.created_at)?,
            updated_at: parse_timestamp(&row.updated_at)?,
            id: row.id,
            client_id: row.user_id,
            companion_id: row.companion_id,
            venue_name: row.venue_name,
            venue_address: row.venue_address,
            special_notes: row.special_notes,
            phone: row.phone,
            total_amount: row.total_amount,
        })
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct ClientBookingRow {
    #[sqlx(flatten)]
    pub booking: BookingRow,
    pub companion_name: Option<String>,
}

impl TryFrom<ClientBookingRow> for ClientBookingView {
    type Error = anyhow::Error;

    fn try_from(row: ClientBookingRow) -> Result<Self> {
        Ok(ClientBookingView {
            booking: row.booking.try_into()?,
            companion_name: row.companion_name,
        })
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct AdminBookingRow {
    #[sqlx(flatten)]
    pub booking: BookingRow,
    pub companion_name: Option<String>,
    pub client_email: Option<String>,
}

impl TryFrom<AdminBookingRow> for AdminBookingView {
    type Error = anyhow::Error;

    fn try_from(row: AdminBookingRow) -> Result<Self> {
        Ok(AdminBookingView {
            booking: row.booking.try_into()?,
            companion_name: row.companion_name,
            client_email: row.client_email,
        })
    }
}
