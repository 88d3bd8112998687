use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};
use shared::{AdminBookingView, Booking, BookingStatus, ClientBookingView, Companion, Role};
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::path::Path;

mod models;

pub use models::*;

const BOOKING_COLUMNS: &str = "id, user_id, companion_id, booking_date, start_time, duration_hours, \
     venue_name, venue_address, presence_nature, special_notes, phone, total_amount, status, \
     created_at, updated_at";

const CLIENT_BOOKING_SELECT: &str = "SELECT b.id, b.user_id, b.companion_id, b.booking_date, \
     b.start_time, b.duration_hours, b.venue_name, b.venue_address, b.presence_nature, \
     b.special_notes, b.phone, b.total_amount, b.status, b.created_at, b.updated_at, \
     c.name AS companion_name \
     FROM bookings b LEFT JOIN companions c ON c.id = b.companion_id";

const COMPANION_COLUMNS: &str = "id, name, bio, avatar_url, city, energy_type, hourly_rate, \
     is_available, is_verified, rating, total_sessions, languages, created_at";

#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    pub async fn new(path: &str) -> Result<Self> {
        // Ensure the directory exists
        if let Some(parent) = Path::new(path).parent() {
            std::fs::create_dir_all(parent)?;
        }

        let database_url = format!("sqlite:{}?mode=rwc", path);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(&database_url)
            .await?;

        Ok(Self { pool })
    }

    /// Private in-memory database; one connection so every query sees the same data
    #[cfg(test)]
    pub async fn in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;
        let db = Self { pool };
        db.run_migrations().await?;
        Ok(db)
    }

    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                email TEXT UNIQUE NOT NULL,
                password_hash TEXT NOT NULL,
                full_name TEXT,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS user_roles (
                user_id TEXT NOT NULL REFERENCES users(id),
                role TEXT NOT NULL,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
                PRIMARY KEY (user_id, role)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS companions (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                bio TEXT,
                avatar_url TEXT,
                city TEXT NOT NULL,
                energy_type TEXT NOT NULL,
                hourly_rate INTEGER NOT NULL CHECK (hourly_rate > 0),
                is_available BOOLEAN NOT NULL DEFAULT 1,
                is_verified BOOLEAN NOT NULL DEFAULT 0,
                rating REAL,
                total_sessions INTEGER DEFAULT 0,
                languages TEXT,
                created_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS bookings (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL REFERENCES users(id),
                companion_id TEXT NOT NULL REFERENCES companions(id),
                booking_date TEXT NOT NULL,
                start_time TEXT NOT NULL,
                duration_hours INTEGER NOT NULL CHECK (duration_hours BETWEEN 1 AND 6),
                venue_name TEXT NOT NULL,
                venue_address TEXT NOT NULL,
                presence_nature TEXT NOT NULL,
                special_notes TEXT,
                phone TEXT NOT NULL,
                total_amount INTEGER NOT NULL,
                status TEXT NOT NULL DEFAULT 'pending',
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS bookings_user_id ON bookings(user_id)")
            .execute(&self.pool)
            .await?;

        tracing::info!("Database migrations completed");
        Ok(())
    }

    // User operations
    pub async fn create_user(&self, user: &User) -> Result<()> {
        sqlx::query(
            "INSERT INTO users (id, email, password_hash, full_name) VALUES (?, ?, ?, ?)",
        )
        .bind(&user.id)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.full_name)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, email, password_hash, full_name, created_at FROM users WHERE email = ?",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    pub async fn get_user_by_id(&self, id: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, email, password_hash, full_name, created_at FROM users WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    // Role operations
    pub async fn grant_role(&self, user_id: &str, role: Role) -> Result<()> {
        sqlx::query("INSERT OR IGNORE INTO user_roles (user_id, role) VALUES (?, ?)")
            .bind(user_id)
            .bind(role.as_str())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Highest role held by the user, `Role::User` when none is recorded
    pub async fn get_role(&self, user_id: &str) -> Result<Role> {
        let roles: Vec<String> = sqlx::query_scalar("SELECT role FROM user_roles WHERE user_id = ?")
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        let mut best = Role::User;
        for role in roles {
            match role.parse::<Role>()? {
                Role::Admin => return Ok(Role::Admin),
                Role::Moderator => best = Role::Moderator,
                Role::User => {}
            }
        }
        Ok(best)
    }

    // Companion operations
    pub async fn insert_companion(&self, companion: &Companion) -> Result<()> {
        let row = CompanionRow::from(companion);
        sqlx::query(&format!(
            "INSERT INTO companions ({COMPANION_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
        ))
        .bind(&row.id)
        .bind(&row.name)
        .bind(&row.bio)
        .bind(&row.avatar_url)
        .bind(&row.city)
        .bind(&row.energy_type)
        .bind(row.hourly_rate)
        .bind(row.is_available)
        .bind(row.is_verified)
        .bind(row.rating)
        .bind(row.total_sessions)
        .bind(&row.languages)
        .bind(&row.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Overwrite every editable column. Returns false if the id is unknown.
    pub async fn update_companion(&self, companion: &Companion) -> Result<bool> {
        let row = CompanionRow::from(companion);
        let result = sqlx::query(
            r#"
            UPDATE companions SET
                name = ?, bio = ?, avatar_url = ?, city = ?, energy_type = ?,
                hourly_rate = ?, is_available = ?, is_verified = ?, rating = ?,
                total_sessions = ?, languages = ?
            WHERE id = ?
            "#,
        )
        .bind(&row.name)
        .bind(&row.bio)
        .bind(&row.avatar_url)
        .bind(&row.city)
        .bind(&row.energy_type)
        .bind(row.hourly_rate)
        .bind(row.is_available)
        .bind(row.is_verified)
        .bind(row.rating)
        .bind(row.total_sessions)
        .bind(&row.languages)
        .bind(&row.id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn delete_companion(&self, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM companions WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn get_companion(&self, id: &str) -> Result<Option<Companion>> {
        let row = sqlx::query_as::<_, CompanionRow>(&format!(
            "SELECT {COMPANION_COLUMNS} FROM companions WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Companion::try_from).transpose()
    }

    /// Bookable companions, best rated first
    pub async fn list_available_companions(&self) -> Result<Vec<Companion>> {
        let rows = sqlx::query_as::<_, CompanionRow>(&format!(
            "SELECT {COMPANION_COLUMNS} FROM companions WHERE is_available = 1 \
             ORDER BY rating DESC, name ASC"
        ))
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(Companion::try_from).collect()
    }

    /// Every companion, newest first
    pub async fn list_all_companions(&self) -> Result<Vec<Companion>> {
        let rows = sqlx::query_as::<_, CompanionRow>(&format!(
            "SELECT {COMPANION_COLUMNS} FROM companions ORDER BY created_at DESC, rowid DESC"
        ))
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(Companion::try_from).collect()
    }

    // Booking operations
    pub async fn insert_booking(&self, booking: &Booking) -> Result<()> {
        let row = BookingRow::from(booking);
        sqlx::query(&format!(
            "INSERT INTO bookings ({BOOKING_COLUMNS}) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
        ))
        .bind(&row.id)
        .bind(&row.user_id)
        .bind(&row.companion_id)
        .bind(&row.booking_date)
        .bind(&row.start_time)
        .bind(row.duration_hours)
        .bind(&row.venue_name)
        .bind(&row.venue_address)
        .bind(&row.presence_nature)
        .bind(&row.special_notes)
        .bind(&row.phone)
        .bind(row.total_amount)
        .bind(&row.status)
        .bind(&row.created_at)
        .bind(&row.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn get_booking(&self, id: &str) -> Result<Option<Booking>> {
        let row = sqlx::query_as::<_, BookingRow>(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Booking::try_from).transpose()
    }

    /// Single-statement status write; concurrent writers resolve last-write-wins.
    /// Returns the row as stored, or `None` if the id is unknown.
    pub async fn update_booking_status(
        &self,
        id: &str,
        status: BookingStatus,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<Booking>> {
        let row = sqlx::query_as::<_, BookingRow>(&format!(
            "UPDATE bookings SET status = ?, updated_at = ? WHERE id = ? RETURNING {BOOKING_COLUMNS}"
        ))
        .bind(status.as_str())
        .bind(timestamp(&updated_at))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Booking::try_from).transpose()
    }

    pub async fn delete_booking(&self, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM bookings WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// A client's dashboard: latest session date first, with companion name
    pub async fn list_bookings_for_client(&self, client_id: &str) -> Result<Vec<ClientBookingView>> {
        let rows = sqlx::query_as::<_, ClientBookingRow>(&format!(
            "{CLIENT_BOOKING_SELECT} WHERE b.user_id = ? \
             ORDER BY b.booking_date DESC, b.start_time DESC, b.created_at DESC"
        ))
        .bind(client_id)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(ClientBookingView::try_from).collect()
    }

    /// Confirmed bookings of a client dated `today` or later, soonest first
    pub async fn list_active_bookings_for_client(
        &self,
        client_id: &str,
        today: NaiveDate,
    ) -> Result<Vec<ClientBookingView>> {
        let rows = sqlx::query_as::<_, ClientBookingRow>(&format!(
            "{CLIENT_BOOKING_SELECT} WHERE b.user_id = ? AND b.status = ? AND b.booking_date >= ? \
             ORDER BY b.booking_date ASC, b.start_time ASC"
        ))
        .bind(client_id)
        .bind(BookingStatus::Confirmed.as_str())
        .bind(today.format(DATE_FORMAT).to_string())
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(ClientBookingView::try_from).collect()
    }

    /// The admin panel: newest bookings first, with companion name and client email
    pub async fn list_all_bookings(&self) -> Result<Vec<AdminBookingView>> {
        let rows = sqlx::query_as::<_, AdminBookingRow>(
            r#"
            SELECT b.id, b.user_id, b.companion_id, b.booking_date, b.start_time,
                   b.duration_hours, b.venue_name, b.venue_address, b.presence_nature,
                   b.special_notes, b.phone, b.total_amount, b.status, b.created_at,
                   b.updated_at,
                   c.name AS companion_name,
                   u.email AS client_email
            FROM bookings b
            LEFT JOIN companions c ON c.id = b.companion_id
            LEFT JOIN users u ON u.id = b.user_id
            ORDER BY b.created_at DESC, b.rowid DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(AdminBookingView::try_from).collect()
    }
}
