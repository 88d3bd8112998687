//! Terminal rendering for catalog and booking listings

use shared::{AdminBookingView, Booking, BookingStatus, ClientBookingView, Companion, RefundQuote};

pub fn rupees(amount: i64) -> String {
    format!("₹{}", amount)
}

fn status_badge(status: BookingStatus) -> String {
    let color = match status {
        BookingStatus::Pending => "33",
        BookingStatus::Confirmed => "36",
        BookingStatus::Completed => "32",
        BookingStatus::Cancelled => "90",
    };
    format!("\x1b[{}m{:<9}\x1b[0m", color, status.as_str())
}

pub fn companion_line(c: &Companion) -> String {
    let verified = if c.is_verified { " ✓" } else { "" };
    format!(
        "{:<36}  {}{}  {} · {} · {}/hr · ★ {:.1} ({} sessions)",
        c.id,
        c.name,
        verified,
        c.city,
        c.energy_type.as_str(),
        rupees(c.hourly_rate),
        c.rating,
        c.total_sessions
    )
}

pub fn booking_line(b: &Booking) -> String {
    format!(
        "{:<36}  {}  {} {} · {}h · {} · {}",
        b.id,
        status_badge(b.status),
        b.booking_date,
        b.start_time.format("%H:%M"),
        b.duration_hours,
        b.venue_name,
        rupees(b.total_amount)
    )
}

pub fn client_booking_line(v: &ClientBookingView) -> String {
    format!(
        "{}  \x1b[90mwith {}\x1b[0m",
        booking_line(&v.booking),
        v.companion_name.as_deref().unwrap_or("unknown companion")
    )
}

pub fn admin_booking_line(v: &AdminBookingView) -> String {
    format!(
        "{}  \x1b[90m{} with {}\x1b[0m",
        booking_line(&v.booking),
        v.client_email.as_deref().unwrap_or("unknown client"),
        v.companion_name.as_deref().unwrap_or("unknown companion")
    )
}

pub fn refund_line(q: &RefundQuote) -> String {
    let hours = q.lead_minutes / 60;
    let minutes = (q.lead_minutes % 60).abs();
    format!(
        "Refund: {}% ({}) with {}h{:02}m until the session",
        q.refund_percent,
        rupees(q.refund_amount),
        hours,
        minutes
    )
}
