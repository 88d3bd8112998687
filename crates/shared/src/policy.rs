//! Pricing, status-transition authority and the cancellation refund policy.
//!
//! Everything here is pure: no clock, no store. Callers pass in the instants
//! and the service time zone they want evaluated.

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{Booking, BookingStatus, Companion, EnergyType};

pub const MIN_DURATION_HOURS: u32 = 1;
pub const MAX_DURATION_HOURS: u32 = 6;

/// Lead time at or above which a cancellation is fully refunded
pub const FULL_REFUND_LEAD_HOURS: i64 = 24;
/// Lead time at or above which a cancellation is half refunded
pub const HALF_REFUND_LEAD_HOURS: i64 = 12;

pub fn is_valid_duration(duration_hours: u32) -> bool {
    (MIN_DURATION_HOURS..=MAX_DURATION_HOURS).contains(&duration_hours)
}

/// `hourly_rate * duration_hours`, or `None` on overflow
pub fn total_amount(hourly_rate: i64, duration_hours: u32) -> Option<i64> {
    hourly_rate.checked_mul(i64::from(duration_hours))
}

/// Whether `actor_is_admin` may move a booking from `from` to `to`.
///
/// Administrators may write any status over any other. Clients may only
/// cancel, and only while the booking is still pending or confirmed.
pub fn may_transition(actor_is_admin: bool, from: BookingStatus, to: BookingStatus) -> bool {
    if actor_is_admin {
        return true;
    }
    to == BookingStatus::Cancelled
        && matches!(from, BookingStatus::Pending | BookingStatus::Confirmed)
}

/// Scheduled start of a session whose wall-clock date and time are in `tz`
pub fn session_start(date: NaiveDate, time: NaiveTime, tz: FixedOffset) -> DateTime<Utc> {
    let local = date.and_time(time);
    Utc.from_utc_datetime(&(local - Duration::seconds(i64::from(tz.local_minus_utc()))))
}

/// The calendar date of `now` as seen in `tz`
pub fn local_today(now: DateTime<Utc>, tz: FixedOffset) -> NaiveDate {
    now.with_timezone(&tz).date_naive()
}

/// Refund tier for a cancellation made `lead` before the session starts.
/// Boundaries resolve toward the higher refund.
pub fn refund_percent(lead: Duration) -> u8 {
    if lead >= Duration::hours(FULL_REFUND_LEAD_HOURS) {
        100
    } else if lead >= Duration::hours(HALF_REFUND_LEAD_HOURS) {
        50
    } else {
        0
    }
}

/// `percent` of `total`, rounded toward zero. Splits `total` around 100 so
/// no intermediate product can overflow.
pub fn refund_amount(total: i64, percent: u8) -> i64 {
    let percent = i64::from(percent);
    total / 100 * percent + total % 100 * percent / 100
}

/// Advisory outcome of cancelling a booking at a given instant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefundQuote {
    pub booking_id: String,
    pub session_start: DateTime<Utc>,
    /// Negative once the session has started
    pub lead_minutes: i64,
    pub refund_percent: u8,
    pub refund_amount: i64,
}

pub fn evaluate_cancellation_policy(
    booking: &Booking,
    cancel_at: DateTime<Utc>,
    tz: FixedOffset,
) -> RefundQuote {
    let start = session_start(booking.booking_date, booking.start_time, tz);
    let lead = start - cancel_at;
    let refund_percent = refund_percent(lead);

    RefundQuote {
        booking_id: booking.id.clone(),
        session_start: start,
        lead_minutes: lead.num_minutes(),
        refund_percent,
        refund_amount: refund_amount(booking.total_amount, refund_percent),
    }
}

/// Catalog query: free-text search over name and city plus an optional energy type
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanionFilter {
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub energy_type: Option<EnergyType>,
}

impl CompanionFilter {
    pub fn matches(&self, companion: &Companion) -> bool {
        let matches_search = match self.search.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(query) => {
                let query = query.to_lowercase();
                companion.name.to_lowercase().contains(&query)
                    || companion.city.to_lowercase().contains(&query)
            }
        };
        let matches_type = self
            .energy_type
            .map_or(true, |wanted| companion.energy_type == wanted);
        matches_search && matches_type
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PresenceNature;
    use proptest::prelude::*;

    fn ist() -> FixedOffset {
        FixedOffset::east_opt(330 * 60).unwrap()
    }

    fn booking_at(date: NaiveDate, time: NaiveTime, total_amount: i64) -> Booking {
        let created = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        Booking {
            id: "b1".to_string(),
            client_id: "c1".to_string(),
            companion_id: "p1".to_string(),
            booking_date: date,
            start_time: time,
            duration_hours: 2,
            venue_name: "Blue Tokai".to_string(),
            venue_address: "Jubilee Hills".to_string(),
            presence_nature: PresenceNature::CafeCompanion,
            special_notes: None,
            phone: "+91 98765 43210".to_string(),
            total_amount,
            status: BookingStatus::Confirmed,
            created_at: created,
            updated_at: created,
        }
    }

    fn companion(name: &str, city: &str, energy_type: EnergyType) -> Companion {
        Companion {
            id: "p1".to_string(),
            name: name.to_string(),
            bio: None,
            avatar_url: None,
            city: city.to_string(),
            energy_type,
            hourly_rate: 500,
            is_available: true,
            is_verified: true,
            rating: 4.8,
            total_sessions: 12,
            languages: vec!["Telugu".to_string(), "English".to_string()],
            created_at: Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    #[test]
    fn rate_500_for_three_hours_costs_1500() {
        assert_eq!(total_amount(500, 3), Some(1500));
    }

    #[test]
    fn total_amount_reports_overflow() {
        assert_eq!(total_amount(i64::MAX, 2), None);
    }

    #[test]
    fn durations_outside_one_to_six_are_invalid() {
        assert!(!is_valid_duration(0));
        assert!(is_valid_duration(1));
        assert!(is_valid_duration(6));
        assert!(!is_valid_duration(7));
    }

    #[test]
    fn refund_tier_boundaries() {
        let h = Duration::hours;
        let m = Duration::minutes;
        assert_eq!(refund_percent(h(24)), 100);
        assert_eq!(refund_percent(h(23) + m(59)), 50);
        assert_eq!(refund_percent(h(12)), 50);
        assert_eq!(refund_percent(h(11) + m(59)), 0);
        assert_eq!(refund_percent(h(-3)), 0);
    }

    #[test]
    fn session_start_is_read_in_the_service_time_zone() {
        let date = NaiveDate::from_ymd_opt(2026, 10, 20).unwrap();
        let time = NaiveTime::from_hms_opt(18, 0, 0).unwrap();
        assert_eq!(
            session_start(date, time, ist()),
            Utc.with_ymd_and_hms(2026, 10, 20, 12, 30, 0).unwrap()
        );
    }

    #[test]
    fn local_today_follows_the_offset() {
        // 20:00 UTC is already the next morning in India
        let now = Utc.with_ymd_and_hms(2026, 10, 17, 20, 0, 0).unwrap();
        assert_eq!(
            local_today(now, ist()),
            NaiveDate::from_ymd_opt(2026, 10, 18).unwrap()
        );
    }

    #[test]
    fn quote_for_exactly_24_hours_refunds_everything() {
        let booking = booking_at(
            NaiveDate::from_ymd_opt(2026, 10, 20).unwrap(),
            NaiveTime::from_hms_opt(18, 0, 0).unwrap(),
            1000,
        );
        let start = Utc.with_ymd_and_hms(2026, 10, 20, 12, 30, 0).unwrap();

        let quote = evaluate_cancellation_policy(&booking, start - Duration::hours(24), ist());
        assert_eq!(quote.refund_percent, 100);
        assert_eq!(quote.refund_amount, 1000);
        assert_eq!(quote.lead_minutes, 24 * 60);

        let quote = evaluate_cancellation_policy(&booking, start - Duration::hours(13), ist());
        assert_eq!(quote.refund_percent, 50);
        assert_eq!(quote.refund_amount, 500);

        let quote = evaluate_cancellation_policy(&booking, start + Duration::minutes(5), ist());
        assert_eq!(quote.refund_percent, 0);
        assert_eq!(quote.refund_amount, 0);
        assert_eq!(quote.lead_minutes, -5);
    }

    #[test]
    fn quote_for_the_largest_priced_booking_does_not_overflow() {
        let total = total_amount(100_000_000_000_000_000, 1).unwrap();
        let booking = booking_at(
            NaiveDate::from_ymd_opt(2026, 10, 20).unwrap(),
            NaiveTime::from_hms_opt(18, 0, 0).unwrap(),
            total,
        );
        let start = Utc.with_ymd_and_hms(2026, 10, 20, 12, 30, 0).unwrap();

        let quote = evaluate_cancellation_policy(&booking, start - Duration::hours(48), ist());
        assert_eq!(quote.refund_amount, total);

        let quote = evaluate_cancellation_policy(&booking, start - Duration::hours(13), ist());
        assert_eq!(quote.refund_amount, 50_000_000_000_000_000);

        assert_eq!(refund_amount(i64::MAX, 100), i64::MAX);
        assert_eq!(refund_amount(1999, 50), 999);
    }

    #[test]
    fn clients_may_only_cancel_live_bookings() {
        use BookingStatus::*;
        for from in BookingStatus::ALL {
            for to in BookingStatus::ALL {
                let expected = to == Cancelled && matches!(from, Pending | Confirmed);
                assert_eq!(may_transition(false, from, to), expected, "{from} -> {to}");
                assert!(may_transition(true, from, to), "admin {from} -> {to}");
            }
        }
    }

    #[test]
    fn filter_matches_name_or_city_case_insensitively() {
        let anaya = companion("Anaya Rao", "Hyderabad", EnergyType::CalmListener);

        let by_city = CompanionFilter {
            search: Some("hyder".to_string()),
            energy_type: None,
        };
        assert!(by_city.matches(&anaya));

        let by_name = CompanionFilter {
            search: Some("  ANAYA ".to_string()),
            energy_type: Some(EnergyType::CalmListener),
        };
        assert!(by_name.matches(&anaya));

        let wrong_type = CompanionFilter {
            search: None,
            energy_type: Some(EnergyType::SilentObservant),
        };
        assert!(!wrong_type.matches(&anaya));

        let miss = CompanionFilter {
            search: Some("mumbai".to_string()),
            energy_type: None,
        };
        assert!(!miss.matches(&anaya));

        assert!(CompanionFilter::default().matches(&anaya));
    }

    proptest! {
        #[test]
        fn total_is_rate_times_duration(rate in 1i64..100_000, hours in 1u32..=6) {
            prop_assert_eq!(total_amount(rate, hours), Some(rate * i64::from(hours)));
        }

        #[test]
        fn refund_amount_matches_wide_arithmetic(total in 0i64..=i64::MAX, pct in prop::sample::select(vec![0u8, 50, 100])) {
            let wide = i128::from(total) * i128::from(pct) / 100;
            prop_assert_eq!(i128::from(refund_amount(total, pct)), wide);
        }

        #[test]
        fn refund_percent_is_deterministic_and_monotone(a in -2_000i64..5_000, b in -2_000i64..5_000) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            let first = refund_percent(Duration::minutes(lo));
            prop_assert_eq!(first, refund_percent(Duration::minutes(lo)));
            prop_assert!(first <= refund_percent(Duration::minutes(hi)));
        }
    }
}
