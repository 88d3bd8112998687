use std::sync::Arc;

use anyhow::Result;

use crate::{booking::BookingManager, clock::Clock, config::Config, db::Database, notify::Notifier};

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub config: Config,
    pub clock: Arc<dyn Clock>,
    pub bookings: BookingManager,
}

impl AppState {
    pub fn new(db: Database, config: Config, notifier: Notifier, clock: Arc<dyn Clock>) -> Result<Self> {
        let tz = config.booking.time_zone()?;
        let bookings = BookingManager::new(db.clone(), notifier, clock.clone(), tz);

        Ok(Self {
            db,
            config,
            clock,
            bookings,
        })
    }
}
