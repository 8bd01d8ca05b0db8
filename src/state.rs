use dashmap::DashMap;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::models::booking::{Booking, BookingEvent};
use crate::models::pricing::PricingRule;
use crate::observability::metrics::Metrics;

pub struct AppState {
    pub pricing_rules: DashMap<Uuid, PricingRule>,
    pub bookings: DashMap<Uuid, Booking>,
    pub booking_events_tx: broadcast::Sender<BookingEvent>,
    pub metrics: Metrics,
}

impl AppState {
    pub fn new(event_buffer_size: usize) -> Self {
        let (booking_events_tx, _unused_rx) = broadcast::channel(event_buffer_size);

        Self {
            pricing_rules: DashMap::new(),
            bookings: DashMap::new(),
            booking_events_tx,
            metrics: Metrics::new(),
        }
    }
}
