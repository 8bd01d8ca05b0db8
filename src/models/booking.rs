use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::pricing::TripType;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Accepted,
    Started,
    Completed,
    Cancelled,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Online,
    Cash,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum PaymentLegStatus {
    Pending,
    Paid,
    Collected,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TripDetails {
    pub pickup: String,
    pub destination: String,
    pub scheduled_at: DateTime<Utc>,
    pub trip_type: TripType,
    pub distance_km: f64,
    pub return_date: Option<DateTime<Utc>>,
}

/// Fare snapshot frozen at creation time. A booking never re-reads the
/// live pricing rule, so later rule edits or deletions cannot reprice it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingSnapshot {
    pub total_amount: f64,
    pub rate_per_km: f64,
    pub distance_tier_used: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartialPaymentDetails {
    pub online_amount: f64,
    pub cash_amount: f64,
    pub online_status: PaymentLegStatus,
    pub cash_status: PaymentLegStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentInfo {
    pub method: PaymentMethod,
    pub is_partial_payment: bool,
    pub status: PaymentLegStatus,
    pub partial: Option<PartialPaymentDetails>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    pub vehicle_id: Uuid,
    pub rider_id: Uuid,
    pub trip: TripDetails,
    pub pricing: PricingSnapshot,
    pub payment: PaymentInfo,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Lifecycle event broadcast to notification consumers after a state
/// change has been committed to the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingEvent {
    pub booking_id: Uuid,
    pub status: BookingStatus,
    pub event: String,
    pub occurred_at: DateTime<Utc>,
}
