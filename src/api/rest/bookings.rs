use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::Json;
use axum::Router;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::catalog;
use crate::engine::fare;
use crate::engine::lifecycle::{self, TransitionEvent};
use crate::engine::payment;
use crate::error::AppError;
use crate::models::actor::Actor;
use crate::models::booking::{
    Booking, BookingEvent, BookingStatus, PartialPaymentDetails, PaymentInfo, PaymentLegStatus,
    PaymentMethod, PricingSnapshot, TripDetails,
};
use crate::models::pricing::{FareBreakdown, FuelType, RuleKey, TripType, VehicleCategory};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/fare/quote", post(quote_fare))
        .route("/bookings", post(create_booking).get(list_bookings))
        .route("/bookings/:id", get(get_booking))
        .route("/bookings/:id/transition", post(transition_booking))
        .route("/bookings/:id/collect-cash", post(collect_cash))
}

#[derive(Deserialize)]
pub struct FareQuoteRequest {
    pub category: VehicleCategory,
    pub vehicle_type: String,
    pub vehicle_model: String,
    pub trip_type: TripType,
    pub fuel_type: FuelType,
    pub distance_km: f64,
    pub scheduled_at: DateTime<Utc>,
}

#[derive(Deserialize)]
pub struct CreateBookingRequest {
    pub vehicle_id: Uuid,
    pub rider_id: Uuid,
    pub category: VehicleCategory,
    pub vehicle_type: String,
    pub vehicle_model: String,
    pub fuel_type: FuelType,
    pub pickup: String,
    pub destination: String,
    pub scheduled_at: DateTime<Utc>,
    pub trip_type: TripType,
    pub distance_km: f64,
    pub return_date: Option<DateTime<Utc>>,
    pub payment_method: PaymentMethod,
}

#[derive(Deserialize)]
pub struct TransitionRequest {
    pub event: TransitionEvent,
    pub actor: Actor,
}

#[derive(Deserialize)]
pub struct CollectCashRequest {
    pub actor: Actor,
}

fn compute_fare(
    state: &AppState,
    key: &RuleKey,
    distance_km: f64,
    scheduled_at: DateTime<Utc>,
    fuel_type: FuelType,
) -> Result<FareBreakdown, AppError> {
    let rule = catalog::find_active(state, key)?;

    match fare::compute(&rule, distance_km, scheduled_at, fuel_type) {
        Ok(breakdown) => {
            state
                .metrics
                .fare_computations_total
                .with_label_values(&["success"])
                .inc();
            state
                .metrics
                .fare_total_amount
                .with_label_values(&[category_label(key.category)])
                .observe(breakdown.total_amount);
            Ok(breakdown)
        }
        Err(err) => {
            state
                .metrics
                .fare_computations_total
                .with_label_values(&["error"])
                .inc();
            Err(err)
        }
    }
}

fn category_label(category: VehicleCategory) -> &'static str {
    match category {
        VehicleCategory::Auto => "auto",
        VehicleCategory::Car => "car",
        VehicleCategory::Bus => "bus",
    }
}

async fn quote_fare(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<FareQuoteRequest>,
) -> Result<Json<FareBreakdown>, AppError> {
    let key = RuleKey {
        category: payload.category,
        vehicle_type: payload.vehicle_type,
        vehicle_model: payload.vehicle_model,
        trip_type: payload.trip_type,
    };

    let breakdown = compute_fare(
        &state,
        &key,
        payload.distance_km,
        payload.scheduled_at,
        payload.fuel_type,
    )?;

    Ok(Json(breakdown))
}

async fn create_booking(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateBookingRequest>,
) -> Result<Json<Booking>, AppError> {
    let key = RuleKey {
        category: payload.category,
        vehicle_type: payload.vehicle_type,
        vehicle_model: payload.vehicle_model,
        trip_type: payload.trip_type,
    };

    let breakdown = compute_fare(
        &state,
        &key,
        payload.distance_km,
        payload.scheduled_at,
        payload.fuel_type,
    )?;

    let split = payment::split(breakdown.total_amount, payload.payment_method);

    let partial = split.is_partial_payment.then(|| PartialPaymentDetails {
        online_amount: split.advance_amount,
        cash_amount: split.driver_collected_amount,
        online_status: PaymentLegStatus::Paid,
        cash_status: PaymentLegStatus::Pending,
    });

    let now = Utc::now();
    let booking = Booking {
        id: Uuid::new_v4(),
        vehicle_id: payload.vehicle_id,
        rider_id: payload.rider_id,
        trip: TripDetails {
            pickup: payload.pickup,
            destination: payload.destination,
            scheduled_at: payload.scheduled_at,
            trip_type: payload.trip_type,
            distance_km: payload.distance_km,
            return_date: payload.return_date,
        },
        pricing: PricingSnapshot {
            total_amount: breakdown.total_amount,
            rate_per_km: breakdown.rate_per_km,
            distance_tier_used: breakdown.distance_tier_used,
        },
        payment: PaymentInfo {
            method: payload.payment_method,
            is_partial_payment: split.is_partial_payment,
            status: PaymentLegStatus::Pending,
            partial,
        },
        status: BookingStatus::Pending,
        created_at: now,
        updated_at: now,
    };

    // Commit before notifying.
    state.bookings.insert(booking.id, booking.clone());

    let _ = state.booking_events_tx.send(BookingEvent {
        booking_id: booking.id,
        status: booking.status,
        event: "created".to_string(),
        occurred_at: now,
    });

    state
        .metrics
        .bookings_created_total
        .with_label_values(&[match payload.payment_method {
            PaymentMethod::Online => "online",
            PaymentMethod::Cash => "cash",
        }])
        .inc();

    Ok(Json(booking))
}

async fn get_booking(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Booking>, AppError> {
    let booking = state
        .bookings
        .get(&id)
        .ok_or_else(|| AppError::NotFound(format!("booking {id} not found")))?;

    Ok(Json(booking.value().clone()))
}

async fn list_bookings(State(state): State<Arc<AppState>>) -> Json<Vec<Booking>> {
    let bookings = state
        .bookings
        .iter()
        .map(|entry| entry.value().clone())
        .collect();
    Json(bookings)
}

async fn transition_booking(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<TransitionRequest>,
) -> Result<Json<Booking>, AppError> {
    lifecycle::transition(&state, id, payload.event, payload.actor)
        .map(Json)
        .inspect_err(|_| {
            state
                .metrics
                .transitions_total
                .with_label_values(&[payload.event.as_str(), "rejected"])
                .inc();
        })
}

async fn collect_cash(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<CollectCashRequest>,
) -> Result<Json<Booking>, AppError> {
    lifecycle::collect_cash(&state, id, payload.actor)
        .map(Json)
        .inspect_err(|_| {
            state
                .metrics
                .transitions_total
                .with_label_values(&["collect-cash", "rejected"])
                .inc();
        })
}
