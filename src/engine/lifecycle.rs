use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::actor::{Actor, ActorRole};
use crate::models::booking::{
    Booking, BookingEvent, BookingStatus, PaymentLegStatus, PaymentMethod,
};
use crate::state::AppState;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TransitionEvent {
    Accept,
    Decline,
    Start,
    Complete,
    Cancel,
}

impl TransitionEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransitionEvent::Accept => "accept",
            TransitionEvent::Decline => "decline",
            TransitionEvent::Start => "start",
            TransitionEvent::Complete => "complete",
            TransitionEvent::Cancel => "cancel",
        }
    }
}

fn status_name(status: BookingStatus) -> &'static str {
    match status {
        BookingStatus::Pending => "pending",
        BookingStatus::Accepted => "accepted",
        BookingStatus::Started => "started",
        BookingStatus::Completed => "completed",
        BookingStatus::Cancelled => "cancelled",
    }
}

/// Applies a lifecycle event to a booking. The guard is evaluated and the
/// new status written while holding the map entry lock, so two racing
/// actors cannot both pass the guard; the loser gets `InvalidTransition`.
/// The event broadcast happens only after the write has landed.
pub fn transition(
    state: &AppState,
    booking_id: Uuid,
    event: TransitionEvent,
    actor: Actor,
) -> Result<Booking, AppError> {
    authorize(event, actor)?;

    let updated = {
        let mut entry = state
            .bookings
            .get_mut(&booking_id)
            .ok_or_else(|| AppError::NotFound(format!("booking {booking_id} not found")))?;
        let booking = entry.value_mut();

        if actor.role == ActorRole::Rider && booking.rider_id != actor.id {
            return Err(AppError::Validation(format!(
                "rider {} does not own booking {booking_id}",
                actor.id
            )));
        }

        let next = next_status(booking.status, event).ok_or_else(|| {
            AppError::InvalidTransition(format!(
                "cannot {} a {} booking",
                event.as_str(),
                status_name(booking.status)
            ))
        })?;

        booking.status = next;
        booking.updated_at = Utc::now();
        booking.clone()
    };

    publish(state, &updated, event.as_str());

    state
        .metrics
        .transitions_total
        .with_label_values(&[event.as_str(), "success"])
        .inc();

    info!(
        booking_id = %updated.id,
        event = event.as_str(),
        status = status_name(updated.status),
        "booking transitioned"
    );

    Ok(updated)
}

fn next_status(current: BookingStatus, event: TransitionEvent) -> Option<BookingStatus> {
    match (current, event) {
        (BookingStatus::Pending, TransitionEvent::Accept) => Some(BookingStatus::Accepted),
        (BookingStatus::Pending, TransitionEvent::Decline) => Some(BookingStatus::Cancelled),
        (BookingStatus::Accepted, TransitionEvent::Start) => Some(BookingStatus::Started),
        (BookingStatus::Started, TransitionEvent::Complete) => Some(BookingStatus::Completed),
        (BookingStatus::Pending | BookingStatus::Accepted, TransitionEvent::Cancel) => {
            Some(BookingStatus::Cancelled)
        }
        _ => None,
    }
}

fn authorize(event: TransitionEvent, actor: Actor) -> Result<(), AppError> {
    let allowed = match event {
        TransitionEvent::Accept
        | TransitionEvent::Decline
        | TransitionEvent::Start
        | TransitionEvent::Complete => actor.role == ActorRole::Driver,
        TransitionEvent::Cancel => {
            actor.role == ActorRole::Rider || actor.role == ActorRole::Admin
        }
    };

    if allowed {
        Ok(())
    } else {
        Err(AppError::Validation(format!(
            "actor role is not allowed to {}",
            event.as_str()
        )))
    }
}

/// Marks the driver-collected cash leg of a completed booking as
/// collected. Independent of the status machine and irreversible.
pub fn collect_cash(state: &AppState, booking_id: Uuid, actor: Actor) -> Result<Booking, AppError> {
    if actor.role != ActorRole::Driver {
        return Err(AppError::Validation(
            "only the driver can collect cash".to_string(),
        ));
    }

    let updated = {
        let mut entry = state
            .bookings
            .get_mut(&booking_id)
            .ok_or_else(|| AppError::NotFound(format!("booking {booking_id} not found")))?;
        let booking = entry.value_mut();

        if booking.status != BookingStatus::Completed {
            return Err(AppError::InvalidTransition(format!(
                "booking {booking_id} is not completed"
            )));
        }

        match booking.payment.partial.as_mut() {
            Some(partial) => {
                if partial.cash_status != PaymentLegStatus::Pending {
                    return Err(AppError::InvalidTransition(format!(
                        "cash already collected for booking {booking_id}"
                    )));
                }
                partial.cash_status = PaymentLegStatus::Collected;
                booking.payment.status = PaymentLegStatus::Collected;
            }
            None => {
                if booking.payment.is_partial_payment {
                    return Err(AppError::Internal(format!(
                        "booking {booking_id} is partial but has no split details"
                    )));
                }
                if booking.payment.method == PaymentMethod::Online {
                    // Fully prepaid online: the advance covered everything.
                    return Err(AppError::InvalidTransition(format!(
                        "no cash due on booking {booking_id}"
                    )));
                }
                if booking.payment.status != PaymentLegStatus::Pending {
                    return Err(AppError::InvalidTransition(format!(
                        "cash already collected for booking {booking_id}"
                    )));
                }
                booking.payment.status = PaymentLegStatus::Collected;
            }
        }

        booking.updated_at = Utc::now();
        booking.clone()
    };

    publish(state, &updated, "collect-cash");

    state
        .metrics
        .transitions_total
        .with_label_values(&["collect-cash", "success"])
        .inc();

    info!(booking_id = %updated.id, "cash collected");

    Ok(updated)
}

fn publish(state: &AppState, booking: &Booking, event: &str) {
    let _ = state.booking_events_tx.send(BookingEvent {
        booking_id: booking.id,
        status: booking.status,
        event: event.to_string(),
        occurred_at: Utc::now(),
    });
}
