//! Booking events
//!
//! Typed events the booking core broadcasts so other parts of the host
//! UI (product page, my-bookings list, price widgets) can stay in sync
//! without ambient global events.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Event types broadcast by a booking session
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum BookingEvent {
    /// Availability index rebuilt from a fresh reservation list
    AvailabilityRefreshed(AvailabilityRefreshedEvent),
    /// Local availability no longer trusted; a refresh is required
    AvailabilityStale(AvailabilityStaleEvent),
    /// A date range selection was completed
    SelectionCompleted(SelectionCompletedEvent),
    /// The in-progress or completed selection was discarded
    SelectionCleared(SelectionClearedEvent),
    /// A reservation was accepted by the marketplace
    ReservationSubmitted(ReservationSubmittedEvent),
    /// A submission attempt failed
    SubmissionFailed(SubmissionFailedEvent),
}

impl BookingEvent {
    /// Get the event type name
    pub fn event_type(&self) -> &'static str {
        match self {
            BookingEvent::AvailabilityRefreshed(_) => "availability_refreshed",
            BookingEvent::AvailabilityStale(_) => "availability_stale",
            BookingEvent::SelectionCompleted(_) => "selection_completed",
            BookingEvent::SelectionCleared(_) => "selection_cleared",
            BookingEvent::ReservationSubmitted(_) => "reservation_submitted",
            BookingEvent::SubmissionFailed(_) => "submission_failed",
        }
    }

    /// Product the event concerns
    pub fn product_id(&self) -> i64 {
        match self {
            BookingEvent::AvailabilityRefreshed(e) => e.product_id,
            BookingEvent::AvailabilityStale(e) => e.product_id,
            BookingEvent::SelectionCompleted(e) => e.product_id,
            BookingEvent::SelectionCleared(e) => e.product_id,
            BookingEvent::ReservationSubmitted(e) => e.product_id,
            BookingEvent::SubmissionFailed(e) => e.product_id,
        }
    }
}

/// Availability refreshed event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailabilityRefreshedEvent {
    pub product_id: i64,
    pub window_start: NaiveDate,
    pub window_end: NaiveDate,
    /// Reservations that went into the rebuild
    pub reservation_count: usize,
}

/// Availability stale event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailabilityStaleEvent {
    pub product_id: i64,
    /// Why the local picture is no longer trusted
    pub reason: String,
}

/// Selection completed event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectionCompletedEvent {
    pub product_id: i64,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub quantity: i64,
    pub subtotal_minor: i64,
}

/// Selection cleared event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectionClearedEvent {
    pub product_id: i64,
    /// quantity_changed, availability_changed, conflict, submitted or manual
    pub reason: String,
}

/// Reservation submitted event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReservationSubmittedEvent {
    pub product_id: i64,
    pub reservation_id: i64,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub quantity: i64,
    pub total_price_minor: i64,
}

/// Submission failed event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionFailedEvent {
    pub product_id: i64,
    pub message: String,
    /// Whether retrying the same submission may succeed
    pub transient: bool,
}

/// Wrapper for delivering events with metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventEnvelope {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub event: BookingEvent,
}

impl EventEnvelope {
    pub fn new(event: BookingEvent) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            event,
        }
    }
}

// ── Tests ──────────────────────────────────────────────────────
