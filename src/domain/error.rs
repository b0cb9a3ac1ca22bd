//! Error taxonomy for the booking core

use chrono::NaiveDate;
use thiserror::Error;

/// Rejection of a day click while building a range.
///
/// These are recoverable by design: the selector stays where it was and
/// the caller shows the message next to the calendar.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum SelectionError {
    #[error("{0} is in the past")]
    DayInPast(NaiveDate),

    #[error("{0} is outside the bookable window")]
    OutsideWindow(NaiveDate),

    #[error("{date}: {remaining} unit(s) left, {requested} requested")]
    DayUnavailable {
        date: NaiveDate,
        remaining: i64,
        requested: i64,
    },

    #[error("end date {end} is before start date {start}")]
    EndBeforeStart { start: NaiveDate, end: NaiveDate },

    #[error("{date} inside the range has {remaining} unit(s) left, {requested} requested")]
    RangeUnavailable {
        date: NaiveDate,
        remaining: i64,
        requested: i64,
    },
}

/// Failure talking to the marketplace backend.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("network error: {0}")]
    Network(String),

    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("reservation conflict: {0}")]
    Conflict(String),

    #[error("rejected by backend ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("backend error ({status})")]
    Server { status: u16 },

    #[error("malformed response: {0}")]
    Decode(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl GatewayError {
    /// Whether the call may succeed if simply retried.
    ///
    /// Conflicts are never transient: the availability picture changed
    /// and must be re-fetched before another attempt makes sense.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            GatewayError::Network(_) | GatewayError::Timeout(_) | GatewayError::Server { .. }
        )
    }
}

/// Failure to submit a reservation.
#[derive(Debug, Error)]
pub enum BookingError {
    #[error("no date range selected")]
    NoDateRange,

    #[error("not signed in")]
    NotAuthenticated,

    #[error("quantity {requested} outside 1..={stock}")]
    InvalidQuantity { requested: i64, stock: i64 },

    #[error("availability is out of date; refresh before submitting")]
    StaleAvailability,

    #[error("availability changed on the backend: {0}")]
    Conflict(String),

    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

impl BookingError {
    pub fn is_transient(&self) -> bool {
        matches!(self, BookingError::Gateway(e) if e.is_transient())
    }
}

// ── Tests ──────────────────────────────────────────────────────
