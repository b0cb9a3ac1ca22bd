//! Reservation domain entity

use crate::domain::date_range::DateRange;

/// Reservation lifecycle status as reported by the marketplace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReservationStatus {
    /// Created, awaiting marketplace confirmation
    Pending,
    /// Confirmed by the marketplace
    Confirmed,
    /// Cancelled by the user or the marketplace
    Cancelled,
    /// Rental period finished
    Completed,
}

impl ReservationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Confirmed => "CONFIRMED",
            Self::Cancelled => "CANCELLED",
            Self::Completed => "COMPLETED",
        }
    }

    /// Unknown wire statuses parse as `Pending`: an unrecognized
    /// reservation keeps holding stock rather than freeing it.
    pub fn from_str(s: &str) -> Self {
        match s {
            "PENDING" => Self::Pending,
            "CONFIRMED" => Self::Confirmed,
            "CANCELLED" => Self::Cancelled,
            "COMPLETED" => Self::Completed,
            _ => Self::Pending,
        }
    }

    /// Whether a reservation in this status still consumes stock.
    pub fn holds_stock(&self) -> bool {
        matches!(self, Self::Pending | Self::Confirmed)
    }
}

impl std::fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Existing allocation of units over an inclusive span of days.
///
/// Fetched from the marketplace and treated as read-only input to the
/// availability index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reservation {
    pub period: DateRange,
    pub quantity: i64,
    pub status: ReservationStatus,
}

impl Reservation {
    pub fn new(period: DateRange, quantity: i64, status: ReservationStatus) -> Self {
        Self {
            period,
            quantity,
            status,
        }
    }

    /// Whether this reservation removes units from availability.
    pub fn holds_stock(&self) -> bool {
        self.status.holds_stock()
    }
}

/// Reservation request assembled by a booking session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewReservation {
    pub product_id: i64,
    pub user_id: i64,
    pub period: DateRange,
    pub quantity: i64,
    /// Total charge in minor units, exactly as quoted to the user.
    pub total_price_minor: i64,
}

/// Backend acknowledgement of a created reservation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReservationConfirmation {
    pub reservation_id: i64,
    pub status: ReservationStatus,
}

// ── Tests ──────────────────────────────────────────────────────
