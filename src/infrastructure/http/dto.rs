//! Wire DTOs for the marketplace reservation API
//!
//! The backend speaks camelCase JSON with `YYYY-MM-DD` dates and prices
//! in major currency units; everything internal stays snake_case with
//! minor-unit integers, so the conversions live here and nowhere else.

use chrono::NaiveDate;
use log::warn;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::domain::date_range::DateRange;
use crate::domain::reservation::{NewReservation, Reservation, ReservationConfirmation, ReservationStatus};

/// One reservation as returned by `GET /reservations/product/{id}`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReservationDto {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub quantity: i64,
    #[serde(default)]
    pub status: Option<String>,
}

impl ReservationDto {
    /// Convert to the domain entity.
    ///
    /// A row whose end precedes its start is backend data the core
    /// cannot price or index; it is dropped with a warning rather than
    /// failing the whole fetch. A missing status counts as pending so
    /// the row keeps holding stock.
    pub fn into_domain(self) -> Option<Reservation> {
        let Some(period) = DateRange::new(self.start_date, self.end_date) else {
            warn!(
                "Dropping reservation with reversed dates: start={}, end={}",
                self.start_date, self.end_date
            );
            return None;
        };
        let status = self
            .status
            .as_deref()
            .map_or(ReservationStatus::Pending, ReservationStatus::from_str);
        Some(Reservation::new(period, self.quantity, status))
    }
}

/// Body for `POST /reservations`
#[derive(Debug, Clone, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateReservationRequest {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[validate(range(min = 1))]
    pub quantity: i64,
    /// Always "PENDING"; the marketplace owns later transitions
    pub status: String,
    pub id_user: i64,
    pub id_product: i64,
    /// Major currency units, e.g. 90.0 for ninety euros
    #[validate(range(min = 0.0))]
    pub total_price: f64,
}

impl CreateReservationRequest {
    pub fn from_domain(request: &NewReservation) -> Self {
        Self {
            start_date: request.period.start,
            end_date: request.period.end,
            quantity: request.quantity,
            status: ReservationStatus::Pending.as_str().to_string(),
            id_user: request.user_id,
            id_product: request.product_id,
            total_price: minor_to_major(request.total_price_minor),
        }
    }
}

/// Record returned by a successful `POST /reservations`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedReservationDto {
    pub id: i64,
    #[serde(default)]
    pub status: Option<String>,
}

impl CreatedReservationDto {
    pub fn into_domain(self) -> ReservationConfirmation {
        ReservationConfirmation {
            reservation_id: self.id,
            status: self
                .status
                .as_deref()
                .map_or(ReservationStatus::Pending, ReservationStatus::from_str),
        }
    }
}

/// Error payload the backend sends alongside non-2xx statuses
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub message: Option<String>,
}

/// Minor units (cents) to the major units the wire expects.
pub fn minor_to_major(amount_minor: i64) -> f64 {
    amount_minor as f64 / 100.0
}

// ── Tests ──────────────────────────────────────────────────────
