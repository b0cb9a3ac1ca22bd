//! Reservation gateway interface

use async_trait::async_trait;

use super::model::{NewReservation, Reservation, ReservationConfirmation};
use crate::domain::error::GatewayError;

pub type GatewayResult<T> = Result<T, GatewayError>;

/// Access to the marketplace reservation API.
///
/// One implementation speaks HTTP to the real backend; an in-memory one
/// backs tests and offline demos.
#[async_trait]
pub trait ReservationGateway: Send + Sync {
    /// Fetch every reservation currently recorded for a product.
    ///
    /// The returned list is the authoritative picture; the availability
    /// index is rebuilt from it wholesale.
    async fn reservations_for_product(&self, product_id: i64) -> GatewayResult<Vec<Reservation>>;

    /// Create a reservation on the marketplace.
    ///
    /// Never retried internally: the call is not idempotent and a
    /// duplicate would double-book the caller.
    async fn create_reservation(
        &self,
        request: &NewReservation,
    ) -> GatewayResult<ReservationConfirmation>;
}
