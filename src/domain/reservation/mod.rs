//! Reservation aggregate
//!
//! Contains the Reservation entity, related types, and the gateway
//! interface to the marketplace backend.

pub mod gateway;
pub mod model;

pub use gateway::{GatewayResult, ReservationGateway};
pub use model::{NewReservation, Reservation, ReservationConfirmation, ReservationStatus};
