pub mod date_range;
pub mod error;
pub mod identity;
pub mod product;
pub mod reservation;

// Re-export commonly used types
pub use date_range::DateRange;
pub use error::{BookingError, GatewayError, SelectionError};
pub use identity::{IdentityProvider, UserIdentity};
pub use product::ProductSnapshot;
pub use reservation::{
    GatewayResult, NewReservation, Reservation, ReservationConfirmation, ReservationGateway,
    ReservationStatus,
};
