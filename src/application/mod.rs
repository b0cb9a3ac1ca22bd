pub mod availability;
pub mod pricing;
pub mod selection;
pub mod session;

// Re-export key types for convenience
pub use availability::{booking_window, AvailabilityIndex, DEFAULT_WINDOW_MONTHS};
pub use pricing::{format_amount, Quote};
pub use selection::{ClickOutcome, RangeSelector, SelectionPhase};
pub use session::BookingSession;
