//! # Cadenza Booking
//!
//! Availability and reservation core for an instrument-rental
//! marketplace: per-day remaining stock, two-click date range
//! selection, price quoting and validated submission to the
//! marketplace REST backend.
//!
//! ## Architecture
//!
//! The project follows Clean Architecture principles:
//!
//! - **domain**: Core business entities, types and traits
//! - **application**: Availability index, range selection, pricing and
//!   the booking session that ties them together
//! - **infrastructure**: External concerns (HTTP gateway, in-memory
//!   test doubles)
//! - **notifications**: Typed event bus for keeping host views in sync

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod notifications;
pub mod shared;

pub use config::{default_config_path, AppConfig};

// Re-export the core types most hosts need
pub use application::{AvailabilityIndex, BookingSession, ClickOutcome, Quote, RangeSelector};
pub use domain::{BookingError, DateRange, ProductSnapshot, SelectionError};

// Re-export notifications
pub use notifications::{create_event_bus, BookingEvent, EventBus, SharedEventBus};
