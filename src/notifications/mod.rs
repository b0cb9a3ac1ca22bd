//! Notifications module
//!
//! Typed pub/sub for booking events, so hosts can mirror availability
//! and reservation changes across views without global event hacks.
//!
//! # Usage
//! ```ignore
//! use cadenza_booking::notifications::{create_event_bus, BookingEvent, AvailabilityStaleEvent};
//!
//! let event_bus = create_event_bus();
//!
//! event_bus.publish(BookingEvent::AvailabilityStale(AvailabilityStaleEvent {
//!     product_id: 7,
//!     reason: "conflict".to_string(),
//! }));
//! ```

pub mod event_bus;
pub mod events;

pub use event_bus::{create_event_bus, EventBus, EventSubscriber, SharedEventBus};
pub use events::*;
