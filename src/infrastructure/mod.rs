//! Infrastructure layer - external concerns

pub mod http;
pub mod memory;

pub use http::{HttpGatewayConfig, HttpReservationGateway};
pub use memory::{InMemoryReservationGateway, StaticIdentity};
