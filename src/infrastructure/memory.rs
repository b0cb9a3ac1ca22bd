//! In-memory reservation gateway

use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::NaiveDate;
use dashmap::DashMap;
use log::debug;

use crate::domain::error::GatewayError;
use crate::domain::identity::{IdentityProvider, UserIdentity};
use crate::domain::reservation::{
    GatewayResult, NewReservation, Reservation, ReservationConfirmation, ReservationGateway,
    ReservationStatus,
};

/// In-memory gateway for development and testing.
///
/// Behaves like a lenient marketplace backend: creates append a pending
/// reservation, and a create that would push any requested day below
/// zero remaining is rejected as a conflict, the same way the real
/// backend rejects a lost booking race. Products without a seeded stock
/// figure skip the conflict check entirely.
pub struct InMemoryReservationGateway {
    reservations: DashMap<i64, Vec<Reservation>>,
    stock: DashMap<i64, i64>,
    id_counter: AtomicI64,
    fetch_calls: AtomicUsize,
    create_calls: AtomicUsize,
    failing_fetches: AtomicUsize,
    conflict_next_create: AtomicBool,
}

impl InMemoryReservationGateway {
    pub fn new() -> Self {
        Self {
            reservations: DashMap::new(),
            stock: DashMap::new(),
            id_counter: AtomicI64::new(1),
            fetch_calls: AtomicUsize::new(0),
            create_calls: AtomicUsize::new(0),
            failing_fetches: AtomicUsize::new(0),
            conflict_next_create: AtomicBool::new(false),
        }
    }

    /// Record the stock the backend holds for a product.
    pub fn set_stock(&self, product_id: i64, stock: i64) {
        self.stock.insert(product_id, stock);
    }

    /// Insert an existing reservation behind the API.
    pub fn seed_reservation(&self, product_id: i64, reservation: Reservation) {
        self.reservations
            .entry(product_id)
            .or_default()
            .push(reservation);
    }

    /// Make the next `count` fetches fail with a network error.
    pub fn fail_next_fetches(&self, count: usize) {
        self.failing_fetches.store(count, Ordering::SeqCst);
    }

    /// Make the next create fail as a conflict regardless of stock.
    pub fn conflict_on_next_create(&self) {
        self.conflict_next_create.store(true, Ordering::SeqCst);
    }

    pub fn fetch_call_count(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    pub fn create_call_count(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    /// Units still free on `day`, given seeded stock and reservations.
    fn remaining_on(&self, product_id: i64, day: NaiveDate, stock: i64) -> i64 {
        let held: i64 = self.reservations.get(&product_id).map_or(0, |list| {
            list.iter()
                .filter(|r| r.holds_stock() && r.period.contains(day))
                .map(|r| r.quantity)
                .sum()
        });
        stock - held
    }
}

impl Default for InMemoryReservationGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ReservationGateway for InMemoryReservationGateway {
    async fn reservations_for_product(&self, product_id: i64) -> GatewayResult<Vec<Reservation>> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);

        let failing = self.failing_fetches.load(Ordering::SeqCst);
        if failing > 0 {
            self.failing_fetches.store(failing - 1, Ordering::SeqCst);
            return Err(GatewayError::Network("injected fetch failure".into()));
        }

        Ok(self
            .reservations
            .get(&product_id)
            .map(|list| list.clone())
            .unwrap_or_default())
    }

    async fn create_reservation(
        &self,
        request: &NewReservation,
    ) -> GatewayResult<ReservationConfirmation> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);

        if self.conflict_next_create.swap(false, Ordering::SeqCst) {
            return Err(GatewayError::Conflict(
                "availability changed, please re-select".into(),
            ));
        }

        if let Some(stock) = self.stock.get(&request.product_id).map(|s| *s) {
            for day in request.period.days() {
                let remaining = self.remaining_on(request.product_id, day, stock);
                if remaining < request.quantity {
                    return Err(GatewayError::Conflict(format!(
                        "only {} unit(s) left on {}",
                        remaining, day
                    )));
                }
            }
        }

        let id = self.id_counter.fetch_add(1, Ordering::SeqCst);
        self.reservations
            .entry(request.product_id)
            .or_default()
            .push(Reservation::new(
                request.period,
                request.quantity,
                ReservationStatus::Pending,
            ));
        debug!(
            "In-memory reservation {} created for product {}",
            id, request.product_id
        );

        Ok(ReservationConfirmation {
            reservation_id: id,
            status: ReservationStatus::Pending,
        })
    }
}

/// Identity provider with a fixed answer.
///
/// Hosts with a real auth layer implement `IdentityProvider` themselves;
/// this one serves the CLI (token from config or environment) and tests.
#[derive(Debug, Clone, Default)]
pub struct StaticIdentity {
    identity: Option<UserIdentity>,
}

impl StaticIdentity {
    pub fn signed_in(user_id: i64, bearer_token: impl Into<String>) -> Self {
        Self {
            identity: Some(UserIdentity::new(user_id, bearer_token)),
        }
    }

    pub fn signed_out() -> Self {
        Self { identity: None }
    }
}

#[async_trait]
impl IdentityProvider for StaticIdentity {
    async fn current_identity(&self) -> Option<UserIdentity> {
        self.identity.clone()
    }
}

// ── Tests ──────────────────────────────────────────────────────
