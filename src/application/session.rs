//! Booking session for one product page
//!
//! Owns the availability index, the range selector and the desired
//! quantity, and drives fetch/submit against the marketplace backend.
//! One session per open product view; no state is shared between them.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use tracing::{info, instrument, warn};

use crate::domain::error::{BookingError, GatewayError, SelectionError};
use crate::domain::identity::IdentityProvider;
use crate::domain::product::ProductSnapshot;
use crate::domain::reservation::{NewReservation, ReservationConfirmation, ReservationGateway};
use crate::notifications::{
    AvailabilityRefreshedEvent, AvailabilityStaleEvent, BookingEvent, ReservationSubmittedEvent,
    SelectionClearedEvent, SelectionCompletedEvent, SharedEventBus, SubmissionFailedEvent,
};
use crate::shared::retry::{retry_with_backoff, RetryConfig};

use super::availability::{booking_window, AvailabilityIndex};
use super::pricing::Quote;
use super::selection::{ClickOutcome, RangeSelector};

/// Books one product: index, selection and submission in one place.
///
/// Starts with zero availability everywhere; nothing is selectable until
/// the first [`refresh`](Self::refresh) pulls the reservation list. The
/// bookable window is anchored at the day the session was created.
pub struct BookingSession {
    product: ProductSnapshot,
    today: NaiveDate,
    window_months: u32,
    retry: RetryConfig,
    gateway: Arc<dyn ReservationGateway>,
    identity: Arc<dyn IdentityProvider>,
    event_bus: SharedEventBus,
    index: AvailabilityIndex,
    selector: RangeSelector,
    needs_refresh: bool,
}

impl BookingSession {
    /// Create a session anchored at the current UTC day.
    pub fn new(
        product: ProductSnapshot,
        gateway: Arc<dyn ReservationGateway>,
        identity: Arc<dyn IdentityProvider>,
        event_bus: SharedEventBus,
        window_months: u32,
    ) -> Self {
        Self::anchored_at(
            product,
            gateway,
            identity,
            event_bus,
            window_months,
            Utc::now().date_naive(),
        )
    }

    /// Create a session with a pinned anchor day.
    pub fn anchored_at(
        product: ProductSnapshot,
        gateway: Arc<dyn ReservationGateway>,
        identity: Arc<dyn IdentityProvider>,
        event_bus: SharedEventBus,
        window_months: u32,
        today: NaiveDate,
    ) -> Self {
        let index = AvailabilityIndex::build(0, &[], booking_window(today, window_months));
        Self {
            product,
            today,
            window_months,
            retry: RetryConfig::default(),
            gateway,
            identity,
            event_bus,
            index,
            selector: RangeSelector::new(1),
            needs_refresh: true,
        }
    }

    pub fn product(&self) -> &ProductSnapshot {
        &self.product
    }

    /// Current per-day availability, for rendering the calendar.
    pub fn availability(&self) -> &AvailabilityIndex {
        &self.index
    }

    /// Current selection state, for rendering start/end highlights.
    pub fn selector(&self) -> &RangeSelector {
        &self.selector
    }

    /// Whether the local picture is known to be out of date.
    ///
    /// Set after a conflict rejection and after a successful submission
    /// (the new reservation is not in the index yet); cleared by the
    /// next successful [`refresh`](Self::refresh). While set, submission
    /// is refused with [`BookingError::StaleAvailability`].
    pub fn needs_refresh(&self) -> bool {
        self.needs_refresh
    }

    /// Whether `day` would be accepted as a start click right now.
    pub fn can_start_at(&self, day: NaiveDate) -> bool {
        self.selector.can_start_at(day, &self.index)
    }

    /// Fetch the reservation list and rebuild the availability index.
    ///
    /// Transient fetch failures are retried with backoff; a final failure
    /// leaves the previous index untouched. A completed selection that no
    /// longer fits the fresh data is discarded.
    #[instrument(skip(self), fields(product_id = self.product.id))]
    pub async fn refresh(&mut self) -> Result<(), BookingError> {
        let gateway = Arc::clone(&self.gateway);
        let product_id = self.product.id;

        let reservations = retry_with_backoff(
            self.retry.clone(),
            move || {
                let gateway = Arc::clone(&gateway);
                async move { gateway.reservations_for_product(product_id).await }
            },
            GatewayError::is_transient,
            "fetch_reservations",
        )
        .await?;

        self.index = AvailabilityIndex::for_product(
            &self.product,
            &reservations,
            self.today,
            self.window_months,
        );
        self.needs_refresh = false;

        let window = self.index.window();
        info!(
            reservations = reservations.len(),
            window = %window,
            "Availability refreshed"
        );
        self.event_bus
            .publish(BookingEvent::AvailabilityRefreshed(AvailabilityRefreshedEvent {
                product_id,
                window_start: window.start,
                window_end: window.end,
                reservation_count: reservations.len(),
            }));

        // Fresh data may have pulled a previously completed range under
        // the desired quantity.
        if let Some(range) = self.selector.completed_range() {
            if !self.index.range_available(range, self.selector.quantity()) {
                self.selector.reset();
                self.publish_selection_cleared("availability_changed");
            }
        }

        Ok(())
    }

    /// Feed one calendar day click into the selection.
    ///
    /// Rejections leave the selection where it was; the error carries the
    /// user-facing detail. Completing a range publishes
    /// [`BookingEvent::SelectionCompleted`] with the live quote.
    pub fn click(&mut self, day: NaiveDate) -> Result<ClickOutcome, SelectionError> {
        let outcome = self.selector.click(day, &self.index)?;

        if let ClickOutcome::RangeCompleted(range) = outcome {
            let quote = self.quote();
            self.event_bus
                .publish(BookingEvent::SelectionCompleted(SelectionCompletedEvent {
                    product_id: self.product.id,
                    start: range.start,
                    end: range.end,
                    quantity: self.selector.quantity(),
                    subtotal_minor: quote.subtotal_minor,
                }));
        }

        Ok(outcome)
    }

    /// Change the desired quantity.
    ///
    /// Any selection is discarded on a real change, since its days were
    /// validated for the old quantity. The value itself is not range
    /// checked here; [`submit`](Self::submit) enforces `1..=stock`.
    pub fn set_quantity(&mut self, quantity: i64) {
        if self.selector.set_quantity(quantity) {
            self.publish_selection_cleared("quantity_changed");
        }
    }

    pub fn quantity(&self) -> i64 {
        self.selector.quantity()
    }

    /// Discard the current selection, if any.
    pub fn clear_selection(&mut self) {
        let had_selection = self.selector.start().is_some();
        self.selector.reset();
        if had_selection {
            self.publish_selection_cleared("manual");
        }
    }

    /// Price of the selection as it stands. Zero until a range completes.
    pub fn quote(&self) -> Quote {
        Quote::for_selection(
            self.selector.completed_range(),
            &self.product,
            self.selector.quantity(),
        )
    }

    /// Submit the completed selection as a reservation.
    ///
    /// Preconditions are checked before anything goes on the wire, each
    /// with its own error so the caller can react differently: no range,
    /// no signed-in user, quantity outside `1..=stock`, stale index.
    ///
    /// The POST itself is never retried. A backend conflict means someone
    /// else booked the range first: the selection is discarded and the
    /// index marked stale until the next successful refresh. On success
    /// the selection is cleared and a refresh is attempted so the new
    /// reservation reduces availability for the next one; if that refresh
    /// fails the confirmation is still returned and the index stays
    /// marked stale.
    #[instrument(skip(self), fields(product_id = self.product.id))]
    pub async fn submit(&mut self) -> Result<ReservationConfirmation, BookingError> {
        let range = self.selector.completed_range().ok_or(BookingError::NoDateRange)?;

        let identity = self
            .identity
            .current_identity()
            .await
            .ok_or(BookingError::NotAuthenticated)?;

        let quantity = self.selector.quantity();
        let stock = self.product.effective_stock();
        if quantity < 1 || quantity > stock {
            return Err(BookingError::InvalidQuantity {
                requested: quantity,
                stock,
            });
        }

        if self.needs_refresh {
            return Err(BookingError::StaleAvailability);
        }

        let quote = self.quote();
        let request = NewReservation {
            product_id: self.product.id,
            user_id: identity.user_id,
            period: range,
            quantity,
            total_price_minor: quote.subtotal_minor,
        };

        match self.gateway.create_reservation(&request).await {
            Ok(confirmation) => {
                info!(
                    reservation_id = confirmation.reservation_id,
                    period = %range,
                    total = %quote.format_subtotal(),
                    "Reservation accepted"
                );
                self.event_bus
                    .publish(BookingEvent::ReservationSubmitted(ReservationSubmittedEvent {
                        product_id: self.product.id,
                        reservation_id: confirmation.reservation_id,
                        start: range.start,
                        end: range.end,
                        quantity,
                        total_price_minor: quote.subtotal_minor,
                    }));

                self.selector.reset();
                self.publish_selection_cleared("submitted");

                // The index does not contain the reservation just made.
                self.needs_refresh = true;
                if let Err(err) = self.refresh().await {
                    warn!(error = %err, "Post-submission refresh failed, index stays stale");
                }

                Ok(confirmation)
            }
            Err(GatewayError::Conflict(message)) => {
                warn!(period = %range, reason = %message, "Reservation conflicted");
                self.needs_refresh = true;
                self.event_bus
                    .publish(BookingEvent::AvailabilityStale(AvailabilityStaleEvent {
                        product_id: self.product.id,
                        reason: message.clone(),
                    }));
                self.selector.reset();
                self.publish_selection_cleared("conflict");
                Err(BookingError::Conflict(message))
            }
            Err(err) => {
                warn!(error = %err, transient = err.is_transient(), "Submission failed");
                self.event_bus
                    .publish(BookingEvent::SubmissionFailed(SubmissionFailedEvent {
                        product_id: self.product.id,
                        message: err.to_string(),
                        transient: err.is_transient(),
                    }));
                Err(BookingError::Gateway(err))
            }
        }
    }

    fn publish_selection_cleared(&self, reason: &str) {
        self.event_bus
            .publish(BookingEvent::SelectionCleared(SelectionClearedEvent {
                product_id: self.product.id,
                reason: reason.to_string(),
            }));
    }
}

// ── Tests ──────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::domain::date_range::DateRange;
    use crate::domain::reservation::{Reservation, ReservationStatus};
    use crate::infrastructure::memory::{InMemoryReservationGateway, StaticIdentity};
    use crate::notifications::{create_event_bus, EventSubscriber};

    fn day(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn range(start: &str, end: &str) -> DateRange {
        DateRange::new(day(start), day(end)).unwrap()
    }

    /// Stock 5 at 15.00 EUR per unit-day, window June 2026.
    fn sample_session(
        gateway: Arc<InMemoryReservationGateway>,
        identity: StaticIdentity,
    ) -> BookingSession {
        BookingSession::anchored_at(
            ProductSnapshot::new(7, 5, 1500, "EUR"),
            gateway,
            Arc::new(identity),
            create_event_bus(),
            1,
            day("2026-06-01"),
        )
    }

    async fn next_event(subscriber: &mut EventSubscriber) -> BookingEvent {
        tokio::time::timeout(Duration::from_millis(200), subscriber.recv())
            .await
            .expect("timed out waiting for an event")
            .expect("event bus closed")
            .event
    }

    #[tokio::test]
    async fn nothing_is_selectable_before_the_first_refresh() {
        let gateway = Arc::new(InMemoryReservationGateway::new());
        let mut session = sample_session(gateway, StaticIdentity::signed_out());

        assert!(session.needs_refresh());
        let err = session.click(day("2026-06-05")).unwrap_err();
        assert_eq!(
            err,
            SelectionError::DayUnavailable {
                date: day("2026-06-05"),
                remaining: 0,
                requested: 1,
            }
        );
    }

    #[tokio::test]
    async fn refresh_builds_the_index_from_fetched_reservations() {
        let gateway = Arc::new(InMemoryReservationGateway::new());
        gateway.seed_reservation(
            7,
            Reservation::new(range("2026-06-02", "2026-06-04"), 4, ReservationStatus::Pending),
        );
        let mut session = sample_session(gateway, StaticIdentity::signed_out());
        let mut events = session.event_bus.subscribe();

        session.refresh().await.unwrap();

        assert!(!session.needs_refresh());
        assert_eq!(session.availability().remaining(day("2026-06-03")), Some(1));
        assert_eq!(session.availability().remaining(day("2026-06-05")), Some(5));

        match next_event(&mut events).await {
            BookingEvent::AvailabilityRefreshed(e) => {
                assert_eq!(e.product_id, 7);
                assert_eq!(e.reservation_count, 1);
                assert_eq!(e.window_start, day("2026-06-01"));
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn refresh_retries_transient_fetch_failures() {
        let gateway = Arc::new(InMemoryReservationGateway::new());
        gateway.fail_next_fetches(2);
        let mut session = sample_session(Arc::clone(&gateway), StaticIdentity::signed_out());

        session.refresh().await.unwrap();

        assert_eq!(gateway.fetch_call_count(), 3);
        assert!(!session.needs_refresh());
    }

    #[tokio::test(start_paused = true)]
    async fn refresh_gives_up_after_exhausting_retries() {
        let gateway = Arc::new(InMemoryReservationGateway::new());
        gateway.fail_next_fetches(10);
        let mut session = sample_session(Arc::clone(&gateway), StaticIdentity::signed_out());

        let err = session.refresh().await.unwrap_err();

        assert!(err.is_transient());
        assert_eq!(gateway.fetch_call_count(), 3);
        assert!(session.needs_refresh());
    }

    #[tokio::test]
    async fn completing_a_range_publishes_the_quote() {
        let gateway = Arc::new(InMemoryReservationGateway::new());
        let mut session = sample_session(gateway, StaticIdentity::signed_out());
        session.refresh().await.unwrap();
        session.set_quantity(2);
        let mut events = session.event_bus.subscribe();

        session.click(day("2026-06-05")).unwrap();
        let outcome = session.click(day("2026-06-07")).unwrap();
        assert_eq!(
            outcome,
            ClickOutcome::RangeCompleted(range("2026-06-05", "2026-06-07"))
        );

        match next_event(&mut events).await {
            BookingEvent::SelectionCompleted(e) => {
                assert_eq!(e.start, day("2026-06-05"));
                assert_eq!(e.end, day("2026-06-07"));
                assert_eq!(e.quantity, 2);
                assert_eq!(e.subtotal_minor, 1500 * 2 * 3);
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn quantity_change_discards_the_selection_and_notifies() {
        let gateway = Arc::new(InMemoryReservationGateway::new());
        let mut session = sample_session(gateway, StaticIdentity::signed_out());
        session.refresh().await.unwrap();
        session.click(day("2026-06-05")).unwrap();
        session.click(day("2026-06-06")).unwrap();
        let mut events = session.event_bus.subscribe();

        session.set_quantity(3);

        assert_eq!(session.quantity(), 3);
        assert_eq!(session.selector().completed_range(), None);
        match next_event(&mut events).await {
            BookingEvent::SelectionCleared(e) => assert_eq!(e.reason, "quantity_changed"),
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn submit_without_a_range_is_rejected_locally() {
        let gateway = Arc::new(InMemoryReservationGateway::new());
        let mut session =
            sample_session(Arc::clone(&gateway), StaticIdentity::signed_in(3, "token"));
        session.refresh().await.unwrap();

        let err = session.submit().await.unwrap_err();

        assert!(matches!(err, BookingError::NoDateRange));
        assert_eq!(gateway.create_call_count(), 0);
    }

    #[tokio::test]
    async fn submit_without_a_user_never_touches_the_network() {
        let gateway = Arc::new(InMemoryReservationGateway::new());
        let mut session = sample_session(Arc::clone(&gateway), StaticIdentity::signed_out());
        session.refresh().await.unwrap();
        session.click(day("2026-06-05")).unwrap();
        session.click(day("2026-06-07")).unwrap();

        let err = session.submit().await.unwrap_err();

        assert!(matches!(err, BookingError::NotAuthenticated));
        assert_eq!(gateway.create_call_count(), 0);
    }

    #[tokio::test]
    async fn submit_rejects_a_quantity_outside_stock() {
        let gateway = Arc::new(InMemoryReservationGateway::new());
        let mut session =
            sample_session(Arc::clone(&gateway), StaticIdentity::signed_in(3, "token"));
        session.refresh().await.unwrap();
        // Zero is never offered by a real quantity picker, but the
        // precondition has to hold for any caller.
        session.set_quantity(0);
        session.click(day("2026-06-05")).unwrap();
        session.click(day("2026-06-07")).unwrap();

        let err = session.submit().await.unwrap_err();

        assert!(matches!(
            err,
            BookingError::InvalidQuantity {
                requested: 0,
                stock: 5,
            }
        ));
        assert_eq!(gateway.create_call_count(), 0);
    }

    #[tokio::test]
    async fn successful_submit_confirms_resets_and_refreshes() {
        let gateway = Arc::new(InMemoryReservationGateway::new());
        let mut session =
            sample_session(Arc::clone(&gateway), StaticIdentity::signed_in(3, "token"));
        session.refresh().await.unwrap();
        session.set_quantity(2);
        session.click(day("2026-06-05")).unwrap();
        session.click(day("2026-06-07")).unwrap();
        let mut events = session.event_bus.subscribe();

        let confirmation = session.submit().await.unwrap();

        assert_eq!(confirmation.reservation_id, 1);
        assert_eq!(confirmation.status, ReservationStatus::Pending);
        assert_eq!(session.selector().completed_range(), None);
        assert!(!session.needs_refresh());
        // The fetched-back reservation now reduces availability.
        assert_eq!(session.availability().remaining(day("2026-06-06")), Some(3));

        match next_event(&mut events).await {
            BookingEvent::ReservationSubmitted(e) => {
                assert_eq!(e.reservation_id, 1);
                assert_eq!(e.total_price_minor, 1500 * 2 * 3);
            }
            other => panic!("unexpected event: {:?}", other),
        }
        match next_event(&mut events).await {
            BookingEvent::SelectionCleared(e) => assert_eq!(e.reason, "submitted"),
            other => panic!("unexpected event: {:?}", other),
        }
        match next_event(&mut events).await {
            BookingEvent::AvailabilityRefreshed(e) => assert_eq!(e.reservation_count, 1),
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn submit_succeeds_even_if_the_followup_refresh_fails() {
        let gateway = Arc::new(InMemoryReservationGateway::new());
        let mut session =
            sample_session(Arc::clone(&gateway), StaticIdentity::signed_in(3, "token"));
        session.refresh().await.unwrap();
        session.click(day("2026-06-05")).unwrap();
        session.click(day("2026-06-07")).unwrap();
        gateway.fail_next_fetches(10);

        let confirmation = session.submit().await.unwrap();

        assert_eq!(confirmation.reservation_id, 1);
        assert!(session.needs_refresh());
    }

    #[tokio::test]
    async fn conflict_discards_the_selection_and_gates_submission() {
        let gateway = Arc::new(InMemoryReservationGateway::new());
        gateway.conflict_on_next_create();
        let mut session =
            sample_session(Arc::clone(&gateway), StaticIdentity::signed_in(3, "token"));
        session.refresh().await.unwrap();
        session.click(day("2026-06-05")).unwrap();
        session.click(day("2026-06-07")).unwrap();
        let mut events = session.event_bus.subscribe();

        let err = session.submit().await.unwrap_err();
        assert!(matches!(err, BookingError::Conflict(_)));
        assert!(session.needs_refresh());
        assert_eq!(session.selector().completed_range(), None);

        match next_event(&mut events).await {
            BookingEvent::AvailabilityStale(e) => assert_eq!(e.product_id, 7),
            other => panic!("unexpected event: {:?}", other),
        }
        match next_event(&mut events).await {
            BookingEvent::SelectionCleared(e) => assert_eq!(e.reason, "conflict"),
            other => panic!("unexpected event: {:?}", other),
        }

        // Re-selecting without refreshing is still gated.
        session.click(day("2026-06-10")).unwrap();
        session.click(day("2026-06-11")).unwrap();
        let err = session.submit().await.unwrap_err();
        assert!(matches!(err, BookingError::StaleAvailability));
        assert_eq!(gateway.create_call_count(), 1);

        // A refresh lifts the gate.
        session.refresh().await.unwrap();
        session.click(day("2026-06-10")).unwrap();
        session.click(day("2026-06-11")).unwrap();
        session.submit().await.unwrap();
        assert_eq!(gateway.create_call_count(), 2);
    }

    #[tokio::test]
    async fn backend_capacity_shortfall_surfaces_as_a_conflict() {
        let gateway = Arc::new(InMemoryReservationGateway::new());
        // The backend believes only 1 unit exists while the session
        // snapshot still says 5, so the POST is where the gap shows.
        gateway.set_stock(7, 1);
        let mut session =
            sample_session(Arc::clone(&gateway), StaticIdentity::signed_in(3, "token"));
        session.refresh().await.unwrap();
        session.set_quantity(2);
        session.click(day("2026-06-05")).unwrap();
        session.click(day("2026-06-07")).unwrap();
        let mut events = session.event_bus.subscribe();

        let err = session.submit().await.unwrap_err();
        match err {
            BookingError::Conflict(message) => assert!(message.contains("left on")),
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(session.needs_refresh());

        match next_event(&mut events).await {
            BookingEvent::AvailabilityStale(e) => assert_eq!(e.product_id, 7),
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn refresh_drops_a_selection_that_no_longer_fits() {
        let gateway = Arc::new(InMemoryReservationGateway::new());
        let mut session =
            sample_session(Arc::clone(&gateway), StaticIdentity::signed_in(3, "token"));
        session.refresh().await.unwrap();
        session.set_quantity(2);
        session.click(day("2026-06-02")).unwrap();
        session.click(day("2026-06-04")).unwrap();
        let mut events = session.event_bus.subscribe();

        // Someone else books 4 of 5 units over the same days.
        gateway.seed_reservation(
            7,
            Reservation::new(range("2026-06-03", "2026-06-03"), 4, ReservationStatus::Confirmed),
        );
        session.refresh().await.unwrap();

        assert_eq!(session.selector().completed_range(), None);
        match next_event(&mut events).await {
            BookingEvent::AvailabilityRefreshed(_) => {}
            other => panic!("unexpected event: {:?}", other),
        }
        match next_event(&mut events).await {
            BookingEvent::SelectionCleared(e) => assert_eq!(e.reason, "availability_changed"),
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn clear_selection_notifies_once() {
        let gateway = Arc::new(InMemoryReservationGateway::new());
        let mut session = sample_session(gateway, StaticIdentity::signed_out());
        session.refresh().await.unwrap();
        session.click(day("2026-06-05")).unwrap();
        let mut events = session.event_bus.subscribe();

        session.clear_selection();
        session.clear_selection();

        match next_event(&mut events).await {
            BookingEvent::SelectionCleared(e) => assert_eq!(e.reason, "manual"),
            other => panic!("unexpected event: {:?}", other),
        }
        let nothing =
            tokio::time::timeout(Duration::from_millis(50), events.recv()).await;
        assert!(nothing.is_err());
    }
}
